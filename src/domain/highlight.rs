//! Highlighting derivation: renders snippet code to a standalone HTML document.

use crate::domain::model::{Language, Style};
use once_cell::sync::Lazy;
use syntect::easy::HighlightLines;
use syntect::highlighting::{Color, Style as TokenStyle, Theme, ThemeSet};
use syntect::html::{styled_line_to_highlighted_html, IncludeBackground};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

static SYNTAX_SET: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: Lazy<ThemeSet> = Lazy::new(ThemeSet::load_defaults);

/// Pure, deterministic renderer for `(code, language, style, linenos)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Highlighter;

impl Highlighter {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, code: &str, language: Language, style: Style, linenos: bool) -> String {
        let syntax = find_syntax(language);
        let theme = find_theme(style);

        let body = highlight_lines(code, syntax, theme).unwrap_or_else(|_| escape_html(code));
        let background = theme
            .settings
            .background
            .map(css_color)
            .unwrap_or_else(|| "#ffffff".to_string());
        let foreground = theme
            .settings
            .foreground
            .map(css_color)
            .unwrap_or_else(|| "#000000".to_string());

        let pre = format!(
            "<pre style=\"background-color:{}; color:{}; margin:0\">{}</pre>",
            background, foreground, body
        );
        let content = if linenos {
            let numbers = (1..=line_count(code))
                .map(|n| n.to_string())
                .collect::<Vec<_>>()
                .join("\n");
            format!(
                "<table class=\"highlighttable\"><tr><td class=\"linenos\"><pre>{}</pre></td><td class=\"code\">{}</td></tr></table>",
                numbers, pre
            )
        } else {
            format!("<div class=\"highlight\">{}</div>", pre)
        };

        format!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title></title>\n</head>\n<body>\n{}\n</body>\n</html>\n",
            content
        )
    }
}

fn find_syntax(language: Language) -> &'static SyntaxReference {
    SYNTAX_SET
        .find_syntax_by_extension(language.syntax_extension())
        .unwrap_or_else(|| SYNTAX_SET.find_syntax_plain_text())
}

fn find_theme(style: Style) -> &'static Theme {
    THEME_SET
        .themes
        .get(style.theme_name())
        .or_else(|| THEME_SET.themes.values().next())
        .unwrap_or_else(|| Lazy::force(&FALLBACK_THEME))
}

static FALLBACK_THEME: Lazy<Theme> = Lazy::new(Theme::default);

fn highlight_lines(code: &str, syntax: &SyntaxReference, theme: &Theme) -> Result<String, syntect::Error> {
    let mut highlighter = HighlightLines::new(syntax, theme);
    let mut html = String::new();
    for line in LinesWithEndings::from(code) {
        let ranges: Vec<(TokenStyle, &str)> = highlighter.highlight_line(line, &SYNTAX_SET)?;
        html.push_str(&styled_line_to_highlighted_html(&ranges[..], IncludeBackground::No)?);
    }
    Ok(html)
}

fn line_count(code: &str) -> usize {
    code.lines().count().max(1)
}

fn css_color(c: Color) -> String {
    format!("#{:02x}{:02x}{:02x}", c.r, c.g, c.b)
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_a_full_document_around_the_code() {
        let html = Highlighter::new().render("print(1)", Language::Python, Style::Friendly, false);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<pre"));
        assert!(html.contains("</html>"));
        assert!(html.contains("<span"));
        assert!(html.contains("print"));
    }

    #[test]
    fn output_is_deterministic() {
        let h = Highlighter::new();
        let a = h.render("fn main() {}", Language::Rust, Style::OceanDark, true);
        let b = h.render("fn main() {}", Language::Rust, Style::OceanDark, true);
        assert_eq!(a, b);
    }

    #[test]
    fn every_input_changes_the_output() {
        let h = Highlighter::new();
        let base = h.render("x = 1\ny = 2", Language::Python, Style::Friendly, false);
        assert_ne!(base, h.render("x = 3\ny = 2", Language::Python, Style::Friendly, false));
        assert_ne!(base, h.render("x = 1\ny = 2", Language::Python, Style::SolarizedDark, false));
        assert_ne!(base, h.render("x = 1\ny = 2", Language::Python, Style::Friendly, true));
    }

    #[test]
    fn line_numbers_are_emitted_in_a_table() {
        let html = Highlighter::new().render("a\nb\nc", Language::Text, Style::Friendly, true);
        assert!(html.contains("class=\"highlighttable\""));
        assert!(html.contains("<pre>1\n2\n3</pre>"));
    }

    #[test]
    fn markup_in_code_is_escaped() {
        let html = Highlighter::new().render("<script>alert(1)</script>", Language::Text, Style::Friendly, false);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn empty_code_still_renders() {
        let html = Highlighter::new().render("", Language::Python, Style::Friendly, false);
        assert!(html.contains("<pre"));
    }
}
