//! The closed sets a snippet may pick its lexer and color theme from.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// Declares a string-keyed choice enum: id table, `FromStr`, `Display`, serde.
macro_rules! choice_enum {
    (
        $(#[$meta:meta])*
        $name:ident default $default:ident {
            $($variant:ident => $id:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
        pub enum $name {
            $(#[serde(rename = $id)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn id(self) -> &'static str {
                match self {
                    $($name::$variant => $id),+
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl FromStr for $name {
            type Err = UnknownChoice;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($id => Ok($name::$variant),)+
                    other => Err(UnknownChoice(other.to_string())),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.id())
            }
        }
    };
}

/// A value outside one of the enumerated sets.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("\"{0}\" is not a valid choice.")]
pub struct UnknownChoice(pub String);

choice_enum! {
    /// Highlighting lexer.
    Language default Python {
        Bash => "bash",
        C => "c",
        Cpp => "cpp",
        CSharp => "csharp",
        Css => "css",
        Diff => "diff",
        Go => "go",
        Haskell => "haskell",
        Html => "html",
        Java => "java",
        JavaScript => "js",
        Json => "json",
        Lua => "lua",
        Make => "make",
        Markdown => "markdown",
        ObjectiveC => "objective-c",
        Perl => "perl",
        Php => "php",
        Python => "python",
        R => "r",
        Ruby => "ruby",
        Rust => "rust",
        Scala => "scala",
        Sql => "sql",
        Text => "text",
        Xml => "xml",
        Yaml => "yaml",
    }
}

choice_enum! {
    /// Highlighting color theme.
    Style default Friendly {
        Friendly => "friendly",
        Eighties => "eighties",
        Mocha => "mocha",
        OceanDark => "ocean-dark",
        OceanLight => "ocean-light",
        SolarizedDark => "solarized-dark",
        SolarizedLight => "solarized-light",
    }
}

impl Language {
    /// File extension used to find the syntax definition.
    pub fn syntax_extension(self) -> &'static str {
        match self {
            Language::Bash => "sh",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::CSharp => "cs",
            Language::Css => "css",
            Language::Diff => "diff",
            Language::Go => "go",
            Language::Haskell => "hs",
            Language::Html => "html",
            Language::Java => "java",
            Language::JavaScript => "js",
            Language::Json => "json",
            Language::Lua => "lua",
            Language::Make => "mk",
            Language::Markdown => "md",
            Language::ObjectiveC => "m",
            Language::Perl => "pl",
            Language::Php => "php",
            Language::Python => "py",
            Language::R => "r",
            Language::Ruby => "rb",
            Language::Rust => "rs",
            Language::Scala => "scala",
            Language::Sql => "sql",
            Language::Text => "txt",
            Language::Xml => "xml",
            Language::Yaml => "yaml",
        }
    }
}

impl Style {
    /// Name of the bundled theme this style renders with.
    pub fn theme_name(self) -> &'static str {
        match self {
            Style::Friendly => "InspiredGitHub",
            Style::Eighties => "base16-eighties.dark",
            Style::Mocha => "base16-mocha.dark",
            Style::OceanDark => "base16-ocean.dark",
            Style::OceanLight => "base16-ocean.light",
            Style::SolarizedDark => "Solarized (dark)",
            Style::SolarizedLight => "Solarized (light)",
        }
    }
}
