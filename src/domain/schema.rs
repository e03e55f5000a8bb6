//! Explicit field schema for the snippet payload.
//!
//! Every inbound snippet body goes through [`validate`] before the store is touched. The
//! schema table below is the single description of each field: its type, whether a write
//! must supply it, whether it is read-only, and its length limit.

use crate::domain::model::{Language, Style};
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;

pub const TITLE_MAX_LENGTH: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Text,
    Bool,
    Timestamp,
    Link,
    LanguageChoice,
    StyleChoice,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    /// Must be present on create and full update.
    pub required: bool,
    /// Ignored on input, only ever emitted.
    pub read_only: bool,
    pub max_length: Option<usize>,
}

const fn field(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        name,
        kind,
        required: false,
        read_only: false,
        max_length: None,
    }
}

const fn read_only(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        read_only: true,
        ..field(name, kind)
    }
}

pub const SNIPPET_FIELDS: &[FieldSpec] = &[
    read_only("id", FieldKind::Integer),
    read_only("url", FieldKind::Link),
    read_only("highlight", FieldKind::Link),
    read_only("owner", FieldKind::Text),
    read_only("created_at", FieldKind::Timestamp),
    FieldSpec {
        max_length: Some(TITLE_MAX_LENGTH),
        ..field("title", FieldKind::Text)
    },
    FieldSpec {
        required: true,
        ..field("code", FieldKind::Text)
    },
    field("linenos", FieldKind::Bool),
    field("language_id", FieldKind::LanguageChoice),
    field("style_id", FieldKind::StyleChoice),
];

/// How much of the payload a write must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// New record: required fields must be present, omitted optional fields take defaults.
    Create,
    /// Full update: required fields must be present, omitted optional fields are left alone.
    Replace,
    /// Partial update: nothing is required.
    Partial,
}

/// Field name to the list of human-readable problems with it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub const NON_FIELD: &'static str = "non_field_errors";

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            first = false;
            write!(f, "{}: {}", field, messages.join(" "))?;
        }
        Ok(())
    }
}

/// Validated writable fields. `None` means "not supplied" (and, for `Create`, never occurs).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnippetChanges {
    pub title: Option<String>,
    pub code: Option<String>,
    pub linenos: Option<bool>,
    pub language: Option<Language>,
    pub style: Option<Style>,
}

/// A single converted field value.
enum Parsed {
    Text(String),
    Bool(bool),
    Language(Language),
    Style(Style),
}

pub fn validate(payload: &JsonValue, mode: WriteMode) -> Result<SnippetChanges, ValidationErrors> {
    let mut errors = ValidationErrors::default();
    let Some(obj) = payload.as_object() else {
        errors.add(
            ValidationErrors::NON_FIELD,
            "Invalid data. Expected a dictionary.",
        );
        return Err(errors);
    };

    let mut changes = SnippetChanges::default();
    for spec in SNIPPET_FIELDS.iter().filter(|s| !s.read_only) {
        match parse_field(spec, obj, mode) {
            Ok(Some(Parsed::Text(s))) if spec.name == "title" => changes.title = Some(s),
            Ok(Some(Parsed::Text(s))) => changes.code = Some(s),
            Ok(Some(Parsed::Bool(b))) => changes.linenos = Some(b),
            Ok(Some(Parsed::Language(l))) => changes.language = Some(l),
            Ok(Some(Parsed::Style(s))) => changes.style = Some(s),
            Ok(None) => {}
            Err(msg) => errors.add(spec.name, msg),
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    if mode == WriteMode::Create {
        changes.title.get_or_insert_with(String::new);
        changes.code.get_or_insert_with(String::new);
        changes.linenos.get_or_insert(false);
        changes.language.get_or_insert_with(Language::default);
        changes.style.get_or_insert_with(Style::default);
    }
    Ok(changes)
}

fn parse_field(
    spec: &FieldSpec,
    obj: &Map<String, JsonValue>,
    mode: WriteMode,
) -> Result<Option<Parsed>, String> {
    let value = match obj.get(spec.name) {
        None if spec.required && mode != WriteMode::Partial => {
            return Err("This field is required.".to_string())
        }
        None => return Ok(None),
        Some(JsonValue::Null) => return Err("This field may not be null.".to_string()),
        Some(v) => v,
    };

    let parsed = match spec.kind {
        FieldKind::Text => {
            let s = value.as_str().ok_or("Not a valid string.")?;
            // Postgres TEXT cannot hold U+0000.
            if s.contains('\0') {
                return Err("Null characters are not allowed.".to_string());
            }
            if let Some(max) = spec.max_length {
                if s.chars().count() > max {
                    return Err(format!(
                        "Ensure this field has no more than {} characters.",
                        max
                    ));
                }
            }
            Parsed::Text(s.to_string())
        }
        FieldKind::Bool => Parsed::Bool(coerce_bool(value).ok_or("Must be a valid boolean.")?),
        FieldKind::LanguageChoice => {
            Parsed::Language(choice_str(value)?.parse::<Language>().map_err(|e| format!("{}", e))?)
        }
        FieldKind::StyleChoice => {
            Parsed::Style(choice_str(value)?.parse::<Style>().map_err(|e| format!("{}", e))?)
        }
        // Read-only kinds never reach here.
        FieldKind::Integer | FieldKind::Timestamp | FieldKind::Link => return Ok(None),
    };
    Ok(Some(parsed))
}

/// Accepts JSON booleans plus the usual form-style spellings.
fn coerce_bool(v: &JsonValue) -> Option<bool> {
    if let Some(b) = v.as_bool() {
        return Some(b);
    }
    if let Some(n) = v.as_i64() {
        return match n {
            1 => Some(true),
            0 => Some(false),
            _ => None,
        };
    }
    match v.as_str()?.trim().to_lowercase().as_str() {
        "true" | "t" | "1" | "yes" | "on" => Some(true),
        "false" | "f" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn choice_str(v: &JsonValue) -> Result<String, String> {
    match v {
        JsonValue::String(s) => Ok(s.clone()),
        other => Err(format!("\"{}\" is not a valid choice.", other)),
    }
}
