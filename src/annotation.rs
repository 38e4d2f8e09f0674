//! Directive comment parsing.
//!
//! A directive is a doc comment line of the form `@name value`:
//!
//! ```text
//! /// @queue emergency
//! /// @header retries: type=integer;description='how often to retry';example=5;
//! ```
//!
//! Lines that do not match the grammar are skipped. Directives the builders do not
//! consume themselves are applied as generic field assignments through explicit
//! [`Field`] tables, so an unknown field is a plain `false` rather than an error.

use crate::document::{Contact, Info, License, Message};
use log::debug;
use regex::Regex;
use serde_json::{Number, Value};
use std::collections::BTreeMap;
use std::sync::LazyLock;

static DIRECTIVE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[/!*\s]*@([a-z][A-Za-z0-9_.]*)(?:\s+(.*?))?\s*$").unwrap()
});

/// One parsed directive line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive<'a> {
    /// Directive name, possibly dotted (`contact.name`)
    pub name: &'a str,
    /// Remaining text after the name, trimmed
    pub value: &'a str,
}

impl<'a> Directive<'a> {
    /// Parse a comment line. Returns `None` for anything that is not a directive.
    pub fn parse(line: &'a str) -> Option<Self> {
        let captures = DIRECTIVE_REGEX.captures(line)?;
        let name = captures.get(1)?.as_str();
        let value = captures.get(2).map_or("", |m| m.as_str());
        Some(Self { name, value })
    }
}

/// A value of the form `name: key1=val1;key2='val2';`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamValue {
    pub name: String,
    pub params: BTreeMap<String, String>,
}

impl ParamValue {
    /// Parse a directive value carrying sub-parameters.
    ///
    /// Chunks that do not split into exactly one key and one value are dropped.
    pub fn parse(value: &str) -> Self {
        let Some((name, raw_params)) = value.split_once(':') else {
            return Self {
                name: value.trim().to_string(),
                params: BTreeMap::new(),
            };
        };

        let mut params = BTreeMap::new();
        for chunk in raw_params.split(';') {
            let parts: Vec<&str> = chunk.trim().split('=').collect();
            if parts.len() != 2 {
                continue;
            }
            let key = parts[0].trim();
            if key.is_empty() {
                continue;
            }
            let value = parts[1].trim_matches(|c| c == '"' || c == '\'');
            params.insert(key.to_string(), value.to_string());
        }

        Self {
            name: name.trim().to_string(),
            params,
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

/// Coerce an annotation value: integer first, then finite float, else the raw string.
///
/// An empty value coerces to nothing.
pub fn coerce_value(raw: &str) -> Option<Value> {
    if raw.is_empty() {
        return None;
    }
    if let Ok(int) = raw.parse::<i64>() {
        return Some(Value::from(int));
    }
    if let Some(number) = raw.parse::<f64>().ok().and_then(Number::from_f64) {
        return Some(Value::Number(number));
    }
    Some(Value::String(raw.to_string()))
}

/// A settable field of a destination record
pub enum Field<T> {
    /// A text field, set from the directive value
    Text(fn(&mut T, String)),
    /// A nested record, addressed by the rest of a dotted path
    Record(fn(&mut T, &str, &str) -> bool),
}

/// Field name -> field, matched case-insensitively
pub type FieldTable<T> = [(&'static str, Field<T>)];

/// Assign `value` to the field named by `path` (case-insensitive, dotted for nesting).
///
/// Returns `false` when no compatible field exists.
pub fn assign_field<T>(table: &FieldTable<T>, target: &mut T, path: &str, value: &str) -> bool {
    let (head, rest) = match path.split_once('.') {
        Some((head, rest)) => (head, Some(rest)),
        None => (path, None),
    };

    let Some((_, field)) = table.iter().find(|(name, _)| name.eq_ignore_ascii_case(head)) else {
        debug!("No field named `{}`, directive ignored", path);
        return false;
    };

    match (field, rest) {
        (Field::Text(set), None) => {
            set(target, value.to_string());
            true
        }
        (Field::Record(walk), Some(rest)) => walk(target, rest, value),
        _ => {
            debug!("Field `{}` cannot take a value of this shape", path);
            false
        }
    }
}

pub const CONTACT_FIELDS: &FieldTable<Contact> = &[
    ("name", Field::Text(|c: &mut Contact, v: String| c.name = Some(v))),
    ("url", Field::Text(|c: &mut Contact, v: String| c.url = Some(v))),
    ("email", Field::Text(|c: &mut Contact, v: String| c.email = Some(v))),
];

pub const LICENSE_FIELDS: &FieldTable<License> = &[
    ("name", Field::Text(|l: &mut License, v: String| l.name = Some(v))),
    ("url", Field::Text(|l: &mut License, v: String| l.url = Some(v))),
];

pub const INFO_FIELDS: &FieldTable<Info> = &[
    ("title", Field::Text(|i: &mut Info, v: String| i.title = Some(v))),
    ("version", Field::Text(|i: &mut Info, v: String| i.version = Some(v))),
    ("description", Field::Text(|i: &mut Info, v: String| i.description = Some(v))),
    (
        "termsOfService",
        Field::Text(|i: &mut Info, v: String| i.terms_of_service = Some(v)),
    ),
    (
        "contact",
        Field::Record(|i: &mut Info, path: &str, v: &str| {
            assign_field(CONTACT_FIELDS, &mut i.contact, path, v)
        }),
    ),
    (
        "license",
        Field::Record(|i: &mut Info, path: &str, v: &str| {
            assign_field(LICENSE_FIELDS, &mut i.license, path, v)
        }),
    ),
];

pub const MESSAGE_FIELDS: &FieldTable<Message> = &[
    ("summary", Field::Text(|m: &mut Message, v: String| m.summary = Some(v))),
    ("description", Field::Text(|m: &mut Message, v: String| m.description = Some(v))),
    ("name", Field::Text(|m: &mut Message, v: String| m.name = Some(v))),
    ("contentType", Field::Text(|m: &mut Message, v: String| m.content_type = Some(v))),
    ("title", Field::Text(|m: &mut Message, v: String| m.title = Some(v))),
];

/// Apply every directive among `lines` to `info`.
pub fn apply_info_directives<S: AsRef<str>>(info: &mut Info, lines: &[S]) {
    for line in lines {
        if let Some(directive) = Directive::parse(line.as_ref()) {
            assign_field(INFO_FIELDS, info, directive.name, directive.value);
        }
    }
}
