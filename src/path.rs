//! Store paths and path templates.
//!
//! Paths are `/`-separated. A template may contain `$name` placeholders which
//! are bound from the field's arguments when the directive is resolved:
//!
//! ```
//! use rtdbql::PathTemplate;
//! use serde_json::json;
//!
//! let template = PathTemplate::parse("/users/$id").unwrap();
//! let args = json!({ "id": 42 });
//! let path = template.resolve(args.as_object().unwrap(), "input").unwrap();
//! assert_eq!(path, "/users/42");
//! ```

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::error::PathError;

/// Path separator used by every store path.
pub const SEPARATOR: char = '/';

const PLACEHOLDER_PATTERN: &str = r"\$([A-Za-z_][A-Za-z0-9_]*)";

static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();

fn placeholder_regex() -> Result<&'static Regex, PathError> {
    if let Some(re) = PLACEHOLDER.get() {
        return Ok(re);
    }
    let compiled = Regex::new(PLACEHOLDER_PATTERN).map_err(|e| PathError::InvalidTemplate {
        template: PLACEHOLDER_PATTERN.to_string(),
        message: e.to_string(),
    })?;
    Ok(PLACEHOLDER.get_or_init(|| compiled))
}

/// Non-empty segments of `path`.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split(SEPARATOR).filter(|s| !s.is_empty())
}

/// Join `child` under `parent` with exactly one separator between them.
#[must_use]
pub fn join(parent: &str, child: &str) -> String {
    format!(
        "{}{SEPARATOR}{}",
        parent.trim_end_matches(SEPARATOR),
        child.trim_start_matches(SEPARATOR)
    )
}

/// The trailing segment of `path`, or `None` when it is empty.
///
/// A trailing separator yields `None`: `"/users/"` has an empty last segment.
#[must_use]
pub fn last_segment(path: &str) -> Option<&str> {
    path.rsplit(SEPARATOR).next().filter(|s| !s.is_empty())
}

/// A store path that may contain `$name` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
    params: Vec<String>,
}

impl PathTemplate {
    /// Parse a template, collecting its placeholder names.
    ///
    /// # Errors
    /// `InvalidTemplate` if the placeholder matcher cannot be built.
    pub fn parse(raw: impl Into<String>) -> Result<Self, PathError> {
        let raw = raw.into();
        let params = placeholder_regex()?
            .captures_iter(&raw)
            .map(|c| c[1].to_string())
            .collect();
        Ok(Self { raw, params })
    }

    /// The template text as declared.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Placeholder names in order of appearance.
    #[must_use]
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// True if the template has no placeholders.
    #[must_use]
    pub fn is_literal(&self) -> bool {
        self.params.is_empty()
    }

    /// Bind placeholders from `args`, falling back to fields of the
    /// `input_argument` object. Literal templates come back unchanged.
    ///
    /// # Errors
    /// - `UnboundParameter` if neither source has the name
    /// - `InvalidParameterValue` if the bound value is not a string or integer,
    ///   or is a string that is empty or contains the separator
    pub fn resolve(&self, args: &Map<String, Value>, input_argument: &str) -> Result<String, PathError> {
        if self.is_literal() {
            return Ok(self.raw.clone());
        }

        let input = args.get(input_argument).and_then(Value::as_object);
        let mut bound = Vec::with_capacity(self.params.len());
        for name in &self.params {
            let value = args
                .get(name)
                .or_else(|| input.and_then(|obj| obj.get(name)))
                .ok_or_else(|| PathError::UnboundParameter { name: name.clone() })?;
            bound.push(segment_value(name, value)?);
        }

        let mut bound = bound.into_iter();
        let resolved = placeholder_regex()?.replace_all(&self.raw, |_: &regex::Captures<'_>| {
            bound.next().unwrap_or_default()
        });
        Ok(resolved.into_owned())
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn segment_value(name: &str, value: &Value) -> Result<String, PathError> {
    match value {
        Value::String(s) if s.is_empty() => Err(PathError::InvalidParameterValue {
            name: name.to_string(),
            found: "empty string".to_string(),
        }),
        Value::String(s) if s.contains(SEPARATOR) => Err(PathError::InvalidParameterValue {
            name: name.to_string(),
            found: format!("string containing '{SEPARATOR}'"),
        }),
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) if n.is_i64() || n.is_u64() => Ok(n.to_string()),
        other => Err(PathError::InvalidParameterValue {
            name: name.to_string(),
            found: json_type_name(other).to_string(),
        }),
    }
}

pub(crate) const fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
