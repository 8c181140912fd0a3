//! Field schemas with defaults for raw upstream JSON

use crate::error::{Error, Result};
use crate::metrics::parse_instant;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::BTreeMap;

/// How a raw value is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Plain string
    Text,
    /// Non-negative integer, sent upstream as a number or a decimal string
    Count,
    /// ISO-8601 instant with an offset
    Timestamp,
    /// True when the key is present and not null
    Presence,
    /// Literal boolean
    Flag,
}

/// A normalized value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Count(u64),
    Timestamp(DateTime<Utc>),
    Bool(bool),
}

/// One output field: where to find it and what to use when it is missing
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    /// Dotted paths, tried in order
    pub paths: &'static [&'static str],
    pub kind: FieldKind,
    /// `None` makes the field mandatory
    pub default: Option<FieldValue>,
}

impl FieldSpec {
    pub fn text(name: &'static str, paths: &'static [&'static str]) -> Self {
        Self {
            name,
            paths,
            kind: FieldKind::Text,
            default: Some(FieldValue::Text(String::new())),
        }
    }

    /// Mandatory text field, e.g. an identifier
    pub fn key(name: &'static str, paths: &'static [&'static str]) -> Self {
        Self {
            default: None,
            ..Self::text(name, paths)
        }
    }

    pub fn count(name: &'static str, paths: &'static [&'static str]) -> Self {
        Self {
            name,
            paths,
            kind: FieldKind::Count,
            default: Some(FieldValue::Count(0)),
        }
    }

    pub fn timestamp(name: &'static str, paths: &'static [&'static str]) -> Self {
        Self {
            name,
            paths,
            kind: FieldKind::Timestamp,
            default: None,
        }
    }

    pub fn presence(name: &'static str, paths: &'static [&'static str]) -> Self {
        Self {
            name,
            paths,
            kind: FieldKind::Presence,
            default: Some(FieldValue::Bool(false)),
        }
    }

    pub fn flag(name: &'static str, paths: &'static [&'static str]) -> Self {
        Self {
            name,
            paths,
            kind: FieldKind::Flag,
            default: Some(FieldValue::Bool(false)),
        }
    }

    /// Replace the default
    pub fn or(mut self, default: FieldValue) -> Self {
        self.default = Some(default);
        self
    }

    fn extract(&self, raw: &Value) -> Result<Option<FieldValue>> {
        if self.kind == FieldKind::Presence {
            let present = self
                .paths
                .iter()
                .any(|path| lookup(raw, path).is_some_and(|v| !v.is_null()));
            return Ok(Some(FieldValue::Bool(present)));
        }

        for path in self.paths {
            let Some(value) = lookup(raw, path) else {
                continue;
            };
            let parsed = match self.kind {
                FieldKind::Text => value.as_str().map(|s| FieldValue::Text(s.to_string())),
                FieldKind::Count => parse_count(value).map(FieldValue::Count),
                FieldKind::Flag => parse_flag(value).map(FieldValue::Bool),
                FieldKind::Timestamp => match value.as_str() {
                    Some(s) => Some(FieldValue::Timestamp(parse_instant(s)?)),
                    None => None,
                },
                FieldKind::Presence => None,
            };
            if parsed.is_some() {
                return Ok(parsed);
            }
        }

        Ok(None)
    }
}

/// A record with exactly the fields of its schema
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    entity: &'static str,
    values: BTreeMap<&'static str, FieldValue>,
}

impl NormalizedRecord {
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn field(&self, name: &str) -> Result<&FieldValue> {
        self.values
            .get(name)
            .ok_or_else(|| Error::malformed(self.entity, format!("no field '{}' in schema", name)))
    }

    fn mismatch(&self, name: &str, expected: &str) -> Error {
        Error::malformed(self.entity, format!("field '{}' is not {}", name, expected))
    }

    pub fn text(&self, name: &str) -> Result<String> {
        match self.field(name)? {
            FieldValue::Text(s) => Ok(s.clone()),
            _ => Err(self.mismatch(name, "text")),
        }
    }

    pub fn count(&self, name: &str) -> Result<u64> {
        match self.field(name)? {
            FieldValue::Count(n) => Ok(*n),
            _ => Err(self.mismatch(name, "a count")),
        }
    }

    pub fn timestamp(&self, name: &str) -> Result<DateTime<Utc>> {
        match self.field(name)? {
            FieldValue::Timestamp(t) => Ok(*t),
            _ => Err(self.mismatch(name, "a timestamp")),
        }
    }

    pub fn boolean(&self, name: &str) -> Result<bool> {
        match self.field(name)? {
            FieldValue::Bool(b) => Ok(*b),
            _ => Err(self.mismatch(name, "a boolean")),
        }
    }
}

/// Target shape for one entity kind
#[derive(Debug, Clone)]
pub struct Schema {
    pub entity: &'static str,
    pub fields: Vec<FieldSpec>,
}

impl Schema {
    pub fn new(entity: &'static str, fields: Vec<FieldSpec>) -> Self {
        Self { entity, fields }
    }

    /// Normalize one raw record.
    ///
    /// Every schema field ends up present. Fields not in the schema are
    /// dropped. A missing mandatory field, or an unusable timestamp, is a
    /// [`Error::MalformedRecord`].
    pub fn normalize(&self, raw: &Value) -> Result<NormalizedRecord> {
        if !raw.is_object() {
            return Err(Error::malformed(self.entity, "record is not an object"));
        }

        let mut values = BTreeMap::new();
        for spec in &self.fields {
            let value = spec
                .extract(raw)
                .map_err(|e| Error::malformed(self.entity, format!("{}: {}", spec.name, e)))?;
            let value = match value.or_else(|| spec.default.clone()) {
                Some(v) => v,
                None => {
                    return Err(Error::malformed(
                        self.entity,
                        format!("missing mandatory field '{}'", spec.name),
                    ))
                }
            };
            values.insert(spec.name, value);
        }

        Ok(NormalizedRecord {
            entity: self.entity,
            values,
        })
    }
}

fn lookup<'a>(raw: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(raw, |node, key| node.get(key))
}

fn parse_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
}

fn parse_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.to_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}
