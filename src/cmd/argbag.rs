/*!
ArgBag: the loosely-typed named-argument bag behind every dispatch.

Two ingestion paths feed the same structure:
  - headless: a JSON-encoded object string (`{"spaceKey":"DOCS"}`);
    anything that is not a JSON object is an argument-parse failure
  - shell: `key=value` tokens, with values coerced through a JSON literal
    parse first (`25` -> number, `true` -> bool) and kept as strings
    otherwise

Presence semantics: a key mapped to `null` counts as absent. Typed getters
never treat an explicit `0` as missing — only absence (or null) falls back
to a default.
*/

use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArgBagError {
    #[error("'{input}' is not valid JSON ({detail})")]
    NotJson { input: String, detail: String },
    #[error("'{0}' is not a JSON object")]
    NotObject(String),
    #[error("argument '{0}' must be of the form key=value")]
    InvalidPair(String),
    #[error("argument '{key}' must be a non-negative integer (got {got})")]
    InvalidNumber { key: String, got: String },
}

#[derive(Debug, Clone, Default)]
pub struct ArgBag(Map<String, Value>);

impl ArgBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the headless JSON argument string. Empty / whitespace-only
    /// input yields an empty bag.
    pub fn from_json_str(raw: &str) -> Result<Self, ArgBagError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(Self::new());
        }
        let value: Value = serde_json::from_str(trimmed).map_err(|e| ArgBagError::NotJson {
            input: trimmed.to_string(),
            detail: e.to_string(),
        })?;
        match value {
            Value::Object(map) => Ok(Self(map)),
            _ => Err(ArgBagError::NotObject(trimmed.to_string())),
        }
    }

    /// Build from shell `key=value` tokens.
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self, ArgBagError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut map = Map::new();
        for pair in pairs {
            let pair = pair.as_ref();
            let (key, raw_value) = pair
                .split_once('=')
                .ok_or_else(|| ArgBagError::InvalidPair(pair.to_string()))?;
            let key = key.trim();
            if key.is_empty() {
                return Err(ArgBagError::InvalidPair(pair.to_string()));
            }
            map.insert(key.to_string(), coerce_value(raw_value));
        }
        Ok(Self(map))
    }

    pub fn insert(&mut self, key: &str, value: Value) {
        self.0.insert(key.to_string(), value);
    }

    /// Presence check used by required-argument validation: `null` is absent.
    pub fn has(&self, key: &str) -> bool {
        matches!(self.0.get(key), Some(v) if !v.is_null())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    /// String view of a value; numbers and booleans stringify so that
    /// `pageId=123` and `pageId="123"` are interchangeable.
    pub fn get_str(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Integer with a default for *absent* values. An explicit `0` is kept.
    pub fn get_u32_or(&self, key: &str, default: u32) -> Result<u32, ArgBagError> {
        match self.get(key) {
            None => Ok(default),
            Some(v) => parse_u64(key, v).and_then(|n| {
                u32::try_from(n).map_err(|_| ArgBagError::InvalidNumber {
                    key: key.to_string(),
                    got: n.to_string(),
                })
            }),
        }
    }

    /// Required integer (used for `version`).
    pub fn get_u64(&self, key: &str) -> Result<Option<u64>, ArgBagError> {
        match self.get(key) {
            None => Ok(None),
            Some(v) => parse_u64(key, v).map(Some),
        }
    }
}

fn parse_u64(key: &str, v: &Value) -> Result<u64, ArgBagError> {
    let invalid = || ArgBagError::InvalidNumber {
        key: key.to_string(),
        got: v.to_string(),
    };
    match v {
        Value::Number(n) => n.as_u64().ok_or_else(invalid),
        Value::String(s) => s.trim().parse::<u64>().map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

/// Shell values pass through a JSON literal parse so numbers and booleans
/// keep their type; everything else stays a plain string.
fn coerce_value(raw: &str) -> Value {
    let trimmed = raw.trim();
    match serde_json::from_str::<Value>(trimmed) {
        Ok(v) => v,
        Err(_) => Value::String(trimmed.to_string()),
    }
}
