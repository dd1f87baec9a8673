/*!
Uniform success/error envelope returned by every dispatched command.

Success carries the structured `data` payload plus `result`, the payload
pre-rendered in the session's output format. Failure carries only `error`,
always prefixed with the `ERROR:` marker so front-ends can print it
verbatim. Exactly one of the two shapes is populated.

Formatting policy:
  - json: stable 2-space-indented serialization (round-trips)
  - toon: compact token-oriented encoding
  - null data renders as the literal `null` under json and as the empty
    string under toon

Rendering never mutates `data`.
*/

use serde::Serialize;
use serde_json::Value;
use std::fmt;

use super::toon;

pub const ERROR_MARKER: &str = "ERROR:";

/// Output rendering format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Json,
    Toon,
}

impl OutputFormat {
    /// Case-insensitive parser for config values and argument bags.
    pub fn from_str_ci(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "toon" => Some(OutputFormat::Toon),
            _ => None,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputFormat::Json => "json",
            OutputFormat::Toon => "toon",
        })
    }
}

/// Render `data` as a string in the chosen format.
pub fn format_result(data: &Value, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(data).unwrap_or_else(|_| data.to_string())
        }
        OutputFormat::Toon => match data {
            Value::Null => String::new(),
            other => toon::encode(other),
        },
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResultEnvelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResultEnvelope {
    pub fn success(data: Value, format: OutputFormat) -> Self {
        let result = format_result(&data, format);
        Self {
            success: true,
            data: Some(data),
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(message: impl fmt::Display) -> Self {
        Self {
            success: false,
            data: None,
            result: None,
            error: Some(format!("{ERROR_MARKER} {message}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_rendering_round_trips() {
        let inputs = vec![
            json!({}),
            json!(null),
            json!({ "a": [1, 2, { "b": null }], "c": "x" }),
            json!([[], [1], "s"]),
        ];
        for input in inputs {
            let rendered = format_result(&input, OutputFormat::Json);
            let back: Value = serde_json::from_str(&rendered).unwrap();
            assert_eq!(back, input);
        }
    }

    #[test]
    fn json_uses_two_space_indent() {
        let rendered = format_result(&json!({ "a": 1 }), OutputFormat::Json);
        assert_eq!(rendered, "{\n  \"a\": 1\n}");
    }

    #[test]
    fn null_data_by_format() {
        assert_eq!(format_result(&Value::Null, OutputFormat::Json), "null");
        assert_eq!(format_result(&Value::Null, OutputFormat::Toon), "");
    }

    #[test]
    fn success_populates_data_and_result() {
        let env = ResultEnvelope::success(json!({ "key": "DOCS" }), OutputFormat::Toon);
        assert!(env.success);
        assert_eq!(env.data, Some(json!({ "key": "DOCS" })));
        assert_eq!(env.result.as_deref(), Some("key: DOCS"));
        assert!(env.error.is_none());
    }

    #[test]
    fn failure_prefixes_error_marker() {
        let env = ResultEnvelope::failure("something broke");
        assert!(!env.success);
        assert!(env.data.is_none());
        assert!(env.result.is_none());
        assert_eq!(env.error.as_deref(), Some("ERROR: something broke"));
    }

    #[test]
    fn format_parsing() {
        assert_eq!(OutputFormat::from_str_ci("JSON"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_str_ci(" toon "), Some(OutputFormat::Toon));
        assert_eq!(OutputFormat::from_str_ci("yaml"), None);
        assert_eq!(OutputFormat::Toon.to_string(), "toon");
    }
}
