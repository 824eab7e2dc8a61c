/*!
 * Dynamically typed parameter values for loot actions and test operands.
 */

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A loot parameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Number(f64),
    Text(String),
    Map(BTreeMap<String, ParamValue>),
}

impl ParamValue {
    /// Infer a typed value from raw JPE text.
    ///
    /// `true`/`false` (any case) become booleans, anything `f64` accepts
    /// becomes a number, everything else stays text.
    pub fn infer(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("true") {
            return ParamValue::Bool(true);
        }
        if trimmed.eq_ignore_ascii_case("false") {
            return ParamValue::Bool(false);
        }
        match trimmed.parse::<f64>() {
            Ok(number) if number.is_finite() => ParamValue::Number(number),
            _ => ParamValue::Text(trimmed.to_string()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Number(number) => Some(*number),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(flag) => Some(*flag),
            _ => None,
        }
    }

    /// Name of the variant, used as the XML `t` attribute
    pub fn type_name(&self) -> &'static str {
        match self {
            ParamValue::Bool(_) => "bool",
            ParamValue::Number(_) => "number",
            ParamValue::Text(_) => "text",
            ParamValue::Map(_) => "map",
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Tuning XML spells booleans in Python case
            ParamValue::Bool(true) => write!(f, "True"),
            ParamValue::Bool(false) => write!(f, "False"),
            ParamValue::Number(number) => write!(f, "{}", format_number(*number)),
            ParamValue::Text(text) => write!(f, "{}", text),
            ParamValue::Map(map) => {
                let parts: Vec<String> = map.iter().map(|(k, v)| format!("{}:{}", k, v)).collect();
                write!(f, "{}", parts.join(", "))
            }
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Number(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

/// Format a number without a trailing `.0` for integral values
pub fn format_number(number: f64) -> String {
    if number.fract() == 0.0 && number.abs() < 1e15 {
        format!("{}", number as i64)
    } else {
        format!("{}", number)
    }
}
