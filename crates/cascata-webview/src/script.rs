//! Script values - the typed-value model for native/page application
//! messages.
//!
//! Values cross the page boundary as a bracketed JSON literal array
//! (`[v0,v1,...]`). Parsing is deliberately lossy: any element whose type
//! cannot be represented (object, array) decodes to `Null` instead of
//! failing the whole vector, so a page sending a richer payload degrades
//! gracefully rather than severing the bridge.

use serde::ser::{Serialize, Serializer};
use smallvec::SmallVec;

/// One typed value in a bridge message.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

/// Ordered sequence of script values. The first element is conventionally a
/// routing tag, followed by a method name and positional arguments.
pub type ScriptValueVector = SmallVec<[ScriptValue; 4]>;

impl ScriptValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ScriptValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ScriptValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            ScriptValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScriptValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for ScriptValue {
    fn from(value: bool) -> Self {
        ScriptValue::Bool(value)
    }
}

impl From<f64> for ScriptValue {
    fn from(value: f64) -> Self {
        ScriptValue::Number(value)
    }
}

impl From<f32> for ScriptValue {
    fn from(value: f32) -> Self {
        ScriptValue::Number(f64::from(value))
    }
}

impl From<u32> for ScriptValue {
    fn from(value: u32) -> Self {
        ScriptValue::Number(f64::from(value))
    }
}

impl From<i32> for ScriptValue {
    fn from(value: i32) -> Self {
        ScriptValue::Number(f64::from(value))
    }
}

impl From<&str> for ScriptValue {
    fn from(value: &str) -> Self {
        ScriptValue::String(value.to_owned())
    }
}

impl From<String> for ScriptValue {
    fn from(value: String) -> Self {
        ScriptValue::String(value)
    }
}

impl Serialize for ScriptValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            ScriptValue::Null => serializer.serialize_unit(),
            ScriptValue::Bool(b) => serializer.serialize_bool(*b),
            // JSON has no representation for non-finite numbers; they
            // degrade to null like any other unrepresentable value.
            ScriptValue::Number(n) if !n.is_finite() => serializer.serialize_unit(),
            ScriptValue::Number(n) => serializer.serialize_f64(*n),
            ScriptValue::String(s) => serializer.serialize_str(s),
        }
    }
}

/// Serialize values as a bracketed, comma-joined literal array.
pub fn serialize_script_values(values: &[ScriptValue]) -> String {
    serde_json::to_string(values).expect("script values always serialize to JSON")
}

/// Inverse of [`serialize_script_values`]. Input that is not a literal
/// array decodes to an empty vector; elements of undeterminable type decode
/// to `Null`.
pub fn deserialize_script_values(payload: &str) -> ScriptValueVector {
    let parsed: serde_json::Value = match serde_json::from_str(payload) {
        Ok(value) => value,
        Err(_) => return ScriptValueVector::new(),
    };
    let serde_json::Value::Array(elements) = parsed else {
        return ScriptValueVector::new();
    };
    elements.into_iter().map(from_json_value).collect()
}

fn from_json_value(value: serde_json::Value) -> ScriptValue {
    match value {
        serde_json::Value::Null => ScriptValue::Null,
        serde_json::Value::Bool(b) => ScriptValue::Bool(b),
        serde_json::Value::Number(n) => match n.as_f64() {
            Some(n) => ScriptValue::Number(n),
            None => ScriptValue::Null,
        },
        serde_json::Value::String(s) => ScriptValue::String(s),
        // Objects and arrays have no ScriptValue shape.
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => ScriptValue::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    #[test]
    fn test_serialize_literal_array() {
        let values: ScriptValueVector = smallvec![
            ScriptValue::Null,
            ScriptValue::Bool(true),
            ScriptValue::Bool(false),
            ScriptValue::Number(0.75),
            ScriptValue::from("hello"),
        ];
        assert_eq!(
            serialize_script_values(&values),
            r#"[null,true,false,0.75,"hello"]"#
        );
    }

    #[test]
    fn test_serialize_escapes_strings() {
        let values: ScriptValueVector = smallvec![ScriptValue::from("a\"b\\c\nd")];
        assert_eq!(serialize_script_values(&values), r#"["a\"b\\c\nd"]"#);
    }

    #[test]
    fn test_round_trip_law() {
        let values: ScriptValueVector = smallvec![
            ScriptValue::Null,
            ScriptValue::Bool(true),
            ScriptValue::Number(1.0),
            ScriptValue::Number(-12.5),
            ScriptValue::from("quoted \"text\""),
        ];
        let round_tripped = deserialize_script_values(&serialize_script_values(&values));
        assert_eq!(round_tripped, values);
    }

    #[test]
    fn test_unrecognized_shapes_decode_to_null() {
        let values = deserialize_script_values(r#"[{"a":1},[1,2],"ok",3]"#);
        assert_eq!(
            values.as_slice(),
            &[
                ScriptValue::Null,
                ScriptValue::Null,
                ScriptValue::from("ok"),
                ScriptValue::Number(3.0),
            ]
        );
    }

    #[test]
    fn test_non_array_input_decodes_empty() {
        assert!(deserialize_script_values("42").is_empty());
        assert!(deserialize_script_values("not json at all").is_empty());
        assert!(deserialize_script_values("{\"a\":1}").is_empty());
    }

    #[test]
    fn test_non_finite_numbers_serialize_as_null() {
        let values: ScriptValueVector = smallvec![ScriptValue::Number(f64::NAN)];
        assert_eq!(serialize_script_values(&values), "[null]");
    }

    #[test]
    fn test_accessors() {
        assert_eq!(ScriptValue::from(2u32).as_number(), Some(2.0));
        assert_eq!(ScriptValue::from("x").as_str(), Some("x"));
        assert_eq!(ScriptValue::Bool(true).as_bool(), Some(true));
        assert_eq!(ScriptValue::from("x").as_number(), None);
        assert!(ScriptValue::Null.is_null());
    }
}
