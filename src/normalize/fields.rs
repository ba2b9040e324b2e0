//! Explicit decoding of loosely-typed venue JSON.
//!
//! BTSE sends numbers sometimes as JSON numbers and sometimes as strings,
//! and omits fields freely. [`Fields`] turns each attribute into
//! `Result<Option<T>>`: `Ok(None)` when the field is absent, null or an
//! empty string, `Err(MalformedResponse)` when it is present but cannot be
//! read as `T`.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::{Map, Value};

use crate::{BtseError, Result};

/// Typed accessor over one JSON object of a venue payload.
#[derive(Debug, Clone, Copy)]
pub struct Fields<'a> {
    operation: &'static str,
    object: &'a Map<String, Value>,
}

impl<'a> Fields<'a> {
    /// Wraps `value`, which must be a JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`BtseError::MalformedResponse`] if `value` is not an object.
    pub fn new(operation: &'static str, value: &'a Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| BtseError::malformed(operation, "<object>", value))?;
        Ok(Self { operation, object })
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// Raw value of `key`, treating null as absent.
    pub fn value(&self, key: &str) -> Option<&'a Value> {
        self.object.get(key).filter(|v| !v.is_null())
    }

    pub fn decimal(&self, key: &str) -> Result<Option<Decimal>> {
        match self.value(key) {
            Some(value) => parse_decimal(self.operation, key, value),
            None => Ok(None),
        }
    }

    /// A string field; numbers are accepted and rendered as text.
    pub fn string(&self, key: &str) -> Result<Option<String>> {
        match self.value(key) {
            Some(Value::String(s)) if s.is_empty() => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(other) => Err(BtseError::malformed(self.operation, key, other)),
            None => Ok(None),
        }
    }

    /// A non-negative integer field such as an epoch-millisecond timestamp.
    pub fn integer(&self, key: &str) -> Result<Option<u64>> {
        match self.value(key) {
            Some(value) => parse_integer(self.operation, key, value),
            None => Ok(None),
        }
    }

    pub fn boolean(&self, key: &str) -> Result<Option<bool>> {
        match self.value(key) {
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(BtseError::malformed(self.operation, key, other)),
            None => Ok(None),
        }
    }

    /// Like [`string`](Self::string) but fails when the field is absent.
    pub fn required_string(&self, key: &str) -> Result<String> {
        self.string(key)?
            .ok_or_else(|| BtseError::malformed(self.operation, key, "missing"))
    }

    /// Like [`decimal`](Self::decimal) but fails when the field is absent.
    pub fn required_decimal(&self, key: &str) -> Result<Decimal> {
        self.decimal(key)?
            .ok_or_else(|| BtseError::malformed(self.operation, key, "missing"))
    }
}

/// Reads a decimal from a JSON number or numeric string.
///
/// Scientific notation is accepted; an empty string is absent.
pub fn parse_decimal(
    operation: &'static str,
    field: &str,
    value: &Value,
) -> Result<Option<Decimal>> {
    let text = match value {
        Value::Null => return Ok(None),
        Value::String(s) if s.trim().is_empty() => return Ok(None),
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        other => return Err(BtseError::malformed(operation, field, other)),
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map(Some)
        .map_err(|_| BtseError::malformed(operation, field, value))
}

/// Reads a non-negative integer from a JSON number or numeric string.
pub fn parse_integer(operation: &'static str, field: &str, value: &Value) -> Result<Option<u64>> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_u64()
            .or_else(|| {
                n.as_f64()
                    .filter(|f| *f >= 0.0 && f.fract() == 0.0)
                    .map(|f| f as u64)
            })
            .map(Some)
            .ok_or_else(|| BtseError::malformed(operation, field, value)),
        Value::String(s) if s.is_empty() => Ok(None),
        Value::String(s) => s
            .parse::<u64>()
            .map(Some)
            .map_err(|_| BtseError::malformed(operation, field, value)),
        other => Err(BtseError::malformed(operation, field, other)),
    }
}

/// Returns the elements of a JSON array payload.
pub fn array<'a>(operation: &'static str, value: &'a Value) -> Result<&'a [Value]> {
    value
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| BtseError::malformed(operation, "<array>", value))
}

/// Returns the first element of a JSON array payload.
pub fn first<'a>(operation: &'static str, value: &'a Value) -> Result<&'a Value> {
    array(operation, value)?
        .first()
        .ok_or_else(|| BtseError::malformed(operation, "[0]", "empty array"))
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use serde_json::json;

    use super::*;

    #[test]
    fn decimal_accepts_strings_numbers_and_scientific() {
        let value = json!({ "a": "7568.0", "b": 1.026, "c": "1e-7", "d": 31 });
        let fields = Fields::new("test", &value).unwrap();
        assert_eq!(fields.decimal("a").unwrap(), Some(dec!(7568.0)));
        assert_eq!(fields.decimal("b").unwrap(), Some(dec!(1.026)));
        assert_eq!(fields.decimal("c").unwrap(), Some(dec!(0.0000001)));
        assert_eq!(fields.decimal("d").unwrap(), Some(dec!(31)));
    }

    #[test]
    fn absent_null_and_empty_are_none() {
        let value = json!({ "null": null, "empty": "" });
        let fields = Fields::new("test", &value).unwrap();
        assert_eq!(fields.decimal("missing").unwrap(), None);
        assert_eq!(fields.decimal("null").unwrap(), None);
        assert_eq!(fields.decimal("empty").unwrap(), None);
        assert_eq!(fields.string("empty").unwrap(), None);
        assert_eq!(fields.integer("missing").unwrap(), None);
    }

    #[test]
    fn malformed_decimal_names_operation_field_and_value() {
        let value = json!({ "price": "12,5" });
        let err = Fields::new("fetch_trades", &value)
            .unwrap()
            .decimal("price")
            .unwrap_err();
        assert!(matches!(err, BtseError::MalformedResponse { .. }));
        let message = err.to_string();
        assert!(message.contains("fetch_trades"));
        assert!(message.contains("\"price\""));
        assert!(message.contains("12,5"));
    }

    #[test]
    fn non_numeric_types_are_malformed() {
        let value = json!({ "size": [1], "flag": true });
        let fields = Fields::new("test", &value).unwrap();
        assert!(fields.decimal("size").is_err());
        assert!(fields.decimal("flag").is_err());
        assert_eq!(fields.boolean("flag").unwrap(), Some(true));
    }

    #[test]
    fn integer_accepts_numbers_and_strings() {
        let value = json!({ "a": 1587685195324u64, "b": "42", "c": 5.0, "d": -1, "e": 1.5 });
        let fields = Fields::new("test", &value).unwrap();
        assert_eq!(fields.integer("a").unwrap(), Some(1_587_685_195_324));
        assert_eq!(fields.integer("b").unwrap(), Some(42));
        assert_eq!(fields.integer("c").unwrap(), Some(5));
        assert!(fields.integer("d").is_err());
        assert!(fields.integer("e").is_err());
    }

    #[test]
    fn string_renders_numbers() {
        let value = json!({ "serialId": 131840942, "status": 4 });
        let fields = Fields::new("test", &value).unwrap();
        assert_eq!(fields.string("serialId").unwrap().as_deref(), Some("131840942"));
        assert_eq!(fields.string("status").unwrap().as_deref(), Some("4"));
    }

    #[test]
    fn non_object_and_empty_array_are_malformed() {
        assert!(Fields::new("test", &json!([1, 2])).is_err());
        assert!(first("test", &json!([])).is_err());
        assert!(array("test", &json!({})).is_err());
        assert_eq!(first("test", &json!([{ "a": 1 }])).unwrap(), &json!({ "a": 1 }));
    }
}
