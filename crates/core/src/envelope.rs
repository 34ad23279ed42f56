//! Response envelopes used by the Hearth backend.
//!
//! Different controllers wrap their payload differently:
//!
//! ```text
//! [{"code": 200, "data": ...}]        product list
//! {"code": 200, "data": ...}          product detail, users, categories
//! {"success": true, "data": ...}      catalog, orders, account
//! {"status": "success", "data": ...}  cart, checkout
//! ```
//!
//! [`Envelope::parse`] accepts all of them and keeps the backend `message`
//! so failures can be shown to the user verbatim.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Why a backend document could not be unwrapped.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EnvelopeError {
    /// The backend answered with an explicit failure marker.
    #[error("{}", .message.as_deref().unwrap_or("request was rejected by the server"))]
    Rejected {
        /// Backend-provided explanation, if any.
        message: Option<String>,
    },

    /// The document is not one of the known envelope shapes.
    #[error("unexpected response format")]
    Shape,

    /// The envelope was fine but `data` did not match the expected type.
    #[error("invalid response data: {0}")]
    Data(String),
}

impl EnvelopeError {
    /// Backend message carried by a rejection.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Rejected { message } => message.as_deref(),
            Self::Shape | Self::Data(_) => None,
        }
    }
}

/// A successfully unwrapped backend response.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    /// The `data` field, `null` when absent.
    pub data: Value,
    /// Optional human-readable message.
    pub message: Option<String>,
    /// Remaining top-level fields (`payUrl`, `totalPrice`, ...).
    pub extra: Map<String, Value>,
}

impl Envelope {
    /// Unwrap any known envelope shape.
    ///
    /// # Errors
    ///
    /// [`EnvelopeError::Rejected`] when the backend flagged a failure, or
    /// [`EnvelopeError::Shape`] when the document is not an envelope.
    pub fn parse(value: Value) -> Result<Self, EnvelopeError> {
        match value {
            Value::Array(items) => match items.into_iter().next() {
                Some(first @ Value::Object(_)) => Self::parse(first),
                _ => Err(EnvelopeError::Shape),
            },
            Value::Object(map) => Self::from_object(map),
            _ => Err(EnvelopeError::Shape),
        }
    }

    fn from_object(mut map: Map<String, Value>) -> Result<Self, EnvelopeError> {
        let ok = if let Some(code) = map.get("code") {
            is_ok_code(code)
        } else if let Some(success) = map.get("success") {
            success.as_bool() == Some(true)
        } else if let Some(status) = map.get("status").and_then(Value::as_str) {
            match status {
                "success" => true,
                "error" | "fail" | "failed" => false,
                _ => return Err(EnvelopeError::Shape),
            }
        } else {
            return Err(EnvelopeError::Shape);
        };

        let message = map
            .remove("message")
            .and_then(|m| m.as_str().map(str::to_owned))
            .filter(|m| !m.is_empty());

        if !ok {
            return Err(EnvelopeError::Rejected { message });
        }

        let data = map.remove("data").unwrap_or(Value::Null);
        for marker in ["code", "success", "status"] {
            map.remove(marker);
        }

        Ok(Self {
            data,
            message,
            extra: map,
        })
    }

    /// Unwrap and deserialize `data` in one step.
    ///
    /// # Errors
    ///
    /// Any [`EnvelopeError`] from [`Envelope::parse`], or
    /// [`EnvelopeError::Data`] when `data` does not fit `T`.
    pub fn data_of<T: DeserializeOwned>(value: Value) -> Result<T, EnvelopeError> {
        Self::parse(value)?.into_data()
    }

    /// Deserialize the `data` field.
    ///
    /// # Errors
    ///
    /// [`EnvelopeError::Data`] when `data` does not fit `T`.
    pub fn into_data<T: DeserializeOwned>(self) -> Result<T, EnvelopeError> {
        serde_json::from_value(self.data).map_err(|e| EnvelopeError::Data(e.to_string()))
    }

    /// Check the reply to a mutation. Any 2xx document counts as done unless
    /// it carries an explicit failure marker; the backend message, if any,
    /// is passed along.
    ///
    /// # Errors
    ///
    /// [`EnvelopeError::Rejected`] only.
    pub fn acknowledge(value: Value) -> Result<Option<String>, EnvelopeError> {
        match Self::parse(value.clone()) {
            Ok(envelope) => Ok(envelope.message),
            Err(EnvelopeError::Shape) => Ok(error_message(&value)),
            Err(e) => Err(e),
        }
    }

    /// Deserialize a list that `data` holds either directly or under `key`
    /// (`{"products": [...]}`).
    ///
    /// # Errors
    ///
    /// [`EnvelopeError::Shape`] when neither form is present, or
    /// [`EnvelopeError::Data`] when the rows do not fit `T`.
    pub fn into_list<T: DeserializeOwned>(self, key: &str) -> Result<Vec<T>, EnvelopeError> {
        let rows = match self.data {
            rows @ Value::Array(_) => rows,
            Value::Object(mut map) => match map.remove(key) {
                Some(rows @ Value::Array(_)) => rows,
                _ => return Err(EnvelopeError::Shape),
            },
            _ => return Err(EnvelopeError::Shape),
        };
        serde_json::from_value(rows).map_err(|e| EnvelopeError::Data(e.to_string()))
    }

    /// A top-level string field outside `data`.
    #[must_use]
    pub fn extra_str(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(Value::as_str)
    }
}

fn is_ok_code(code: &Value) -> bool {
    match code {
        Value::Number(n) => n.as_u64() == Some(200),
        Value::String(s) => s.trim() == "200",
        _ => false,
    }
}

/// Deserialize every element of an array that fits, skipping the rest.
#[must_use]
pub fn list_of<T: DeserializeOwned>(value: Value) -> Vec<T> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    }
}

/// Best-effort `message` from an error body, whatever its shape.
#[must_use]
pub fn error_message(value: &Value) -> Option<String> {
    let object = match value {
        Value::Array(items) => items.first()?,
        other => other,
    };
    object
        .get("message")
        .or_else(|| object.get("error"))
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_array_code_envelope() {
        let data: Vec<String> =
            Envelope::data_of(json!([{"code": 200, "data": ["a", "b"]}])).unwrap_or_default();
        assert_eq!(data, vec!["a", "b"]);
    }

    #[test]
    fn test_object_code_envelope_accepts_string_code() {
        let env = Envelope::parse(json!({"code": "200", "data": {"x": 1}}));
        assert_eq!(env.map(|e| e.data), Ok(json!({"x": 1})));
    }

    #[test]
    fn test_success_envelope() {
        let env = Envelope::parse(json!({"success": true, "data": [1, 2], "payUrl": "https://pay"}));
        let env = env.unwrap_or_else(|e| panic!("unexpected {e}"));
        assert_eq!(env.data, json!([1, 2]));
        assert_eq!(env.extra_str("payUrl"), Some("https://pay"));
    }

    #[test]
    fn test_status_envelope_without_data() {
        let env = Envelope::parse(json!({"status": "success", "message": "Updated"}));
        let env = env.unwrap_or_else(|e| panic!("unexpected {e}"));
        assert_eq!(env.data, Value::Null);
        assert_eq!(env.message.as_deref(), Some("Updated"));
    }

    #[test]
    fn test_rejections_carry_message() {
        let err = Envelope::parse(json!({"status": "error", "message": "Cart is empty or not found"}));
        assert_eq!(err.as_ref().err().and_then(EnvelopeError::message), Some("Cart is empty or not found"));

        let err = Envelope::parse(json!({"code": 400, "message": "Title is required"}));
        assert_eq!(
            err.map_err(|e| e.to_string()),
            Err("Title is required".to_string())
        );

        let err = Envelope::parse(json!({"success": false}));
        assert_eq!(err, Err(EnvelopeError::Rejected { message: None }));
    }

    #[test]
    fn test_unknown_shapes() {
        assert_eq!(Envelope::parse(json!([])), Err(EnvelopeError::Shape));
        assert_eq!(Envelope::parse(json!("ok")), Err(EnvelopeError::Shape));
        assert_eq!(Envelope::parse(json!({"data": []})), Err(EnvelopeError::Shape));
        assert_eq!(Envelope::parse(json!({"status": "active"})), Err(EnvelopeError::Shape));
    }

    #[test]
    fn test_data_type_mismatch() {
        let res: Result<Vec<String>, _> = Envelope::data_of(json!({"code": 200, "data": {"a": 1}}));
        assert!(matches!(res, Err(EnvelopeError::Data(_))));
    }

    #[test]
    fn test_acknowledge_accepts_markerless_replies() {
        assert_eq!(Envelope::acknowledge(Value::Null), Ok(None));
        assert_eq!(
            Envelope::acknowledge(json!({"message": "Status updated"})),
            Ok(Some("Status updated".to_string()))
        );
        assert_eq!(
            Envelope::acknowledge(json!({"code": 200, "message": "Deleted"})),
            Ok(Some("Deleted".to_string()))
        );
        assert_eq!(
            Envelope::acknowledge(json!({"code": 403, "message": "Forbidden"})),
            Err(EnvelopeError::Rejected { message: Some("Forbidden".to_string()) })
        );
    }

    #[test]
    fn test_into_list_flat_or_nested() {
        let flat: Result<Vec<String>, _> = Envelope::parse(json!([{"code": 200, "data": ["a"]}]))
            .and_then(|e| e.into_list("products"));
        assert_eq!(flat, Ok(vec!["a".to_string()]));

        let nested: Result<Vec<String>, _> =
            Envelope::parse(json!({"success": true, "data": {"products": ["a", "b"]}}))
                .and_then(|e| e.into_list("products"));
        assert_eq!(nested.map(|rows| rows.len()), Ok(2));

        let missing: Result<Vec<String>, _> =
            Envelope::parse(json!({"success": true, "data": {"items": []}})).and_then(|e| e.into_list("products"));
        assert_eq!(missing, Err(EnvelopeError::Shape));

        let scalar: Result<Vec<String>, _> =
            Envelope::parse(json!({"code": 200, "data": "nope"})).and_then(|e| e.into_list("products"));
        assert_eq!(scalar, Err(EnvelopeError::Shape));
    }

    #[test]
    fn test_list_of_skips_bad_rows() {
        let rows: Vec<Map<String, Value>> = list_of(json!([{"_id": "o1"}, 42, {"_id": "o2"}]));
        assert_eq!(rows.len(), 2);
        let none: Vec<Map<String, Value>> = list_of(json!({"_id": "o1"}));
        assert!(none.is_empty());
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(error_message(&json!({"message": "Invalid token"})).as_deref(), Some("Invalid token"));
        assert_eq!(error_message(&json!([{"message": "nope"}])).as_deref(), Some("nope"));
        assert_eq!(error_message(&json!({"error": "boom"})).as_deref(), Some("boom"));
        assert_eq!(error_message(&json!({"message": ""})), None);
    }
}
