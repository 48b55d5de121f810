//! JSON document helpers shared by the store backends and the composer.
//!
//! Documents are plain JSON objects. Two fields are reserved: `_id` (a UUID
//! string) and `createdAt` (RFC 3339, UTC, always microsecond precision so
//! that lexical and chronological order agree).

use std::cmp::Ordering;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::StoreError;

pub type Document = Map<String, Value>;

pub const ID_FIELD: &str = "_id";
pub const CREATED_AT_FIELD: &str = "createdAt";
pub const UPDATED_AT_FIELD: &str = "updatedAt";

/// Serialize a typed record into a document.
pub fn to_document<T: Serialize>(record: &T) -> Result<Document, StoreError> {
    match serde_json::to_value(record)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Shape(format!(
            "expected an object, got {}",
            type_name(&other)
        ))),
    }
}

/// Deserialize a document back into a typed record.
pub fn from_document<T: DeserializeOwned>(doc: Document) -> Result<T, StoreError> {
    Ok(serde_json::from_value(Value::Object(doc))?)
}

pub fn document_id(doc: &Document) -> Option<Uuid> {
    doc.get(ID_FIELD)
        .and_then(Value::as_str)
        .and_then(|raw| Uuid::parse_str(raw).ok())
}

pub fn id_value(id: Uuid) -> Value {
    Value::String(id.to_string())
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn now_value() -> Value {
    Value::String(format_timestamp(Utc::now()))
}

/// Total order over optional JSON values used for sorting.
///
/// Missing and `null` sort first, then booleans, numbers, strings, arrays and
/// objects. Values of the same type compare naturally; arrays and objects
/// compare by their serialized form so the order stays total.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.unwrap_or(&Value::Null);
    let b = b.unwrap_or(&Value::Null);

    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.total_cmp(&y)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(_), Value::Array(_)) | (Value::Object(_), Value::Object(_)) => {
            a.to_string().cmp(&b.to_string())
        }
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Serde adapter that pins timestamps to microsecond precision.
///
/// chrono's default serializer drops trailing zero fractions, which breaks
/// lexical ordering of the stored strings.
pub mod timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_timestamp(*at))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|at| at.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn timestamps_sort_lexically() {
        let whole = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 5).unwrap();
        let fractional = whole + chrono::Duration::milliseconds(120);

        let a = format_timestamp(whole);
        let b = format_timestamp(fractional);
        assert_eq!(a, "2024-03-01T12:00:05.000000Z");
        assert!(a < b);
    }

    #[test]
    fn null_and_missing_sort_first() {
        let number = json!(3);
        assert_eq!(compare_values(None, Some(&number)), Ordering::Less);
        assert_eq!(compare_values(Some(&Value::Null), None), Ordering::Equal);
        assert_eq!(
            compare_values(Some(&json!("b")), Some(&json!("a"))),
            Ordering::Greater
        );
        assert_eq!(compare_values(Some(&json!(10)), Some(&json!(9.5))), Ordering::Greater);
    }

    #[test]
    fn rejects_non_object_records() {
        let err = to_document(&vec![1, 2, 3]).unwrap_err();
        assert!(matches!(err, StoreError::Shape(_)));
    }
}
