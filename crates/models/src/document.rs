//! Conversions between client JSON, stored BSON documents and the portable JSON
//! returned to clients.

use chrono::{SecondsFormat, Utc};
use mongodb::bson::{self, oid::ObjectId, Bson, Document};
use serde_json::{Map, Value};

use crate::errors::ModelError;

/// Store-assigned primary key field.
pub const ID: &str = "_id";
/// Name of the primary key in portable JSON.
pub const PUBLIC_ID: &str = "id";

/// A JSON object body as sent by clients.
pub type Body = Map<String, Value>;

/// Parse a 24-hex object id.
pub fn parse_id(raw: &str) -> Result<ObjectId, ModelError> {
    ObjectId::parse_str(raw).map_err(|_| ModelError::InvalidId(format!("`{raw}` is not a valid id")))
}

pub fn into_object(body: Value) -> Result<Body, ModelError> {
    match body {
        Value::Object(map) => Ok(map),
        _ => Err(ModelError::Validation("request body must be a JSON object".into())),
    }
}

/// Drop fields the server owns; clients may not set them.
pub fn strip_fields(body: &mut Body, fields: &[&str]) {
    for field in fields {
        body.remove(*field);
    }
}

/// The field must be a non-blank string.
pub fn require_text(body: &Body, field: &str) -> Result<String, ModelError> {
    match body.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        Some(Value::String(_)) | Some(Value::Null) | None => {
            Err(ModelError::Validation(format!("`{field}` is required")))
        }
        Some(_) => Err(ModelError::Validation(format!("`{field}` must be a string"))),
    }
}

/// Like [`require_text`], but only when the field is present.
pub fn check_text_if_present(body: &Body, field: &str) -> Result<(), ModelError> {
    if body.contains_key(field) {
        require_text(body, field)?;
    }
    Ok(())
}

/// Absent or null is fine; anything else must be a string.
pub fn optional_text(body: &Body, field: &str) -> Result<Option<String>, ModelError> {
    match body.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(ModelError::Validation(format!("`{field}` must be a string"))),
    }
}

/// Convert a validated body into a storable document.
///
/// No key, at any depth, may be empty, start with `$` or contain `.`: the store would
/// read them as operators or paths.
pub fn to_document(body: Body) -> Result<Document, ModelError> {
    check_keys(&body)?;
    bson::to_document(&body).map_err(|e| ModelError::Validation(e.to_string()))
}

fn check_keys(map: &Body) -> Result<(), ModelError> {
    for (key, value) in map {
        if key.is_empty() || key.starts_with('$') || key.contains('.') {
            return Err(ModelError::Validation(format!("field name `{key}` is not allowed")));
        }
        check_nested_keys(value)?;
    }
    Ok(())
}

fn check_nested_keys(value: &Value) -> Result<(), ModelError> {
    match value {
        Value::Object(map) => check_keys(map),
        Value::Array(items) => items.iter().try_for_each(check_nested_keys),
        _ => Ok(()),
    }
}

/// Convert a merge-patch body; an empty patch is rejected.
pub fn to_patch(body: Body) -> Result<Document, ModelError> {
    if body.is_empty() {
        return Err(ModelError::Validation("update body has no updatable fields".into()));
    }
    to_document(body)
}

pub fn text_field(doc: &Document, field: &str) -> Option<String> {
    doc.get_str(field).ok().map(str::to_string)
}

pub fn to_bson_datetime(at: chrono::DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_millis(at.timestamp_millis())
}

/// RFC 3339, UTC, millisecond precision.
pub fn format_timestamp(at: bson::DateTime) -> Result<String, ModelError> {
    let millis = at.timestamp_millis();
    chrono::DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
        .ok_or_else(|| ModelError::Serialization(format!("timestamp {millis} is out of range")))
}

/// Render a stored document as portable JSON: `_id` becomes `id`, object ids become
/// hex strings, dates become RFC 3339 strings.
pub fn to_portable_json(doc: Document) -> Result<Value, ModelError> {
    let mut out = Map::with_capacity(doc.len());
    for (key, value) in doc {
        let key = if key == ID { PUBLIC_ID.to_string() } else { key };
        out.insert(key, portable_value(value)?);
    }
    Ok(Value::Object(out))
}

fn portable_value(value: Bson) -> Result<Value, ModelError> {
    match value {
        Bson::ObjectId(oid) => Ok(Value::String(oid.to_hex())),
        Bson::DateTime(at) => format_timestamp(at).map(Value::String),
        Bson::Document(doc) => {
            let mut out = Map::with_capacity(doc.len());
            for (key, value) in doc {
                out.insert(key, portable_value(value)?);
            }
            Ok(Value::Object(out))
        }
        Bson::Array(items) => items
            .into_iter()
            .map(portable_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        other => Ok(other.into_relaxed_extjson()),
    }
}

pub fn to_portable_list(docs: Vec<Document>) -> Result<Vec<Value>, ModelError> {
    docs.into_iter().map(to_portable_json).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;
    use serde_json::json;

    fn body(v: Value) -> Body {
        into_object(v).unwrap()
    }

    #[test]
    fn parse_id_rejects_malformed() {
        assert!(parse_id("507f1f77bcf86cd799439011").is_ok());
        assert!(matches!(parse_id("not-an-id"), Err(ModelError::InvalidId(_))));
        assert!(matches!(parse_id(""), Err(ModelError::InvalidId(_))));
    }

    #[test]
    fn non_object_body_is_a_validation_error() {
        assert!(matches!(into_object(json!([1, 2])), Err(ModelError::Validation(_))));
        assert!(matches!(into_object(json!("x")), Err(ModelError::Validation(_))));
    }

    #[test]
    fn require_text_checks_presence_and_type() {
        let b = body(json!({"a": "x", "blank": "  ", "n": 3, "nil": null}));
        assert_eq!(require_text(&b, "a").unwrap(), "x");
        assert!(require_text(&b, "blank").is_err());
        assert!(require_text(&b, "n").is_err());
        assert!(require_text(&b, "nil").is_err());
        assert!(require_text(&b, "missing").is_err());
        assert!(check_text_if_present(&b, "missing").is_ok());
        assert_eq!(optional_text(&b, "nil").unwrap(), None);
        assert!(optional_text(&b, "n").is_err());
    }

    #[test]
    fn operator_like_keys_are_rejected() {
        assert!(to_document(body(json!({"$set": {"a": 1}}))).is_err());
        assert!(to_document(body(json!({"a.b": 1}))).is_err());
        assert!(to_patch(Body::new()).is_err());
    }

    #[test]
    fn nested_operator_like_keys_are_rejected() {
        let err = to_document(body(json!({"meta": {"$x": 1}}))).unwrap_err();
        assert_eq!(err, ModelError::Validation("field name `$x` is not allowed".into()));
        assert!(to_document(body(json!({"tags": [{"a.b": 1}]}))).is_err());
        assert!(to_patch(body(json!({"meta": {"deep": {"": 1}}}))).is_err());
    }

    #[test]
    fn free_form_fields_survive_conversion() {
        let d = to_document(body(json!({"alias": "John", "age": 41, "tags": ["a"], "meta": {"x": true}}))).unwrap();
        assert_eq!(d.get_str("alias").unwrap(), "John");
        assert_eq!(d.get_array("tags").unwrap().len(), 1);
        assert!(d.get_document("meta").unwrap().get_bool("x").unwrap());
    }

    #[test]
    fn portable_json_flattens_store_types() {
        let oid = ObjectId::parse_str("507f1f77bcf86cd799439011").unwrap();
        let when = bson::DateTime::from_millis(1_700_000_000_123);
        let stored = doc! {
            "_id": oid,
            "owner": oid,
            "timestamp": when,
            "nested": { "at": when, "n": 5_i64 },
            "list": [oid],
        };
        let v = to_portable_json(stored).unwrap();
        assert_eq!(v["id"], "507f1f77bcf86cd799439011");
        assert!(v.get("_id").is_none());
        assert_eq!(v["owner"], "507f1f77bcf86cd799439011");
        assert_eq!(v["timestamp"], "2023-11-14T22:13:20.123Z");
        assert_eq!(v["nested"]["at"], "2023-11-14T22:13:20.123Z");
        assert_eq!(v["nested"]["n"], 5);
        assert_eq!(v["list"][0], "507f1f77bcf86cd799439011");
    }

    #[test]
    fn out_of_range_dates_fail_to_serialize() {
        let stored = doc! { "at": bson::DateTime::from_millis(i64::MAX) };
        assert!(matches!(to_portable_json(stored), Err(ModelError::Serialization(_))));
    }
}
