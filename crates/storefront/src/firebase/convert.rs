//! Firestore typed-value conversion.
//!
//! Firestore's REST surface wraps every field in a type tag
//! (`{"stringValue": "x"}`, `{"integerValue": "3"}`, ...). This module maps
//! between that shape and plain `serde_json::Value` documents so the rest of
//! the crate works with ordinary JSON.

use serde_json::{Map, Value, json};

use wildthread_core::store::StoreError;

/// Convert a plain JSON document body into a Firestore `fields` map.
///
/// # Errors
///
/// Returns `StoreError::Decode` if the body is not a JSON object - Firestore
/// documents are always maps at the top level.
pub fn to_fields(value: &Value) -> Result<Map<String, Value>, StoreError> {
    let Value::Object(map) = value else {
        return Err(StoreError::Decode(format!(
            "document body must be a JSON object, got {value}"
        )));
    };

    Ok(map
        .iter()
        .map(|(key, field)| (key.clone(), to_value(field)))
        .collect())
}

/// Convert one plain JSON value into a Firestore typed value.
pub fn to_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => n.as_i64().map_or_else(
            // Firestore has no unsigned integer type; anything that does not
            // fit i64 travels as a double.
            || json!({ "doubleValue": n.as_f64() }),
            |i| json!({ "integerValue": i.to_string() }),
        ),
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => json!({
            "arrayValue": { "values": items.iter().map(to_value).collect::<Vec<_>>() }
        }),
        Value::Object(map) => {
            let fields: Map<String, Value> = map
                .iter()
                .map(|(key, field)| (key.clone(), to_value(field)))
                .collect();
            json!({ "mapValue": { "fields": fields } })
        }
    }
}

/// Convert a Firestore `fields` map back into a plain JSON object.
///
/// # Errors
///
/// Returns `StoreError::Decode` on malformed typed values.
pub fn from_fields(fields: &Map<String, Value>) -> Result<Value, StoreError> {
    let mut out = Map::with_capacity(fields.len());
    for (key, field) in fields {
        out.insert(key.clone(), from_value(field)?);
    }
    Ok(Value::Object(out))
}

/// Convert one Firestore typed value back into plain JSON.
///
/// Timestamps and references come back as their string forms.
///
/// # Errors
///
/// Returns `StoreError::Decode` if the type tag is missing or its payload is
/// malformed.
pub fn from_value(value: &Value) -> Result<Value, StoreError> {
    let Value::Object(map) = value else {
        return Err(StoreError::Decode(format!(
            "expected a typed value object, got {value}"
        )));
    };

    let Some((tag, payload)) = map.iter().next() else {
        return Err(StoreError::Decode("empty typed value".to_owned()));
    };

    match tag.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" => Ok(payload.clone()),
        "integerValue" => {
            let text = payload
                .as_str()
                .ok_or_else(|| StoreError::Decode("integerValue must be a string".to_owned()))?;
            let parsed: i64 = text
                .parse()
                .map_err(|_| StoreError::Decode(format!("bad integerValue: {text}")))?;
            Ok(Value::from(parsed))
        }
        "doubleValue" => Ok(payload.clone()),
        "stringValue" | "timestampValue" | "referenceValue" => Ok(payload.clone()),
        "arrayValue" => {
            let values = payload.get("values").and_then(Value::as_array);
            values.map_or_else(
                || Ok(Value::Array(Vec::new())),
                |items| {
                    items
                        .iter()
                        .map(from_value)
                        .collect::<Result<Vec<_>, _>>()
                        .map(Value::Array)
                },
            )
        }
        "mapValue" => {
            let fields = payload.get("fields").and_then(Value::as_object);
            fields.map_or_else(|| Ok(json!({})), from_fields)
        }
        other => Err(StoreError::Decode(format!("unknown value type: {other}"))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_document_roundtrip() {
        let body = json!({
            "name": "Juniper Hoodie",
            "price": "58.00",
            "sold": 42,
            "active": true,
            "sizes": ["S", "M"],
            "meta": { "season": "fall", "weight": 1.5 },
            "discontinuedAt": null,
        });

        let fields = to_fields(&body).unwrap();
        assert_eq!(fields["sold"], json!({ "integerValue": "42" }));
        assert_eq!(fields["price"], json!({ "stringValue": "58.00" }));

        let back = from_fields(&fields).unwrap();
        assert_eq!(back, body);
    }

    #[test]
    fn test_top_level_must_be_object() {
        assert!(to_fields(&json!("scalar")).is_err());
    }

    #[test]
    fn test_timestamp_value_becomes_string() {
        let value = json!({ "timestampValue": "2026-08-01T12:00:00Z" });
        assert_eq!(
            from_value(&value).unwrap(),
            Value::String("2026-08-01T12:00:00Z".to_owned())
        );
    }

    #[test]
    fn test_bad_integer_is_decode_error() {
        let value = json!({ "integerValue": "forty-two" });
        assert!(matches!(from_value(&value), Err(StoreError::Decode(_))));
    }

    #[test]
    fn test_empty_array_value() {
        let value = json!({ "arrayValue": {} });
        assert_eq!(from_value(&value).unwrap(), json!([]));
    }
}
