//! Decoding of stored and incoming container documents.

use super::{StoreError, StoreResult};
use crate::model::Container;
use log::warn;
use serde_json::{Map, Value};

/// Decodes a durable snapshot.
///
/// Durable data is not validated: a payload that is not an object decodes
/// as an empty container, and each collection that does not decode on its
/// own is dropped to empty while the rest are kept.
pub fn decode_stored<C: Container>(body: &str) -> C {
    let fields = match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(fields)) => fields,
        Ok(_) | Err(_) => {
            warn!(
                "event=store_load module=store status=fallback key={} reason=not_an_object",
                C::DOCUMENT_KEY
            );
            return C::default();
        }
    };

    let usable: Map<String, Value> = fields
        .into_iter()
        .filter(|(name, value)| {
            let alone = Value::Object(Map::from_iter([(name.clone(), value.clone())]));
            let decodes = serde_json::from_value::<C>(alone).is_ok();
            if !decodes {
                warn!(
                    "event=store_load module=store status=fallback key={} collection={name} reason=malformed",
                    C::DOCUMENT_KEY
                );
            }
            decodes
        })
        .collect();
    serde_json::from_value(Value::Object(usable)).unwrap_or_default()
}

/// Parses an imported or fetched document.
///
/// Unlike [`decode_stored`], anything but a well-formed object is rejected so
/// the caller can leave its store untouched.
pub fn parse_document<C: Container>(body: &str) -> StoreResult<C> {
    let value: Value =
        serde_json::from_str(body).map_err(|err| StoreError::InvalidDocument(err.to_string()))?;
    if !value.is_object() {
        return Err(StoreError::InvalidDocument(
            "expected a JSON object".to_string(),
        ));
    }
    serde_json::from_value(value).map_err(|err| StoreError::InvalidDocument(err.to_string()))
}
