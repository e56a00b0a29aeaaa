use serde_json::Value;
use thiserror::Error;

use crate::envelope::ErrorResponse;
use crate::resource::Entity;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("response body is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),
    #[error("response envelope is missing key `{0}`")]
    MissingKey(&'static str),
    #[error("failed to deserialize envelope member to target type: {0}")]
    JsonDeserialize(#[source] serde_json::Error),
}

pub fn decode_collection<T: Entity>(bytes: &[u8]) -> Result<Vec<T>, CodecError> {
    let key = T::RESOURCE.collection_key();
    let member = take_member(parse(bytes)?, key)?;
    serde_json::from_value(member).map_err(CodecError::JsonDeserialize)
}

pub fn decode_record<T: Entity>(bytes: &[u8]) -> Result<T, CodecError> {
    let key = T::RESOURCE.name();
    let member = take_member(parse(bytes)?, key)?;
    serde_json::from_value(member).map_err(CodecError::JsonDeserialize)
}

/// Decodes a create response. Servers answer either with the record envelope
/// or with the bare created record.
pub fn decode_created<T: Entity>(bytes: &[u8]) -> Result<T, CodecError> {
    let key = T::RESOURCE.name();
    let value = parse(bytes)?;
    let wrapped = value
        .as_object()
        .filter(|obj| obj.len() == 1)
        .and_then(|obj| obj.get(key))
        .cloned();

    serde_json::from_value(wrapped.unwrap_or(value)).map_err(CodecError::JsonDeserialize)
}

pub fn decode_error(bytes: &[u8]) -> Result<ErrorResponse, CodecError> {
    serde_json::from_value(parse(bytes)?).map_err(CodecError::JsonDeserialize)
}

fn parse(bytes: &[u8]) -> Result<Value, CodecError> {
    serde_json::from_slice(bytes).map_err(CodecError::InvalidJson)
}

fn take_member(value: Value, key: &'static str) -> Result<Value, CodecError> {
    match value {
        Value::Object(mut obj) => obj.remove(key).ok_or(CodecError::MissingKey(key)),
        _ => Err(CodecError::MissingKey(key)),
    }
}
