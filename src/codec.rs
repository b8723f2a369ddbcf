//! Serialization capability used to turn documents into wire payloads.
//!
//! The client only ever talks to a [`Serializer`]; [`JsonSerializer`] is the default and
//! matches what the registry accepts. Other encodings can be plugged in without touching the
//! submission path.

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{_prelude::*, error::SerializationError};

/// Encodes values into request payloads and decodes response payloads.
pub trait Serializer
where
	Self: 'static + Send + Sync,
{
	/// Media type advertised for encoded payloads.
	fn content_type(&self) -> &'static str;

	/// Encodes `value` into a payload.
	fn encode<V>(&self, value: &V) -> Result<Vec<u8>, SerializationError>
	where
		V: ?Sized + Serialize;

	/// Decodes `bytes` into a `T`.
	fn decode<T>(&self, bytes: &[u8]) -> Result<T, SerializationError>
	where
		T: DeserializeOwned;
}

/// JSON codec backed by `serde_json`.
///
/// Decode failures carry the JSON path of the offending field.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonSerializer;
impl Serializer for JsonSerializer {
	fn content_type(&self) -> &'static str {
		"application/json"
	}

	fn encode<V>(&self, value: &V) -> Result<Vec<u8>, SerializationError>
	where
		V: ?Sized + Serialize,
	{
		serde_json::to_vec(value).map_err(SerializationError::encode)
	}

	fn decode<T>(&self, bytes: &[u8]) -> Result<T, SerializationError>
	where
		T: DeserializeOwned,
	{
		let mut de = serde_json::Deserializer::from_slice(bytes);

		serde_path_to_error::deserialize(&mut de).map_err(SerializationError::decode)
	}
}
