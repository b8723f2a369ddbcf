//! Client-level error types shared across the limiter, codecs, and transports.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// The document could not be encoded (or a response could not be decoded).
	#[error(transparent)]
	Serialization(#[from] SerializationError),
	/// Transport failure (DNS, TCP, TLS, I/O).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// The wait for a submission slot was cancelled or the limiter was closed.
	#[error("Waiting for a submission slot was cancelled.")]
	Cancelled,
}
impl Error {
	/// Returns `true` when the error is [`Error::Cancelled`].
	pub fn is_cancelled(&self) -> bool {
		matches!(self, Self::Cancelled)
	}
}

/// Configuration and validation failures raised while building a client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Rate budget window must be longer than zero.
	#[error("Rate budget window must be greater than zero.")]
	ZeroWindow,
	/// Rate budget window has sub-millisecond precision.
	#[error("Rate budget window {window:?} must be a whole number of milliseconds.")]
	FractionalWindow {
		/// Rejected window.
		window: Duration,
	},
	/// Rate budget must admit at least one request per window.
	#[error("Rate budget must allow at least one request per window.")]
	ZeroMaxRequests,
	/// Registry endpoint could not be assembled from the configured host and version.
	#[error("Registry endpoint `{endpoint}` is invalid.")]
	InvalidEndpoint {
		/// Endpoint string that failed to parse.
		endpoint: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Configuration document is malformed.
	#[error("Client configuration is malformed.")]
	Parse {
		/// Structured parsing failure including the offending path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Codec failures surfaced by [`Serializer`](crate::codec::Serializer) implementations.
#[derive(Debug, ThisError)]
pub enum SerializationError {
	/// The value could not be encoded into a wire payload.
	#[error("Document could not be encoded.")]
	Encode {
		/// Codec-specific failure.
		#[source]
		source: BoxError,
	},
	/// The payload could not be decoded into the requested type.
	#[error("Payload could not be decoded.")]
	Decode {
		/// Codec-specific failure.
		#[source]
		source: BoxError,
	},
}
impl SerializationError {
	/// Wraps a codec-specific encode failure.
	pub fn encode(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Encode { source: Box::new(src) }
	}

	/// Wraps a codec-specific decode failure.
	pub fn decode(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Decode { source: Box::new(src) }
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the registry.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the registry.")]
	Io(#[from] std::io::Error),
	/// A request header could not be represented on the wire.
	#[error("Request header `{name}` is not a valid HTTP header.")]
	InvalidHeader {
		/// Offending header name.
		name: String,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
