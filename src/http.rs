//! Transport primitives for registry calls.
//!
//! The module exposes [`HttpTransport`] alongside [`TransportResponse`] so downstream crates
//! can plug in any HTTP stack. The client hands every non-error response back verbatim: it
//! never interprets status codes, retries, or follows redirects, so transports should not
//! either unless the caller explicitly wants that behavior.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// crates.io
#[cfg(feature = "reqwest")]
use reqwest::{
	RequestBuilder, Response,
	header::{HeaderMap, HeaderName, HeaderValue},
	redirect::Policy,
};
// self
use crate::{_prelude::*, error::TransportError};
#[cfg(feature = "reqwest")] use crate::error::ConfigError;

/// Header map exchanged with transports (name → value).
pub type Headers = BTreeMap<String, String>;

/// Boxed future returned by [`HttpTransport`] calls.
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<TransportResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP stacks capable of reaching the registry.
///
/// The trait is the client's only dependency on an HTTP library. Implementations must be
/// `Send + Sync + 'static` so one transport can be shared by every clone of a client, and
/// the futures they return must be `Send` so submissions can hop executors.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Performs a `POST` with the provided body and headers.
	fn post<'a>(&'a self, uri: &'a Url, body: Vec<u8>, headers: &'a Headers)
	-> TransportFuture<'a>;

	/// Performs a `GET` with the provided headers.
	fn get<'a>(&'a self, uri: &'a Url, headers: &'a Headers) -> TransportFuture<'a>;
}

/// Raw HTTP response returned by a transport.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransportResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response body bytes.
	pub body: Vec<u8>,
	/// Response headers; repeated headers are joined with `", "`.
	pub headers: Headers,
}
impl TransportResponse {
	/// Creates a response with the provided status and body and no headers.
	pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
		Self { status, body: body.into(), headers: Headers::new() }
	}

	/// Adds a header to the response.
	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.insert(name.into(), value.into());

		self
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Registry responses must reach the caller untouched, so [`ReqwestTransport::new`] builds a
/// client that does not follow redirects. Configure any custom [`ReqwestClient`] the same way
/// before handing it to [`ReqwestTransport::with_client`].
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Builds a transport whose client never follows redirects.
	pub fn new() -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder().redirect(Policy::none()).build()?;

		Ok(Self(client))
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	fn apply_headers(
		request: RequestBuilder,
		headers: &Headers,
	) -> Result<RequestBuilder, TransportError> {
		let mut map = HeaderMap::with_capacity(headers.len());

		for (name, value) in headers {
			let invalid = || TransportError::InvalidHeader { name: name.clone() };
			let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
			let header_value = HeaderValue::from_str(value).map_err(|_| invalid())?;

			map.insert(header_name, header_value);
		}

		Ok(request.headers(map))
	}

	async fn execute(request: RequestBuilder) -> Result<TransportResponse, TransportError> {
		let response = request.send().await?;

		convert_response(response).await
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestTransport {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	fn post<'a>(
		&'a self,
		uri: &'a Url,
		body: Vec<u8>,
		headers: &'a Headers,
	) -> TransportFuture<'a> {
		Box::pin(async move {
			let request = Self::apply_headers(self.0.post(uri.clone()).body(body), headers)?;

			Self::execute(request).await
		})
	}

	fn get<'a>(&'a self, uri: &'a Url, headers: &'a Headers) -> TransportFuture<'a> {
		Box::pin(async move {
			let request = Self::apply_headers(self.0.get(uri.clone()), headers)?;

			Self::execute(request).await
		})
	}
}

#[cfg(feature = "reqwest")]
async fn convert_response(response: Response) -> Result<TransportResponse, TransportError> {
	let status = response.status().as_u16();
	let headers = flatten_headers(response.headers());
	let body = response.bytes().await?.to_vec();

	Ok(TransportResponse { status, body, headers })
}

#[cfg(feature = "reqwest")]
fn flatten_headers(map: &HeaderMap) -> Headers {
	let mut headers = Headers::new();

	for (name, value) in map {
		let value = String::from_utf8_lossy(value.as_bytes()).into_owned();

		headers
			.entry(name.as_str().to_owned())
			.and_modify(|joined: &mut String| {
				joined.push_str(", ");
				joined.push_str(&value);
			})
			.or_insert_with(|| value.clone());
	}

	headers
}
