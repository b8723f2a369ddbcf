//! Document submission client.
//!
//! [`DocumentClient::submit_document`] runs the whole submission pipeline: take a slot from
//! the shared [`RateLimiter`], encode the document with the configured [`Serializer`], attach
//! the caller's signature, and `POST` the payload through the [`HttpTransport`]. The client
//! keeps no per-call state, so one instance (or its clones) can serve any number of
//! concurrent callers while the limiter enforces the budget for all of them.

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	codec::{JsonSerializer, Serializer},
	config::{RateBudget, RegistryConfig},
	http::{Headers, HttpTransport, TransportResponse},
	limiter::RateLimiter,
	obs::{self, SubmissionOutcome, SubmissionSpan},
};
#[cfg(feature = "reqwest")] use crate::{config::ClientConfig, http::ReqwestTransport};

/// Header carrying the document signature.
pub const SIGNATURE_HEADER: &str = "Signature";
/// Header carrying the serializer's media type.
pub const CONTENT_TYPE_HEADER: &str = "Content-Type";

/// Outbound request assembled for a single submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmissionRequest {
	/// Target endpoint.
	pub endpoint: Url,
	/// Encoded document.
	pub payload: Vec<u8>,
	/// Request headers.
	pub headers: Headers,
}
impl SubmissionRequest {
	/// Builds a request carrying `signature` in the [`SIGNATURE_HEADER`] header and the
	/// payload's media type in the [`CONTENT_TYPE_HEADER`] header.
	pub fn signed(endpoint: Url, payload: Vec<u8>, content_type: &str, signature: &str) -> Self {
		let headers = Headers::from([
			(SIGNATURE_HEADER.to_owned(), signature.to_owned()),
			(CONTENT_TYPE_HEADER.to_owned(), content_type.to_owned()),
		]);

		Self { endpoint, payload, headers }
	}
}

/// Registry response handed back verbatim, whatever its status.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubmissionResult {
	/// HTTP status code.
	pub status_code: u16,
	/// Response body bytes.
	pub body: Vec<u8>,
	/// Response headers.
	pub headers: Headers,
}
impl SubmissionResult {
	/// Returns `true` for `2xx` statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status_code)
	}

	/// Returns the body as UTF-8 text, replacing invalid sequences.
	pub fn body_text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}
}
impl From<TransportResponse> for SubmissionResult {
	fn from(response: TransportResponse) -> Self {
		Self { status_code: response.status, body: response.body, headers: response.headers }
	}
}

/// Rate-limited client for the registry's document-creation endpoint.
///
/// Clones share the transport, serializer, and limiter.
pub struct DocumentClient<T, S = JsonSerializer>
where
	T: ?Sized + HttpTransport,
	S: Serializer,
{
	/// Transport used for every outbound request.
	pub transport: Arc<T>,
	/// Codec applied to documents and responses.
	pub serializer: Arc<S>,
	limiter: Arc<RateLimiter>,
	endpoint: Url,
}
impl<T, S> DocumentClient<T, S>
where
	T: ?Sized + HttpTransport,
	S: Serializer,
{
	/// Creates a client that reuses the caller-provided transport + serializer pair.
	pub fn with_transport(
		registry: &RegistryConfig,
		budget: RateBudget,
		transport: impl Into<Arc<T>>,
		serializer: impl Into<Arc<S>>,
	) -> Result<Self> {
		Ok(Self {
			transport: transport.into(),
			serializer: serializer.into(),
			limiter: Arc::new(RateLimiter::new(budget)),
			endpoint: registry.endpoint()?,
		})
	}

	/// Replaces the limiter so several clients draw from one budget.
	pub fn with_shared_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
		self.limiter = limiter;

		self
	}

	/// Returns the limiter gating this client.
	pub fn limiter(&self) -> &Arc<RateLimiter> {
		&self.limiter
	}

	/// Returns the fixed document-creation endpoint.
	pub fn endpoint(&self) -> &Url {
		&self.endpoint
	}

	/// Submits `document` signed with `signature`.
	///
	/// Waits for a rate-limit slot first, so the call may suspend for up to one window per
	/// caller queued ahead of it. The slot is spent once granted: a later encode or transport
	/// failure does not return it. Non-`2xx` responses are returned as ordinary results.
	pub async fn submit_document<D>(
		&self,
		document: &D,
		signature: &str,
	) -> Result<SubmissionResult>
	where
		D: ?Sized + Serialize + Sync,
	{
		self.submit_document_until(document, signature, std::future::pending::<()>()).await
	}

	/// Same as [`submit_document`](Self::submit_document), but gives up with
	/// [`Error::Cancelled`] if `cancel` resolves while still waiting for a slot.
	///
	/// Cancellation has no effect once the slot is granted.
	pub async fn submit_document_until<D, F>(
		&self,
		document: &D,
		signature: &str,
		cancel: F,
	) -> Result<SubmissionResult>
	where
		D: ?Sized + Serialize + Sync,
		F: Future<Output = ()>,
	{
		let span = SubmissionSpan::new("submit_document");

		obs::record_submission_outcome(SubmissionOutcome::Attempt);

		let result = span
			.instrument(async move {
				self.limiter.acquire_until(cancel).await?;

				let payload = self.serializer.encode(document)?;
				let SubmissionRequest { endpoint, payload, headers } = SubmissionRequest::signed(
					self.endpoint.clone(),
					payload,
					self.serializer.content_type(),
					signature,
				);
				let response = self.transport.post(&endpoint, payload, &headers).await?;

				Ok(SubmissionResult::from(response))
			})
			.await;

		match &result {
			Ok(_) => obs::record_submission_outcome(SubmissionOutcome::Success),
			Err(_) => obs::record_submission_outcome(SubmissionOutcome::Failure),
		}

		result
	}

	/// Decodes a response body with the client's serializer.
	pub fn decode_response<R>(&self, result: &SubmissionResult) -> Result<R>
	where
		R: DeserializeOwned,
	{
		Ok(self.serializer.decode(&result.body)?)
	}
}
#[cfg(feature = "reqwest")]
impl DocumentClient<ReqwestTransport, JsonSerializer> {
	/// Creates a client backed by the crate's reqwest transport and JSON codec.
	pub fn new(registry: &RegistryConfig, budget: RateBudget) -> Result<Self> {
		Self::with_transport(registry, budget, ReqwestTransport::new()?, JsonSerializer)
	}

	/// Creates a client from a loaded [`ClientConfig`].
	pub fn from_config(config: &ClientConfig) -> Result<Self> {
		Self::new(&config.registry, config.rate)
	}
}
impl<T, S> Clone for DocumentClient<T, S>
where
	T: ?Sized + HttpTransport,
	S: Serializer,
{
	fn clone(&self) -> Self {
		Self {
			transport: Arc::clone(&self.transport),
			serializer: Arc::clone(&self.serializer),
			limiter: Arc::clone(&self.limiter),
			endpoint: self.endpoint.clone(),
		}
	}
}
impl<T, S> Debug for DocumentClient<T, S>
where
	T: ?Sized + HttpTransport,
	S: Serializer,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("DocumentClient")
			.field("endpoint", &self.endpoint.as_str())
			.field("limiter", &self.limiter)
			.finish()
	}
}
