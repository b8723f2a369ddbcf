//! Immutable client configuration: registry location and the outbound rate budget.

// std
use std::num::NonZeroU32;
// self
use crate::{_prelude::*, error::ConfigError};

/// Path of the document-creation operation relative to the versioned API root.
pub const CREATE_DOCUMENT_PATH: &str = "lk/documents/create";

/// Location of the registry API.
///
/// The endpoint is derived once when a client is constructed and never changes afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
	/// Registry host name, used as `https://{host}` unless `base_url` is set.
	pub host: String,
	/// API version segment, rendered as `/api/v{api_version}`.
	pub api_version: String,
	/// Replaces `https://{host}` (useful for staging or mock servers).
	pub base_url: Option<Url>,
}
impl RegistryConfig {
	/// Default registry host.
	pub const DEFAULT_HOST: &'static str = "ismp.crpt.ru";
	/// Default API version.
	pub const DEFAULT_API_VERSION: &'static str = "3";

	/// Creates a configuration for the provided host and API version.
	pub fn new(host: impl Into<String>, api_version: impl Into<String>) -> Self {
		Self { host: host.into(), api_version: api_version.into(), base_url: None }
	}

	/// Points the client at an explicit base URL instead of `https://{host}`.
	pub fn with_base_url(mut self, base_url: Url) -> Self {
		self.base_url = Some(base_url);

		self
	}

	/// Returns the versioned API root, e.g. `https://ismp.crpt.ru/api/v3`.
	pub fn api_root(&self) -> Result<Url, ConfigError> {
		let mut root = match &self.base_url {
			Some(base) => base.clone(),
			None => parse_endpoint(format!("https://{}", self.host))?,
		};

		if root.cannot_be_a_base() {
			return Err(ConfigError::InvalidEndpoint {
				endpoint: root.into(),
				source: url::ParseError::RelativeUrlWithCannotBeABaseBase,
			});
		}

		let path = format!("{}/api/v{}", root.path().trim_end_matches('/'), self.api_version);

		root.set_path(&path);

		Ok(root)
	}

	/// Returns the fixed document-creation endpoint.
	///
	/// Any query carried by `base_url` is kept on the endpoint.
	pub fn endpoint(&self) -> Result<Url, ConfigError> {
		let mut endpoint = self.api_root()?;

		if let Ok(mut segments) = endpoint.path_segments_mut() {
			segments.pop_if_empty().extend(CREATE_DOCUMENT_PATH.split('/'));
		}

		Ok(endpoint)
	}
}
impl Default for RegistryConfig {
	fn default() -> Self {
		Self::new(Self::DEFAULT_HOST, Self::DEFAULT_API_VERSION)
	}
}

/// Outbound call budget: at most `max_requests` admissions in any rolling `window`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRateBudget", into = "RawRateBudget")]
pub struct RateBudget {
	window: Duration,
	max_requests: NonZeroU32,
}
impl RateBudget {
	/// Creates a validated budget.
	///
	/// The window must be a positive whole number of milliseconds.
	pub fn new(window: Duration, max_requests: u32) -> Result<Self, ConfigError> {
		if window.is_zero() {
			return Err(ConfigError::ZeroWindow);
		}

		if window.subsec_nanos() % 1_000_000 != 0 {
			return Err(ConfigError::FractionalWindow { window });
		}

		let max_requests = NonZeroU32::new(max_requests).ok_or(ConfigError::ZeroMaxRequests)?;

		Ok(Self { window, max_requests })
	}

	/// Length of the rolling window.
	pub fn window(&self) -> Duration {
		self.window
	}

	/// Maximum admissions per window.
	pub fn max_requests(&self) -> u32 {
		self.max_requests.get()
	}

	pub(crate) fn capacity(&self) -> usize {
		usize::try_from(self.max_requests.get()).unwrap_or(usize::MAX)
	}
}

#[derive(Serialize, Deserialize)]
struct RawRateBudget {
	window_ms: u64,
	max_requests: u32,
}
impl TryFrom<RawRateBudget> for RateBudget {
	type Error = ConfigError;

	fn try_from(raw: RawRateBudget) -> Result<Self, Self::Error> {
		Self::new(Duration::from_millis(raw.window_ms), raw.max_requests)
	}
}
impl From<RateBudget> for RawRateBudget {
	fn from(budget: RateBudget) -> Self {
		Self {
			window_ms: u64::try_from(budget.window.as_millis()).unwrap_or(u64::MAX),
			max_requests: budget.max_requests.get(),
		}
	}
}

/// Complete client configuration as loaded from a JSON document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
	/// Registry location; defaults apply when omitted.
	#[serde(default)]
	pub registry: RegistryConfig,
	/// Outbound rate budget.
	pub rate: RateBudget,
}
impl ClientConfig {
	/// Parses a JSON configuration document, reporting the path of the first invalid field.
	pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
		let mut de = serde_json::Deserializer::from_str(raw);

		serde_path_to_error::deserialize(&mut de).map_err(|source| ConfigError::Parse { source })
	}
}

fn parse_endpoint(endpoint: String) -> Result<Url, ConfigError> {
	Url::parse(&endpoint).map_err(|source| ConfigError::InvalidEndpoint { endpoint, source })
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn default_endpoint_targets_registry() {
		let endpoint = RegistryConfig::default()
			.endpoint()
			.expect("Default registry endpoint should be valid.");

		assert_eq!(endpoint.as_str(), "https://ismp.crpt.ru/api/v3/lk/documents/create");
	}

	#[test]
	fn base_url_override_keeps_prefix_path() {
		let base = Url::parse("http://127.0.0.1:8080/gateway/")
			.expect("Base URL fixture should parse.");
		let endpoint = RegistryConfig::new("ignored.example", "4")
			.with_base_url(base)
			.endpoint()
			.expect("Overridden endpoint should be valid.");

		assert_eq!(endpoint.as_str(), "http://127.0.0.1:8080/gateway/api/v4/lk/documents/create");
	}

	#[test]
	fn base_url_query_stays_after_the_path() {
		let base = Url::parse("http://127.0.0.1:8080/gw?tenant=a")
			.expect("Base URL fixture should parse.");
		let endpoint = RegistryConfig::default()
			.with_base_url(base)
			.endpoint()
			.expect("Endpoint with a query should be valid.");

		assert_eq!(
			endpoint.as_str(),
			"http://127.0.0.1:8080/gw/api/v3/lk/documents/create?tenant=a"
		);
	}

	#[test]
	fn opaque_base_url_is_rejected() {
		let base = Url::parse("mailto:ops@registry.example").expect("Mailto fixture should parse.");
		let err = RegistryConfig::default()
			.with_base_url(base)
			.endpoint()
			.expect_err("A base URL without a path hierarchy must be rejected.");

		assert!(matches!(err, ConfigError::InvalidEndpoint { .. }));
	}

	#[test]
	fn invalid_host_is_rejected() {
		let err = RegistryConfig::new("bad host", "3")
			.endpoint()
			.expect_err("Hosts containing spaces must be rejected.");

		assert!(matches!(err, ConfigError::InvalidEndpoint { .. }));
	}

	#[test]
	fn budget_rejects_zero_values() {
		assert!(matches!(RateBudget::new(Duration::ZERO, 1), Err(ConfigError::ZeroWindow)));
		assert!(matches!(
			RateBudget::new(Duration::from_secs(1), 0),
			Err(ConfigError::ZeroMaxRequests)
		));

		assert!(matches!(
			RateBudget::new(Duration::from_micros(500), 1),
			Err(ConfigError::FractionalWindow { .. })
		));
		assert!(matches!(
			RateBudget::new(Duration::from_micros(1_500), 1),
			Err(ConfigError::FractionalWindow { .. })
		));

		let budget = RateBudget::new(Duration::from_secs(10), 2)
			.expect("Positive budget values should be accepted.");

		assert_eq!(budget.window(), Duration::from_secs(10));
		assert_eq!(budget.max_requests(), 2);
	}

	#[test]
	fn client_config_loads_with_registry_defaults() {
		let config = ClientConfig::from_json_str(r#"{"rate":{"window_ms":10000,"max_requests":2}}"#)
			.expect("Minimal configuration should parse.");

		assert_eq!(config.registry, RegistryConfig::default());
		assert_eq!(config.rate.window(), Duration::from_secs(10));
		assert_eq!(config.rate.max_requests(), 2);
	}

	#[test]
	fn budget_survives_a_serde_round_trip() {
		let budget = RateBudget::new(Duration::from_millis(1_500), 3)
			.expect("Whole-millisecond windows should be accepted.");
		let raw = serde_json::to_string(&budget).expect("Budget should serialize.");
		let back: RateBudget = serde_json::from_str(&raw).expect("Budget should deserialize.");

		assert_eq!(raw, r#"{"window_ms":1500,"max_requests":3}"#);
		assert_eq!(back, budget);
	}

	#[test]
	fn client_config_reports_invalid_budget() {
		let err = ClientConfig::from_json_str(
			r#"{"registry":{"host":"registry.example"},"rate":{"window_ms":0,"max_requests":2}}"#,
		)
		.expect_err("A zero window must be rejected while parsing.");

		match err {
			ConfigError::Parse { source } => assert_eq!(source.path().to_string(), "rate"),
			other => panic!("Expected a parse error, got {other:?}."),
		}
	}
}
