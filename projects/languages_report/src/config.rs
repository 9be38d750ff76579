use std::{
	net::SocketAddr,
	num::{NonZeroUsize, ParseIntError},
	str::ParseBoolError,
};

use interfaces_github_languages::index::org_repositories_url;
use thiserror::Error;

use crate::fanout::index::{DependentFailurePolicy, FanoutConfig, ParseDependentFailurePolicyError};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_ORG: &str = "creativecommons";

/// Everything the binary reads from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
	/// `PORT`, for the idle listener.
	pub port: u16,
	/// `SERVE`; the listener is only bound when true.
	pub serve: bool,
	/// `GITHUB_API_URL`
	pub api_url: String,
	/// `GITHUB_ORG`
	pub org: String,
	/// `GITHUB_TOKEN`
	pub token: Option<String>,
	/// `DEPENDENT_FAILURE`
	pub failure_policy: DependentFailurePolicy,
	/// `MAX_CONCURRENCY`
	pub max_concurrency: Option<NonZeroUsize>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("InvalidPort {value:?}: {source}")]
	InvalidPort {
		value: String,
		source: ParseIntError,
	},

	#[error("InvalidServe {value:?}: {source}")]
	InvalidServe {
		value: String,
		source: ParseBoolError,
	},

	#[error("InvalidDependentFailure: {source}")]
	InvalidDependentFailure {
		#[from]
		source: ParseDependentFailurePolicyError,
	},

	#[error("InvalidMaxConcurrency {value:?}: {source}")]
	InvalidMaxConcurrency {
		value: String,
		source: ParseIntError,
	},
}

impl Config {
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Builds the config from `lookup`. Unset and empty variables take their
	/// defaults.
	pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
		let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

		let port = match var("PORT") {
			Some(value) => value
				.trim()
				.parse::<u16>()
				.map_err(|source| ConfigError::InvalidPort { value, source })?,
			None => DEFAULT_PORT,
		};

		let serve = match var("SERVE") {
			Some(value) => value
				.trim()
				.to_ascii_lowercase()
				.parse::<bool>()
				.map_err(|source| ConfigError::InvalidServe { value, source })?,
			None => false,
		};

		let failure_policy = match var("DEPENDENT_FAILURE") {
			Some(value) => value.parse::<DependentFailurePolicy>()?,
			None => DependentFailurePolicy::default(),
		};

		let max_concurrency = match var("MAX_CONCURRENCY") {
			Some(value) => Some(
				value
					.trim()
					.parse::<NonZeroUsize>()
					.map_err(|source| ConfigError::InvalidMaxConcurrency { value, source })?,
			),
			None => None,
		};

		Ok(Self {
			port,
			serve,
			api_url: var("GITHUB_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
			org: var("GITHUB_ORG").unwrap_or_else(|| DEFAULT_ORG.to_string()),
			token: var("GITHUB_TOKEN"),
			failure_policy,
			max_concurrency,
		})
	}

	pub fn listen_addr(&self) -> SocketAddr {
		SocketAddr::from(([0, 0, 0, 0], self.port))
	}

	pub fn collection_url(&self) -> String {
		org_repositories_url(&self.api_url, &self.org)
	}

	pub fn fanout(&self) -> FanoutConfig {
		FanoutConfig::new(self.collection_url())
			.with_failure_policy(self.failure_policy)
			.with_max_concurrency(self.max_concurrency)
	}
}
