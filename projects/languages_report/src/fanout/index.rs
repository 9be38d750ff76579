use std::{
	fmt,
	num::NonZeroUsize,
	str::FromStr,
	sync::atomic::{AtomicUsize, Ordering},
};

use futures::{stream, TryStreamExt};
use interfaces_github_languages::index::{
	fetch_org_repositories, fetch_repository_languages, FetchOrgRepositoriesError,
	FetchRepositoryLanguagesError, RepositoryDescriptor,
};
use reqwest::Client;
use thiserror::Error;
use tracing::{info, warn};

use crate::report::{EmitError, ReportRecord, ReportSink};

/// What to do when one repository's languages cannot be fetched.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum DependentFailurePolicy {
	/// Stop the run and return the failure.
	#[default]
	Abort,
	/// Log the failure and keep going with the other repositories.
	///
	/// Only fetch failures are skipped. A sink that fails to emit still stops
	/// the run with [`RunFanoutError::EmitReport`].
	Skip,
}

#[derive(Debug, Error)]
#[error("unknown dependent failure policy {value:?}, expected \"abort\" or \"skip\"")]
pub struct ParseDependentFailurePolicyError {
	pub value: String,
}

impl FromStr for DependentFailurePolicy {
	type Err = ParseDependentFailurePolicyError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"abort" => Ok(Self::Abort),
			"skip" => Ok(Self::Skip),
			_ => Err(ParseDependentFailurePolicyError { value: s.to_string() }),
		}
	}
}

impl fmt::Display for DependentFailurePolicy {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Abort => f.write_str("abort"),
			Self::Skip => f.write_str("skip"),
		}
	}
}

#[derive(Debug, Clone)]
pub struct FanoutConfig {
	pub collection_url: String,
	pub failure_policy: DependentFailurePolicy,
	/// `None` drives every languages fetch at once.
	pub max_concurrency: Option<NonZeroUsize>,
}

impl FanoutConfig {
	pub fn new(collection_url: impl Into<String>) -> Self {
		Self {
			collection_url: collection_url.into(),
			failure_policy: DependentFailurePolicy::default(),
			max_concurrency: None,
		}
	}

	pub fn with_failure_policy(mut self, failure_policy: DependentFailurePolicy) -> Self {
		self.failure_policy = failure_policy;
		self
	}

	pub fn with_max_concurrency(mut self, max_concurrency: Option<NonZeroUsize>) -> Self {
		self.max_concurrency = max_concurrency;
		self
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanoutOutcome {
	pub repositories: usize,
	pub emitted: usize,
	pub skipped: usize,
}

#[derive(Debug, Error)]
pub enum RunFanoutError {
	#[error("FetchOrgRepositories: {source}")]
	FetchOrgRepositories {
		#[from]
		source: FetchOrgRepositoriesError,
	},

	#[error("FetchRepositoryLanguages for {name}: {source}")]
	FetchRepositoryLanguages {
		name: String,
		#[source]
		source: FetchRepositoryLanguagesError,
	},

	#[error("EmitReport for {name}: {source}")]
	EmitReport {
		name: String,
		#[source]
		source: EmitError,
	},
}

/// Lists the repositories at `config.collection_url`, then fetches every
/// repository's languages concurrently. Each completed fetch is handed to
/// `sink` as its own record, in completion order.
///
/// A failed listing issues no languages fetches. A failed languages fetch
/// follows `config.failure_policy`.
pub async fn run_fanout(
	client: &Client,
	config: &FanoutConfig,
	sink: &dyn ReportSink,
) -> Result<FanoutOutcome, RunFanoutError> {
	let repositories = fetch_org_repositories(client, &config.collection_url).await?;
	let total = repositories.len();

	info!(
		url = %config.collection_url,
		count = total,
		policy = %config.failure_policy,
		max_concurrency = ?config.max_concurrency,
		"Fetched organization repositories"
	);

	let emitted_count = AtomicUsize::new(0);
	let skipped_count = AtomicUsize::new(0);
	let (emitted, skipped) = (&emitted_count, &skipped_count);
	let policy = config.failure_policy;

	stream::iter(repositories.into_iter().map(Ok::<_, RunFanoutError>))
		.try_for_each_concurrent(config.max_concurrency.map(NonZeroUsize::get), move |repository| async move {
			let report = report_repository(client, repository, sink).await;
			match (report, policy) {
				(Ok(()), _) => {
					emitted.fetch_add(1, Ordering::Relaxed);
					Ok(())
				}
				(
					Err(RunFanoutError::FetchRepositoryLanguages { name, source }),
					DependentFailurePolicy::Skip,
				) => {
					warn!(%name, error = %source, "Skipping repository");
					skipped.fetch_add(1, Ordering::Relaxed);
					Ok(())
				}
				(Err(err), _) => Err(err),
			}
		})
		.await?;

	Ok(FanoutOutcome {
		repositories: total,
		emitted: emitted_count.into_inner(),
		skipped: skipped_count.into_inner(),
	})
}

async fn report_repository(
	client: &Client,
	repository: RepositoryDescriptor,
	sink: &dyn ReportSink,
) -> Result<(), RunFanoutError> {
	let RepositoryDescriptor { name, languages_url } = repository;

	let languages = match fetch_repository_languages(client, &languages_url).await {
		Ok(languages) => languages,
		Err(source) => return Err(RunFanoutError::FetchRepositoryLanguages { name, source }),
	};

	sink.emit(ReportRecord { name: name.clone(), languages })
		.map_err(|source| RunFanoutError::EmitReport { name, source })
}
