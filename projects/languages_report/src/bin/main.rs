use interfaces_github_languages::index::{build_client, BuildClientError};
use projects_languages_report::{
	config::{Config, ConfigError},
	fanout::index::{run_fanout, RunFanoutError},
	report::StdoutSink,
	server::index::{bind, serve_idle, ServeError},
};
use thiserror::Error;
use tracing::{debug, info};
use utils_trace::tracing_init;

#[derive(Debug, Error)]
pub enum MainError {
	#[error("TracingInit: {source}")]
	TracingInit {
		#[source]
		source: utils_trace::TracingInitError,
	},
	#[error("Config: {source}")]
	Config {
		#[source]
		source: ConfigError,
	},
	#[error("BuildClient: {source}")]
	BuildClient {
		#[source]
		source: BuildClientError,
	},
	#[error("RunFanout: {source}")]
	RunFanout {
		#[source]
		source: RunFanoutError,
	},
	#[error("Server: {source}")]
	Server {
		#[source]
		source: ServeError,
	},
}

#[tokio::main]
async fn main() -> Result<(), MainError> {
	let dotenv = dotenvy::dotenv();

	tracing_init("info")
		.map_err(|source| MainError::TracingInit { source })?;

	if let Err(error) = dotenv {
		debug!(%error, "No .env loaded");
	}

	let config = Config::from_env()
		.map_err(|source| MainError::Config { source })?;

	// Bound before the fan-out so the port is held while fetches run.
	let listener = if config.serve {
		Some(
			bind(config.listen_addr())
				.await
				.map_err(|source| MainError::Server { source })?,
		)
	} else {
		None
	};

	let client = build_client(config.token.as_deref())
		.map_err(|source| MainError::BuildClient { source })?;

	let outcome = run_fanout(&client, &config.fanout(), &StdoutSink)
		.await
		.map_err(|source| MainError::RunFanout { source })?;

	info!(
		org = %config.org,
		repositories = outcome.repositories,
		emitted = outcome.emitted,
		skipped = outcome.skipped,
		"Fan-out complete"
	);

	if let Some(listener) = listener {
		serve_idle(listener)
			.await
			.map_err(|source| MainError::Server { source })?;
	}

	Ok(())
}
