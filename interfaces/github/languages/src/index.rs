use std::collections::BTreeMap;

use reqwest::{
	header::{HeaderMap, HeaderValue, InvalidHeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT},
	Client, StatusCode,
};
use serde::{de::DeserializeOwned, Deserialize};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_USER_AGENT: &str = "rust-client";
pub const GITHUB_API_VERSION: &str = "2022-11-28";

/// Language name to byte count, as returned by a repository's `languages_url`.
pub type Languages = BTreeMap<String, u64>;

/// One element of `GET /orgs/{org}/repos`. Every other field is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RepositoryDescriptor {
	pub name: String,
	pub languages_url: String,
}

#[derive(Debug, Error)]
pub enum BuildClientError {
	#[error("InvalidToken: {source}")]
	InvalidToken {
		source: InvalidHeaderValue,
	},

	#[error("ClientBuild: {source}")]
	ClientBuild {
		source: reqwest::Error,
	},
}

/// Builds the shared client. Every request it sends carries the GitHub REST
/// headers, plus a bearer token when one is given.
pub fn build_client(token: Option<&str>) -> Result<Client, BuildClientError> {
	let mut headers = HeaderMap::new();
	headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));
	headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
	headers.insert("X-GitHub-Api-Version", HeaderValue::from_static(GITHUB_API_VERSION));

	if let Some(token) = token {
		let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
			.map_err(|source| BuildClientError::InvalidToken { source })?;
		value.set_sensitive(true);
		headers.insert(AUTHORIZATION, value);
	}

	Client::builder()
		.default_headers(headers)
		.build()
		.map_err(|source| BuildClientError::ClientBuild { source })
}

#[derive(Debug, Error)]
pub enum FetchJsonError {
	#[error("RequestSend: {source}")]
	RequestSend {
		source: reqwest::Error,
	},

	#[error("UnexpectedStatus: {status} from {url}")]
	UnexpectedStatus {
		url: String,
		status: StatusCode,
	},

	#[error("ResponseRead: {source}")]
	ResponseRead {
		source: reqwest::Error,
	},

	#[error("DeserializeResponseBody: {source}")]
	DeserializeResponseBody {
		source: serde_json::Error,
	},
}

async fn fetch_json<T: DeserializeOwned>(client: &Client, url: &str) -> Result<T, FetchJsonError> {
	let response = client
		.get(url)
		.send()
		.await
		.map_err(|source| FetchJsonError::RequestSend { source })?;

	let status = response.status();
	debug!(%url, %status, "GitHub response received");

	if !status.is_success() {
		return Err(FetchJsonError::UnexpectedStatus {
			url: url.to_string(),
			status,
		});
	}

	let body = response
		.text()
		.await
		.map_err(|source| FetchJsonError::ResponseRead { source })?;

	serde_json::from_str(&body).map_err(|source| FetchJsonError::DeserializeResponseBody { source })
}

#[derive(Debug, Error)]
pub enum FetchOrgRepositoriesError {
	#[error("FetchOrgRepositories: {source}")]
	FetchOrgRepositories {
		#[from]
		source: FetchJsonError,
	},
}

/// Fetches the repository list at `url` (a `GET /orgs/{org}/repos` endpoint).
/// Only the first page is read.
pub async fn fetch_org_repositories(
	client: &Client,
	url: &str,
) -> Result<Vec<RepositoryDescriptor>, FetchOrgRepositoriesError> {
	Ok(fetch_json(client, url).await?)
}

#[derive(Debug, Error)]
pub enum FetchRepositoryLanguagesError {
	#[error("FetchRepositoryLanguages: {source}")]
	FetchRepositoryLanguages {
		#[from]
		source: FetchJsonError,
	},
}

pub async fn fetch_repository_languages(
	client: &Client,
	languages_url: &str,
) -> Result<Languages, FetchRepositoryLanguagesError> {
	Ok(fetch_json(client, languages_url).await?)
}

/// `{api_url}/orgs/{org}/repos`, tolerating a trailing slash on the base.
pub fn org_repositories_url(api_url: &str, org: &str) -> String {
	format!("{}/orgs/{org}/repos", api_url.trim_end_matches('/'))
}
