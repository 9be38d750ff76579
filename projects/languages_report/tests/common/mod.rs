use std::{
	io,
	net::SocketAddr,
	sync::{
		atomic::{AtomicUsize, Ordering},
		Arc, Mutex, PoisonError,
	},
	time::Duration,
};

use axum::{
	extract::{Path, State},
	routing::get,
	Json, Router,
};
use projects_languages_report::report::{EmitError, ReportRecord, ReportSink};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::Barrier, task::JoinHandle};

/// Keeps records in memory, in emission order.
#[derive(Debug, Default)]
pub struct MemorySink {
	records: Mutex<Vec<ReportRecord>>,
}

impl MemorySink {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn records(&self) -> Vec<ReportRecord> {
		self.records
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.clone()
	}
}

impl ReportSink for MemorySink {
	fn emit(&self, record: ReportRecord) -> Result<(), EmitError> {
		self.records
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.push(record);
		Ok(())
	}
}

/// Fails every emit the way a closed stdout would.
pub struct BrokenPipeSink;

impl ReportSink for BrokenPipeSink {
	fn emit(&self, _record: ReportRecord) -> Result<(), EmitError> {
		Err(EmitError::WriteRecord {
			source: io::Error::new(io::ErrorKind::BrokenPipe, "stdout closed"),
		})
	}
}

/// How a languages request is held open before it answers.
pub enum Hold {
	/// Wait until the barrier's party count of languages requests are in
	/// flight together.
	Barrier(Barrier),
	/// Sleep for a fixed time.
	Delay(Duration),
}

struct StubState {
	base_url: String,
	repositories: usize,
	hold: Hold,
	in_flight: AtomicUsize,
	peak: AtomicUsize,
}

/// GitHub stand-in serving `/orgs/acme/repos` with `repo-{i}` entries and
/// `/langs/{i}` answering `{"Go": i}`, while tracking concurrent languages
/// requests.
pub struct GitHubStub {
	state: Arc<StubState>,
	server: JoinHandle<()>,
}

impl GitHubStub {
	pub async fn spawn(repositories: usize, hold: Hold) -> io::Result<Self> {
		let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
		let addr = listener.local_addr()?;

		let state = Arc::new(StubState {
			base_url: format!("http://{addr}"),
			repositories,
			hold,
			in_flight: AtomicUsize::new(0),
			peak: AtomicUsize::new(0),
		});

		let app = Router::new()
			.route("/orgs/acme/repos", get(list_repositories))
			.route("/langs/{id}", get(repository_languages))
			.with_state(Arc::clone(&state));

		let server = tokio::spawn(async move {
			let _ = axum::serve(listener, app).await;
		});

		Ok(Self { state, server })
	}

	pub fn base_url(&self) -> &str {
		&self.state.base_url
	}

	/// Highest number of languages requests seen in flight at once.
	pub fn peak_in_flight(&self) -> usize {
		self.state.peak.load(Ordering::SeqCst)
	}
}

impl Drop for GitHubStub {
	fn drop(&mut self) {
		self.server.abort();
	}
}

async fn list_repositories(State(state): State<Arc<StubState>>) -> Json<Value> {
	let repositories = (0..state.repositories)
		.map(|i| {
			json!({
				"name": format!("repo-{i}"),
				"languages_url": format!("{}/langs/{i}", state.base_url),
			})
		})
		.collect();

	Json(Value::Array(repositories))
}

async fn repository_languages(
	State(state): State<Arc<StubState>>,
	Path(id): Path<u64>,
) -> Json<Value> {
	let now = state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
	state.peak.fetch_max(now, Ordering::SeqCst);

	match &state.hold {
		Hold::Barrier(barrier) => {
			barrier.wait().await;
		}
		Hold::Delay(delay) => tokio::time::sleep(*delay).await,
	}

	state.in_flight.fetch_sub(1, Ordering::SeqCst);
	Json(json!({ "Go": id }))
}
