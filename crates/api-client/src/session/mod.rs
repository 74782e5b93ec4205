//! Streaming extraction session
//!
//! One [`ExtractionSession`] owns at most one worker connection at a time.
//! The connection runs on a spawned task that feeds socket events into
//! [`SessionState`]; every transition is published as a [`SessionSnapshot`]
//! on a watch channel.
//!
//! Each `start` bumps a generation counter. Events from a connection whose
//! generation is no longer current are discarded, and its task is aborted,
//! which drops the socket.

mod protocol;
mod state;
mod transport;

pub use protocol::{ExtractRequest, ExtractionStage, WorkerMessage};
pub use state::{
    Directive, ExtractionProgress, PreviewState, SessionSnapshot, SessionState,
    CONNECTION_ERROR_MESSAGE, DOWNLOADING_MESSAGE,
};
pub use transport::{Connection, Connector, PreviewSource, WsConnection, WsConnector};

use crate::error::ApiResult;
use osm_extractor_geo::{Feature, FeatureCollection};
use osm_extractor_telemetry::Timer;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

struct Inner {
    generation: u64,
    preview_generation: u64,
    state: SessionState,
}

struct Shared {
    inner: Mutex<Inner>,
    tx: watch::Sender<SessionSnapshot>,
}

impl Shared {
    fn new() -> Self {
        let (tx, _) = watch::channel(SessionSnapshot::default());
        Self {
            inner: Mutex::new(Inner {
                generation: 0,
                preview_generation: 0,
                state: SessionState::default(),
            }),
            tx,
        }
    }

    /// Runs `f` under the lock and publishes the resulting snapshot.
    fn update<R>(&self, f: impl FnOnce(&mut Inner) -> R) -> R {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let result = f(&mut inner);
        self.tx.send_replace(inner.state.snapshot().clone());
        result
    }

    /// Applies `f` only if `generation` is still the current session.
    fn apply<R>(&self, generation: u64, f: impl FnOnce(&mut SessionState) -> R) -> Option<R> {
        self.update(|inner| {
            if inner.generation == generation {
                Some(f(&mut inner.state))
            } else {
                debug!(generation, current = inner.generation, "Ignoring event from superseded session");
                None
            }
        })
    }

    fn snapshot(&self) -> SessionSnapshot {
        self.tx.borrow().clone()
    }
}

/// Client side of a streaming extraction.
///
/// `start` and `cancel` must be called from within a Tokio runtime.
pub struct ExtractionSession<C: Connector = WsConnector, P: PreviewSource = crate::endpoints::PreviewApi> {
    connector: Arc<C>,
    previewer: P,
    ws_url: String,
    shared: Arc<Shared>,
    task: Option<JoinHandle<()>>,
}

impl<C: Connector, P: PreviewSource> ExtractionSession<C, P> {
    /// Create an idle session that connects to `ws_url`.
    pub fn new(connector: C, previewer: P, ws_url: impl Into<String>) -> Self {
        Self {
            connector: Arc::new(connector),
            previewer,
            ws_url: ws_url.into(),
            shared: Arc::new(Shared::new()),
            task: None,
        }
    }

    /// Worker URL this session connects to
    #[must_use]
    pub fn ws_url(&self) -> &str {
        &self.ws_url
    }

    /// Start extracting `polygon`, superseding any session in progress.
    ///
    /// Returns as soon as the session is `connecting`; progress arrives on
    /// [`subscribe`](Self::subscribe). Only fails if the payload cannot be
    /// serialized, in which case nothing changes.
    #[instrument(skip(self, polygon), fields(url = %self.ws_url))]
    pub fn start(&mut self, polygon: &Feature) -> ApiResult<()> {
        let payload = serde_json::to_string(&ExtractRequest { polygon })?;

        if let Some(previous) = self.task.take() {
            debug!("Superseding previous session");
            previous.abort();
        }

        let generation = self.shared.update(|inner| {
            inner.generation += 1;
            inner.state.begin();
            inner.generation
        });
        info!(generation, "Extraction session started");

        self.task = Some(tokio::spawn(run_connection(
            Arc::clone(&self.shared),
            Arc::clone(&self.connector),
            self.ws_url.clone(),
            payload,
            generation,
        )));
        Ok(())
    }

    /// Drop the connection and return to idle, clearing the download
    /// reference and preview roads.
    ///
    /// The worker is not told; its own teardown is not awaited.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.shared.update(|inner| {
            inner.generation += 1;
            inner.preview_generation += 1;
            inner.state.reset();
        });
        debug!("Extraction session cancelled");
    }

    /// Fetch a road preview for `polygon`.
    ///
    /// Moves the preview to loading, then settles it with the roads or with
    /// nothing on failure. Does not touch the stage. A preview that settles
    /// after a newer preview or a cancel is not recorded.
    #[instrument(skip(self, polygon))]
    pub async fn preview(&self, polygon: &Feature) -> Option<FeatureCollection> {
        let generation = self.shared.update(|inner| {
            inner.preview_generation += 1;
            inner.state.preview_started();
            inner.preview_generation
        });

        let timer = Timer::start("session.preview_ms");
        let roads = match self.previewer.fetch_roads(polygon).await {
            Ok(roads) => {
                debug!(features = roads.len(), "Preview loaded");
                Some(roads)
            }
            Err(e) => {
                warn!(error = %e, "Preview request failed");
                None
            }
        };
        timer.stop();

        self.shared.update(|inner| {
            if inner.preview_generation == generation {
                inner.state.preview_settled(roads.clone());
            }
        });
        roads
    }

    /// Drop preview roads, leaving the session alone.
    pub fn clear_preview(&self) {
        self.shared.update(|inner| {
            inner.preview_generation += 1;
            inner.state.clear_preview();
        });
    }

    /// Current state
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.shared.snapshot()
    }

    /// Receiver that sees every published snapshot
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.shared.tx.subscribe()
    }

    /// Current stage
    #[must_use]
    pub fn stage(&self) -> ExtractionStage {
        self.shared.tx.borrow().progress.stage
    }

    /// Download reference of a completed session
    #[must_use]
    pub fn download_reference(&self) -> Option<String> {
        self.shared.tx.borrow().download_reference.clone()
    }

    /// Wait until the session is no longer in flight and return that state.
    pub async fn wait_until_settled(&self) -> SessionSnapshot {
        let mut rx = self.subscribe();
        let settled = rx
            .wait_for(|snapshot| !snapshot.progress.stage.is_in_flight())
            .await
            .map(|snapshot| snapshot.clone());
        settled.unwrap_or_else(|_| self.snapshot())
    }
}

impl<C: Connector, P: PreviewSource> Drop for ExtractionSession<C, P> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Drives one connection from connect to close.
async fn run_connection<C: Connector>(
    shared: Arc<Shared>,
    connector: Arc<C>,
    url: String,
    payload: String,
    generation: u64,
) {
    let mut connection = match connector.connect(&url).await {
        Ok(connection) => connection,
        Err(e) => {
            warn!(error = %e, url = %url, "Failed to connect to extraction worker");
            shared.apply(generation, SessionState::on_transport_error);
            return;
        }
    };

    if let Err(e) = connection.send_text(payload).await {
        warn!(error = %e, "Failed to send extraction request");
        shared.apply(generation, SessionState::on_transport_error);
        connection.close().await;
        return;
    }

    if shared.apply(generation, SessionState::on_open).is_none() {
        connection.close().await;
        return;
    }

    loop {
        match connection.next_text().await {
            Some(Ok(text)) => match shared.apply(generation, |state| state.on_message(&text)) {
                Some(Directive::Continue) => {}
                Some(Directive::Close) | None => {
                    connection.close().await;
                    return;
                }
            },
            Some(Err(e)) => {
                warn!(error = %e, "Extraction connection failed");
                shared.apply(generation, SessionState::on_transport_error);
                connection.close().await;
                return;
            }
            None => {
                shared.apply(generation, SessionState::on_closed);
                return;
            }
        }
    }
}
