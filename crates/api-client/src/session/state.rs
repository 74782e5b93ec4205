//! Extraction session state machine.
//!
//! Pure transitions with no I/O. The driver in [`super`] feeds it socket
//! events and publishes the resulting snapshots.

use super::protocol::{ExtractionStage, WorkerMessage};
use osm_extractor_geo::FeatureCollection;
use osm_extractor_telemetry::metrics;
use serde::Serialize;
use tracing::{debug, warn};

/// Status text shown once the request payload is sent.
pub const DOWNLOADING_MESSAGE: &str = "Downloading Overture data...";

/// Status text for any transport failure.
pub const CONNECTION_ERROR_MESSAGE: &str = "Connection error";

/// Stage, percentage and status text of the current session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractionProgress {
    /// Current stage
    pub stage: ExtractionStage,
    /// 0-100 as reported by the worker, not clamped
    pub progress: f64,
    /// Status text from the worker or the client
    pub message: Option<String>,
}

impl ExtractionProgress {
    fn at(stage: ExtractionStage, message: Option<&str>) -> Self {
        Self {
            stage,
            progress: 0.0,
            message: message.map(str::to_string),
        }
    }
}

/// Road preview request state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "roads", rename_all = "snake_case")]
pub enum PreviewState {
    /// Request in flight
    Loading,
    /// Finished; `None` after a failure or before any request
    Settled(Option<FeatureCollection>),
}

impl Default for PreviewState {
    fn default() -> Self {
        Self::Settled(None)
    }
}

impl PreviewState {
    /// Whether a preview request is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Settled preview roads, if any.
    #[must_use]
    pub fn roads(&self) -> Option<&FeatureCollection> {
        match self {
            Self::Settled(roads) => roads.as_ref(),
            Self::Loading => None,
        }
    }
}

/// Everything a presentation layer needs to render the session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionSnapshot {
    /// Stage and progress
    pub progress: ExtractionProgress,
    /// Set only when the session completed successfully
    pub download_reference: Option<String>,
    /// Road preview, independent of the stage
    pub preview: PreviewState,
}

/// What the driver should do with the connection after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// Keep reading
    Continue,
    /// Close the connection; nothing further is processed
    Close,
}

/// Session state machine.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    snapshot: SessionSnapshot,
}

impl SessionState {
    /// Current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> &SessionSnapshot {
        &self.snapshot
    }

    /// A new session supersedes whatever came before.
    pub fn begin(&mut self) {
        self.snapshot.progress = ExtractionProgress::at(ExtractionStage::Connecting, None);
        self.snapshot.download_reference = None;
        metrics().increment("session.started");
    }

    /// Socket open and polygon sent.
    pub fn on_open(&mut self) {
        self.snapshot.progress =
            ExtractionProgress::at(ExtractionStage::Downloading, Some(DOWNLOADING_MESSAGE));
    }

    /// Applies one text frame from the worker.
    ///
    /// Stage, progress and message are taken verbatim. Frames that fail to
    /// parse are dropped and leave the state untouched.
    pub fn on_message(&mut self, text: &str) -> Directive {
        let message = match WorkerMessage::parse(text) {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, frame_len = text.len(), "Dropping malformed worker message");
                metrics().increment("session.message_dropped");
                return Directive::Continue;
            }
        };

        let progress = message.progress_or_zero();
        debug!(stage = %message.stage, progress, "Worker progress");

        self.snapshot.progress = ExtractionProgress {
            stage: message.stage,
            progress,
            message: message.message,
        };

        let reference = message.download_reference.filter(|r| !r.is_empty());
        match (message.stage, reference) {
            (ExtractionStage::Complete, Some(reference)) => {
                self.snapshot.download_reference = Some(reference);
                metrics().increment("session.completed");
                Directive::Close
            }
            (ExtractionStage::Error, _) => Directive::Close,
            _ => Directive::Continue,
        }
    }

    /// Connection failed or errored.
    pub fn on_transport_error(&mut self) {
        if !self.snapshot.progress.stage.is_in_flight() {
            return;
        }
        self.snapshot.progress =
            ExtractionProgress::at(ExtractionStage::Error, Some(CONNECTION_ERROR_MESSAGE));
        metrics().increment("session.transport_error");
    }

    /// Connection closed by the worker. Before completion this is a failure.
    pub fn on_closed(&mut self) {
        if self.snapshot.progress.stage.is_in_flight() {
            debug!(stage = %self.snapshot.progress.stage, "Connection closed before completion");
            self.on_transport_error();
        }
    }

    /// Back to idle, dropping the download reference and preview roads.
    pub fn reset(&mut self) {
        if self.snapshot.progress.stage != ExtractionStage::Idle {
            metrics().increment("session.cancelled");
        }
        self.snapshot = SessionSnapshot::default();
    }

    /// Preview request sent.
    pub fn preview_started(&mut self) {
        self.snapshot.preview = PreviewState::Loading;
    }

    /// Preview request finished.
    pub fn preview_settled(&mut self, roads: Option<FeatureCollection>) {
        self.snapshot.preview = PreviewState::Settled(roads);
    }

    /// Drops preview roads without touching the session.
    pub fn clear_preview(&mut self) {
        self.snapshot.preview = PreviewState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn downloading() -> SessionState {
        let mut state = SessionState::default();
        state.begin();
        state.on_open();
        state
    }

    #[test]
    fn test_begin_then_open() {
        let mut state = SessionState::default();
        state.begin();
        assert_eq!(state.snapshot().progress.stage, ExtractionStage::Connecting);
        assert_eq!(state.snapshot().progress.progress, 0.0);

        state.on_open();
        let progress = &state.snapshot().progress;
        assert_eq!(progress.stage, ExtractionStage::Downloading);
        assert_eq!(progress.progress, 0.0);
        assert_eq!(progress.message.as_deref(), Some(DOWNLOADING_MESSAGE));
    }

    #[test]
    fn test_messages_applied_verbatim() {
        let mut state = downloading();
        let directive = state.on_message(r#"{"stage": "clipping", "progress": 55}"#);
        assert_eq!(directive, Directive::Continue);
        assert_eq!(state.snapshot().progress.stage, ExtractionStage::Clipping);
        assert_eq!(state.snapshot().progress.progress, 55.0);
        assert!(state.snapshot().progress.message.is_none());

        // Going backwards is the worker's call, not ours.
        state.on_message(r#"{"stage": "downloading", "progress": 10, "message": "retrying"}"#);
        assert_eq!(state.snapshot().progress.stage, ExtractionStage::Downloading);
        assert_eq!(state.snapshot().progress.progress, 10.0);
        assert_eq!(state.snapshot().progress.message.as_deref(), Some("retrying"));
    }

    #[test]
    fn test_malformed_message_leaves_state_unchanged() {
        let mut state = downloading();
        state.on_message(r#"{"stage": "clipping", "progress": 40}"#);
        let before = state.snapshot().clone();

        assert_eq!(state.on_message("{not json"), Directive::Continue);
        assert_eq!(state.on_message(r#"{"stage": "teleporting"}"#), Directive::Continue);
        assert_eq!(state.snapshot(), &before);
    }

    #[test]
    fn test_complete_with_reference_closes() {
        let mut state = downloading();
        let directive =
            state.on_message(r#"{"stage": "complete", "progress": 100, "download_url": "abc"}"#);
        assert_eq!(directive, Directive::Close);
        assert_eq!(state.snapshot().progress.stage, ExtractionStage::Complete);
        assert_eq!(state.snapshot().download_reference.as_deref(), Some("abc"));
    }

    #[test]
    fn test_idle_frame_is_dropped() {
        let mut state = downloading();
        let before = state.snapshot().clone();

        assert_eq!(state.on_message(r#"{"stage": "idle", "progress": 0}"#), Directive::Continue);
        assert_eq!(state.snapshot(), &before);

        // Still in flight, so a close is a failure.
        state.on_closed();
        assert_eq!(state.snapshot().progress.stage, ExtractionStage::Error);
    }

    #[test]
    fn test_empty_download_reference_is_absent() {
        let mut state = downloading();
        let directive =
            state.on_message(r#"{"stage": "complete", "progress": 100, "download_url": ""}"#);
        assert_eq!(directive, Directive::Continue);
        assert_eq!(state.snapshot().progress.stage, ExtractionStage::Complete);
        assert!(state.snapshot().download_reference.is_none());
    }

    #[test]
    fn test_complete_without_reference_keeps_reading() {
        let mut state = downloading();
        let directive = state.on_message(r#"{"stage": "complete", "progress": 100}"#);
        assert_eq!(directive, Directive::Continue);
        assert!(state.snapshot().download_reference.is_none());

        // Closing after completion is not a failure.
        state.on_closed();
        assert_eq!(state.snapshot().progress.stage, ExtractionStage::Complete);
    }

    #[test]
    fn test_worker_error_closes() {
        let mut state = downloading();
        let directive =
            state.on_message(r#"{"stage": "error", "progress": 0, "message": "Overpass timeout"}"#);
        assert_eq!(directive, Directive::Close);
        assert_eq!(state.snapshot().progress.message.as_deref(), Some("Overpass timeout"));
    }

    #[test]
    fn test_transport_error() {
        let mut state = downloading();
        state.on_message(r#"{"stage": "clipping", "progress": 80}"#);
        state.on_transport_error();

        let progress = &state.snapshot().progress;
        assert_eq!(progress.stage, ExtractionStage::Error);
        assert_eq!(progress.progress, 0.0);
        assert_eq!(progress.message.as_deref(), Some(CONNECTION_ERROR_MESSAGE));
    }

    #[test]
    fn test_abrupt_close_is_error() {
        let mut state = downloading();
        state.on_closed();
        assert_eq!(state.snapshot().progress.stage, ExtractionStage::Error);
    }

    #[test]
    fn test_transport_error_ignored_when_idle() {
        let mut state = SessionState::default();
        state.on_transport_error();
        assert_eq!(state.snapshot(), &SessionSnapshot::default());
    }

    #[test]
    fn test_begin_clears_previous_reference() {
        let mut state = downloading();
        state.on_message(r#"{"stage": "complete", "progress": 100, "download_url": "abc"}"#);
        state.begin();
        assert_eq!(state.snapshot().progress.stage, ExtractionStage::Connecting);
        assert!(state.snapshot().download_reference.is_none());
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut state = downloading();
        state.preview_settled(Some(FeatureCollection::empty()));
        state.on_message(r#"{"stage": "complete", "progress": 100, "download_url": "abc"}"#);

        state.reset();
        assert_eq!(state.snapshot(), &SessionSnapshot::default());
        assert_eq!(state.snapshot().progress.stage, ExtractionStage::Idle);
        assert!(state.snapshot().preview.roads().is_none());
    }

    #[test]
    fn test_preview_does_not_touch_stage() {
        let mut state = downloading();
        state.preview_started();
        assert!(state.snapshot().preview.is_loading());
        state.preview_settled(Some(FeatureCollection::empty()));
        assert!(state.snapshot().preview.roads().is_some());
        assert_eq!(state.snapshot().progress.stage, ExtractionStage::Downloading);

        state.clear_preview();
        assert_eq!(state.snapshot().preview, PreviewState::Settled(None));
    }
}
