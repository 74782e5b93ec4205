//! Transport seams of the session.
//!
//! The session only needs to open a text-frame connection, send one frame,
//! read frames in order and close. [`WsConnector`] does that over a
//! WebSocket; tests plug in an in-memory connector. Road previews go through
//! [`PreviewSource`] the same way.

use crate::error::ApiResult;
use futures_util::{SinkExt, StreamExt};
use osm_extractor_geo::{Feature, FeatureCollection};
use std::future::Future;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

/// Opens connections to the worker.
pub trait Connector: Send + Sync + 'static {
    /// Connection type produced by this connector
    type Connection: Connection;

    /// Opens a connection to `url`.
    fn connect(&self, url: &str) -> impl Future<Output = ApiResult<Self::Connection>> + Send;
}

/// An open, ordered, bidirectional text-frame connection.
pub trait Connection: Send + 'static {
    /// Sends one text frame.
    fn send_text(&mut self, text: String) -> impl Future<Output = ApiResult<()>> + Send;

    /// Next text frame; `None` once the peer has closed.
    fn next_text(&mut self) -> impl Future<Output = Option<ApiResult<String>>> + Send;

    /// Closes the connection without waiting for the peer.
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}

/// One-shot road preview for a polygon.
pub trait PreviewSource: Send + Sync + 'static {
    /// Fetches the roads inside `polygon`.
    fn fetch_roads(
        &self,
        polygon: &Feature,
    ) -> impl Future<Output = ApiResult<FeatureCollection>> + Send;
}

/// WebSocket connector backed by `tokio-tungstenite`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

impl Connector for WsConnector {
    type Connection = WsConnection;

    async fn connect(&self, url: &str) -> ApiResult<WsConnection> {
        let (stream, response) = tokio_tungstenite::connect_async(url).await?;
        debug!(url = %url, status = %response.status(), "WebSocket connected");
        Ok(WsConnection { stream })
    }
}

/// An open WebSocket to the worker.
pub struct WsConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl Connection for WsConnection {
    async fn send_text(&mut self, text: String) -> ApiResult<()> {
        self.stream.send(Message::Text(text)).await?;
        Ok(())
    }

    async fn next_text(&mut self) -> Option<ApiResult<String>> {
        while let Some(frame) = self.stream.next().await {
            match frame {
                Ok(Message::Text(text)) => return Some(Ok(text)),
                Ok(Message::Binary(bytes)) => match String::from_utf8(bytes) {
                    Ok(text) => return Some(Ok(text)),
                    Err(_) => warn!("Dropping non-UTF-8 binary frame"),
                },
                Ok(Message::Close(frame)) => {
                    debug!(?frame, "Worker closed the connection");
                    return None;
                }
                // Ping/pong are answered by tungstenite.
                Ok(_) => {}
                Err(e) => return Some(Err(e.into())),
            }
        }
        None
    }

    async fn close(&mut self) {
        if let Err(e) = self.stream.close(None).await {
            debug!(error = %e, "Close handshake failed");
        }
    }
}
