//! HTTP implementation of [`MoveResolver`].

use super::wire::{MoveRequest, NewSessionRequest, OpponentReplyRequest, WireSnapshot};
use super::{MoveResolver, Resolution};
use crate::config::{ClientConfig, Endpoints};
use crate::difficulty::Difficulty;
use crate::error::{MalformedResponse, ResolutionError};
use connect_four::{Board, Dimensions};
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

/// Resolution client speaking JSON over HTTP.
#[derive(Debug, Clone)]
pub struct HttpResolutionClient {
    /// Base URL of the service, without a trailing slash.
    base_url: String,
    /// HTTP client.
    client: reqwest::Client,
    /// Endpoint paths.
    endpoints: Endpoints,
    /// Key of the opener flag in the new-session body.
    opener_field: String,
    /// Board size every response must have.
    dimensions: Dimensions,
}

impl HttpResolutionClient {
    /// Builds a client from configuration.
    #[instrument(skip(config), fields(base_url = %config.base_url()))]
    pub fn new(config: &ClientConfig) -> Result<Self, ResolutionError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| {
                error!(error = %e, "Failed to build HTTP client");
                ResolutionError::Unavailable(format!("Failed to build HTTP client: {}", e))
            })?;

        info!(dimensions = %config.dimensions(), "Resolution client ready");
        Ok(Self {
            base_url: config.base_url().trim_end_matches('/').to_string(),
            client,
            endpoints: config.endpoints().clone(),
            opener_field: config.opener_field().clone(),
            dimensions: config.dimensions(),
        })
    }

    /// Board size this client validates against.
    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Rejects local state that must never reach the wire.
    fn check_board(&self, board: &Board) -> Result<(), ResolutionError> {
        if board.dimensions() != self.dimensions {
            error!(
                expected = %self.dimensions,
                found = %board.dimensions(),
                "Local board has wrong dimensions"
            );
            return Err(ResolutionError::InvalidRequest(format!(
                "board is {}, expected {}",
                board.dimensions(),
                self.dimensions
            )));
        }
        Ok(())
    }

    #[instrument(skip(self, body), fields(url = %self.url(path)))]
    async fn post<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<Resolution, ResolutionError> {
        let url = self.url(path);
        debug!("Sending resolution request");

        let response = self.client.post(&url).json(body).send().await.map_err(|e| {
            warn!(error = %e, "Resolution request failed");
            ResolutionError::Unavailable(e.to_string())
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            warn!(error = %e, %status, "Failed to read response body");
            ResolutionError::Unavailable(e.to_string())
        })?;
        debug!(%status, body = %text, "Received response");

        if !status.is_success() {
            warn!(%status, body = %text, "Service returned non-success status");
            let diagnostic = if text.trim().is_empty() {
                format!("HTTP {}", status)
            } else {
                text
            };
            return Err(ResolutionError::Unavailable(diagnostic));
        }

        let snapshot: WireSnapshot = serde_json::from_str(&text).map_err(|e| {
            error!(error = %e, body = %text, "Response is not a session snapshot");
            MalformedResponse::Decode(e.to_string())
        })?;

        Ok(Resolution::from_wire(snapshot, self.dimensions)?)
    }
}

#[async_trait::async_trait]
impl MoveResolver for HttpResolutionClient {
    #[instrument(skip(self))]
    async fn new_session(
        &self,
        difficulty: Difficulty,
        opponent_starts_first: bool,
    ) -> Result<Resolution, ResolutionError> {
        info!("Requesting new session");
        let body = NewSessionRequest {
            difficulty,
            opponent_starts_first,
        }
        .to_body(&self.opener_field);
        self.post(self.endpoints.new_session(), &body).await
    }

    #[instrument(skip(self, board))]
    async fn request_move(
        &self,
        board: &Board,
        column: usize,
        difficulty: Difficulty,
    ) -> Result<Resolution, ResolutionError> {
        self.check_board(board)?;
        if column >= self.dimensions.columns {
            error!(column, columns = self.dimensions.columns, "Column out of range");
            return Err(ResolutionError::InvalidRequest(format!(
                "column {} is outside 0..{}",
                column, self.dimensions.columns
            )));
        }

        info!("Submitting player move");
        let body = MoveRequest {
            board: board.to_codes(),
            column,
            difficulty,
        };
        self.post(self.endpoints.move_path(), &body).await
    }

    #[instrument(skip(self, board))]
    async fn request_opponent_reply(
        &self,
        board: &Board,
        difficulty: Difficulty,
    ) -> Result<Resolution, ResolutionError> {
        self.check_board(board)?;

        info!("Requesting opponent reply");
        let body = OpponentReplyRequest {
            board: board.to_codes(),
            difficulty,
        };
        self.post(self.endpoints.opponent_reply(), &body).await
    }
}
