//! HTTP client for the external move oracle.

use async_trait::async_trait;
use log::{debug, warn};
use serde::Serialize;
use std::time::{Duration, Instant};

use super::{
    MoveOracle,
    errors::{OracleError, OracleResult},
    models::{MoveRequest, OracleErrorBody, OracleResponse, StateRequest},
};
use crate::game::{Board, GameState, Position, Symbol};

/// Per-request timeout applied to every oracle call.
pub const DEFAULT_ORACLE_TIMEOUT: Duration = Duration::from_secs(5);

/// Calls slower than this are logged at warn level.
const SLOW_CALL: Duration = Duration::from_secs(1);

/// Move oracle reached over HTTP.
///
/// A single attempt per call: failures surface immediately, nothing is retried.
#[derive(Debug, Clone)]
pub struct HttpMoveOracle {
    base_url: String,
    client: reqwest::Client,
}

impl HttpMoveOracle {
    /// Create a client with the default 5-second timeout
    pub fn new(base_url: impl Into<String>) -> OracleResult<Self> {
        Self::with_timeout(base_url, DEFAULT_ORACLE_TIMEOUT)
    }

    /// Create a client with a custom per-request timeout
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> OracleResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OracleError::Configuration(e.to_string()))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<B: Serialize + Sync>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> OracleResult<OracleResponse> {
        let url = format!("{}{}", self.base_url, endpoint);
        let started = Instant::now();

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| OracleError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<OracleErrorBody>()
                .await
                .ok()
                .and_then(|body| body.error)
                .unwrap_or_else(|| "Move oracle error".to_string());
            return Err(OracleError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let decoded = response.json::<OracleResponse>().await.map_err(|e| {
            if e.is_decode() {
                OracleError::InvalidResponse(e.to_string())
            } else {
                OracleError::Unreachable(e.to_string())
            }
        })?;

        let elapsed = started.elapsed();
        if elapsed > SLOW_CALL {
            warn!("Slow move oracle call: POST {} took {:?}", endpoint, elapsed);
        } else {
            debug!("POST {} answered in {:?}", endpoint, elapsed);
        }

        Ok(decoded)
    }
}

#[async_trait]
impl MoveOracle for HttpMoveOracle {
    async fn compute_move(&self, board: &Board, player: Symbol) -> OracleResult<Option<Position>> {
        let request = MoveRequest {
            board: *board,
            player,
        };
        let response = self.post("/move", &request).await?;

        match response.next_move {
            None => Ok(None),
            Some(wire) => wire.position().map(Some).ok_or_else(|| {
                OracleError::InvalidResponse(format!(
                    "move ({}, {}) is off the board",
                    wire.row, wire.col
                ))
            }),
        }
    }

    async fn evaluate(&self, board: &Board) -> OracleResult<GameState> {
        let request = StateRequest { board: *board };
        let response = self.post("/game-state", &request).await?;
        Ok(response.game_state.into())
    }
}
