//! Chain-activity oracle
//!
//! Asks the Blockfrost mainnet API whether a stake address has ever been
//! active. Transient failures are retried with exponential backoff; after the
//! last attempt the candidate is reported with unknown activity so the search
//! can continue. Auth failures abort the search.

use crate::error::OracleError;
use log::warn;
use std::time::Duration;

/// Blockfrost mainnet API base
const MAINNET_BASE_URL: &str = "https://cardano-mainnet.blockfrost.io/api/v0";

/// Attempts per address, including the first
const MAX_ATTEMPTS: u32 = 3;

/// Backoff before the second attempt; doubles per retry
const INITIAL_BACKOFF: Duration = Duration::from_millis(500);

/// HTTP timeout per request
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// On-chain activity verdict for one stake address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    Active,
    Inactive,
    /// The oracle could not be reached within the retry budget
    Unknown,
}

/// Source of on-chain activity information
///
/// A trait seam so the search driver can be tested without network I/O.
/// `Send + Sync` because the driver is shared with the worker pool.
pub trait ChainOracle: Send + Sync {
    fn check(&self, stake_address: &str) -> Result<Activity, OracleError>;
}

/// Blockfrost-backed oracle
#[derive(Debug)]
pub struct BlockfrostClient {
    client: reqwest::blocking::Client,
    base_url: String,
    project_id: String,
}

impl BlockfrostClient {
    pub fn new(project_id: impl Into<String>) -> Result<Self, OracleError> {
        Self::with_base_url(project_id, MAINNET_BASE_URL)
    }

    pub fn with_base_url(
        project_id: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, OracleError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| OracleError::Transient(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            project_id: project_id.into(),
        })
    }

    /// Probe the API before the search starts
    ///
    /// Surfaces a bad API key immediately instead of on the first candidate.
    pub fn health(&self) -> Result<(), OracleError> {
        let (status, body) = self.get("/health")?;
        match status {
            200 => {
                let healthy = serde_json::from_str::<serde_json::Value>(&body)
                    .ok()
                    .and_then(|v| v.get("is_healthy").and_then(|h| h.as_bool()))
                    .unwrap_or(false);
                if healthy {
                    Ok(())
                } else {
                    Err(OracleError::Transient("oracle reports unhealthy".into()))
                }
            }
            401 | 403 => Err(OracleError::Auth(status)),
            other => Err(OracleError::Transient(format!("health returned HTTP {other}"))),
        }
    }

    fn query(&self, stake_address: &str) -> Result<Activity, OracleError> {
        let (status, body) = self.get(&format!("/accounts/{stake_address}"))?;
        interpret(status, &body)
    }

    fn get(&self, path: &str) -> Result<(u16, String), OracleError> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .header("project_id", &self.project_id)
            .send()
            .map_err(|e| OracleError::Transient(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| OracleError::Transient(e.to_string()))?;
        Ok((status, body))
    }
}

impl ChainOracle for BlockfrostClient {
    fn check(&self, stake_address: &str) -> Result<Activity, OracleError> {
        let mut backoff = INITIAL_BACKOFF;
        for attempt in 1..=MAX_ATTEMPTS {
            match self.query(stake_address) {
                Ok(activity) => return Ok(activity),
                Err(OracleError::Auth(status)) => return Err(OracleError::Auth(status)),
                Err(OracleError::Transient(reason)) => {
                    warn!("Oracle attempt {attempt}/{MAX_ATTEMPTS} failed: {reason}");
                    if attempt < MAX_ATTEMPTS {
                        std::thread::sleep(backoff);
                        backoff *= 2;
                    }
                }
            }
        }
        Ok(Activity::Unknown)
    }
}

/// Map an account-endpoint response to an activity verdict
fn interpret(status: u16, body: &str) -> Result<Activity, OracleError> {
    match status {
        200 => {
            let payload: serde_json::Value = serde_json::from_str(body)
                .map_err(|e| OracleError::Transient(format!("bad oracle payload: {e}")))?;
            Ok(if payload_is_empty(&payload) {
                Activity::Inactive
            } else {
                Activity::Active
            })
        }
        404 => Ok(Activity::Inactive),
        401 | 403 => Err(OracleError::Auth(status)),
        other => Err(OracleError::Transient(format!("HTTP {other}"))),
    }
}

fn payload_is_empty(payload: &serde_json::Value) -> bool {
    match payload {
        serde_json::Value::Null => true,
        serde_json::Value::Object(map) => map.is_empty(),
        serde_json::Value::Array(items) => items.is_empty(),
        _ => false,
    }
}
