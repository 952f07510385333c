//! reqwest adapter for the device REST API.
//!
//! Wire contract:
//! - `GET  {base}/v1/devices/{id}/readings`  -> `{"readings":[{kind,value,timestamp}]}`
//! - `POST {base}/v1/devices/{id}/commands`  `{"command_id","locked"}` -> `{"command_id","accepted"}`

use std::time::Duration;

use async_trait::async_trait;
use bolt_schemas::{CommandAck, SensorReading};
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::{LockTransport, TransportError};

/// Upper bound on how much of an error body is carried into a message.
const MAX_ERROR_BODY_CHARS: usize = 256;

#[derive(Debug, Deserialize)]
struct ReadingsResponse {
    readings: Vec<SensorReading>,
}

#[derive(Debug, Serialize)]
struct CommandRequest {
    command_id: Uuid,
    locked: bool,
}

#[derive(Debug, Deserialize)]
struct CommandResponse {
    command_id: Uuid,
    accepted: bool,
}

// ---------------------------------------------------------------------------
// HttpLockTransport
// ---------------------------------------------------------------------------

pub struct HttpLockTransport {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl std::fmt::Debug for HttpLockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpLockTransport")
            .field("base_url", &self.base_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "<REDACTED>"))
            .finish()
    }
}

impl HttpLockTransport {
    /// Build an adapter. `timeout` bounds every request end to end.
    pub fn new(
        base_url: &str,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| TransportError::Config(format!("invalid base_url '{base_url}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(TransportError::Config(format!(
                "base_url '{base_url}' cannot carry a path"
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Config(format!("http client build failed: {e}")))?;

        Ok(Self {
            client,
            base_url,
            token: token.filter(|t| !t.trim().is_empty()),
        })
    }

    fn device_url(&self, device_id: &str, leaf: &str) -> Result<Url, TransportError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                TransportError::Config(format!("base_url '{}' cannot carry a path", self.base_url))
            })?;
            segments
                .pop_if_empty()
                .extend(["v1", "devices", device_id, leaf]);
        }
        Ok(url)
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response, TransportError> {
        let resp = self.authorize(req).send().await.map_err(map_send_error)?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        Err(TransportError::Api {
            status: Some(status.as_u16()),
            message: truncate(&body, MAX_ERROR_BODY_CHARS),
        })
    }
}

#[async_trait]
impl LockTransport for HttpLockTransport {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn query_readings(&self, device_id: &str) -> Result<Vec<SensorReading>, TransportError> {
        let url = self.device_url(device_id, "readings")?;
        debug!(device_id, %url, "querying readings");

        let resp = self.send(self.client.get(url)).await?;
        let body: ReadingsResponse = decode(resp).await?;
        Ok(body.readings)
    }

    async fn dispatch_command(
        &self,
        device_id: &str,
        desired_locked: bool,
    ) -> Result<CommandAck, TransportError> {
        let url = self.device_url(device_id, "commands")?;
        let command_id = Uuid::new_v4();
        debug!(device_id, %url, %command_id, desired_locked, "dispatching command");

        let req = self.client.post(url).json(&CommandRequest {
            command_id,
            locked: desired_locked,
        });
        let resp = self.send(req).await?;
        let body: CommandResponse = decode(resp).await?;

        if !body.accepted {
            return Err(TransportError::Api {
                status: None,
                message: format!("command {} not accepted", body.command_id),
            });
        }
        if body.command_id != command_id {
            debug!(device_id, sent = %command_id, acked = %body.command_id, "device reassigned command id");
        }

        // The device's id is authoritative for later correlation.
        Ok(CommandAck {
            command_id: body.command_id,
            locked: desired_locked,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn map_send_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Transport(format!("request timed out: {e}"))
    } else {
        TransportError::Transport(e.to_string())
    }
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, TransportError> {
    let bytes = resp
        .bytes()
        .await
        .map_err(|e| TransportError::Transport(format!("reading body failed: {e}")))?;
    serde_json::from_slice(&bytes).map_err(|e| TransportError::Decode(e.to_string()))
}

fn truncate(s: &str, max_chars: usize) -> String {
    let trimmed = s.trim();
    match trimmed.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}
