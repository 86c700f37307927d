// SPC Bridge HTTP client
//
// Wraps `reqwest::Client` with gateway URL construction, per-channel
// Basic auth and envelope unwrapping. Reads go out with the *get*
// credential pair, commands with the *put* pair.

use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::auth::{BridgeCredentials, Channel, CredentialPair};
use crate::error::Error;
use crate::models::{
    CommandBody, CommandResponse, GatewayEnvelope, OneOrMany, RawArea, RawArmStatus,
    RawCommandResult, RawDoor, RawOutput, RawPanel, RawSnapshot, RawUser, RawZone,
};
use crate::transport::TransportConfig;

/// Default TCP port of the gateway's HTTP and WebSocket service.
pub const DEFAULT_PORT: u16 = 8088;

/// Raw HTTP client for the SPC Bridge gateway.
///
/// All methods return unwrapped `data` payloads -- the envelope is stripped
/// before the caller sees it.
#[derive(Clone)]
pub struct BridgeClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: BridgeCredentials,
    /// Push endpoint when it is not derived from `base_url`.
    ws_url: Option<Url>,
}

impl BridgeClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// `base_url` is the gateway root, e.g. `http://192.168.1.50:8088`.
    pub fn new(
        base_url: Url,
        credentials: BridgeCredentials,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url, credentials))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, credentials: BridgeCredentials) -> Self {
        Self {
            http,
            base_url,
            credentials,
            ws_url: None,
        }
    }

    /// Use `url` for the push channel instead of deriving it.
    pub fn with_ws_url(mut self, url: Url) -> Self {
        self.ws_url = Some(url);
        self
    }

    /// The gateway base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Credentials for the WebSocket push channel.
    pub fn ws_credentials(&self) -> &CredentialPair {
        self.credentials.for_channel(Channel::Ws)
    }

    /// Push channel URL: `ws(s)://host:port/ws/spc` unless overridden.
    pub fn ws_url(&self) -> Result<Url, Error> {
        if let Some(url) = &self.ws_url {
            return Ok(url.clone());
        }
        let mut url = self.spc_url("ws/spc")?;
        let scheme = if self.base_url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme)
            .map_err(|()| Error::WebSocketConnect(format!("cannot derive ws URL from {url}")))?;
        Ok(url)
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// `{base}/{path}` with any trailing slash on the base collapsed.
    fn spc_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    async fn get_data(&self, url: Url) -> Result<Value, Error> {
        debug!("GET {}", url);
        let creds = self.credentials.for_channel(Channel::Get);
        let resp = self
            .http
            .get(url)
            .basic_auth(&creds.username, Some(creds.password.expose_secret()))
            .send()
            .await
            .map_err(Error::Transport)?;

        parse_envelope(resp).await
    }

    async fn put_data(&self, url: Url, code: Option<&SecretString>) -> Result<Value, Error> {
        debug!("PUT {}", url);
        let creds = self.credentials.for_channel(Channel::Put);
        let body = CommandBody {
            code: code.map(ExposeSecret::expose_secret),
        };
        let resp = self
            .http
            .put(url)
            .basic_auth(&creds.username, Some(creds.password.expose_secret()))
            .json(&body)
            .send()
            .await
            .map_err(Error::Transport)?;

        parse_envelope(resp).await
    }

    /// Fetch `GET /spc/{key}` and decode `data.{key}` as a list.
    async fn get_records<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>, Error> {
        let url = self.spc_url(&format!("spc/{key}"))?;
        let data = self.get_data(url).await?;
        let records = match data.get(key) {
            None | Some(Value::Null) => Vec::new(),
            Some(value) => decode::<OneOrMany<T>>(value)?.into_vec(),
        };
        trace!(key, count = records.len(), "records fetched");
        Ok(records)
    }

    // ── Entity endpoints ─────────────────────────────────────────────

    pub async fn panel(&self) -> Result<RawPanel, Error> {
        let mut panels: Vec<RawPanel> = self.get_records("panel").await?;
        if panels.is_empty() {
            return Err(Error::Gateway {
                status: 200,
                message: "gateway returned no panel record".into(),
            });
        }
        Ok(panels.swap_remove(0))
    }

    pub async fn areas(&self) -> Result<Vec<RawArea>, Error> {
        self.get_records("area").await
    }

    pub async fn zones(&self) -> Result<Vec<RawZone>, Error> {
        self.get_records("zone").await
    }

    pub async fn outputs(&self) -> Result<Vec<RawOutput>, Error> {
        self.get_records("output").await
    }

    pub async fn doors(&self) -> Result<Vec<RawDoor>, Error> {
        self.get_records("door").await
    }

    pub async fn users(&self) -> Result<Vec<RawUser>, Error> {
        self.get_records("user").await
    }

    /// Fetch every entity list concurrently.
    pub async fn fetch_snapshot(&self) -> Result<RawSnapshot, Error> {
        let (panel, users, areas, zones, outputs, doors) = tokio::join!(
            self.panel(),
            self.users(),
            self.areas(),
            self.zones(),
            self.outputs(),
            self.doors(),
        );

        Ok(RawSnapshot {
            panel: panel?,
            users: users?,
            areas: areas?,
            zones: zones?,
            outputs: outputs?,
            doors: doors?,
        })
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Send a command: `PUT /spc/{kind}/{id}/{action}`.
    ///
    /// Panel commands have no id segment (`PUT /spc/panel/{action}`). The
    /// gateway's result shape is normalised into one [`CommandResponse`].
    pub async fn send_command(
        &self,
        kind: &str,
        id: u32,
        action: &str,
        code: Option<&SecretString>,
    ) -> Result<CommandResponse, Error> {
        let path = if kind == "panel" {
            format!("spc/panel/{action}")
        } else {
            format!("spc/{kind}/{id}/{action}")
        };
        let url = self.spc_url(&path)?;
        let data = self.put_data(url, code).await?;

        let results = match data {
            Value::Null => Vec::new(),
            ref value => decode::<OneOrMany<RawCommandResult>>(value)?.into_vec(),
        };
        let response = CommandResponse::from_results(results);
        debug!(kind, id, action, code = response.code, "command answered");
        Ok(response)
    }

    /// Diagnostic arm-status query: `GET /spc/arm_status?mode=..&area=..`.
    pub async fn arm_status(&self, mode: &str, area: Option<u32>) -> Result<Vec<RawArmStatus>, Error> {
        let mut url = self.spc_url("spc/arm_status")?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("mode", mode);
            if let Some(area) = area {
                query.append_pair("area", &area.to_string());
            }
        }

        let data = self.get_data(url).await?;
        match data.get("arm_status") {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(value) => Ok(decode::<OneOrMany<RawArmStatus>>(value)?.into_vec()),
        }
    }

    /// Probe the gateway and return the panel serial number.
    pub async fn test_connection(&self) -> Result<String, Error> {
        let panel = self.panel().await?;
        panel.serial.ok_or_else(|| Error::Gateway {
            status: 200,
            message: "panel reported no serial number".into(),
        })
    }
}

fn decode<T: DeserializeOwned>(value: &Value) -> Result<T, Error> {
    T::deserialize(value).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body: value.to_string(),
    })
}

/// Parse the `{ status, data }` envelope, returning `data` on success.
async fn parse_envelope(resp: reqwest::Response) -> Result<Value, Error> {
    let status = resp.status();

    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Err(Error::Authentication {
            message: format!("gateway rejected credentials (HTTP {})", status.as_u16()),
        });
    }

    let body = resp.text().await.map_err(Error::Transport)?;

    if !status.is_success() {
        let message = serde_json::from_str::<GatewayEnvelope>(&body)
            .ok()
            .and_then(|env| env.message)
            .unwrap_or_else(|| body.chars().take(200).collect());
        return Err(Error::Gateway {
            status: status.as_u16(),
            message,
        });
    }

    let envelope: GatewayEnvelope = serde_json::from_str(&body).map_err(|e| {
        let preview: String = body.chars().take(200).collect();
        Error::Deserialization {
            message: format!("{e} (body preview: {preview:?})"),
            body: body.clone(),
        }
    })?;

    match envelope.status.as_str() {
        "success" | "ok" => Ok(envelope.data.unwrap_or(Value::Null)),
        other => Err(Error::Gateway {
            status: status.as_u16(),
            message: envelope
                .message
                .unwrap_or_else(|| format!("status={other}")),
        }),
    }
}
