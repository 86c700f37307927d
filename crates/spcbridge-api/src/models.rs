// Wire models for the SPC Bridge gateway.
//
// The gateway is loose about scalar encodings (booleans arrive as `1`,
// `"1"` or `true`; ids as numbers or numeric strings), so every field goes
// through the `lenient` deserializers. All entity fields are optional: the
// same structs carry full snapshot records and partial push updates.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ── Envelope ─────────────────────────────────────────────────────────

/// Every HTTP response is wrapped in `{ "status": "...", "data": ... }`.
///
/// On failure the gateway answers `{"status": "error", "message": "..."}`.
#[derive(Debug, Deserialize)]
pub(crate) struct GatewayEnvelope {
    pub status: String,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub message: Option<String>,
}

/// A field the gateway returns as a single object or as an array of them.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::Many(items) => items,
            Self::One(item) => vec![item],
        }
    }
}

// ── Entities ─────────────────────────────────────────────────────────

/// Panel record from `GET /spc/panel` or a `"panel"` push frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPanel {
    #[serde(default, deserialize_with = "lenient::opt_u32")]
    pub id: Option<u32>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub serial: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub model: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub firmware: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_bool")]
    pub intrusion: Option<bool>,
    #[serde(default, deserialize_with = "lenient::opt_bool")]
    pub fire: Option<bool>,
    #[serde(default, deserialize_with = "lenient::opt_bool")]
    pub tamper: Option<bool>,
    #[serde(default, deserialize_with = "lenient::opt_bool")]
    pub problem: Option<bool>,
    #[serde(default, deserialize_with = "lenient::opt_bool")]
    pub verified: Option<bool>,
    /// Arm mode wire code (0..=6).
    #[serde(default, deserialize_with = "lenient::opt_u32")]
    pub mode: Option<u32>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub alarm_status: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_bool")]
    pub a_enabled: Option<bool>,
    #[serde(default, deserialize_with = "lenient::opt_bool")]
    pub b_enabled: Option<bool>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub a_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub b_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_u32")]
    pub exittime: Option<u32>,
    #[serde(default, deserialize_with = "lenient::opt_u32")]
    pub entrytime: Option<u32>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub changed_by: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_id_list")]
    pub areas: Option<Vec<u32>>,
}

/// Area record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawArea {
    #[serde(default, deserialize_with = "lenient::opt_u32")]
    pub id: Option<u32>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_u32")]
    pub mode: Option<u32>,
    #[serde(default, deserialize_with = "lenient::opt_bool")]
    pub a_enabled: Option<bool>,
    #[serde(default, deserialize_with = "lenient::opt_bool")]
    pub b_enabled: Option<bool>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub a_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub b_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_u32")]
    pub exittime: Option<u32>,
    #[serde(default, deserialize_with = "lenient::opt_u32")]
    pub entrytime: Option<u32>,
    #[serde(default, deserialize_with = "lenient::opt_bool")]
    pub intrusion: Option<bool>,
    #[serde(default, deserialize_with = "lenient::opt_bool")]
    pub fire: Option<bool>,
    #[serde(default, deserialize_with = "lenient::opt_bool")]
    pub tamper: Option<bool>,
    #[serde(default, deserialize_with = "lenient::opt_bool")]
    pub problem: Option<bool>,
    #[serde(default, deserialize_with = "lenient::opt_bool")]
    pub verified: Option<bool>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub alarm_status: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub set_user: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub unset_user: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub changed_by: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_id_list")]
    pub zones: Option<Vec<u32>>,
}

/// Zone record.
///
/// The zone type travels as `zone_type` so it never collides with the
/// `type` discriminator of push frames.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawZone {
    #[serde(default, deserialize_with = "lenient::opt_u32")]
    pub id: Option<u32>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub zone_type: Option<String>,
    /// Input state: `closed`, `open`, `short`, `disconnected`, ...
    #[serde(default, alias = "input", deserialize_with = "lenient::opt_string")]
    pub state: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_bool")]
    pub inhibited: Option<bool>,
    #[serde(default, deserialize_with = "lenient::opt_bool")]
    pub isolated: Option<bool>,
    #[serde(default, deserialize_with = "lenient::opt_bool")]
    pub tamper: Option<bool>,
    #[serde(default, deserialize_with = "lenient::opt_bool")]
    pub problem: Option<bool>,
    #[serde(default, deserialize_with = "lenient::opt_bool")]
    pub intrusion: Option<bool>,
    #[serde(default, deserialize_with = "lenient::opt_bool")]
    pub fire: Option<bool>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub alarm_status: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_u32")]
    pub area: Option<u32>,
}

/// Output (mapping gate) record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawOutput {
    #[serde(default, deserialize_with = "lenient::opt_u32")]
    pub id: Option<u32>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_bool")]
    pub state: Option<bool>,
}

/// Door record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawDoor {
    #[serde(default, deserialize_with = "lenient::opt_u32")]
    pub id: Option<u32>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub name: Option<String>,
    /// Door mode wire code: 0 normal, 1 locked, 2 unlocked.
    #[serde(default, deserialize_with = "lenient::opt_u32")]
    pub mode: Option<u32>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub entry_granted: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub entry_denied: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub exit_granted: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub exit_denied: Option<String>,
}

/// Panel user record. Keypad codes are never exposed by the gateway.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawUser {
    #[serde(default, deserialize_with = "lenient::opt_u32")]
    pub id: Option<u32>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub name: Option<String>,
}

/// Everything fetched by a full load.
#[derive(Debug, Clone, Default)]
pub struct RawSnapshot {
    pub panel: RawPanel,
    pub users: Vec<RawUser>,
    pub areas: Vec<RawArea>,
    pub zones: Vec<RawZone>,
    pub outputs: Vec<RawOutput>,
    pub doors: Vec<RawDoor>,
}

// ── Commands ─────────────────────────────────────────────────────────

/// Request body of a `PUT /spc/...` command.
#[derive(Debug, Serialize)]
pub(crate) struct CommandBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'a str>,
}

/// One result entry as the gateway reports it.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawCommandResult {
    #[serde(default, deserialize_with = "lenient::opt_u32")]
    pub code: Option<u32>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub message: Option<String>,
}

/// Uniform command outcome: `code == 0` means accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResponse {
    pub code: u32,
    pub message: String,
}

impl CommandResponse {
    pub fn is_success(&self) -> bool {
        self.code == 0
    }

    /// Collapse the gateway's result shape into one response.
    ///
    /// Panel-wide commands answer with one entry per area; the first failing
    /// entry wins, otherwise the first entry. An empty list counts as success.
    pub(crate) fn from_results(results: Vec<RawCommandResult>) -> Self {
        let chosen = results
            .iter()
            .position(|r| r.code.unwrap_or(0) != 0)
            .or_else(|| (!results.is_empty()).then_some(0));

        match chosen.and_then(|idx| results.into_iter().nth(idx)) {
            Some(result) => Self {
                code: result.code.unwrap_or(0),
                message: result.message.unwrap_or_default(),
            },
            None => Self {
                code: 0,
                message: String::new(),
            },
        }
    }
}

// ── Arm status ───────────────────────────────────────────────────────

/// Per-area result of `GET /spc/arm_status`: why an area can't be set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawArmStatus {
    #[serde(deserialize_with = "lenient::u32_required")]
    pub area_id: u32,
    #[serde(default)]
    pub reasons: Vec<String>,
}

// ── Lenient scalar decoding ──────────────────────────────────────────

pub(crate) mod lenient {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn value_to_u32<E: serde::de::Error>(value: &Value) -> Result<Option<u32>, E> {
        match value {
            Value::Null => Ok(None),
            Value::Number(n) => n
                .as_u64()
                .and_then(|v| u32::try_from(v).ok())
                .map(Some)
                .ok_or_else(|| E::custom(format!("expected unsigned integer, got {n}"))),
            Value::String(s) if s.trim().is_empty() => Ok(None),
            Value::String(s) => s
                .trim()
                .parse()
                .map(Some)
                .map_err(|e| E::custom(format!("invalid integer {s:?}: {e}"))),
            other => Err(E::custom(format!("expected integer, got {other}"))),
        }
    }

    pub fn opt_u32<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
        let value = Option::<Value>::deserialize(d)?.unwrap_or(Value::Null);
        value_to_u32(&value)
    }

    pub fn u32_required<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
        let value = Value::deserialize(d)?;
        value_to_u32(&value)?.ok_or_else(|| D::Error::custom("missing integer"))
    }

    pub fn opt_bool<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
        match Option::<Value>::deserialize(d)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(b)),
            Some(Value::Number(n)) => Ok(Some(n.as_f64().is_some_and(|v| v != 0.0))),
            Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "" => Ok(None),
                "1" | "true" | "yes" | "on" => Ok(Some(true)),
                "0" | "false" | "no" | "off" => Ok(Some(false)),
                other => Err(D::Error::custom(format!("invalid boolean {other:?}"))),
            },
            Some(other) => Err(D::Error::custom(format!("expected boolean, got {other}"))),
        }
    }

    pub fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        match Option::<Value>::deserialize(d)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(Value::Bool(b)) => Ok(Some(b.to_string())),
            Some(other) => Err(D::Error::custom(format!("expected string, got {other}"))),
        }
    }

    pub fn opt_id_list<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<u32>>, D::Error> {
        match Option::<Value>::deserialize(d)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Array(items)) => {
                let mut ids = Vec::with_capacity(items.len());
                for item in &items {
                    if let Some(id) = value_to_u32::<D::Error>(item)? {
                        ids.push(id);
                    }
                }
                Ok(Some(ids))
            }
            // Some firmware sends "1,2,3".
            Some(Value::String(s)) => s
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(|part| {
                    part.parse::<u32>()
                        .map_err(|e| D::Error::custom(format!("invalid id {part:?}: {e}")))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Some),
            Some(other) => Err(D::Error::custom(format!("expected id list, got {other}"))),
        }
    }
}
