// ── Push frame decoding ──
//
// Frames are JSON objects discriminated by `type`:
//
//   {"type": "zone", "id": 10, "state": "open"}
//
// Only the fields present are carried forward; the store leaves everything
// else untouched.

use serde::de::DeserializeOwned;
use serde_json::Value;
use spcbridge_api::{RawArea, RawDoor, RawOutput, RawPanel, RawZone};

use crate::error::CoreError;
use crate::model::EntityKind;

/// A partial update for one entity.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityUpdate {
    Panel(RawPanel),
    Area(u32, RawArea),
    Zone(u32, RawZone),
    Output(u32, RawOutput),
    Door(u32, RawDoor),
    /// Panel event-log entry: becomes the panel's last event.
    PanelLog {
        entry: String,
        changed_by: Option<String>,
    },
}

/// A decoded push frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Update(EntityUpdate),
    /// Gateway configuration changed; the store must be rebuilt.
    Reload,
    /// A frame type this version does not understand.
    Unknown(String),
}

/// Decode one text frame.
///
/// Unknown `type` values decode to [`Frame::Unknown`]; anything malformed
/// is a [`CoreError::Decode`].
pub fn decode_frame(text: &str) -> Result<Frame, CoreError> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| CoreError::decode(format!("invalid JSON frame: {e}")))?;
    if !value.is_object() {
        return Err(CoreError::decode("frame is not a JSON object"));
    }
    let Some(kind) = value.get("type").and_then(Value::as_str) else {
        return Err(CoreError::decode("frame has no type"));
    };

    let update = match kind {
        "reload" => return Ok(Frame::Reload),
        "panel" => EntityUpdate::Panel(fields(&value, EntityKind::Panel)?),
        "area" => {
            let raw: RawArea = fields(&value, EntityKind::Area)?;
            EntityUpdate::Area(require_id(raw.id, EntityKind::Area)?, raw)
        }
        "zone" => {
            let raw: RawZone = fields(&value, EntityKind::Zone)?;
            EntityUpdate::Zone(require_id(raw.id, EntityKind::Zone)?, raw)
        }
        "output" => {
            let raw: RawOutput = fields(&value, EntityKind::Output)?;
            EntityUpdate::Output(require_id(raw.id, EntityKind::Output)?, raw)
        }
        "door" => {
            let raw: RawDoor = fields(&value, EntityKind::Door)?;
            EntityUpdate::Door(require_id(raw.id, EntityKind::Door)?, raw)
        }
        "event" => EntityUpdate::PanelLog {
            entry: text.to_owned(),
            changed_by: match value.get("user") {
                Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
                Some(Value::Number(n)) => Some(n.to_string()),
                _ => None,
            },
        },
        other => return Ok(Frame::Unknown(other.to_owned())),
    };

    Ok(Frame::Update(update))
}

fn fields<T: DeserializeOwned>(value: &Value, kind: EntityKind) -> Result<T, CoreError> {
    T::deserialize(value)
        .map_err(|e| CoreError::decode(format!("malformed {kind} frame: {e}")))
}

fn require_id(id: Option<u32>, kind: EntityKind) -> Result<u32, CoreError> {
    id.ok_or_else(|| CoreError::decode(format!("{kind} frame without id")))
}
