// ── SPC domain model ──
//
// Canonical representation of everything the gateway reports. Wire quirks
// (loose scalars, integer mode codes, string zone types) are resolved in
// `convert`; nothing here knows about JSON field names.

pub mod entity_ref;
pub mod modes;

pub mod area;
pub mod door;
pub mod output;
pub mod panel;
pub mod user;
pub mod zone;

// ── Re-exports ──────────────────────────────────────────────────────

pub use entity_ref::{EntityKind, EntityRef, PANEL_ID};
pub use modes::{ArmMode, DoorMode, ZoneState, ZoneType};

pub use area::Area;
pub use door::Door;
pub use output::Output;
pub use panel::Panel;
pub use user::User;
pub use zone::Zone;
