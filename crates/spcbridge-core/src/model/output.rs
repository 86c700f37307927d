use serde::{Deserialize, Serialize};

/// A relay (mapping gate) driven by the panel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    pub id: u32,
    pub name: String,
    pub state: bool,
}
