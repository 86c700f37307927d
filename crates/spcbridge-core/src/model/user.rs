use serde::{Deserialize, Serialize};

/// Panel user. Keypad codes live in configuration, never here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u32,
    pub name: String,
}
