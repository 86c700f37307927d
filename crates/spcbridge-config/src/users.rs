// Keypad-code map: lets a consumer pass a short keypad code that is
// translated to the matching SPC user's password before a command is sent.

use std::collections::BTreeMap;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

const KEYPAD_CODE_MAX_DIGITS: usize = 10;
const SPC_PASSWORD_MAX_CHARS: usize = 16;

/// How the code attached to a command identifies the SPC user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UserIdentifyMethod {
    /// The code is sent to the gateway as given.
    #[default]
    ById,
    /// The code is a keypad code, looked up in `users`.
    ByMap,
}

/// One row of the keypad-code map.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UserEntry {
    /// 1 to 10 digits.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub keypad_code: String,
    /// 1 to 16 characters.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub spc_password: String,
}

/// Validated keypad code → (user id, SPC password) lookup.
#[derive(Debug, Default)]
pub struct KeypadMap {
    by_code: BTreeMap<String, (u32, SecretString)>,
}

impl KeypadMap {
    /// Validate every row. Rows with an empty code or password are skipped.
    pub fn from_users(users: &BTreeMap<String, UserEntry>) -> Result<Self, ConfigError> {
        let mut by_code = BTreeMap::new();

        for (key, entry) in users {
            let user_id: u32 = key.parse().map_err(|_| {
                ConfigError::validation(format!("users.{key}"), "user id must be a number")
            })?;

            if !entry.keypad_code.is_empty() {
                validate_keypad_code(&entry.keypad_code)
                    .map_err(|reason| ConfigError::validation(format!("users.{key}.keypad_code"), reason))?;
            }
            if !entry.spc_password.is_empty() {
                validate_spc_password(&entry.spc_password)
                    .map_err(|reason| ConfigError::validation(format!("users.{key}.spc_password"), reason))?;
            }
            if entry.keypad_code.is_empty() || entry.spc_password.is_empty() {
                continue;
            }

            let previous = by_code.insert(
                entry.keypad_code.clone(),
                (user_id, SecretString::from(entry.spc_password.clone())),
            );
            if let Some((other, _)) = previous {
                return Err(ConfigError::validation(
                    format!("users.{key}.keypad_code"),
                    format!("same keypad code as user {other}"),
                ));
            }
        }

        Ok(Self { by_code })
    }

    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }

    /// The user id and SPC password registered for `code`.
    pub fn lookup(&self, code: &str) -> Option<(u32, &SecretString)> {
        self.by_code.get(code).map(|(id, pw)| (*id, pw))
    }

    /// Translate a consumer-supplied code according to `method`.
    ///
    /// `ById` passes the code through. `ByMap` replaces it with the
    /// matching SPC password; unknown codes are rejected.
    pub fn translate(
        &self,
        method: UserIdentifyMethod,
        code: Option<&str>,
    ) -> Result<Option<SecretString>, ConfigError> {
        let Some(code) = code else {
            return Ok(None);
        };
        match method {
            UserIdentifyMethod::ById => Ok(Some(SecretString::from(code.to_owned()))),
            UserIdentifyMethod::ByMap => self
                .lookup(code)
                .map(|(_, password)| Some(password.clone()))
                .ok_or_else(|| ConfigError::validation("code", "unknown keypad code")),
        }
    }
}

fn validate_keypad_code(code: &str) -> Result<(), String> {
    if code.len() > KEYPAD_CODE_MAX_DIGITS || !code.chars().all(|c| c.is_ascii_digit()) {
        return Err(format!("keypad code must be 1 to {KEYPAD_CODE_MAX_DIGITS} digits"));
    }
    Ok(())
}

fn validate_spc_password(password: &str) -> Result<(), String> {
    if password.chars().count() > SPC_PASSWORD_MAX_CHARS {
        return Err(format!("SPC password must be 1 to {SPC_PASSWORD_MAX_CHARS} characters"));
    }
    Ok(())
}
