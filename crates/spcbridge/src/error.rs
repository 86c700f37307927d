//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use spcbridge_config::ConfigError;
use spcbridge_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const REJECTED: i32 = 5;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach gateway at {url}")]
    #[diagnostic(
        code(spcbridge::connection_failed),
        help(
            "{reason}\n\
             Check that the gateway is running and reachable, then try: spcbridge config test"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(spcbridge::auth_failed),
        help(
            "The gateway uses separate get, put and ws users.\n\
             Check the credentials in your profile: spcbridge config show"
        )
    )]
    AuthFailed { message: String },

    #[error("No {channel} password configured for profile '{profile}'")]
    #[diagnostic(
        code(spcbridge::no_credentials),
        help(
            "Set {channel}_password or {channel}_password_env in the profile,\n\
             or store it with: spcbridge config init --keyring"
        )
    )]
    NoCredentials { profile: String, channel: String },

    // ── Entities & commands ──────────────────────────────────────────
    #[error("{kind} {id} not found")]
    #[diagnostic(
        code(spcbridge::not_found),
        help("Run: spcbridge {list_command} to see available ids")
    )]
    NotFound {
        kind: String,
        id: String,
        list_command: String,
    },

    #[error("Gateway rejected the command (code {code}): {message}")]
    #[diagnostic(code(spcbridge::rejected))]
    Rejected { code: u32, message: String },

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(spcbridge::validation))]
    Validation { field: String, reason: String },

    #[error("Unreadable data from gateway: {message}")]
    #[diagnostic(code(spcbridge::decode))]
    Decode { message: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(spcbridge::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: spcbridge --profile {name} --gateway <ADDR> config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Configuration file not found")]
    #[diagnostic(
        code(spcbridge::no_config),
        help(
            "Pass --gateway <ADDR>, or create a profile with: spcbridge --gateway <ADDR> config init\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(spcbridge::config))]
    Config { message: String },

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Timed out after {millis}ms")]
    #[diagnostic(
        code(spcbridge::timeout),
        help("Increase command_timeout in the profile or check gateway responsiveness.")
    )]
    Timeout { millis: u64 },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON output failed: {0}")]
    #[diagnostic(code(spcbridge::json))]
    Json(#[from] serde_json::Error),

    #[error("YAML output failed: {0}")]
    #[diagnostic(code(spcbridge::yaml))]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML output failed: {0}")]
    #[diagnostic(code(spcbridge::toml))]
    Toml(#[from] toml::ser::Error),

    #[error("Internal error: {0}")]
    #[diagnostic(code(spcbridge::internal))]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Rejected { .. } => exit_code::REJECTED,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed { url, reason },

            CoreError::AuthenticationFailed { message } => Self::AuthFailed { message },

            CoreError::Timeout { timeout_ms } => Self::Timeout { millis: timeout_ms },

            CoreError::CommandRejected { code, message } => Self::Rejected { code, message },

            CoreError::ValidationFailed { message } => Self::Validation {
                field: "input".into(),
                reason: message,
            },

            CoreError::Decode { message } => Self::Decode { message },

            CoreError::NotFound {
                entity_type,
                identifier,
            } => Self::NotFound {
                list_command: format!("{entity_type}s"),
                kind: entity_type,
                id: identifier,
            },

            CoreError::Config { message } => Self::Config { message },

            CoreError::Internal(message) => Self::Internal(message),
        }
    }
}

impl From<spcbridge_api::Error> for CliError {
    fn from(err: spcbridge_api::Error) -> Self {
        CoreError::from(err).into()
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::NoCredentials { profile, channel } => {
                Self::NoCredentials { profile, channel }
            }
            ConfigError::Io(e) => Self::Io(e),
            other => Self::Config {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_keeps_gateway_code_and_message() {
        let err = CliError::from(CoreError::CommandRejected {
            code: 7,
            message: "Zone open".into(),
        });
        assert_eq!(err.exit_code(), exit_code::REJECTED);
        assert!(err.to_string().contains("Zone open"));
    }

    #[test]
    fn core_validation_is_a_usage_error() {
        let err = CliError::from(CoreError::ValidationFailed {
            message: "area 9 does not exist".into(),
        });
        assert_eq!(err.exit_code(), exit_code::USAGE);
    }

    #[test]
    fn not_found_points_at_listing_command() {
        let err = CliError::from(CoreError::NotFound {
            entity_type: "zone".into(),
            identifier: "12".into(),
        });
        match err {
            CliError::NotFound { list_command, .. } => assert_eq!(list_command, "zones"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn missing_credentials_exit_as_auth() {
        let err = CliError::from(ConfigError::NoCredentials {
            profile: "home".into(),
            channel: "put".into(),
        });
        assert_eq!(err.exit_code(), exit_code::AUTH);
    }
}
