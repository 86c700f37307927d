//! Profile selection and flag overrides.
//!
//! File format, credential lookup and translation to `BridgeConfig` live in
//! `spcbridge-config`; this module only layers `GlobalOpts` on top.

use std::time::Duration;

use spcbridge_config::{Config, KeypadMap, Profile, UserIdentifyMethod};
use spcbridge_core::BridgeConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Everything a gateway-bound command needs.
pub struct Resolved {
    pub profile_name: String,
    pub profile: Profile,
    pub bridge: BridgeConfig,
}

impl Resolved {
    pub fn keypad_map(&self) -> Result<KeypadMap, CliError> {
        Ok(self.profile.keypad_map()?)
    }

    pub fn user_identify(&self) -> UserIdentifyMethod {
        self.profile.user_identify
    }
}

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Resolve the profile and build a `BridgeConfig`.
///
/// `--gateway` works without a config file; the profile then carries only
/// factory-default credentials.
pub fn resolve(global: &GlobalOpts) -> Result<Resolved, CliError> {
    let cfg = spcbridge_config::load_config_or_default();
    resolve_from(global, &cfg)
}

pub fn resolve_from(global: &GlobalOpts, cfg: &Config) -> Result<Resolved, CliError> {
    let profile_name = active_profile_name(global, cfg);

    let mut profile = match (cfg.profiles.get(&profile_name), &global.gateway) {
        (Some(profile), _) => profile.clone(),
        (None, Some(gateway)) => Profile::new(gateway.clone()),
        (None, None) if global.profile.is_some() && !cfg.profiles.is_empty() => {
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: cfg.profiles.keys().cloned().collect::<Vec<_>>().join(", "),
            });
        }
        (None, None) => {
            return Err(CliError::NoConfig {
                path: spcbridge_config::config_path().display().to_string(),
            });
        }
    };

    if let Some(ref gateway) = global.gateway {
        profile.gateway.clone_from(gateway);
    }

    let mut bridge =
        spcbridge_config::profile_to_bridge_config(&profile, &profile_name, &cfg.defaults)?;
    if let Some(secs) = global.timeout {
        bridge.timeout = Duration::from_secs(secs);
    }

    tracing::debug!(profile = %profile_name, url = %bridge.url, "profile resolved");
    Ok(Resolved {
        profile_name,
        profile,
        bridge,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::cli::Cli;

    fn global(args: &[&str]) -> GlobalOpts {
        let mut argv = vec!["spcbridge"];
        argv.extend_from_slice(args);
        argv.push("status");
        Cli::try_parse_from(argv).unwrap().global
    }

    #[test]
    fn gateway_flag_needs_no_config() {
        let resolved = resolve_from(&global(&["--gateway", "10.0.0.5"]), &Config::default()).unwrap();
        assert_eq!(resolved.bridge.url.as_str(), "http://10.0.0.5:8088/");
        assert_eq!(resolved.profile_name, "default");
    }

    #[test]
    fn no_profile_and_no_gateway_is_no_config() {
        let err = resolve_from(&global(&[]), &Config::default()).err().unwrap();
        assert!(matches!(err, CliError::NoConfig { .. }));
    }

    #[test]
    fn unknown_profile_lists_available() {
        let mut cfg = Config::default();
        cfg.profiles.insert("home".into(), Profile::new("10.0.0.5"));
        match resolve_from(&global(&["--profile", "office"]), &cfg) {
            Err(CliError::ProfileNotFound { available, .. }) => assert_eq!(available, "home"),
            other => panic!("expected ProfileNotFound, got {:?}", other.err()),
        }
    }

    #[test]
    fn flags_override_profile() {
        let mut cfg = Config::default();
        cfg.profiles.insert("default".into(), Profile::new("10.0.0.5"));
        let resolved = resolve_from(
            &global(&["--gateway", "http://10.0.0.9:9000", "--timeout", "3"]),
            &cfg,
        )
        .unwrap();
        assert_eq!(resolved.bridge.url.as_str(), "http://10.0.0.9:9000/");
        assert_eq!(resolved.bridge.timeout, Duration::from_secs(3));
    }
}
