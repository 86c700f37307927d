//! Config subcommand handlers.

use spcbridge_api::Channel;
use spcbridge_config::{Config, Profile};
use spcbridge_core::Bridge;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, InitArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

const REDACTED: &str = "********";

pub async fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init(init) => init_profile(&init, global),

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let mut cfg = spcbridge_config::load_config_or_default();
            redact(&mut cfg);
            let out = output::render_single(
                global.output,
                &cfg,
                |c| toml::to_string_pretty(c).unwrap_or_else(|e| format!("{c:#?}\n({e})")),
                |c| c.profiles.keys().cloned().collect::<Vec<_>>().join("\n"),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            println!("{}", spcbridge_config::config_path().display());
            Ok(())
        }

        // ── Test ────────────────────────────────────────────────────
        ConfigCommand::Test => {
            let resolved = config::resolve(global)?;
            let url = resolved.bridge.url.clone();
            let bridge = Bridge::new(resolved.bridge)?;
            let serial = bridge.client().test_connection().await?;
            if !global.quiet {
                eprintln!("✓ Connected to {url} (profile '{}')", resolved.profile_name);
            }
            output::print_output(&serial, false);
            Ok(())
        }
    }
}

// ── Init ────────────────────────────────────────────────────────────

fn init_profile(args: &InitArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let gateway = global
        .gateway
        .clone()
        .ok_or_else(|| CliError::validation("gateway", "pass the gateway address with --gateway"))?;

    let mut cfg = spcbridge_config::load_config_or_default();
    let profile_name = global.profile.clone().unwrap_or_else(|| "default".into());

    if cfg.profiles.contains_key(&profile_name) && !args.force {
        return Err(CliError::validation(
            "profile",
            format!("'{profile_name}' already exists; use --force to replace it"),
        ));
    }

    let mut profile = Profile::new(gateway);
    profile.secure = args.secure;
    // Reject a bad address before anything is written.
    profile.gateway_url()?;

    for (channel, password) in [
        (Channel::Get, &args.get_password),
        (Channel::Put, &args.put_password),
        (Channel::Ws, &args.ws_password),
    ] {
        let Some(password) = password else { continue };
        if args.keyring {
            spcbridge_config::store_password(&profile_name, channel, password)?;
        } else {
            let slot = match channel {
                Channel::Get => &mut profile.get_password,
                Channel::Put => &mut profile.put_password,
                Channel::Ws => &mut profile.ws_password,
            };
            *slot = Some(password.clone());
        }
    }

    if cfg.profiles.is_empty() {
        cfg.default_profile = Some(profile_name.clone());
    }
    cfg.profiles.insert(profile_name.clone(), profile);
    spcbridge_config::save_config(&cfg)?;

    if !global.quiet {
        eprintln!(
            "✓ Profile '{profile_name}' written to {}",
            spcbridge_config::config_path().display()
        );
        eprintln!("  Test it: spcbridge --profile {profile_name} config test");
    }
    Ok(())
}

// ── Redaction ───────────────────────────────────────────────────────

fn redact(cfg: &mut Config) {
    fn mask(slot: &mut Option<String>) {
        if slot.is_some() {
            *slot = Some(REDACTED.into());
        }
    }

    for profile in cfg.profiles.values_mut() {
        mask(&mut profile.get_password);
        mask(&mut profile.put_password);
        mask(&mut profile.ws_password);
        for user in profile.users.values_mut() {
            if !user.keypad_code.is_empty() {
                user.keypad_code = REDACTED.into();
            }
            if !user.spc_password.is_empty() {
                user.spc_password = REDACTED.into();
            }
        }
    }
}
