//! Config subcommand handlers.

use dialoguer::{Confirm, Input};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

use super::util::prompt_err;

// ── Helpers ─────────────────────────────────────────────────────────

fn save_config(cfg: &Config) -> Result<(), CliError> {
    config::save_config(cfg)?;
    Ok(())
}

fn render_toml(cfg: &Config) -> String {
    toml::to_string_pretty(cfg).unwrap_or_else(|e| format!("# could not render config: {e}"))
}

fn parse_field<T: std::str::FromStr>(field: &str, value: &str, hint: &str) -> Result<T, CliError> {
    value.parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: hint.into(),
    })
}

fn profile_not_found(name: String, cfg: &Config) -> CliError {
    let mut available: Vec<_> = cfg.profiles.keys().cloned().collect();
    available.sort();
    CliError::ProfileNotFound {
        name,
        available: if available.is_empty() {
            "(none)".into()
        } else {
            available.join(", ")
        },
    }
}

fn set_key(profile: &mut Profile, key: &str, value: String) -> Result<(), CliError> {
    match key {
        "api_url" | "api-url" => {
            let url: url::Url = parse_field("api_url", &value, "must be an http(s) URL")?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(CliError::Validation {
                    field: "api_url".into(),
                    reason: "must be an http(s) URL".into(),
                });
            }
            profile.api_url = value;
        }
        "email" => profile.email = Some(value),
        "insecure" => {
            profile.insecure = Some(parse_field("insecure", &value, "must be 'true' or 'false'")?);
        }
        "timeout" => {
            profile.timeout = Some(parse_field("timeout", &value, "must be a number (seconds)")?);
        }
        "ca_cert" | "ca-cert" => profile.ca_cert = Some(value.into()),
        "completion_delay" | "completion-delay" => {
            profile.completion_delay_secs = Some(parse_field(
                "completion_delay",
                &value,
                "must be a number (seconds)",
            )?);
        }
        "fallback_completion" | "fallback-completion" => {
            profile.fallback_completion = Some(parse_field(
                "fallback_completion",
                &value,
                "must be 'true' or 'false'",
            )?);
        }
        "refresh_interval" | "refresh-interval" => {
            profile.refresh_interval_secs = Some(parse_field(
                "refresh_interval",
                &value,
                "must be a number (seconds, 0 disables)",
            )?);
        }
        other => {
            return Err(CliError::Validation {
                field: other.into(),
                reason: format!(
                    "unknown config key '{other}'. Valid keys: api_url, email, insecure, \
                     timeout, ca_cert, completion_delay, fallback_completion, refresh_interval"
                ),
            });
        }
    }
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => {
            let config_path = config::config_path();
            eprintln!("EarnHub CLI configuration");
            eprintln!("   Config path: {}\n", config_path.display());

            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default("default".into())
                .interact_text()
                .map_err(prompt_err)?;

            let mut profile = Profile::default();
            let api_url: String = Input::new()
                .with_prompt("Backend URL")
                .default(profile.api_url.clone())
                .interact_text()
                .map_err(prompt_err)?;
            set_key(&mut profile, "api_url", api_url)?;

            let email: String = Input::new()
                .with_prompt("Login email (optional)")
                .allow_empty(true)
                .interact_text()
                .map_err(prompt_err)?;
            profile.email = Some(email.trim().to_owned()).filter(|e| !e.is_empty());

            let fallback = Confirm::new()
                .with_prompt("Report completion for offers without a provider callback?")
                .default(true)
                .interact()
                .map_err(prompt_err)?;
            profile.fallback_completion = Some(fallback);

            let mut cfg = config::load_config_or_default();
            if cfg.profiles.contains_key(&profile_name) {
                let overwrite = Confirm::new()
                    .with_prompt(format!("Profile '{profile_name}' exists. Overwrite?"))
                    .default(false)
                    .interact()
                    .map_err(prompt_err)?;
                if !overwrite {
                    return Ok(());
                }
            }
            cfg.profiles.insert(profile_name.clone(), profile);
            cfg.default_profile = Some(profile_name.clone());
            save_config(&cfg)?;

            eprintln!("\nConfiguration written to {}", config_path.display());
            eprintln!("  Active profile: {profile_name}");
            eprintln!("\n  Next: earnhub login");
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::load_config_or_default();
            let out = output::render_single(&global.output, &cfg, render_toml, |_| {
                config::config_path().display().to_string()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            println!("{}", config::config_path().display());
            Ok(())
        }

        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);
            let profile = cfg.profiles.entry(profile_name.clone()).or_default();
            set_key(profile, &key, value)?;
            save_config(&cfg)?;
            output::notice(&format!("Set {key} on profile '{profile_name}'"), global.quiet);
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() {
                output::notice("No profiles configured. Run: earnhub config init", global.quiet);
            } else {
                let mut names: Vec<_> = cfg.profiles.keys().collect();
                names.sort();
                for name in names {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}");
                }
            }
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                return Err(profile_not_found(name, &cfg));
            }
            cfg.default_profile = Some(name.clone());
            save_config(&cfg)?;
            output::notice(&format!("Default profile set to '{name}'"), global.quiet);
            Ok(())
        }
    }
}
