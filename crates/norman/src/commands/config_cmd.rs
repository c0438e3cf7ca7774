//! Config subcommand handlers.

use norman_config::{Config, Profile};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

/// Add `name` to `cfg`, making it the default when no usable default exists.
fn add_profile(
    cfg: &mut Config,
    name: &str,
    profile: Profile,
    force: bool,
) -> Result<(), CliError> {
    if cfg.profiles.contains_key(name) && !force {
        return Err(CliError::Validation {
            field: "profile".into(),
            reason: format!("'{name}' already exists (use --force to replace it)"),
        });
    }
    cfg.profiles.insert(name.to_string(), profile);

    let default_usable = cfg
        .default_profile
        .as_ref()
        .is_some_and(|d| cfg.profiles.contains_key(d));
    if !default_usable {
        cfg.default_profile = Some(name.to_string());
    }
    Ok(())
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            output::print_output(
                &norman_config::config_path().display().to_string(),
                global.quiet,
            );
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = norman_config::load_config()?;
            let out = output::render_single(
                &global.output,
                &cfg,
                |c| toml::to_string_pretty(c).unwrap_or_else(|e| format!("{c:#?}\n# {e}")),
                |c| c.profiles.keys().cloned().collect::<Vec<_>>().join("\n"),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Init { name, force } => {
            let host = global.host.clone().ok_or_else(|| CliError::Validation {
                field: "host".into(),
                reason: "pass the hub address with --host".into(),
            })?;
            let mut profile = Profile::new(host);
            profile.port = global.port;
            profile.timeout = global.timeout;

            let mut cfg = norman_config::load_config()?;
            add_profile(&mut cfg, &name, profile, force)?;
            let path = norman_config::save_config(&cfg)?;

            if !global.quiet {
                eprintln!(
                    "{}",
                    output::success(
                        &format!("Profile '{name}' written to {}", path.display()),
                        output::should_color(&global.color),
                    )
                );
            }
            Ok(())
        }
    }
}
