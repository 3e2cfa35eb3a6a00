//! Config subcommand handlers.

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Copy of `cfg` with secrets masked.
fn redacted(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    cfg.broker.password = "****".into();
    cfg
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init { force } => {
            let path = config::config_path();
            if path.exists() && !force {
                return Err(CliError::Validation {
                    field: "config".into(),
                    reason: format!("{} already exists, pass --force to overwrite", path.display()),
                });
            }
            config::save_config_to(&Config::default(), &path)?;
            tracing::info!(path = %path.display(), "wrote default configuration");
            output::print_status(
                &format!("wrote {}", path.display()),
                true,
                output::should_color(&global.color),
                global.quiet,
            );
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = redacted(&config::resolve(global)?);
            let toml = config::to_toml(&cfg)?;
            let out = output::render_single(
                &global.output,
                &cfg,
                |_| toml.trim_end().to_owned(),
                |_| toml.trim_end().to_owned(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redaction_masks_password_only() {
        let mut cfg = Config::default();
        cfg.broker.password = "hunter2".into();
        let shown = redacted(&cfg);
        assert_eq!(shown.broker.password, "****");
        assert_eq!(shown.broker.username, cfg.broker.username);
    }
}
