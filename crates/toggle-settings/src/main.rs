//! togglekit command-line front end.
//!
//! Lists, toggles, adds and removes boolean settings kept in two plain text
//! files next to the application (or under `--data-dir`).
//!
//! # Usage
//!
//! ```text
//! togglekit [OPTIONS] [COMMAND]
//!
//! Commands:
//!   show    [--json]                       List every setting (default)
//!   set     KEY=VALUE...                   Change values and save them
//!   add     DISPLAY_NAME KEY [DEFAULT]     Add a setting definition
//!   remove  NUMBER|KEY                     Remove a user-added definition
//!
//! Options:
//!   --config        <PATH>     Config file [default: platform config dir]
//!   --data-dir      <DIR>      Directory holding the two data files
//!   --values-format <FORMAT>   on_off | numeric
//!   --log-level     <LEVEL>    error | warn | info | debug | trace
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable                  | Flag              |
//! |---------------------------|-------------------|
//! | `TOGGLEKIT_CONFIG`        | `--config`        |
//! | `TOGGLEKIT_DATA_DIR`      | `--data-dir`      |
//! | `TOGGLEKIT_VALUES_FORMAT` | `--values-format` |
//! | `TOGGLEKIT_LOG_LEVEL`     | `--log-level`     |
//!
//! Flags win over the environment, which wins over `config.toml`.
//! `RUST_LOG`, when set, wins over every log level setting.

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use toggle_core::ValuesFormat;
use toggle_settings::infrastructure::storage::config::{load_config_from, AppConfig};
use toggle_settings::infrastructure::ui_bridge::{
    self, CommandResult, NewSettingDto, SettingDto, SettingsSession, ValueChangeDto,
};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Boolean settings with a user-editable schema.
///
/// The `#[derive(Parser)]` macro from `clap` generates the argument parser
/// automatically from the struct fields and their `#[arg(...)]` attributes.
#[derive(Debug, Parser)]
#[command(
    name = "togglekit",
    about = "Edit boolean settings and the schema that defines them",
    version
)]
struct Cli {
    /// Path of the TOML configuration file.
    #[arg(long, env = "TOGGLEKIT_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding the schema and values files.
    #[arg(long, env = "TOGGLEKIT_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Record form used when writing the values file.
    #[arg(long, env = "TOGGLEKIT_VALUES_FORMAT")]
    values_format: Option<ValuesFormat>,

    /// Log level when `RUST_LOG` is not set.
    #[arg(long, env = "TOGGLEKIT_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List every setting with its number, current value and key.
    Show {
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Change one or more values and save them, e.g. `set buzzer=on announce=0`.
    Set {
        #[arg(value_name = "KEY=VALUE", required = true)]
        assignments: Vec<String>,
    },
    /// Add a setting definition to the schema.
    Add {
        display_name: String,
        key: String,
        /// Default value: 1/0, on/off or true/false.
        #[arg(default_value = "0")]
        default: String,
    },
    /// Remove a user-added definition by its number or key.
    Remove { target: String },
}

impl Cli {
    /// Merges the configuration file with the command-line overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or parsed.
    fn resolve_config(&self) -> anyhow::Result<AppConfig> {
        let mut config = load_config_from(self.config.as_deref()).with_context(|| {
            match &self.config {
                Some(path) => format!("failed to load config from {}", path.display()),
                None => "failed to load the platform config file".to_string(),
            }
        })?;

        if let Some(dir) = &self.data_dir {
            config.storage.data_dir = Some(dir.clone());
        }
        if let Some(format) = self.values_format {
            config.storage.values_format = format;
        }
        if let Some(level) = &self.log_level {
            config.logging.log_level = level.clone();
        }
        Ok(config)
    }
}

/// Splits `key=value`; the key never contains `=`.
fn parse_assignment(raw: &str) -> anyhow::Result<ValueChangeDto> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected KEY=VALUE, got {raw:?}"))?;
    Ok(ValueChangeDto {
        key: key.trim().to_string(),
        value: value.trim().to_string(),
    })
}

fn into_data<T: serde::Serialize>(result: CommandResult<T>) -> anyhow::Result<T> {
    match (result.success, result.data) {
        (true, Some(data)) => Ok(data),
        _ => bail!(result.error.unwrap_or_else(|| "command failed".to_string())),
    }
}

fn print_settings(settings: &[SettingDto]) {
    for s in settings {
        let state = if s.value { "ON" } else { "OFF" };
        let lock = if s.protected { " (base)" } else { "" };
        println!(
            "{:>3}. {:<3}  {}  [{}]{}",
            s.number, state, s.display_name, s.key, lock
        );
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.resolve_config();

    // ── Logging setup ─────────────────────────────────────────────────────────
    //
    // `RUST_LOG` wins; otherwise the configured level, otherwise `info`.
    // Logs go to stderr so `show --json` output stays machine-readable.
    let fallback_level = config
        .as_ref()
        .map(|c| c.logging.log_level.clone())
        .unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(&fallback_level))
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = config?;
    debug!(
        "schema file {}, values file {}",
        config.storage.schema_path().display(),
        config.storage.values_path().display()
    );

    let mut session = SettingsSession::open(&config.storage);
    for warning in session.warnings() {
        warn!("{warning}");
    }

    match cli.command.unwrap_or(Command::Show { json: false }) {
        Command::Show { json } => {
            let settings = into_data(ui_bridge::get_settings(&session))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&settings)?);
            } else {
                print_settings(&settings);
            }
        }
        Command::Set { assignments } => {
            let changes = assignments
                .iter()
                .map(|a| parse_assignment(a))
                .collect::<anyhow::Result<Vec<_>>>()?;
            let settings = into_data(ui_bridge::set_values(&mut session, changes))?;
            print_settings(&settings);
        }
        Command::Add {
            display_name,
            key,
            default,
        } => {
            let settings = into_data(ui_bridge::add_setting(
                &mut session,
                NewSettingDto {
                    display_name,
                    key,
                    default_value: default,
                },
            ))?;
            print_settings(&settings);
        }
        Command::Remove { target } => {
            let settings = into_data(ui_bridge::remove_setting(&mut session, &target))?;
            print_settings(&settings);
        }
    }

    Ok(())
}
