//! Command-line front end: flag parsing, command dispatch and exit codes.

use anyhow::Context;
use clap::{Parser, Subcommand};
use confstack_config::{
    ConfigError, ConfigManager, ErrorKind, LoadOptions, RedactionPolicy, ValidationRules,
};
use log::{LevelFilter, debug, info};
use serde_json::Value;
use std::io::Write;
use std::path::PathBuf;

/// Prefix for `CONFSTACK_A__B=value` overrides.
pub const DEFAULT_ENV_PREFIX: &str = "CONFSTACK";

/// Exit status for a failed validation.
pub const EXIT_VALIDATION: u8 = 1;
/// Exit status for a missing, unreadable or malformed file.
pub const EXIT_LOAD: u8 = 2;
/// Exit status for a missing or undecodable key.
pub const EXIT_KEY: u8 = 3;

/// Command-line options for the `confstack` binary.
#[derive(Debug, Parser)]
#[command(name = "confstack", version, about)]
pub struct Cli {
    /// Directory holding app.yaml, cloud.yaml, database.yaml and secrets.yaml
    #[arg(long, env = "CONFSTACK_CONFIG_DIR", default_value = ".")]
    pub config_dir: PathBuf,
    /// Load these files instead of the standard stack, in merge order
    #[arg(long = "file", value_name = "PATH")]
    pub files: Vec<PathBuf>,
    /// Active environment
    #[arg(long, env = "CONFSTACK_ENV", value_name = "NAME")]
    pub env: Option<String>,
    /// Merge whole documents instead of default/environment sections
    #[arg(long)]
    pub no_environments: bool,
    /// Prefix for environment-variable overrides; empty disables them
    #[arg(long, default_value = DEFAULT_ENV_PREFIX, value_name = "P")]
    pub env_prefix: String,
    /// Treat placeholder values as errors
    #[arg(long)]
    pub strict: bool,
    /// Domain that must have a database entry
    #[arg(long = "require-domain", value_name = "D")]
    pub require_domains: Vec<String>,
    #[command(subcommand)]
    pub command: Command,
}

/// Supported subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load and validate, then print findings and a summary
    Check,
    /// Print the value at a dotted key as YAML
    Get {
        /// Dotted key, e.g. database.sample_domain.port
        key: String,
        /// Printed when the key is absent
        #[arg(long)]
        default: Option<String>,
    },
    /// Print the merged tree as YAML with secrets redacted
    Show,
}

impl Cli {
    /// Loader options described by the flags.
    pub fn load_options(&self) -> LoadOptions {
        let mut options = if self.files.is_empty() {
            LoadOptions::from_dir(&self.config_dir)
        } else {
            self.files.iter().fold(
                LoadOptions::new().with_base_dir(&self.config_dir),
                LoadOptions::with_file,
            )
        };
        if let Some(env) = &self.env {
            options = options.with_environment(env);
        }
        if self.no_environments {
            options = options.without_environments();
        }
        if !self.env_prefix.trim().is_empty() {
            options = options.with_env_prefix(&self.env_prefix);
        }
        options
    }

    /// Validation rules described by the flags.
    pub fn rules(&self) -> ValidationRules {
        self.require_domains
            .iter()
            .fold(ValidationRules::default(), |rules, domain| {
                rules.require_domain(domain)
            })
            .strict(self.strict)
    }
}

/// Install logging, load, validate, then run the selected command.
///
/// Until the configured `log_level` is known only warnings are shown, unless
/// `RUST_LOG` asks for more.
pub fn run(cli: &Cli, out: &mut impl Write) -> anyhow::Result<()> {
    crate::init_logging(LevelFilter::Warn);
    let mut manager = ConfigManager::load(cli.load_options())?;
    let level = manager
        .log_level()
        .map(LevelFilter::from)
        .unwrap_or(LevelFilter::Info);
    crate::set_log_level(level);
    info!(
        "config loaded (environment={}, layers={})",
        manager.environment(),
        manager.layers().len()
    );

    let report = manager.validate(&cli.rules())?;
    match &cli.command {
        Command::Check => {
            if !report.findings().is_empty() {
                writeln!(out, "{report}")?;
            }
            writeln!(
                out,
                "config ok (environment={}, files={}, warnings={})",
                manager.environment(),
                manager.layers().len(),
                report.warning_count()
            )?;
        }
        Command::Get { key, default } => {
            let value = match (manager.get(key), default) {
                (Some(value), _) => value.clone(),
                (None, Some(raw)) => {
                    debug!("key absent, printing default (key={key})");
                    parse_default(raw)
                }
                (None, None) => manager.get_required(key)?.clone(),
            };
            write_yaml(out, &value)?;
        }
        Command::Show => {
            write_yaml(out, &manager.redacted(&RedactionPolicy::default()))?;
        }
    }
    Ok(())
}

/// Process exit status for a failed run.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    let kind = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<ConfigError>())
        .map(ConfigError::kind);
    match kind {
        Some(ErrorKind::Validation) => EXIT_VALIDATION,
        Some(ErrorKind::Load) => EXIT_LOAD,
        Some(ErrorKind::Key) => EXIT_KEY,
        Some(ErrorKind::Frozen) | None => 1,
    }
}

/// Write a failure to `err_out`, one validation finding per line.
pub fn report_error(err: &anyhow::Error, err_out: &mut impl Write) -> std::io::Result<()> {
    let report = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<ConfigError>())
        .and_then(ConfigError::report);
    match report {
        Some(report) => {
            writeln!(
                err_out,
                "config validation failed with {} error(s):",
                report.error_count()
            )?;
            writeln!(err_out, "{report}")
        }
        None => writeln!(err_out, "error: {err:#}"),
    }
}

/// Defaults parse as YAML scalars, so `--default 30` prints an integer.
fn parse_default(raw: &str) -> Value {
    serde_yaml::from_str::<Value>(raw)
        .ok()
        .filter(|value| !value.is_null())
        .unwrap_or_else(|| Value::String(raw.to_string()))
}

fn write_yaml(out: &mut impl Write, value: &Value) -> anyhow::Result<()> {
    let rendered = serde_yaml::to_string(value).context("failed to render YAML")?;
    out.write_all(rendered.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::path::Path;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("confstack").chain(args.iter().copied()))
            .expect("parse")
    }

    #[test]
    fn flags_build_load_options() {
        let cli = parse(&[
            "--config-dir",
            "/etc/confstack",
            "--env",
            "Production",
            "--no-environments",
            "check",
        ]);
        let options = cli.load_options();
        assert_eq!(options.base_dir.as_deref(), Some(Path::new("/etc/confstack")));
        assert_eq!(options.files.len(), 4);
        assert_eq!(options.resolved_environment(), "production");
        assert!(!options.environments);
        assert_eq!(options.env_prefix.as_deref(), Some(DEFAULT_ENV_PREFIX));
    }

    #[test]
    fn explicit_files_replace_standard_stack() {
        let cli = parse(&["--file", "base.yaml", "--file", "local.yaml", "--env-prefix", "", "show"]);
        let options = cli.load_options();
        assert_eq!(
            options.files,
            vec![PathBuf::from("base.yaml"), PathBuf::from("local.yaml")]
        );
        assert_eq!(options.secrets_file, None);
        assert_eq!(options.env_prefix, None);
    }

    #[test]
    fn strict_and_domains_build_rules() {
        let cli = parse(&[
            "--strict",
            "--require-domain",
            "billing",
            "--require-domain",
            "search",
            "get",
            "log_level",
        ]);
        let rules = cli.rules();
        assert!(rules.strict);
        assert_eq!(rules.required_domains, vec!["billing", "search"]);
        assert!(matches!(cli.command, Command::Get { ref key, default: None } if key == "log_level"));
    }

    #[test]
    fn defaults_parse_as_scalars() {
        assert_eq!(parse_default("30"), json!(30));
        assert_eq!(parse_default("true"), json!(true));
        assert_eq!(parse_default("eu-west-1"), json!("eu-west-1"));
        assert_eq!(parse_default(""), json!(""));
    }

    #[test]
    fn exit_codes_follow_error_kind() {
        let missing = anyhow::Error::new(ConfigError::MissingKey("a.b".into()));
        assert_eq!(exit_code(&missing), EXIT_KEY);

        let not_found =
            anyhow::Error::new(ConfigError::NotFound(PathBuf::from("app.yaml"))).context("loading");
        assert_eq!(exit_code(&not_found), EXIT_LOAD);

        assert_eq!(exit_code(&anyhow::anyhow!("io")), 1);
    }
}
