use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{default_config_path, TrialConfig};
use crate::error::Result;
use crate::protect::ProtectService;
use crate::ui::UI;

#[derive(Parser)]
#[command(
    name = "trialseal",
    about = "Time-limited trial protection for model files",
    long_about = "trialseal - Time-limited trial protection for model files

OVERVIEW:
  Appends a 24-byte expiry trailer to a model file. Applications that build
  their inference sessions through trialseal's GatedLoader refuse the model
  once the trial is over.

QUICK START:
  trialseal protect models/segm.onnx --days 60   # Protect in place for 60 days
  trialseal check models/segm.onnx               # Show expiry and status
  trialseal check models/                        # Check every model in a directory
  trialseal debug models/segm.onnx               # Trailer diagnostics
  trialseal strip models/segm.onnx -o clean.onnx # Write the unprotected payload",
    version = crate::VERSION,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (JSON)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Append a trial trailer to a model file
    #[command(aliases = &["p"])]
    Protect(ProtectArgs),

    /// Show trial status of a model file or directory
    #[command(aliases = &["st"])]
    Check(CheckArgs),

    /// Print trailer diagnostics
    Debug(DebugArgs),

    /// Remove the trial trailer from a model file
    Strip(StripArgs),

    /// Inspect configuration
    #[command(aliases = &["cfg"])]
    Config(ConfigArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ProtectArgs {
    pub model_path: PathBuf,

    /// Write the protected model here instead of overwriting the input
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Trial length in days; negative values produce an expired model
    #[arg(short, long, allow_negative_numbers = true)]
    pub days: Option<i64>,

    /// Replace an existing trailer without asking
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    pub path: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct DebugArgs {
    pub path: PathBuf,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct StripArgs {
    pub model_path: PathBuf,

    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Cut at the last header even if the trailer is malformed
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show,
}

/// CLI handler for processing commands
pub struct CliHandler {
    config_path: Option<PathBuf>,
    config: TrialConfig,
    ui: UI,
}

impl CliHandler {
    /// Create a handler, loading configuration from `config_path` or the default location
    pub fn new(config_path: Option<PathBuf>) -> Result<Self> {
        let config = TrialConfig::load(config_path.as_deref())?;
        Ok(Self {
            config_path,
            config,
            ui: UI::new(),
        })
    }

    pub fn config(&self) -> &TrialConfig {
        &self.config
    }

    /// Execute a CLI command
    pub async fn execute(&self, command: Commands) -> Result<()> {
        let service = ProtectService::new(self.config.clone());
        match command {
            Commands::Protect(args) => service.protect(args).await.map(|_| ()),
            Commands::Check(args) => service.check(args).await.map(|_| ()),
            Commands::Debug(args) => service.debug(args).await.map(|_| ()),
            Commands::Strip(args) => service.strip(args).await.map(|_| ()),
            Commands::Config(args) => self.handle_config(args),
        }
    }

    fn handle_config(&self, args: ConfigArgs) -> Result<()> {
        match args.command {
            ConfigCommand::Show => {
                let source = self
                    .config_path
                    .clone()
                    .unwrap_or_else(default_config_path);
                self.ui.card(
                    "Configuration",
                    vec![
                        ("Config file", source.display().to_string()),
                        ("Default trial days", self.config.default_trial_days.to_string()),
                        ("Transient suffix", self.config.transient_suffix.clone()),
                        (
                            "Transient dir",
                            self.config
                                .transient_dir
                                .as_ref()
                                .map(|d| d.display().to_string())
                                .unwrap_or_else(|| std::env::temp_dir().display().to_string()),
                        ),
                        ("Model extensions", self.config.artifact_extensions.join(", ")),
                        ("Verbose", self.config.verbose.to_string()),
                    ],
                );
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_protect_with_negative_days() {
        let cli = Cli::try_parse_from(["trialseal", "protect", "m.onnx", "--days", "-1", "-o", "out.onnx"])
            .unwrap();
        match cli.command {
            Commands::Protect(args) => {
                assert_eq!(args.model_path, PathBuf::from("m.onnx"));
                assert_eq!(args.days, Some(-1));
                assert_eq!(args.output, Some(PathBuf::from("out.onnx")));
                assert!(!args.force);
            }
            _ => panic!("expected protect"),
        }
    }

    #[test]
    fn test_missing_path_is_rejected() {
        assert!(Cli::try_parse_from(["trialseal", "check"]).is_err());
        assert!(Cli::try_parse_from(["trialseal", "protect"]).is_err());
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::try_parse_from(["trialseal", "debug", "m.onnx", "--json", "-v", "--config", "c.json"])
            .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("c.json")));
        assert!(matches!(cli.command, Commands::Debug(DebugArgs { json: true, .. })));
    }

    #[tokio::test]
    async fn test_handler_runs_protect_then_check() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("m.onnx");
        std::fs::write(&model, b"\x08\x07\x12\x02model").unwrap();
        let config = dir.path().join("config.json");
        std::fs::write(&config, br#"{"default_trial_days": 3}"#).unwrap();

        let handler = CliHandler::new(Some(config)).unwrap();
        assert_eq!(handler.config().default_trial_days, 3);

        handler
            .execute(Commands::Protect(ProtectArgs {
                model_path: model.clone(),
                output: None,
                days: None,
                force: false,
            }))
            .await
            .unwrap();
        assert!(crate::gate::is_within_trial(&model));

        handler
            .execute(Commands::Check(CheckArgs { path: model }))
            .await
            .unwrap();
    }
}
