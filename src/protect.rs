//! Protect, inspect and restore model artifacts

use chrono::{DateTime, Duration};
use dialoguer::{theme::ColorfulTheme, Confirm};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::cli::{CheckArgs, DebugArgs, ProtectArgs, StripArgs};
use crate::clock::{Clock, SystemClock};
use crate::config::TrialConfig;
use crate::error::{Result, TrialsealError};
use crate::model::{classify, ArtifactDirectory, ArtifactFile, ArtifactStatus};
use crate::trailer::{self, Expiry, TrailerReport};
use crate::ui::UI;
use crate::utils::{days_remaining, format_bytes, has_onnx_signature, hex_head, sha256_hex};

/// Trial state of an artifact at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialState {
    Valid { expiry: Expiry, days_left: i64 },
    Expired { expiry: Expiry, days_left: i64 },
    Unprotected,
    Malformed,
}

impl TrialState {
    /// Same rule as the gate: valid up to and including the expiry second
    pub fn at(status: ArtifactStatus, now: u64) -> Self {
        match status {
            ArtifactStatus::Unprotected => Self::Unprotected,
            ArtifactStatus::Malformed => Self::Malformed,
            ArtifactStatus::Protected(expiry) => {
                let days_left = days_remaining(expiry, now);
                if now <= expiry.as_unix() {
                    Self::Valid { expiry, days_left }
                } else {
                    Self::Expired { expiry, days_left }
                }
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Valid { .. } => "Valid",
            Self::Expired { .. } => "Expired",
            Self::Unprotected => "Not protected",
            Self::Malformed => "Malformed trailer",
        }
    }
}

/// Result of a protect operation
#[derive(Debug, Clone)]
pub struct ProtectOutcome {
    pub output: PathBuf,
    pub expiry: Expiry,
    pub payload_size: usize,
    /// An earlier trailer was replaced
    pub replaced: bool,
}

/// Full diagnostics for one artifact
#[derive(Debug, Clone, Serialize)]
pub struct DebugReport {
    pub path: PathBuf,
    #[serde(flatten)]
    pub trailer: TrailerReport,
    pub expiry_date: Option<String>,
    pub payload_sha256: String,
    pub payload_head: String,
    pub onnx_signature: bool,
}

pub struct ProtectService<C = SystemClock> {
    ui: UI,
    config: TrialConfig,
    clock: C,
}

impl ProtectService<SystemClock> {
    pub fn new(config: TrialConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> ProtectService<C> {
    pub fn with_clock(config: TrialConfig, clock: C) -> Self {
        Self {
            ui: UI::new(),
            config,
            clock,
        }
    }

    /// Append a trial trailer to a model file
    pub async fn protect(&self, args: ProtectArgs) -> Result<ProtectOutcome> {
        let data = read_artifact(&args.model_path).await?;
        let days = args.days.unwrap_or(self.config.default_trial_days);
        let expiry = self.expiry_after_days(days)?;

        let (payload, replaced) = match classify(&data) {
            ArtifactStatus::Unprotected => (data.as_slice(), false),
            ArtifactStatus::Protected(current) => {
                if !args.force && !self.confirm_replace(&args.model_path, current)? {
                    return Err(TrialsealError::user_cancelled());
                }
                (trailer::strip(&data), true)
            }
            ArtifactStatus::Malformed => {
                if !args.force {
                    return Err(TrialsealError::validation(format!(
                        "{} carries a malformed trailer; inspect it with `debug` or pass --force",
                        args.model_path.display()
                    )));
                }
                // Keep every byte: the stray header may belong to the payload.
                self.ui
                    .warning("Malformed trailer left in place, appending a new one");
                (data.as_slice(), false)
            }
        };

        let protected = trailer::encode(payload, expiry);
        let output = args.output.unwrap_or(args.model_path);
        write_artifact(&output, &protected).await?;

        tracing::info!(
            output = %output.display(),
            expiry = expiry.as_unix(),
            replaced,
            "model protected"
        );

        self.ui.success("Model protected");
        self.ui.card(
            "Trial protection",
            vec![
                ("File", output.display().to_string()),
                ("Payload", format_bytes(payload.len() as u64)),
                ("Expires", expiry.to_string()),
                ("Trial days", days.to_string()),
            ],
        );
        self.ui
            .info("Load the model through GatedLoader for the trial to be enforced");

        Ok(ProtectOutcome {
            output,
            expiry,
            payload_size: payload.len(),
            replaced,
        })
    }

    /// Report the trial state of a file, or of every model in a directory
    pub async fn check(&self, args: CheckArgs) -> Result<Vec<(ArtifactFile, TrialState)>> {
        let files = if args.path.is_dir() {
            let scanned = ArtifactDirectory::from_path(&args.path, &self.config).await?;
            self.ui.info(&format!(
                "{}: {} model(s), {} protected, {} total",
                scanned.path.display(),
                scanned.files.len(),
                scanned.protected_files().count(),
                scanned.formatted_size()
            ));
            scanned.files
        } else {
            if !args.path.exists() {
                return Err(TrialsealError::file_not_found(args.path.display().to_string()));
            }
            vec![ArtifactFile::from_path(&args.path).await?]
        };

        let now = self.clock.now_unix();
        let results: Vec<(ArtifactFile, TrialState)> = files
            .into_iter()
            .map(|file| {
                let state = TrialState::at(file.status, now);
                (file, state)
            })
            .collect();

        if let [(file, state)] = results.as_slice() {
            self.display_state(file, state);
        } else {
            for (file, state) in &results {
                let detail = match state {
                    TrialState::Valid { expiry, days_left }
                    | TrialState::Expired { expiry, days_left } => {
                        format!("{} ({} days, until {})", state.label(), days_left, expiry)
                    }
                    _ => state.label().to_string(),
                };
                self.ui.status(
                    &file.name,
                    &detail,
                    !matches!(state, TrialState::Expired { .. } | TrialState::Malformed),
                );
            }
        }

        Ok(results)
    }

    /// Print trailer diagnostics
    pub async fn debug(&self, args: DebugArgs) -> Result<DebugReport> {
        let data = read_artifact(&args.path).await?;
        let payload = trailer::strip(&data);
        let report = trailer::inspect(&data);

        let debug = DebugReport {
            path: args.path.clone(),
            expiry_date: report.expiry.map(|e| e.to_string()),
            payload_sha256: sha256_hex(payload),
            payload_head: hex_head(payload, 20),
            onnx_signature: has_onnx_signature(payload),
            trailer: report,
        };

        if args.json {
            println!("{}", serde_json::to_string_pretty(&debug)?);
        } else {
            self.display_debug(&debug);
        }

        Ok(debug)
    }

    /// Write the payload without its trailer
    pub async fn strip(&self, args: StripArgs) -> Result<PathBuf> {
        let data = read_artifact(&args.model_path).await?;
        let output = args.output.unwrap_or_else(|| args.model_path.clone());

        match classify(&data) {
            ArtifactStatus::Unprotected => {
                self.ui.warning("Model is not protected, nothing to strip");
                if output != args.model_path {
                    write_artifact(&output, &data).await?;
                }
                return Ok(output);
            }
            ArtifactStatus::Malformed if !args.force => {
                return Err(TrialsealError::validation(format!(
                    "{} carries a malformed trailer; pass --force to cut at the last header",
                    args.model_path.display()
                )));
            }
            _ => {}
        }

        let payload = trailer::strip(&data);
        write_artifact(&output, payload).await?;

        tracing::info!(output = %output.display(), size = payload.len(), "trailer stripped");
        self.ui.success(&format!(
            "Trailer removed, {} written to {}",
            format_bytes(payload.len() as u64),
            output.display()
        ));

        Ok(output)
    }

    fn expiry_after_days(&self, days: i64) -> Result<Expiry> {
        let out_of_range =
            || TrialsealError::invalid_input(format!("Trial of {} days is out of range", days));

        let now = i64::try_from(self.clock.now_unix()).map_err(|_| out_of_range())?;
        let end = DateTime::from_timestamp(now, 0)
            .zip(Duration::try_days(days))
            .and_then(|(now, trial)| now.checked_add_signed(trial))
            .ok_or_else(out_of_range)?;

        Ok(Expiry::from_datetime(end))
    }

    fn confirm_replace(&self, path: &Path, current: Expiry) -> Result<bool> {
        self.ui.warning(&format!(
            "{} is already protected (expires {})",
            path.display(),
            current
        ));
        let proceed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt("Replace the existing trial trailer?")
            .default(false)
            .interact()?;
        Ok(proceed)
    }

    fn display_state(&self, file: &ArtifactFile, state: &TrialState) {
        let mut rows = vec![
            ("File", file.path.display().to_string()),
            ("Size", format_bytes(file.size)),
            ("Status", self.ui.format_trial_state(state)),
        ];
        if let TrialState::Valid { expiry, days_left } | TrialState::Expired { expiry, days_left } =
            state
        {
            rows.push(("Expires", expiry.to_string()));
            rows.push(("Days remaining", days_left.to_string()));
        }
        self.ui.card("Trial information", rows);
    }

    fn display_debug(&self, debug: &DebugReport) {
        let report = &debug.trailer;
        let mut rows = vec![
            ("File", debug.path.display().to_string()),
            ("Total size", format!("{} bytes", report.total_size)),
        ];

        match report.header_offset {
            Some(offset) => {
                rows.push(("Header offset", offset.to_string()));
                rows.push(("Trailer size", format!("{} bytes", report.total_size - offset)));
                rows.push((
                    "Trailer bytes",
                    report.trailer_hex.clone().unwrap_or_default(),
                ));
                rows.push(("Structure complete", self.ui.format_check(report.complete)));
                if let Some(date) = &debug.expiry_date {
                    rows.push(("Expires", date.clone()));
                }
                if let Some(error) = &report.error {
                    rows.push(("Decode error", error.clone()));
                }
            }
            None => rows.push(("Header offset", "not found".to_string())),
        }

        rows.push(("Payload size", format!("{} bytes", report.payload_size)));
        rows.push(("Payload SHA-256", debug.payload_sha256.clone()));
        rows.push(("Payload head", debug.payload_head.clone()));
        rows.push(("ONNX signature", self.ui.format_check(debug.onnx_signature)));

        self.ui.card("Trailer diagnostics", rows);
    }
}

async fn read_artifact(path: &Path) -> Result<Vec<u8>> {
    if !path.exists() {
        return Err(TrialsealError::file_not_found(path.display().to_string()));
    }
    fs::read(path)
        .await
        .map_err(|e| TrialsealError::read_failed(path, e))
}

async fn write_artifact(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| TrialsealError::write_failed(parent, e))?;
    }
    fs::write(path, data)
        .await
        .map_err(|e| TrialsealError::write_failed(path, e))
}
