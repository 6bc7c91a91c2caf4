pub mod cli;
pub mod config;
pub mod error;
pub mod parser;
pub mod ui;
pub mod writer;

// Public API re-exports
pub use cli::{Cli, OutputFormat};
pub use config::{CliOverrides, Config, OutputConfig, ProtectionConfig, TargetConfig};
pub use error::{AnimCodeError, Result, UserFriendlyError};

// Core functionality re-exports
pub use parser::{parse_animation_code, FileRecord};
pub use ui::{GracefulShutdown, OutputFormatter, OutputMode, ProgressManager};
pub use writer::{FileWriter, PathDecision, PathPolicy, WriteFailure, WriteReport, WriteResult};

use std::path::Path;
use tokio::task;

/// Main library interface: recover files from a completion and save them.
pub struct AnimCode {
    config: Config,
    output_formatter: OutputFormatter,
    progress_manager: ProgressManager,
    shutdown: GracefulShutdown,
}

impl AnimCode {
    /// Create a new AnimCode instance with the provided configuration
    pub fn new(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Result<Self> {
        let shutdown = GracefulShutdown::new()?;
        Ok(Self::with_shutdown(config, output_mode, verbose, quiet, shutdown))
    }

    /// Create an instance without installing a Ctrl+C handler.
    pub fn new_for_test(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        Self::with_shutdown(config, output_mode, verbose, quiet, GracefulShutdown::new_for_test())
    }

    fn with_shutdown(
        config: Config,
        output_mode: OutputMode,
        verbose: u8,
        quiet: bool,
        shutdown: GracefulShutdown,
    ) -> Self {
        let output_formatter = OutputFormatter::new(output_mode, verbose, quiet);
        // Progress bars would interleave with machine-readable output.
        let progress_manager =
            ProgressManager::new(!quiet && config.output.progress && output_mode == OutputMode::Human);

        Self {
            config,
            output_formatter,
            progress_manager,
            shutdown,
        }
    }

    /// Create AnimCode instance from CLI arguments
    pub fn from_cli(cli_args: &Cli) -> Result<Self> {
        let config = cli_args.load_config()?;
        let output_mode = match cli_args.output_format {
            OutputFormat::Human => OutputMode::Human,
            OutputFormat::Json => OutputMode::Json,
            OutputFormat::Plain => OutputMode::Plain,
        };

        Self::new(config, output_mode, cli_args.verbosity_level(), cli_args.quiet)
    }

    /// Parse `text` and save every recovered file under the configured base directory.
    ///
    /// Never fails: configuration problems and task failures come back as a
    /// `WriteResult` with `success == false`.
    pub async fn save_animation_code(&self, text: &str) -> WriteResult {
        match self.write_animation_code(text).await {
            Ok(report) => report.into_write_result(),
            Err(e) => {
                tracing::error!(error = %e, "Animation code was not saved");
                WriteResult::from_error(&e)
            }
        }
    }

    /// Like [`AnimCode::save_animation_code`], but keeps the full report and typed errors.
    pub async fn write_animation_code(&self, text: &str) -> Result<WriteReport> {
        let base_dir = self.config.resolve_base_directory()?;
        self.shutdown.check_shutdown()?;

        self.output_formatter.start_operation("Saving animation code");
        self.output_formatter
            .info(&format!("Animation server directory: {}", base_dir.display()));

        let write_progress = self.progress_manager.create_write_progress(0);
        let progress_callback = {
            let pb = write_progress.clone();
            move |report: &WriteReport| {
                ui::progress::update_write_progress(&pb, report);
            }
        };

        let writer = self.file_writer();
        let text = text.to_string();
        let report = task::spawn_blocking(move || {
            let records = parse_animation_code(&text);
            writer.write_files(&base_dir, &records, Some(&progress_callback))
        })
        .await
        .map_err(|e| AnimCodeError::Task {
            message: e.to_string(),
        })?;

        ui::progress::finish_progress_with_summary(
            &write_progress,
            &format!("Saved {} files", report.saved_files.len()),
            report.elapsed(),
        );

        Ok(report)
    }

    /// Parse without writing, pairing each record with what the writer would do.
    pub fn plan(&self, text: &str) -> Vec<(FileRecord, PathDecision)> {
        let policy = PathPolicy::new(&self.config.protection);

        parse_animation_code(text)
            .into_iter()
            .map(|record| {
                let decision = policy.check(&record.path);
                (record, decision)
            })
            .collect()
    }

    fn file_writer(&self) -> FileWriter {
        FileWriter::new()
            .with_policy(PathPolicy::new(&self.config.protection))
            .with_shutdown(self.shutdown.clone())
    }

    /// Generate sample configuration file
    pub fn generate_sample_config<P: AsRef<Path>>(output_path: P) -> Result<()> {
        let sample_config = Config::create_sample_config();
        std::fs::write(output_path.as_ref(), sample_config)?;
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn output_formatter(&self) -> &OutputFormatter {
        &self.output_formatter
    }

    pub fn request_shutdown(&self) {
        self.shutdown.request_shutdown();
    }

    /// Handle error with user-friendly output
    pub fn handle_error(&self, error: &AnimCodeError) {
        self.output_formatter.print_user_friendly_error(error);
    }
}

/// Parse `text` and save the files under `base_dir` with the default denylist.
///
/// `None` means the caller found no base directory configured; nothing is
/// parsed in that case.
pub fn save_animation_code(text: &str, base_dir: Option<&Path>) -> WriteResult {
    let base_dir = match base_dir.filter(|dir| !dir.as_os_str().is_empty()) {
        Some(dir) => dir,
        None => {
            return WriteResult::failed(
                AnimCodeError::BaseDirectoryNotConfigured {
                    env_var: config::DEFAULT_ENV_VAR.to_string(),
                }
                .to_string(),
            )
        }
    };

    if let Err(e) = config::check_base_directory(base_dir) {
        return WriteResult::failed(e.to_string());
    }

    let records = parse_animation_code(text);
    FileWriter::new()
        .write_files(base_dir, &records, None)
        .into_write_result()
}

/// Get version information
pub fn version_info() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Get build information
pub fn build_info() -> BuildInfo {
    BuildInfo {
        version: env!("CARGO_PKG_VERSION"),
        git_hash: option_env!("GIT_HASH").unwrap_or("unknown"),
        build_date: option_env!("BUILD_DATE").unwrap_or("unknown"),
        target: std::env::consts::ARCH.to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct BuildInfo {
    pub version: &'static str,
    pub git_hash: &'static str,
    pub build_date: &'static str,
    pub target: String,
}

impl std::fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "animcode {} ({}) built on {} for {}",
            self.version, self.git_hash, self.build_date, self.target
        )
    }
}
