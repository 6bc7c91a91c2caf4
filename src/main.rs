use animcode::{
    AnimCode, AnimCodeError, Cli, OutputFormatter, OutputMode, UserFriendlyError, WriteReport,
    WriteResult,
};
use anyhow::Context;
use clap::Parser;
use std::io::Read;
use std::path::Path;
use std::process;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let exit_code = run().await;
    process::exit(exit_code);
}

async fn run() -> i32 {
    let cli = Cli::parse();
    setup_logging(&cli);

    if cli.generate_config {
        return handle_generate_config(&cli);
    }

    let animcode = match AnimCode::from_cli(&cli) {
        Ok(animcode) => animcode,
        Err(e) => {
            print_startup_error(&e);
            return 1;
        }
    };

    // Fail on a missing target before waiting on stdin.
    if !cli.dry_run {
        if let Err(e) = animcode.config().resolve_base_directory() {
            return handle_failure(&animcode, &e);
        }
    }

    let text = match read_input(cli.input_path()) {
        Ok(text) => text,
        Err(e) => {
            animcode.handle_error(&AnimCodeError::Input {
                message: format!("{:#}", e),
            });
            return 1;
        }
    };

    if cli.dry_run {
        return handle_dry_run(&animcode, &text);
    }

    match animcode.write_animation_code(&text).await {
        Ok(report) => {
            let formatter = animcode.output_formatter();
            formatter.print_write_summary(&report, animcode.config().output.show_skipped);

            let exit_code = exit_code_for_report(&report);
            formatter.print_write_result(&report.into_write_result());
            exit_code
        }
        Err(e) => handle_failure(&animcode, &e),
    }
}

fn handle_failure(animcode: &AnimCode, error: &AnimCodeError) -> i32 {
    animcode.handle_error(error);
    if animcode.output_formatter().mode() == OutputMode::Json {
        animcode
            .output_formatter()
            .print_write_result(&WriteResult::from_error(error));
    }
    exit_code_for_error(error)
}

fn exit_code_for_report(report: &WriteReport) -> i32 {
    if report.cancelled {
        130
    } else if report.has_failures() {
        2 // Saved with per-file failures
    } else {
        0
    }
}

fn exit_code_for_error(error: &AnimCodeError) -> i32 {
    match error {
        AnimCodeError::Cancelled => 130, // Interrupted (SIGINT)
        AnimCodeError::BaseDirectoryNotConfigured { .. } => 3,
        AnimCodeError::BaseDirectoryNotFound { .. } => 4,
        _ => 1,
    }
}

fn read_input(path: Option<&Path>) -> anyhow::Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("failed to read completion from stdin")?;
            Ok(text)
        }
    }
}

fn handle_generate_config(cli: &Cli) -> i32 {
    let config_path = cli
        .config
        .as_ref()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| "animcode.toml".to_string());

    match AnimCode::generate_sample_config(&config_path) {
        Ok(()) => {
            println!("Generated sample configuration file: {}", config_path);
            println!("\nTo use this configuration:");
            println!("  animcode completion.md --config {}", config_path);
            println!("\nSet [target] base_directory to your animation project before running.");
            0
        }
        Err(e) => {
            eprintln!("Failed to generate configuration file: {}", e.user_message());
            if let Some(suggestion) = e.suggestion() {
                eprintln!("Suggestion: {}", suggestion);
            }
            1
        }
    }
}

fn handle_dry_run(animcode: &AnimCode, text: &str) -> i32 {
    let formatter = animcode.output_formatter();

    formatter.info("DRY RUN MODE - No files will be written");

    match animcode.config().base_directory() {
        Some(dir) => formatter.info(&format!("Files would be written under {}", dir.display())),
        None => formatter.warning("No animation server directory is configured"),
    }

    let plan = animcode.plan(text);
    formatter.print_parse_plan(&plan);

    let writable = plan.iter().filter(|(_, decision)| decision.is_write()).count();
    formatter.success(&format!(
        "Dry run completed: {} of {} files would be written",
        writable,
        plan.len()
    ));

    0
}

fn print_startup_error(error: &AnimCodeError) {
    let formatter = OutputFormatter::new(OutputMode::Human, 0, false);
    formatter.print_user_friendly_error(error);
}

fn setup_logging(cli: &Cli) {
    // RUST_LOG wins over the verbosity flags.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use animcode::Config;
    use std::fs;
    use tempfile::TempDir;

    fn cli_with(config: Option<std::path::PathBuf>, generate_config: bool) -> Cli {
        Cli {
            input: None,
            target: None,
            config,
            output_format: animcode::cli::OutputFormat::Plain,
            allow_protected: false,
            protect: None,
            verbose: 0,
            quiet: true,
            no_progress: true,
            dry_run: false,
            generate_config,
        }
    }

    #[test]
    fn test_generate_config_command() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let exit_code = handle_generate_config(&cli_with(Some(config_path.clone()), true));
        assert_eq!(exit_code, 0);

        let content = fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("[protection]"));
    }

    #[test]
    fn test_dry_run_mode() {
        let animcode = AnimCode::new_for_test(Config::default(), OutputMode::Plain, 0, true);

        let exit_code = handle_dry_run(&animcode, "File: a.ts\nconst a = 1;\n");
        assert_eq!(exit_code, 0);
    }

    #[test]
    fn test_read_input_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("completion.md");
        fs::write(&input, "File: a.ts\nx\n").unwrap();

        assert_eq!(read_input(Some(&input)).unwrap(), "File: a.ts\nx\n");

        let error = read_input(Some(&temp_dir.path().join("missing.md"))).unwrap_err();
        assert!(format!("{:#}", error).contains("missing.md"));
    }

    #[test]
    fn test_error_exit_codes() {
        let not_configured = AnimCodeError::BaseDirectoryNotConfigured {
            env_var: "ANIMATION_SERVER_PATH".to_string(),
        };
        let not_found = AnimCodeError::BaseDirectoryNotFound {
            path: "/nowhere".to_string(),
        };

        assert_eq!(exit_code_for_error(&not_configured), 3);
        assert_eq!(exit_code_for_error(&not_found), 4);
        assert_eq!(exit_code_for_error(&AnimCodeError::Cancelled), 130);
        assert_eq!(
            exit_code_for_error(&AnimCodeError::Config {
                message: "bad".to_string()
            }),
            1
        );
    }

    #[test]
    fn test_report_exit_codes() {
        let mut report = WriteReport::new(1);
        assert_eq!(exit_code_for_report(&report), 0);

        report.failures.push(animcode::WriteFailure {
            path: "a.ts/b.ts".to_string(),
            reason: "Not a directory".to_string(),
        });
        assert!(report.has_failures());
        assert_eq!(exit_code_for_report(&report), 2);

        report.cancelled = true;
        assert_eq!(exit_code_for_report(&report), 130);
    }

    #[test]
    fn test_missing_target_checked_before_input() {
        let mut config = Config::default();
        config.target.env_var = "ANIMCODE_TEST_UNSET_VARIABLE".to_string();
        let animcode = AnimCode::new_for_test(config, OutputMode::Json, 0, true);

        let error = animcode.config().resolve_base_directory().unwrap_err();
        assert_eq!(handle_failure(&animcode, &error), 3);
    }
}
