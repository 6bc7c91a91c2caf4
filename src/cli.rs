use crate::config::{CliOverrides, Config};
use crate::error::Result;
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "animcode")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Extract animation source files from LLM output and save them to a project")]
#[command(
    long_about = "animcode reads a chat completion containing `File: <path>` sections, \
                  recovers each file's contents and writes them under the animation \
                  server directory, never touching protected project files."
)]
#[command(before_help = "🎬 animcode - Animation Code Extractor")]
#[command(after_help = "EXAMPLES:\n  \
    animcode completion.md --target ./animation_server\n  \
    cat completion.md | ANIMATION_SERVER_PATH=./animation_server animcode\n  \
    animcode completion.md --dry-run\n  \
    animcode completion.md --output-format json --protect server/,layouts/\n  \
    animcode --generate-config --config animcode.toml")]
pub struct Cli {
    /// Completion text to parse (`-` or omitted reads stdin)
    pub input: Option<PathBuf>,

    /// Animation server directory the files are written under
    #[arg(short, long, help = "Animation server directory (overrides the config file and ANIMATION_SERVER_PATH)")]
    pub target: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, help = "Path to TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub output_format: OutputFormat,

    /// Write protected project files too
    #[arg(long, help = "Disable the protected-file denylist")]
    pub allow_protected: bool,

    /// Additional protected names (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub protect: Option<Vec<String>>,

    /// Verbose output level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Hide the progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Dry run (list recovered files without writing them)
    #[arg(long, help = "Show which files would be written without writing them")]
    pub dry_run: bool,

    /// Generate sample configuration file
    #[arg(long, help = "Generate a sample configuration file")]
    pub generate_config: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON formatted output
    Json,
    /// Plain text output
    Plain,
}

impl Cli {
    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load_with_defaults(self.config.as_ref())?;

        let overrides = self.create_cli_overrides();
        config.merge_with_cli_args(&overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn create_cli_overrides(&self) -> CliOverrides {
        let target = self
            .target
            .as_ref()
            .filter(|t| !t.as_os_str().is_empty())
            .cloned();

        CliOverrides::new()
            .with_target(target)
            .with_allow_protected(self.allow_protected.then_some(true))
            .with_protect(self.protect.clone())
            .with_progress(self.no_progress.then_some(false))
    }

    /// The input file, or `None` when the completion comes from stdin.
    pub fn input_path(&self) -> Option<&Path> {
        self.input
            .as_deref()
            .filter(|path| path.as_os_str() != "-")
    }

    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Default `tracing` filter directive for the chosen verbosity.
    pub fn log_filter(&self) -> &'static str {
        if self.quiet {
            return "animcode=warn";
        }

        match self.verbose {
            0 => "animcode=info",
            1 => "animcode=debug",
            _ => "animcode=trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["animcode"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cli = Cli {
            input: None,
            target: None,
            config: None,
            output_format: OutputFormat::Human,
            allow_protected: false,
            protect: None,
            verbose: 0,
            quiet: false,
            no_progress: false,
            dry_run: false,
            generate_config: false,
        };

        let overrides = cli.create_cli_overrides();
        assert!(overrides.target.is_none());
        assert!(overrides.allow_protected.is_none());
        assert!(overrides.progress.is_none());
        assert!(cli.input_path().is_none());
        assert_eq!(cli.log_filter(), "animcode=info");
    }

    #[test]
    fn test_stdin_dash() {
        let cli = parse(&["-", "--target", "/srv/anim"]);
        assert!(cli.input_path().is_none());

        let cli = parse(&["completion.md", "--target", "/srv/anim"]);
        assert_eq!(cli.input_path(), Some(Path::new("completion.md")));
    }

    #[test]
    fn test_protect_list() {
        let cli = parse(&["--protect", "server/,layouts/", "--allow-protected", "--target", "/x"]);

        assert_eq!(
            cli.protect,
            Some(vec!["server/".to_string(), "layouts/".to_string()])
        );

        let overrides = cli.create_cli_overrides();
        assert_eq!(overrides.allow_protected, Some(true));
        assert_eq!(overrides.target, Some(PathBuf::from("/x")));
    }

    #[test]
    fn test_log_filter_levels() {
        assert_eq!(parse(&["-v", "--target", "/x"]).log_filter(), "animcode=debug");
        assert_eq!(parse(&["-vv", "--target", "/x"]).log_filter(), "animcode=trace");
        assert_eq!(parse(&["-q", "--target", "/x"]).log_filter(), "animcode=warn");
        assert_eq!(parse(&["-q", "--target", "/x"]).verbosity_level(), 0);
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["animcode", "-q", "-v"]).is_err());
    }

    #[test]
    fn test_output_format_values() {
        let cli = parse(&["--output-format", "json", "--target", "/x"]);
        assert!(matches!(cli.output_format, OutputFormat::Json));
        assert!(Cli::try_parse_from(["animcode", "--output-format", "xml"]).is_err());
    }
}
