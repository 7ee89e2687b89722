use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "testverdict")]
#[command(about = "Decide whether a failing test or the code under test is wrong", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Correlate tests with source methods and classify each pair
    Analyze {
        /// Files or directories to analyze; the first must exist
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip the AI bridge even when it is configured
        #[arg(long = "no-ai", env = "TESTVERDICT_NO_AI")]
        no_ai: bool,

        /// Drop pairs whose correlation confidence is below this value
        #[arg(long = "min-confidence")]
        min_confidence: Option<f64>,

        /// Run the project's tests first and use real failure messages
        #[arg(long = "run-tests")]
        run_tests: bool,

        /// Include the full per-pair analysis in JSON output
        #[arg(long)]
        detailed: bool,

        /// Gitignore-style globs to skip
        #[arg(long, value_delimiter = ',')]
        exclude: Vec<String>,

        /// Explicit configuration file instead of searching for .testverdict.toml
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Increase verbosity level (can be repeated: -v, -vv)
        #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
        verbosity: u8,
    },

    /// Report assertion weak spots found by static mutation analysis
    Mutations {
        /// Files or directories to analyze; the first must exist
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Drop pairs whose correlation confidence is below this value
        #[arg(long = "min-confidence")]
        min_confidence: Option<f64>,

        /// Gitignore-style globs to skip
        #[arg(long, value_delimiter = ',')]
        exclude: Vec<String>,

        /// Explicit configuration file instead of searching for .testverdict.toml
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Increase verbosity level (can be repeated: -v, -vv)
        #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
        verbosity: u8,
    },

    /// Write a default .testverdict.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
}

pub fn parse_args() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing_analyze_command() {
        let cli = Cli::try_parse_from([
            "testverdict",
            "analyze",
            "src",
            "tests",
            "--format",
            "json",
            "--no-ai",
            "--min-confidence",
            "0.8",
            "--exclude",
            "vendor/**,dist/**",
            "-vv",
        ])
        .unwrap();

        match cli.command {
            Commands::Analyze {
                paths,
                format,
                no_ai,
                min_confidence,
                exclude,
                verbosity,
                run_tests,
                ..
            } => {
                assert_eq!(paths, vec![PathBuf::from("src"), PathBuf::from("tests")]);
                assert_eq!(format, OutputFormat::Json);
                assert!(no_ai);
                assert!(!run_tests);
                assert_eq!(min_confidence, Some(0.8));
                assert_eq!(exclude, vec!["vendor/**".to_string(), "dist/**".to_string()]);
                assert_eq!(verbosity, 2);
            }
            _ => panic!("Expected Analyze command"),
        }
    }

    #[test]
    fn test_analyze_requires_a_path() {
        assert!(Cli::try_parse_from(["testverdict", "analyze"]).is_err());
    }

    #[test]
    fn test_cli_parsing_mutations_defaults() {
        let cli = Cli::try_parse_from(["testverdict", "mutations", "src/Calc.java"]).unwrap();
        match cli.command {
            Commands::Mutations { format, output, .. } => {
                assert_eq!(format, OutputFormat::Table);
                assert!(output.is_none());
            }
            _ => panic!("Expected Mutations command"),
        }
    }

    #[test]
    fn test_cli_parsing_init_command() {
        let cli = Cli::try_parse_from(["testverdict", "init", "--force"]).unwrap();
        match cli.command {
            Commands::Init { force } => assert!(force),
            _ => panic!("Expected Init command"),
        }
    }
}
