//! Command line argument parsing for the Jiaodui CLI using clap.

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Jiaodui - Chinese spelling correction driven by a masked language model
#[derive(Parser, Debug, Clone)]
#[command(name = "jiaodui")]
#[command(about = "Character-level spelling correction for Chinese text")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "Jiaodui Contributors")]
#[command(long_about = None)]
pub struct JiaoduiArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Configuration file (JSON)
    #[arg(short, long, value_name = "CONFIG_FILE", env = "JIAODUI_CONFIG")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl JiaoduiArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1, // Default to normal
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Correct sentences
    Correct(CorrectArgs),

    /// List the confusion candidates of a word
    Candidates(CandidatesArgs),

    /// Show dictionary statistics
    Inspect(InspectArgs),
}

/// Arguments for correcting text
#[derive(Parser, Debug, Clone)]
pub struct CorrectArgs {
    /// Sentences to correct (read from --file or stdin when empty)
    #[arg(value_name = "TEXT")]
    pub texts: Vec<String>,

    /// File with one sentence per line
    #[arg(long, value_name = "FILE", conflicts_with = "texts")]
    pub file: Option<PathBuf>,

    /// Directory holding the dictionary files
    #[arg(short, long, value_name = "DATA_DIR", env = "JIAODUI_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Scorer program speaking JSON lines on stdin/stdout
    #[arg(long, value_name = "PROGRAM", conflicts_with = "fixture")]
    pub scorer_command: Option<String>,

    /// Argument passed to the scorer program (repeatable)
    #[arg(long = "scorer-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub scorer_args: Vec<String>,

    /// JSON file of recorded predictions used as scorer
    #[arg(long, value_name = "FIXTURE_FILE")]
    pub fixture: Option<PathBuf>,

    /// Mask marker understood by the scorer
    #[arg(long)]
    pub mask_token: Option<String>,

    /// Per-probe deadline in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Memoize up to this many probes
    #[arg(long)]
    pub cache_capacity: Option<usize>,

    /// Correct blocks in parallel
    #[arg(long)]
    pub parallel: bool,

    /// Number of threads for parallel correction
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Fail the whole sentence when a block cannot be scored
    #[arg(long)]
    pub abort_on_failure: bool,

    /// Cut blocks longer than this many characters
    #[arg(long)]
    pub max_block_chars: Option<usize>,
}

/// Arguments for listing candidates
#[derive(Parser, Debug, Clone)]
pub struct CandidatesArgs {
    /// Word or character to look up
    #[arg(value_name = "WORD")]
    pub word: String,

    /// Keep only the first `count / fragment + 1` candidates
    #[arg(long, default_value = "1")]
    pub fragment: usize,

    /// Directory holding the dictionary files
    #[arg(short, long, value_name = "DATA_DIR", env = "JIAODUI_DATA_DIR")]
    pub data_dir: Option<PathBuf>,
}

/// Arguments for dictionary statistics
#[derive(Parser, Debug, Clone)]
pub struct InspectArgs {
    /// Directory holding the dictionary files
    #[arg(short, long, value_name = "DATA_DIR", env = "JIAODUI_DATA_DIR")]
    pub data_dir: Option<PathBuf>,
}

/// Output formats for CLI
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_correct_command() {
        let args = JiaoduiArgs::try_parse_from([
            "jiaodui",
            "correct",
            "国物院办公厅",
            "少先队员因该为老人让坐",
            "--data-dir",
            "/srv/jiaodui",
            "--scorer-command",
            "python3",
            "--scorer-arg",
            "fill_mask.py",
            "--parallel",
        ])
        .unwrap();

        if let Command::Correct(correct_args) = args.command {
            assert_eq!(correct_args.texts.len(), 2);
            assert_eq!(correct_args.data_dir, Some(PathBuf::from("/srv/jiaodui")));
            assert_eq!(correct_args.scorer_command.as_deref(), Some("python3"));
            assert_eq!(correct_args.scorer_args, vec!["fill_mask.py"]);
            assert!(correct_args.parallel);
            assert!(!correct_args.abort_on_failure);
        } else {
            panic!("Expected Correct command");
        }
    }

    #[test]
    fn test_scorer_sources_conflict() {
        let result = JiaoduiArgs::try_parse_from([
            "jiaodui",
            "correct",
            "国物院",
            "--scorer-command",
            "python3",
            "--fixture",
            "probes.json",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_candidates_command() {
        let args = JiaoduiArgs::try_parse_from([
            "jiaodui",
            "candidates",
            "物",
            "--fragment",
            "3",
            "-d",
            "data",
        ])
        .unwrap();

        if let Command::Candidates(candidates_args) = args.command {
            assert_eq!(candidates_args.word, "物");
            assert_eq!(candidates_args.fragment, 3);
            assert_eq!(candidates_args.data_dir, Some(PathBuf::from("data")));
        } else {
            panic!("Expected Candidates command");
        }
    }

    #[test]
    fn test_verbosity_levels() {
        // Default verbosity
        let args = JiaoduiArgs::try_parse_from(["jiaodui", "inspect"]).unwrap();
        assert_eq!(args.verbosity(), 1);

        // Multiple verbose flags
        let args = JiaoduiArgs::try_parse_from(["jiaodui", "-vv", "inspect"]).unwrap();
        assert_eq!(args.verbosity(), 2);

        // Quiet flag
        let args = JiaoduiArgs::try_parse_from(["jiaodui", "-vvv", "--quiet", "inspect"]).unwrap();
        assert_eq!(args.verbosity(), 0);
    }

    #[test]
    fn test_output_format() {
        let args =
            JiaoduiArgs::try_parse_from(["jiaodui", "--format", "json", "--pretty", "inspect"])
                .unwrap();
        assert_eq!(args.output_format, OutputFormat::Json);
        assert!(args.pretty);
    }
}
