//! Command implementations for the Jiaodui CLI.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use log::{debug, info};

use crate::cli::args::*;
use crate::cli::output::*;
use crate::config::{AppConfig, FailurePolicy, ScorerBackend};
use crate::confusion::ConfusionStore;
use crate::error::{JiaoduiError, Result};
use crate::scorer::{self, MaskedScorer};
use crate::spelling::{CandidateGenerator, CorrectionEngine};

/// Execute a CLI command.
pub fn execute_command(args: JiaoduiArgs) -> Result<()> {
    let config = load_config(&args)?;
    match &args.command {
        Command::Correct(correct_args) => correct_text(correct_args.clone(), config, &args),
        Command::Candidates(candidates_args) => {
            list_candidates(candidates_args.clone(), config, &args)
        }
        Command::Inspect(inspect_args) => inspect_store(inspect_args.clone(), config, &args),
    }
}

fn load_config(args: &JiaoduiArgs) -> Result<AppConfig> {
    match &args.config {
        Some(path) => {
            debug!("Loading configuration from {}", path.display());
            AppConfig::from_file(path)
        }
        None => Ok(AppConfig::default()),
    }
}

/// Apply command line overrides on top of the configuration file.
fn apply_correct_overrides(args: &CorrectArgs, config: &mut AppConfig) {
    if let Some(data_dir) = &args.data_dir {
        config.data_dir = Some(data_dir.clone());
    }

    if let Some(program) = &args.scorer_command {
        config.scorer.backend = Some(ScorerBackend::Command {
            program: program.clone(),
            args: args.scorer_args.clone(),
        });
    } else if let Some(path) = &args.fixture {
        config.scorer.backend = Some(ScorerBackend::Fixture { path: path.clone() });
    }
    if let Some(mask_token) = &args.mask_token {
        config.scorer.mask_token = mask_token.clone();
    }
    if args.timeout_ms.is_some() {
        config.scorer.timeout_ms = args.timeout_ms;
    }
    if args.cache_capacity.is_some() {
        config.scorer.cache_capacity = args.cache_capacity;
    }

    let corrector = &mut config.corrector;
    if args.parallel {
        corrector.parallel_blocks = true;
    }
    if args.threads.is_some() {
        corrector.num_threads = args.threads;
    }
    if args.abort_on_failure {
        corrector.failure_policy = FailurePolicy::AbortCall;
    }
    if args.max_block_chars.is_some() {
        corrector.max_block_chars = args.max_block_chars;
    }
}

fn resolve_data_dir(cli_dir: Option<PathBuf>, config: &AppConfig) -> Result<PathBuf> {
    cli_dir.or_else(|| config.data_dir.clone()).ok_or_else(|| {
        JiaoduiError::config(
            "No data directory given. Use --data-dir or set data_dir in the config file.",
        )
    })
}

fn load_store(data_dir: &Path, cli_args: &JiaoduiArgs) -> Result<Arc<ConfusionStore>> {
    if cli_args.verbosity() > 1 {
        println!("Loading dictionaries from: {}", data_dir.display());
    }
    Ok(Arc::new(ConfusionStore::load_from_dir(data_dir)?))
}

/// Collect sentences from the arguments, a file or stdin.
fn read_sentences(args: &CorrectArgs) -> Result<Vec<String>> {
    if !args.texts.is_empty() {
        return Ok(args.texts.clone());
    }

    match &args.file {
        Some(path) => {
            let file = File::open(path).map_err(|e| {
                JiaoduiError::invalid_argument(format!("Cannot open {}: {e}", path.display()))
            })?;
            let lines: Vec<String> = BufReader::new(file).lines().collect::<io::Result<_>>()?;
            Ok(lines
                .into_iter()
                .map(|line| line.trim().to_string())
                .filter(|line| !line.is_empty())
                .collect())
        }
        None => read_typed_sentences(io::stdin().lock()),
    }
}

/// Sentences typed at a prompt: every line is split on `。`, and a line
/// holding only `q` ends the input.
fn read_typed_sentences<R: BufRead>(reader: R) -> Result<Vec<String>> {
    let mut sentences = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line == "q" {
            break;
        }
        sentences.extend(
            line.split('。')
                .map(str::trim)
                .filter(|sentence| !sentence.is_empty())
                .map(str::to_string),
        );
    }
    Ok(sentences)
}

/// Correct sentences.
fn correct_text(args: CorrectArgs, mut config: AppConfig, cli_args: &JiaoduiArgs) -> Result<()> {
    apply_correct_overrides(&args, &mut config);

    let data_dir = resolve_data_dir(None, &config)?;
    let store = load_store(&data_dir, cli_args)?;
    let scorer = scorer::from_config(&config.scorer)?;
    let engine = CorrectionEngine::with_config(store, scorer, config.corrector)?;
    info!("Using {} scorer", engine.scorer().name());
    debug!("Corrector configuration: {:?}", engine.config());

    let sentences = read_sentences(&args)?;

    let start_time = Instant::now();
    let mut corrections = Vec::with_capacity(sentences.len());
    for sentence in sentences {
        let result = engine.correct(&sentence)?;
        corrections.push(SentenceCorrection::new(sentence, result));
    }
    let duration = start_time.elapsed();

    let total_edits = corrections.iter().map(|c| c.edits.len()).sum();
    output_result(
        "Correction finished",
        &CorrectionReport {
            sentences: corrections,
            total_edits,
            duration_ms: duration.as_millis() as u64,
        },
        cli_args,
    )
}

/// List candidates of a word.
fn list_candidates(args: CandidatesArgs, config: AppConfig, cli_args: &JiaoduiArgs) -> Result<()> {
    let data_dir = resolve_data_dir(args.data_dir, &config)?;
    let generator = CandidateGenerator::new(load_store(&data_dir, cli_args)?);
    let candidates = generator.generate_candidate_fragment(&args.word, args.fragment)?;

    output_result(
        "Candidates generated",
        &CandidateList {
            word: args.word,
            fragment: args.fragment,
            candidates,
        },
        cli_args,
    )
}

/// Show dictionary statistics.
fn inspect_store(args: InspectArgs, config: AppConfig, cli_args: &JiaoduiArgs) -> Result<()> {
    let data_dir = resolve_data_dir(args.data_dir, &config)?;
    let store = load_store(&data_dir, cli_args)?;
    output_result("Dictionary statistics", &store.stats(), cli_args)
}
