//! Output formatting for CLI commands.

use serde::{Deserialize, Serialize};

use crate::cli::args::{JiaoduiArgs, OutputFormat};
use crate::confusion::StoreStats;
use crate::error::Result;
use crate::spelling::{BlockFailure, CorrectionResult, Edit};

/// Correction of one input sentence.
#[derive(Debug, Serialize, Deserialize)]
pub struct SentenceCorrection {
    pub text: String,
    pub corrected_text: String,
    pub edits: Vec<Edit>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_blocks: Vec<BlockFailure>,
}

impl SentenceCorrection {
    pub fn new(text: String, result: CorrectionResult) -> Self {
        SentenceCorrection {
            text,
            corrected_text: result.corrected_text,
            edits: result.edits,
            failed_blocks: result.failed_blocks,
        }
    }
}

/// Result structure for the correct command.
#[derive(Debug, Serialize, Deserialize)]
pub struct CorrectionReport {
    pub sentences: Vec<SentenceCorrection>,
    pub total_edits: usize,
    pub duration_ms: u64,
}

/// Result structure for the candidates command.
#[derive(Debug, Serialize, Deserialize)]
pub struct CandidateList {
    pub word: String,
    pub fragment: usize,
    pub candidates: Vec<String>,
}

/// Anything the CLI can print in human form.
pub trait HumanOutput {
    fn print_human(&self, args: &JiaoduiArgs);
}

impl HumanOutput for CorrectionReport {
    fn print_human(&self, args: &JiaoduiArgs) {
        for sentence in &self.sentences {
            println!("{}", sentence.corrected_text);
            if args.verbosity() > 1 || !sentence.edits.is_empty() {
                println!("  original: {}", sentence.text);
                for edit in &sentence.edits {
                    println!("  {edit}");
                }
            }
            for failure in &sentence.failed_blocks {
                println!(
                    "  uncorrected block {} at {}: {} ({})",
                    failure.block_index, failure.start, failure.text, failure.error
                );
            }
        }

        if args.verbosity() > 1 {
            println!();
            println!("Sentences: {}", self.sentences.len());
            println!("Edits: {}", self.total_edits);
            println!("Time: {}ms", self.duration_ms);
        }
    }
}

impl HumanOutput for CandidateList {
    fn print_human(&self, _args: &JiaoduiArgs) {
        println!("Candidates for {}:", self.word);
        println!("════════════════");
        if self.candidates.is_empty() {
            println!("(none)");
        }
        for (rank, candidate) in self.candidates.iter().enumerate() {
            println!("{:>3}. {candidate}", rank + 1);
        }
    }
}

impl HumanOutput for StoreStats {
    fn print_human(&self, _args: &JiaoduiArgs) {
        println!("Dictionary Statistics:");
        println!("═════════════════════");
        println!("Common characters: {}", self.common_chars);
        println!("Custom confusions: {}", self.custom_confusions);
        println!("Words with frequency: {}", self.words);
        println!("Same-pinyin groups: {}", self.same_pinyin);
        println!("Same-stroke groups: {}", self.same_stroke);
    }
}

/// Output a result in the specified format.
pub fn output_result<T>(message: &str, result: &T, args: &JiaoduiArgs) -> Result<()>
where
    T: Serialize + HumanOutput,
{
    match args.output_format {
        OutputFormat::Human => {
            if args.verbosity() > 2 {
                println!("{message}");
                println!();
            }
            result.print_human(args);
            Ok(())
        }
        OutputFormat::Json => output_json(result, args),
    }
}

/// Output in JSON format.
fn output_json<T: Serialize>(result: &T, args: &JiaoduiArgs) -> Result<()> {
    println!("{}", to_json(result, args.pretty)?);
    Ok(())
}

fn to_json<T: Serialize>(result: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };
    Ok(json)
}
