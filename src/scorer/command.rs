//! Scorer backed by an external fill-mask process.
//!
//! The process is started once and kept alive. Each request is one JSON
//! object per line on its stdin:
//!
//! ```text
//! {"text": "国[MASK]院办公厅"}
//! ```
//!
//! and each response is one JSON line on its stdout, either an array of
//! predictions or an error object:
//!
//! ```text
//! [{"token_str": "务", "score": 0.97}, {"token_str": "家", "score": 0.01}]
//! {"error": "sequence too long"}
//! ```
//!
//! Prediction objects may use `token_str`/`score` (fill-mask pipeline output,
//! where `token` is a vocabulary id) or `token`/`probability`.

use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Context;
use log::{debug, trace};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::{JiaoduiError, Result};
use crate::scorer::{MaskedScorer, Prediction};

#[derive(Serialize)]
struct ScoreRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ScoreResponse {
    Predictions(Vec<WirePrediction>),
    Error { error: String },
}

#[derive(Deserialize)]
struct WirePrediction {
    #[serde(default)]
    token_str: Option<String>,
    #[serde(default)]
    token: Option<serde_json::Value>,
    #[serde(alias = "probability")]
    score: f64,
}

impl WirePrediction {
    fn into_prediction(self) -> Option<Prediction> {
        let token = match (self.token_str, self.token) {
            (Some(token_str), _) => token_str,
            (None, Some(serde_json::Value::String(token))) => token,
            _ => return None,
        };
        Some(Prediction::new(token, self.score))
    }
}

struct ScorerIo {
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

/// A [`MaskedScorer`] that forwards probes to a long-running child process.
///
/// The process is restarted on the next call after a transport failure or
/// after [`MaskedScorer::cancel_in_flight`] killed it.
pub struct CommandScorer {
    program: String,
    args: Vec<String>,
    mask_token: String,
    io: Mutex<ScorerIo>,
    child: Mutex<Child>,
    stale: AtomicBool,
}

fn start_process(program: &str, args: &[String]) -> Result<(Child, ScorerIo)> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
        .with_context(|| format!("Failed to spawn scorer process `{program}`"))?;

    let stdin = child
        .stdin
        .take()
        .ok_or_else(|| JiaoduiError::scorer("Scorer process has no stdin"))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| JiaoduiError::scorer("Scorer process has no stdout"))?;

    debug!("Spawned scorer process `{program}` (pid {})", child.id());

    Ok((
        child,
        ScorerIo {
            stdin,
            stdout: BufReader::new(stdout),
        },
    ))
}

impl CommandScorer {
    /// Start `program` with `args` and talk to it over its standard streams.
    pub fn spawn<S: AsRef<str>>(program: &str, args: &[S], mask_token: String) -> Result<Self> {
        let args: Vec<String> = args.iter().map(|a| a.as_ref().to_string()).collect();
        let (child, io) = start_process(program, &args)?;

        Ok(CommandScorer {
            program: program.to_string(),
            args,
            mask_token,
            io: Mutex::new(io),
            child: Mutex::new(child),
            stale: AtomicBool::new(false),
        })
    }

    /// Replace the child process. The caller holds the I/O lock.
    fn restart(&self, io: &mut ScorerIo) -> Result<()> {
        let (child, fresh) = start_process(&self.program, &self.args)?;
        *io = fresh;
        let mut old = std::mem::replace(&mut *self.child.lock(), child);
        let _ = old.kill();
        let _ = old.wait();
        debug!("Restarted scorer process `{}`", self.program);
        Ok(())
    }

    fn exchange(&self, io: &mut ScorerIo, sentence: &str) -> Result<ScoreResponse> {
        let mut request = serde_json::to_string(&ScoreRequest { text: sentence })?;
        request.push('\n');
        trace!("-> {}: {}", self.program, request.trim_end());
        io.stdin.write_all(request.as_bytes())?;
        io.stdin.flush()?;

        let mut line = String::new();
        if io.stdout.read_line(&mut line)? == 0 {
            return Err(JiaoduiError::scorer(format!(
                "Scorer process `{}` closed its output",
                self.program
            )));
        }
        trace!("<- {}: {}", self.program, line.trim_end());

        Ok(serde_json::from_str::<ScoreResponse>(line.trim_end())?)
    }
}

impl MaskedScorer for CommandScorer {
    fn mask_token(&self) -> &str {
        &self.mask_token
    }

    fn score_masked(&self, sentence: &str) -> Result<Vec<Prediction>> {
        let mut io = self.io.lock();
        if self.stale.swap(false, Ordering::SeqCst) {
            self.restart(&mut io)?;
        }

        let response = self.exchange(&mut io, sentence).inspect_err(|_| {
            self.stale.store(true, Ordering::SeqCst);
        })?;

        match response {
            ScoreResponse::Predictions(predictions) => Ok(predictions
                .into_iter()
                .filter_map(WirePrediction::into_prediction)
                .collect()),
            ScoreResponse::Error { error } => Err(JiaoduiError::scorer(error)),
        }
    }

    fn cancel_in_flight(&self) {
        self.stale.store(true, Ordering::SeqCst);
        let mut child = self.child.lock();
        debug!("Killing scorer process `{}` (pid {})", self.program, child.id());
        let _ = child.kill();
    }

    fn name(&self) -> &'static str {
        "command"
    }
}

impl Drop for CommandScorer {
    fn drop(&mut self) {
        let child = self.child.get_mut();
        let _ = child.kill();
        let _ = child.wait();
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use super::*;
    use crate::scorer::TimeoutScorer;

    fn shell_scorer(script: &str) -> CommandScorer {
        CommandScorer::spawn("sh", &["-c", script], "[MASK]".to_string()).unwrap()
    }

    #[test]
    fn test_pipeline_style_response() {
        let scorer = shell_scorer(
            r#"while read line; do echo '[{"token": 1234, "token_str": "务", "score": 0.97}, {"token_str": "家", "score": 0.01}]'; done"#,
        );

        let predictions = scorer.score_masked("国[MASK]院").unwrap();
        assert_eq!(
            predictions,
            vec![Prediction::new("务", 0.97), Prediction::new("家", 0.01)]
        );

        // The process stays alive between probes.
        assert_eq!(scorer.score_masked("国务[MASK]").unwrap().len(), 2);
    }

    #[test]
    fn test_plain_response() {
        let scorer = shell_scorer(
            r#"while read line; do echo '[{"token": "务", "probability": 0.5}]'; done"#,
        );
        let predictions = scorer.score_masked("国[MASK]院").unwrap();
        assert_eq!(predictions, vec![Prediction::new("务", 0.5)]);
    }

    #[test]
    fn test_error_response() {
        let scorer =
            shell_scorer(r#"while read line; do echo '{"error": "sequence too long"}'; done"#);
        let err = scorer.score_masked("国[MASK]院").unwrap_err();
        assert_eq!(err.to_string(), "Scorer error: sequence too long");
    }

    #[test]
    fn test_closed_output() {
        let scorer = shell_scorer("exit 0");
        assert!(scorer.score_masked("国[MASK]院").is_err());
    }

    #[test]
    fn test_closed_output_restarts_process() {
        let scorer = shell_scorer(
            r#"read line; echo '[{"token": "务", "probability": 0.5}]'; read line; exit 0"#,
        );
        assert!(scorer.score_masked("国[MASK]院").is_ok());
        assert!(scorer.score_masked("国务[MASK]").is_err());
        assert!(scorer.score_masked("[MASK]务院").is_ok());
    }

    #[test]
    fn test_timed_out_call_kills_and_restarts_process() {
        let scorer = Arc::new(shell_scorer(
            r#"while read line; do case "$line" in *慢*) read stuck ;; *) echo '[{"token": "务", "probability": 0.5}]' ;; esac; done"#,
        ));
        let bounded = TimeoutScorer::new(scorer, Duration::from_millis(200)).unwrap();

        for _ in 0..3 {
            let err = bounded.score_masked("慢[MASK]院").unwrap_err();
            assert!(matches!(err, JiaoduiError::Timeout(_)));
        }

        let started = Instant::now();
        let answer = loop {
            match bounded.score_masked("国[MASK]院") {
                Ok(predictions) => break predictions,
                Err(_) => assert!(started.elapsed() < Duration::from_secs(5)),
            }
        };
        assert_eq!(answer, vec![Prediction::new("务", 0.5)]);
    }

    #[test]
    fn test_spawn_failure() {
        let result = CommandScorer::spawn::<&str>(
            "/nonexistent/jiaodui-scorer",
            &[],
            "[MASK]".to_string(),
        );
        assert!(matches!(result, Err(JiaoduiError::Anyhow(_))));
    }
}
