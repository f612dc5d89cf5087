//! Per-call deadline for scorer probes.
//!
//! Probes are answered by a fixed set of worker threads fed through a bounded
//! queue. A caller waits for its answer until the deadline and then reports
//! [`JiaoduiError::Timeout`]. Requests still queued when their deadline passes
//! are dropped before they reach the inner scorer, and a request already being
//! answered is abandoned through [`MaskedScorer::cancel_in_flight`].

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, SendTimeoutError, Sender, bounded};
use log::{debug, trace};

use crate::error::{JiaoduiError, Result};
use crate::scorer::{MaskedScorer, Prediction};

/// Maximum number of probes waiting for a worker.
const QUEUE_DEPTH: usize = 64;

/// Marks a worker with no request in hand.
const IDLE: u64 = 0;

struct ScoreRequest {
    id: u64,
    sentence: String,
    deadline: Instant,
    reply: Sender<Result<Vec<Prediction>>>,
}

/// A [`MaskedScorer`] that bounds the latency of an inner scorer.
pub struct TimeoutScorer {
    inner: Arc<dyn MaskedScorer>,
    timeout: Duration,
    requests: Sender<ScoreRequest>,
    in_flight: Arc<Vec<AtomicU64>>,
    next_id: AtomicU64,
}

impl TimeoutScorer {
    /// Wrap `inner` with a single worker thread.
    pub fn new(inner: Arc<dyn MaskedScorer>, timeout: Duration) -> Result<Self> {
        Self::with_workers(inner, timeout, 1)
    }

    /// Wrap `inner` with `workers` threads answering probes concurrently.
    pub fn with_workers(
        inner: Arc<dyn MaskedScorer>,
        timeout: Duration,
        workers: usize,
    ) -> Result<Self> {
        let workers = workers.max(1);
        let (sender, receiver) = bounded::<ScoreRequest>(QUEUE_DEPTH);
        let in_flight: Arc<Vec<AtomicU64>> =
            Arc::new((0..workers).map(|_| AtomicU64::new(IDLE)).collect());

        for slot in 0..workers {
            let inner = Arc::clone(&inner);
            let receiver = receiver.clone();
            let in_flight = Arc::clone(&in_flight);
            thread::Builder::new()
                .name(format!("scorer-worker-{slot}"))
                .spawn(move || serve(inner.as_ref(), &receiver, &in_flight[slot]))?;
        }

        Ok(TimeoutScorer {
            inner,
            timeout,
            requests: sender,
            in_flight,
            next_id: AtomicU64::new(IDLE + 1),
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Number of worker threads.
    pub fn workers(&self) -> usize {
        self.in_flight.len()
    }

    fn is_in_flight(&self, id: u64) -> bool {
        self.in_flight
            .iter()
            .any(|slot| slot.load(Ordering::SeqCst) == id)
    }

    fn timed_out(&self, sentence: &str) -> JiaoduiError {
        JiaoduiError::timeout(format!(
            "{} scorer did not answer within {:?} for `{sentence}`",
            self.inner.name(),
            self.timeout
        ))
    }
}

/// Worker loop: answer requests until every sender is gone.
fn serve(inner: &dyn MaskedScorer, requests: &Receiver<ScoreRequest>, slot: &AtomicU64) {
    for request in requests.iter() {
        if Instant::now() >= request.deadline {
            trace!("Dropping expired probe `{}`", request.sentence);
            continue;
        }

        slot.store(request.id, Ordering::SeqCst);
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            inner.score_masked(&request.sentence)
        }))
        .unwrap_or_else(|_| {
            Err(JiaoduiError::scorer(format!(
                "{} scorer panicked on `{}`",
                inner.name(),
                request.sentence
            )))
        });
        slot.store(IDLE, Ordering::SeqCst);

        // The caller may have given up already.
        let _ = request.reply.send(result);
    }
}

impl MaskedScorer for TimeoutScorer {
    fn mask_token(&self) -> &str {
        self.inner.mask_token()
    }

    fn score_masked(&self, sentence: &str) -> Result<Vec<Prediction>> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let deadline = Instant::now() + self.timeout;
        let (reply, answer) = bounded(1);
        let request = ScoreRequest {
            id,
            sentence: sentence.to_string(),
            deadline,
            reply,
        };

        match self.requests.send_timeout(request, self.timeout) {
            Ok(()) => {}
            Err(SendTimeoutError::Timeout(_)) => return Err(self.timed_out(sentence)),
            Err(SendTimeoutError::Disconnected(_)) => {
                return Err(JiaoduiError::scorer("Scorer workers have exited"));
            }
        }

        match answer.recv_deadline(deadline) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                if self.is_in_flight(id) {
                    debug!("Cancelling in-flight probe `{sentence}`");
                    self.inner.cancel_in_flight();
                }
                Err(self.timed_out(sentence))
            }
            // Dropped by a worker that saw it expire.
            Err(RecvTimeoutError::Disconnected) => Err(self.timed_out(sentence)),
        }
    }

    fn cancel_in_flight(&self) {
        self.inner.cancel_in_flight()
    }

    fn name(&self) -> &'static str {
        "timeout"
    }
}
