//! Batch evaluation: many resumes against one already-extracted job profile.
//!
//! Items run on a `JoinSet` bounded by a semaphore. Dispatch stops when the cancel flag
//! flips or the deadline passes; items already running finish, the rest come back
//! `CANCELLED`. One failing resume never affects the others.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{warn, Instrument};

use crate::errors::AppError;
use crate::extraction::ProfileExtractor;
use crate::screening::models::JobProfile;
use crate::screening::pipeline::{evaluate_resume, Evaluation, ResumeUpload};

pub const CANCELLED_CODE: &str = "CANCELLED";

#[derive(Debug, Clone, Copy)]
pub struct BatchOptions {
    pub concurrency: usize,
    pub deadline: Duration,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemError {
    pub code: String,
    pub message: String,
}

impl From<&AppError> for ItemError {
    fn from(err: &AppError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.public_message(),
        }
    }
}

#[derive(Debug)]
pub enum ItemOutcome {
    Evaluated(Evaluation),
    Failed(ItemError),
    Cancelled,
}

#[derive(Debug)]
pub struct BatchItem {
    /// Position in the upload.
    pub index: usize,
    pub filename: String,
    /// 1-based, successes only.
    pub rank: Option<usize>,
    pub outcome: ItemOutcome,
}

#[derive(Debug)]
pub struct BatchReport {
    /// Ranked successes first, then failures and cancellations in upload order.
    pub items: Vec<BatchItem>,
    pub succeeded: usize,
    pub failed: usize,
    pub cancelled: usize,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.items.len()
    }
}

pub async fn run_batch(
    extractor: Arc<dyn ProfileExtractor>,
    job: Arc<JobProfile>,
    resumes: Vec<ResumeUpload>,
    options: BatchOptions,
    request_id: &str,
    mut cancel: watch::Receiver<bool>,
) -> BatchReport {
    let filenames: Vec<String> = resumes.iter().map(|r| r.filename.clone()).collect();
    let mut outcomes: Vec<Option<ItemOutcome>> = filenames.iter().map(|_| None).collect();

    let semaphore = Arc::new(Semaphore::new(options.concurrency.max(1)));
    let deadline = Instant::now() + options.deadline;
    let request_id: Arc<str> = Arc::from(request_id);
    let span = tracing::Span::current();
    let mut set = JoinSet::new();

    for (index, upload) in resumes.into_iter().enumerate() {
        if Instant::now() >= deadline {
            warn!(%request_id, index, "Batch deadline reached, no further resumes dispatched");
            break;
        }
        let permit = tokio::select! {
            biased;
            _ = wait_cancelled(&mut cancel) => {
                warn!(%request_id, index, "Batch cancelled, no further resumes dispatched");
                break;
            }
            _ = tokio::time::sleep_until(deadline) => {
                warn!(%request_id, index, "Batch deadline reached, no further resumes dispatched");
                break;
            }
            permit = semaphore.clone().acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => break,
            },
        };

        let extractor = Arc::clone(&extractor);
        let job = Arc::clone(&job);
        let max_bytes = options.max_upload_bytes;
        let task_span = span.clone();
        let item_request_id = Arc::clone(&request_id);
        set.spawn(async move {
            let _permit = permit;
            // Nested spawn so a panic is reported against this item.
            let handle = tokio::spawn(
                async move {
                    evaluate_resume(extractor.as_ref(), &job, upload, max_bytes, &item_request_id).await
                }
                .instrument(task_span),
            );
            let outcome = match handle.await {
                Ok(Ok(evaluation)) => ItemOutcome::Evaluated(evaluation),
                Ok(Err(err)) => ItemOutcome::Failed(ItemError::from(&err)),
                Err(join_err) => {
                    warn!(index, error = %join_err, "Batch item task failed");
                    ItemOutcome::Failed(ItemError {
                        code: "INTERNAL_ERROR".to_string(),
                        message: "An internal server error occurred".to_string(),
                    })
                }
            };
            (index, outcome)
        });
    }

    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((index, outcome)) => outcomes[index] = Some(outcome),
            Err(e) => warn!(error = %e, "Batch worker failed to join"),
        }
    }

    rank(filenames, outcomes)
}

/// Resolves once the flag is set. A dropped sender means the batch can no longer be cancelled.
async fn wait_cancelled(cancel: &mut watch::Receiver<bool>) {
    loop {
        if *cancel.borrow_and_update() {
            return;
        }
        if cancel.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

fn rank(filenames: Vec<String>, outcomes: Vec<Option<ItemOutcome>>) -> BatchReport {
    let mut successes = Vec::new();
    let mut rest = Vec::new();

    for (index, (filename, outcome)) in filenames.into_iter().zip(outcomes).enumerate() {
        let item = BatchItem {
            index,
            filename,
            rank: None,
            outcome: outcome.unwrap_or(ItemOutcome::Cancelled),
        };
        match item.outcome {
            ItemOutcome::Evaluated(_) => successes.push(item),
            _ => rest.push(item),
        }
    }

    // Stable: equal scores keep upload order.
    successes.sort_by(|a, b| score_of(b).total_cmp(&score_of(a)));
    for (i, item) in successes.iter_mut().enumerate() {
        item.rank = Some(i + 1);
    }

    let succeeded = successes.len();
    let cancelled = rest
        .iter()
        .filter(|i| matches!(i.outcome, ItemOutcome::Cancelled))
        .count();
    let failed = rest.len() - cancelled;

    successes.extend(rest);
    BatchReport {
        items: successes,
        succeeded,
        failed,
        cancelled,
    }
}

fn score_of(item: &BatchItem) -> f64 {
    match &item.outcome {
        ItemOutcome::Evaluated(e) => e.result.final_score,
        _ => f64::NEG_INFINITY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::RuleBasedExtractor;
    use crate::screening::models::CandidateProfile;
    use crate::screening::pipeline::analyze_job_description;
    use crate::screening::pipeline::fixtures::{JD, RESUME, WEAK_RESUME};
    use async_trait::async_trait;
    use bytes::Bytes;

    fn upload(name: &str, text: &str) -> ResumeUpload {
        ResumeUpload {
            filename: name.to_string(),
            data: Bytes::from(text.to_string()),
        }
    }

    fn options() -> BatchOptions {
        BatchOptions {
            concurrency: 2,
            deadline: Duration::from_secs(60),
            max_upload_bytes: 1 << 20,
        }
    }

    async fn job() -> Arc<JobProfile> {
        Arc::new(analyze_job_description(&RuleBasedExtractor, JD).await.unwrap())
    }

    fn evaluated(item: &BatchItem) -> &Evaluation {
        match &item.outcome {
            ItemOutcome::Evaluated(e) => e,
            other => panic!("expected evaluation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_batch_ranks_by_score_with_partial_failure() {
        let (_tx, rx) = watch::channel(false);
        let resumes = vec![
            upload("weak.txt", WEAK_RESUME),
            upload("photo.png", RESUME),
            upload("strong.txt", RESUME),
        ];
        let report = run_batch(Arc::new(RuleBasedExtractor), job().await, resumes, options(), "req-batch", rx).await;

        assert_eq!(report.total(), 3);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.cancelled, 0);

        assert_eq!(report.items[0].filename, "strong.txt");
        assert_eq!(report.items[0].rank, Some(1));
        assert_eq!(report.items[1].filename, "weak.txt");
        assert_eq!(report.items[1].rank, Some(2));
        assert!(evaluated(&report.items[0]).result.final_score > evaluated(&report.items[1]).result.final_score);

        let failure = &report.items[2];
        assert_eq!(failure.index, 1);
        assert_eq!(failure.rank, None);
        assert!(matches!(&failure.outcome, ItemOutcome::Failed(e) if e.code == "VALIDATION_ERROR"));
    }

    #[tokio::test]
    async fn test_equal_scores_keep_upload_order() {
        let (_tx, rx) = watch::channel(false);
        let resumes = vec![upload("a.txt", RESUME), upload("b.txt", RESUME), upload("c.txt", RESUME)];
        let report = run_batch(Arc::new(RuleBasedExtractor), job().await, resumes, options(), "req-batch", rx).await;
        let names: Vec<&str> = report.items.iter().map(|i| i.filename.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "b.txt", "c.txt"]);
        assert_eq!(report.items[2].rank, Some(3));
    }

    #[tokio::test]
    async fn test_batch_equals_single_evaluation() {
        let job = job().await;
        let single = evaluate_resume(&RuleBasedExtractor, &job, upload("r.txt", RESUME), 1 << 20, "req-single")
            .await
            .unwrap();

        let (_tx, rx) = watch::channel(false);
        let resumes = vec![upload("w.txt", WEAK_RESUME), upload("r.txt", RESUME)];
        let report = run_batch(Arc::new(RuleBasedExtractor), job, resumes, options(), "req-batch", rx).await;
        let in_batch = report.items.iter().find(|i| i.filename == "r.txt").unwrap();
        assert_eq!(evaluated(in_batch).result, single.result);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_dispatches_nothing() {
        let (_tx, rx) = watch::channel(true);
        let resumes = vec![upload("a.txt", RESUME), upload("b.txt", RESUME)];
        let report = run_batch(Arc::new(RuleBasedExtractor), job().await, resumes, options(), "req-batch", rx).await;
        assert_eq!(report.cancelled, 2);
        assert_eq!(report.succeeded, 0);
        assert!(report.items.iter().all(|i| matches!(i.outcome, ItemOutcome::Cancelled)));
    }

    #[tokio::test]
    async fn test_elapsed_deadline_dispatches_nothing() {
        let (_tx, rx) = watch::channel(false);
        let opts = BatchOptions {
            deadline: Duration::ZERO,
            ..options()
        };
        let report = run_batch(Arc::new(RuleBasedExtractor), job().await, vec![upload("a.txt", RESUME)], opts, "req-batch", rx).await;
        assert_eq!(report.cancelled, 1);
    }

    /// Collects formatted log output for assertions.
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_item_logs_carry_request_id_outside_request_span() {
        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let (_tx, rx) = watch::channel(false);
        let resumes = vec![upload("a.txt", RESUME), upload("b.txt", WEAK_RESUME)];
        let report = run_batch(Arc::new(RuleBasedExtractor), job().await, resumes, options(), "req-batch-7", rx).await;
        assert_eq!(report.succeeded, 2);

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        let evaluated: Vec<&str> = output.lines().filter(|l| l.contains("Resume evaluated")).collect();
        assert_eq!(evaluated.len(), 2, "{output}");
        assert!(evaluated.iter().all(|line| line.contains("req-batch-7")), "{output}");
    }

    /// Flips the cancel flag from inside the first extraction.
    struct CancellingExtractor {
        cancel: watch::Sender<bool>,
    }

    #[async_trait]
    impl ProfileExtractor for CancellingExtractor {
        async fn extract_candidate(&self, text: &str) -> Result<CandidateProfile, AppError> {
            self.cancel.send_replace(true);
            RuleBasedExtractor.extract_candidate(text).await
        }

        async fn extract_job(&self, text: &str) -> Result<JobProfile, AppError> {
            RuleBasedExtractor.extract_job(text).await
        }

        fn backend(&self) -> &'static str {
            "cancelling"
        }
    }

    #[tokio::test]
    async fn test_cancel_lets_in_flight_item_finish() {
        let (tx, rx) = watch::channel(false);
        let extractor = Arc::new(CancellingExtractor { cancel: tx });
        let opts = BatchOptions {
            concurrency: 1,
            ..options()
        };
        let resumes = vec![upload("a.txt", RESUME), upload("b.txt", RESUME), upload("c.txt", RESUME)];
        let report = run_batch(extractor, job().await, resumes, opts, "req-batch", rx).await;

        assert_eq!(report.succeeded, 1);
        assert_eq!(report.cancelled, 2);
        assert_eq!(report.items[0].filename, "a.txt");
        assert_eq!(report.items[0].rank, Some(1));
        assert_eq!(report.items[1].index, 1);
        assert_eq!(report.items[2].index, 2);
    }
}
