/*!
 * End-to-end tests for the batch translation driver
 */

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use article_translator::errors::TranslationError;
use article_translator::providers::mock::{MockBehavior, MockTranslator};
use article_translator::translation::{
    BatchTranslator, CheckpointSink, JsonFileCheckpoint, MemoryCheckpoint, PipelineEvent, PipelineOptions,
};
use article_translator::RunProgress;

use crate::common;

fn options(max_chunk_chars: usize, checkpoint_every: usize) -> PipelineOptions {
    PipelineOptions {
        max_chunk_chars,
        checkpoint_every,
        ..PipelineOptions::default()
    }
}

/// One article, two chunks, one output record
#[tokio::test(start_paused = true)]
async fn test_run_withExampleArticle_shouldTranslateBothChunks() {
    common::init_logging();
    let mock = MockTranslator::working();
    let driver = BatchTranslator::new(Arc::new(mock.clone()), options(20, 5));
    let input = vec![common::article("Example", "Hello world. This is a test.")];

    let report = driver.run(&input, RunProgress::new(), &MemoryCheckpoint::new()).await;

    assert_eq!(mock.call_count(), 2);
    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].content, "[ko] Hello world. [ko] This is a test.");
    assert_eq!(report.records[0].title, "Example");
    assert_eq!(report.stats.total_chunks, 2);
    assert_eq!(report.stats.translated_chunks, 2);
}

/// A dead backend still yields every article, untouched
#[tokio::test(start_paused = true)]
async fn test_run_withFailingBackend_shouldReturnOriginalArticles() {
    common::init_logging();
    let input = common::sample_articles();
    let driver = BatchTranslator::new(Arc::new(MockTranslator::failing()), options(100, 2));

    let report = driver.run(&input, RunProgress::new(), &MemoryCheckpoint::new()).await;

    assert_eq!(report.records.len(), input.len());
    for (output, original) in report.records.iter().zip(&input) {
        assert_eq!(output.content, original.content);
    }
    assert_eq!(report.stats.translated_chunks, 0);
    assert!(report.stats.has_fallbacks());
}

const PARAGRAPHS: &str = "First paragraph. It has two sentences.\n\nSecond paragraph starts here.\nA new line follows.";

/// Paragraph breaks survive when every chunk falls back
#[tokio::test(start_paused = true)]
async fn test_run_withFailingBackendAndParagraphs_shouldKeepNewlines() {
    let driver = BatchTranslator::new(Arc::new(MockTranslator::failing()), options(40, 5));
    let input = vec![common::article("Paragraphs", PARAGRAPHS)];

    let report = driver.run(&input, RunProgress::new(), &MemoryCheckpoint::new()).await;

    assert_eq!(report.stats.total_chunks, 3);
    assert_eq!(report.records[0].content, PARAGRAPHS);
}

/// Translated chunks are rejoined with the breaks they had in the source
#[tokio::test(start_paused = true)]
async fn test_run_withParagraphs_shouldRejoinTranslationsWithOriginalBreaks() {
    let driver = BatchTranslator::new(Arc::new(MockTranslator::working()), options(40, 5));
    let input = vec![common::article("Paragraphs", PARAGRAPHS)];

    let report = driver.run(&input, RunProgress::new(), &MemoryCheckpoint::new()).await;

    assert_eq!(
        report.records[0].content,
        "[ko] First paragraph. It has two sentences.\n\n[ko] Second paragraph starts here.\n[ko] A new line follows."
    );
}

/// Malformed and intermittent failures only affect their own chunk
#[tokio::test(start_paused = true)]
async fn test_run_withIntermittentBackend_shouldMixTranslatedAndOriginal() {
    let mock = MockTranslator::intermittent(2);
    let driver = BatchTranslator::new(Arc::new(mock), options(15, 5));
    let input = vec![common::article("Mixed", "One thing. Two things. Three things. Four things.")];

    let report = driver.run(&input, RunProgress::new(), &MemoryCheckpoint::new()).await;

    assert_eq!(report.records[0].content, "[ko] One thing. Two things. [ko] Three things. Four things.");
    assert_eq!(report.stats.translated_chunks, 2);
    assert_eq!(report.stats.fallback_chunks, 2);
    assert_eq!(report.stats.articles_with_fallback, 1);
}

/// A throttled chunk costs exactly two calls and uses the retry's answer
#[tokio::test(start_paused = true)]
async fn test_run_withRateLimitOnce_shouldRetryAfterCooldown() {
    let mock = MockTranslator::working().with_script(vec![
        Err(TranslationError::RateLimited("429".to_string())),
        Ok("재시도 성공.".to_string()),
    ]);
    let driver = BatchTranslator::new(Arc::new(mock.clone()), options(100, 5));
    let input = vec![common::article("Retry", "Throttled sentence.")];
    let started = tokio::time::Instant::now();

    let report = driver.run(&input, RunProgress::new(), &MemoryCheckpoint::new()).await;

    assert_eq!(mock.calls_for("Throttled sentence."), 2);
    assert_eq!(report.records[0].content, "재시도 성공.");
    assert_eq!(report.stats.rate_limit_hits, 1);
    assert_eq!(report.stats.retry_successes, 1);
    assert!(started.elapsed() >= Duration::from_secs(60));
}

/// After N articles the file checkpoint holds exactly those records
#[tokio::test(start_paused = true)]
async fn test_run_withFileCheckpoint_shouldSnapshotCompletedArticles() {
    common::init_logging();
    let dir = common::create_temp_dir().unwrap();
    let sink = JsonFileCheckpoint::new(dir.path().join("progress.json"));
    let input = common::sample_articles();

    let snapshots = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&snapshots);
    let reader = JsonFileCheckpoint::new(sink.path());
    let driver = BatchTranslator::new(Arc::new(MockTranslator::working()), options(4500, 2))
        .with_run_identity("run-42", Some("fingerprint".to_string()))
        .with_event_handler(move |event| {
            if let PipelineEvent::CheckpointWritten { .. } = event {
                if let Ok(Some(snapshot)) = reader.load() {
                    seen.lock().push(snapshot);
                }
            }
        });

    let report = driver.run(&input, RunProgress::new(), &sink).await;

    let snapshots = snapshots.lock();
    assert_eq!(snapshots.len(), 2);
    assert_eq!(snapshots[0].records, report.records[..2].to_vec());
    assert_eq!(snapshots[0].run_id, "run-42");
    assert_eq!(snapshots[0].input_fingerprint.as_deref(), Some("fingerprint"));
    assert_eq!(snapshots[1].records, report.records);
}

/// A run interrupted after a checkpoint picks up where it stopped
#[tokio::test(start_paused = true)]
async fn test_run_resumedFromCheckpoint_shouldOnlyTranslateRemainingArticles() {
    let input = common::sample_articles();
    let sink = MemoryCheckpoint::new();

    // First run stops once the first checkpoint is written
    let token = tokio_util::sync::CancellationToken::new();
    let trigger = token.clone();
    let first = BatchTranslator::new(Arc::new(MockTranslator::working()), options(4500, 1))
        .with_cancellation(token)
        .with_event_handler(move |event| {
            if matches!(event, PipelineEvent::CheckpointWritten { records: 1 }) {
                trigger.cancel();
            }
        });
    let report = first.run(&input, RunProgress::new(), &sink).await;
    assert!(report.cancelled);
    assert_eq!(report.records.len(), 1);

    // Second run resumes from the saved snapshot
    let mock = MockTranslator::working();
    let second = BatchTranslator::new(Arc::new(mock.clone()), options(4500, 1));
    let saved = sink.last().unwrap();
    let progress = RunProgress::resume(saved.records, &input);
    let report = second.run(&input, progress, &sink).await;

    assert!(!report.cancelled);
    assert_eq!(report.records.len(), input.len());
    assert_eq!(report.stats.articles_resumed, 1);
    assert_eq!(mock.call_count(), 2);
    assert!(report.records.iter().all(|r| r.content.starts_with("[ko] ")));
}

/// Slow responses are awaited one at a time, each followed by the pause
#[tokio::test(start_paused = true)]
async fn test_run_withSlowBackend_shouldSerializeRequests() {
    let mock = MockTranslator::new(MockBehavior::Slow { delay_ms: 500 });
    let driver = BatchTranslator::new(Arc::new(mock.clone()), options(10, 5));
    let input = vec![common::article("a", "One. Two."), common::article("b", "Three. Four.")];
    let started = tokio::time::Instant::now();

    let report = driver.run(&input, RunProgress::new(), &MemoryCheckpoint::new()).await;

    assert_eq!(mock.call_count(), 2);
    assert_eq!(report.records.len(), 2);
    assert!(started.elapsed() >= Duration::from_millis(3000));
}

/// Checkpoint failures never stop the batch
#[tokio::test(start_paused = true)]
async fn test_run_withBrokenCheckpointSink_shouldStillFinish() {
    struct ReadOnlySink;
    impl CheckpointSink for ReadOnlySink {
        fn save(
            &self,
            _snapshot: &article_translator::translation::CheckpointSnapshot,
        ) -> Result<(), article_translator::AppError> {
            Err(article_translator::AppError::Checkpoint("read-only".to_string()))
        }
    }

    let failures = Arc::new(Mutex::new(0usize));
    let counter = Arc::clone(&failures);
    let driver = BatchTranslator::new(Arc::new(MockTranslator::working()), options(4500, 1)).with_event_handler(
        move |event| {
            if let PipelineEvent::CheckpointFailed { .. } = event {
                *counter.lock() += 1;
            }
        },
    );
    let input = common::sample_articles();

    let report = driver.run(&input, RunProgress::new(), &ReadOnlySink).await;

    assert_eq!(report.records.len(), input.len());
    assert_eq!(*failures.lock(), input.len());
    assert_eq!(report.stats.checkpoint_failures, input.len());
}
