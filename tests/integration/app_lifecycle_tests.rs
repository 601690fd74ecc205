/*!
 * Full application runs: input file in, output and progress files out
 */

use std::sync::Arc;

use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use article_translator::app_config::{Config, TranslationProvider};
use article_translator::app_controller::{Controller, RunOutcome};
use article_translator::file_utils::FileManager;
use article_translator::providers::mock::MockTranslator;
use article_translator::translation::{CheckpointSink, CheckpointSnapshot, JsonFileCheckpoint};
use article_translator::AppError;

use crate::common;

/// Config with no pacing, suitable for runs against a local server
fn fast_config() -> Config {
    let mut config = Config::default();
    config.translation.common.rate_limit_cooldown_ms = 10;
    config.translation.active_provider_config_mut().inter_request_delay_ms = Some(0);
    config
}

fn controller_with_mock(config: Config, mock: &MockTranslator) -> Controller {
    Controller::with_config(config)
        .unwrap()
        .with_translator(Arc::new(mock.clone()))
        .with_cancellation(CancellationToken::new())
}

/// Real HTTP backend, default output path, progress file cleaned up
#[tokio::test]
async fn test_run_withGoogleBackend_shouldWriteTranslatedOutput() {
    common::init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/translate_a/single"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([[["번역된 문장.", "source", null, null]]])))
        .expect(3)
        .mount(&server)
        .await;

    let dir = common::create_temp_dir().unwrap();
    let input = common::create_articles_file(dir.path(), "articles.json", &common::sample_articles()).unwrap();

    let mut config = fast_config();
    config.translation.provider = TranslationProvider::Google;
    config.translation.active_provider_config_mut().endpoint = server.uri();
    let controller = Controller::with_config(config).unwrap().with_cancellation(CancellationToken::new());

    let outcome = controller.run(input.clone(), None, false, false).await.unwrap();

    let output_path = dir.path().join("articles.ko.json");
    match outcome {
        RunOutcome::Completed { output_path: written, report } => {
            assert_eq!(written, output_path);
            assert_eq!(report.stats.translated_chunks, 3);
            assert_eq!(report.stats.provider, "google");
        }
        other => panic!("unexpected outcome: {:?}", other),
    }

    let records = common::read_articles(&output_path).unwrap();
    let originals = common::sample_articles();
    assert_eq!(records.len(), originals.len());
    for (record, original) in records.iter().zip(&originals) {
        assert_eq!(record.content, "번역된 문장.");
        assert_eq!(record.title, original.title);
        assert_eq!(record.source_url, original.source_url);
    }

    assert!(!dir.path().join("articles.ko.progress.json").exists());
    assert!(dir.path().join("articles.ko.log").exists());
}

/// Output keeps the original field names
#[tokio::test(start_paused = true)]
async fn test_run_outputFile_shouldUseCamelCaseFields() {
    let dir = common::create_temp_dir().unwrap();
    let input = common::create_articles_file(dir.path(), "in.json", &common::sample_articles()).unwrap();
    let output = dir.path().join("out").join("translated.json");
    let controller = controller_with_mock(fast_config(), &MockTranslator::working());

    controller.run(input, Some(output.clone()), false, false).await.unwrap();

    let raw = std::fs::read_to_string(&output).unwrap();
    assert!(raw.contains("\"sourceUrl\""));
    assert!(!raw.contains("source_url"));
}

/// A missing input aborts before anything else happens
#[tokio::test]
async fn test_run_withMissingInput_shouldFailWithFatalInput() {
    let dir = common::create_temp_dir().unwrap();
    let mock = MockTranslator::working();
    let controller = controller_with_mock(fast_config(), &mock);

    let error = controller.run(dir.path().join("missing.json"), None, false, false).await.unwrap_err();

    assert!(matches!(error.downcast_ref::<AppError>(), Some(AppError::FatalInput(_))), "got {:#}", error);
    assert_eq!(mock.call_count(), 0);
}

/// Unparsable input is just as fatal
#[tokio::test]
async fn test_run_withInvalidJson_shouldFailWithFatalInput() {
    let dir = common::create_temp_dir().unwrap();
    let input = common::create_test_file(dir.path(), "broken.json", "[{\"title\": ").unwrap();
    let controller = controller_with_mock(fast_config(), &MockTranslator::working());

    let error = controller.run(input, None, false, false).await.unwrap_err();

    assert!(matches!(error.downcast_ref::<AppError>(), Some(AppError::FatalInput(_))));
}

/// Existing output is left alone unless forced
#[tokio::test(start_paused = true)]
async fn test_run_withExistingOutput_shouldSkipUnlessForced() {
    let dir = common::create_temp_dir().unwrap();
    let input = common::create_articles_file(dir.path(), "articles.json", &common::sample_articles()).unwrap();
    let output = common::create_test_file(dir.path(), "articles.ko.json", "[]").unwrap();
    let mock = MockTranslator::working();
    let controller = controller_with_mock(fast_config(), &mock);

    let outcome = controller.run(input.clone(), None, false, false).await.unwrap();
    assert!(matches!(outcome, RunOutcome::Skipped { .. }));
    assert_eq!(std::fs::read_to_string(&output).unwrap(), "[]");
    assert_eq!(mock.call_count(), 0);

    let outcome = controller.run(input, None, true, false).await.unwrap();
    assert!(matches!(outcome, RunOutcome::Completed { .. }));
    assert_eq!(common::read_articles(&output).unwrap().len(), 3);
}

/// A matching progress file is continued, not redone
#[tokio::test(start_paused = true)]
async fn test_run_withResumeAndMatchingProgress_shouldSkipCompletedArticles() {
    let dir = common::create_temp_dir().unwrap();
    let articles = common::sample_articles();
    let input = common::create_articles_file(dir.path(), "articles.json", &articles).unwrap();

    let done = vec![articles[0].with_content("이미 번역됨."), articles[1].with_content("이것도.")];
    let fingerprint = FileManager::hash_file(&input).unwrap();
    let sink = JsonFileCheckpoint::new(dir.path().join("articles.ko.progress.json"));
    sink.save(&CheckpointSnapshot::new("earlier", Some(fingerprint), "en", "ko", done)).unwrap();

    let mock = MockTranslator::working();
    let controller = controller_with_mock(fast_config(), &mock);
    let outcome = controller.run(input, None, false, true).await.unwrap();

    assert!(matches!(outcome, RunOutcome::Completed { .. }));
    assert_eq!(mock.call_count(), 1);

    let records = common::read_articles(&dir.path().join("articles.ko.json")).unwrap();
    assert_eq!(records[0].content, "이미 번역됨.");
    assert_eq!(records[1].content, "이것도.");
    assert!(records[2].content.starts_with("[ko] "));
}

/// A progress file from another input is ignored
#[tokio::test(start_paused = true)]
async fn test_run_withResumeAndForeignProgress_shouldStartOver() {
    let dir = common::create_temp_dir().unwrap();
    let articles = common::sample_articles();
    let input = common::create_articles_file(dir.path(), "articles.json", &articles).unwrap();

    let sink = JsonFileCheckpoint::new(dir.path().join("articles.ko.progress.json"));
    let stale = vec![articles[0].with_content("stale")];
    sink.save(&CheckpointSnapshot::new("old", Some("other-input".to_string()), "en", "ko", stale)).unwrap();

    let mock = MockTranslator::working();
    let controller = controller_with_mock(fast_config(), &mock);
    controller.run(input, None, false, true).await.unwrap();

    assert_eq!(mock.call_count(), 3);
    let records = common::read_articles(&dir.path().join("articles.ko.json")).unwrap();
    assert!(records.iter().all(|r| r.content.starts_with("[ko] ")));
}

/// Cancelling keeps the progress file and writes no output
#[tokio::test(start_paused = true)]
async fn test_run_whenCancelled_shouldKeepProgressAndSkipOutput() {
    let dir = common::create_temp_dir().unwrap();
    let input = common::create_articles_file(dir.path(), "articles.json", &common::sample_articles()).unwrap();
    let token = CancellationToken::new();
    token.cancel();

    let controller = Controller::with_config(fast_config())
        .unwrap()
        .with_translator(Arc::new(MockTranslator::working()))
        .with_cancellation(token);

    let outcome = controller.run(input, None, false, false).await.unwrap();

    match outcome {
        RunOutcome::Cancelled { progress_path, report } => {
            assert!(report.cancelled);
            assert!(report.records.is_empty());
            assert!(progress_path.exists());
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert!(!dir.path().join("articles.ko.json").exists());
}

/// Invalid configuration is rejected up front
#[test]
fn test_with_config_withInvalidConfig_shouldFail() {
    let mut config = Config::default();
    config.checkpoint.every_n = 0;
    assert!(Controller::with_config(config).is_err());
}
