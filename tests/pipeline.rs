//! Pipeline integration tests with a fake PDF engine and a fake model.
//!
//! Always run: no pdfium library and no API key are needed.

mod common;

use common::{pipeline_with, test_config, CannedService, FixedPages, MINIMAL_PDF, TWO_CARDS};
use edgequake_pdf2anki::{
    inspect_package, CardList, ErrorKind, Flashcard, FlashcardConfig, IssueProblem,
    Pdf2AnkiError, PipelineProgressCallback, PipelineStage,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const REFERENCE_PAGES: &[&str] = &["Page 1\nHello world.", "Page 2\n© 2020-2021 Foo"];

#[tokio::test]
async fn test_reference_document_is_cleaned_before_generation() {
    let service = CannedService::new(TWO_CARDS);
    let pipeline = pipeline_with(test_config(), FixedPages::new(REFERENCE_PAGES), service.clone());

    let generated = pipeline.cards_from_pdf(MINIMAL_PDF).await.unwrap();

    assert_eq!(service.last_user_text().as_deref(), Some("Hello world."));
    assert_eq!(generated.stats.cleaned_chars, "Hello world.".len());
    assert!(generated.stats.raw_chars > generated.stats.cleaned_chars);
}

#[tokio::test]
async fn test_two_cards_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline_with(
        test_config(),
        FixedPages::new(REFERENCE_PAGES),
        CannedService::new(TWO_CARDS),
    );

    let output = pipeline.run(MINIMAL_PDF, None, dir.path()).await.unwrap();
    assert_eq!(
        output.cards,
        CardList::new(vec![Flashcard::new("Q1", "A1"), Flashcard::new("Q2", "A2")])
    );

    let summary = inspect_package(&output.package_path).unwrap();
    assert_eq!(summary.cards, output.cards);
    assert_eq!(summary.deck_id, output.deck_id);
    assert_eq!(summary.deck_name, "Deck_generated");
}

#[tokio::test]
async fn test_request_carries_prompt_and_fixed_parameters() {
    let service = CannedService::new(TWO_CARDS);
    let pipeline = pipeline_with(test_config(), FixedPages::new(&["Cells divide."]), service.clone());
    pipeline.cards_from_pdf(MINIMAL_PDF).await.unwrap();

    let request = service.last_request.lock().unwrap().clone().unwrap();
    assert_eq!(request.system, "Make flashcards as a JSON array.");
    assert_eq!(request.temperature, 0.7);
    assert_eq!(request.max_tokens, 8192);
    assert_eq!(request.top_p, 1.0);
}

#[tokio::test]
async fn test_non_json_answer_is_a_format_error() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline_with(
        test_config(),
        FixedPages::new(&["text"]),
        CannedService::new("Sure! Here are your flashcards."),
    );
    let err = pipeline.run(MINIMAL_PDF, None, dir.path()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::GenerationFormat);
    assert_eq!(err.raw_response(), Some("Sure! Here are your flashcards."));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_partial_batch_rejected_whole() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline_with(
        test_config(),
        FixedPages::new(&["text"]),
        CannedService::new(r#"[{"front":"Q1","back":"A1"},{"front":"Q2"}]"#),
    );
    let err = pipeline.run(MINIMAL_PDF, None, dir.path()).await.unwrap_err();
    match err {
        Pdf2AnkiError::InvalidCards { issues, .. } => {
            assert_eq!(issues.len(), 1);
            assert_eq!(issues[0].index, 1);
            assert_eq!(issues[0].field, "back");
        }
        other => panic!("expected InvalidCards, got {other:?}"),
    }
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_field_separator_in_answer_never_reaches_package() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline_with(
        test_config(),
        FixedPages::new(&["text"]),
        CannedService::new(r#"[{"front":"Q\u001fX","back":"A"}]"#),
    );
    let err = pipeline.run(MINIMAL_PDF, None, dir.path()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::GenerationFormat);
    match err {
        Pdf2AnkiError::InvalidCards { issues, .. } => {
            assert_eq!(issues.len(), 1);
            assert_eq!(issues[0].field, "front");
            assert_eq!(issues[0].problem, IssueProblem::ControlCharacter);
        }
        other => panic!("expected InvalidCards, got {other:?}"),
    }
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_not_a_pdf_never_reaches_engine() {
    let engine = FixedPages::new(&["text"]);
    let pipeline = pipeline_with(test_config(), engine.clone(), CannedService::new(TWO_CARDS));
    let err = pipeline.cards_from_pdf(b"plain text").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Extraction);
    assert_eq!(engine.call_count(), 0);
}

#[tokio::test]
async fn test_slow_model_times_out() {
    let config = FlashcardConfig::builder()
        .api_timeout_secs(1)
        .build()
        .unwrap();
    let pipeline = pipeline_with(
        config,
        FixedPages::new(&["text"]),
        CannedService::slow(TWO_CARDS, Duration::from_secs(30)),
    );
    let err = pipeline.cards_from_pdf(MINIMAL_PDF).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::GenerationTimeout);
}

#[tokio::test]
async fn test_cards_json_written_when_configured() {
    let dir = tempfile::tempdir().unwrap();
    let json_path = dir.path().join("output_flashcards.json");
    let config = FlashcardConfig::builder()
        .cards_json_path(&json_path)
        .build()
        .unwrap();
    let pipeline = pipeline_with(config, FixedPages::new(&["text"]), CannedService::new(TWO_CARDS));

    pipeline.run(MINIMAL_PDF, Some("Bio"), dir.path()).await.unwrap();

    let saved: CardList =
        serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(saved.len(), 2);
    assert!(dir.path().join("Bio.apkg").exists());
}

#[tokio::test]
async fn test_consecutive_runs_get_different_deck_ids() {
    let dir_a = tempfile::tempdir().unwrap();
    let dir_b = tempfile::tempdir().unwrap();
    let pipeline = pipeline_with(test_config(), FixedPages::new(&["text"]), CannedService::new(TWO_CARDS));

    let a = pipeline.run(MINIMAL_PDF, None, dir_a.path()).await.unwrap();
    let b = pipeline.run(MINIMAL_PDF, None, dir_b.path()).await.unwrap();
    assert_ne!(a.deck_id, b.deck_id);
    assert_eq!(a.package_path.file_name(), b.package_path.file_name());
}

#[derive(Default)]
struct StageLog(Mutex<Vec<String>>);

impl PipelineProgressCallback for StageLog {
    fn on_stage_start(&self, stage: PipelineStage) {
        self.0.lock().unwrap().push(format!("start {stage:?}"));
    }

    fn on_stage_error(&self, stage: PipelineStage, _error: &str) {
        self.0.lock().unwrap().push(format!("error {stage:?}"));
    }

    fn on_pipeline_complete(&self, card_count: usize) {
        self.0.lock().unwrap().push(format!("done {card_count}"));
    }
}

#[tokio::test]
async fn test_progress_events_in_stage_order() {
    let dir = tempfile::tempdir().unwrap();
    let log = Arc::new(StageLog::default());
    let config = FlashcardConfig::builder()
        .progress_callback(log.clone())
        .build()
        .unwrap();
    let pipeline = pipeline_with(config, FixedPages::new(&["text"]), CannedService::new(TWO_CARDS));

    pipeline.run(MINIMAL_PDF, None, dir.path()).await.unwrap();

    assert_eq!(
        *log.0.lock().unwrap(),
        vec![
            "start Extracting",
            "start Normalizing",
            "start Generating",
            "start Packaging",
            "done 2",
        ]
    );
}

#[tokio::test]
async fn test_progress_reports_failing_stage() {
    let dir = tempfile::tempdir().unwrap();
    let log = Arc::new(StageLog::default());
    let config = FlashcardConfig::builder()
        .progress_callback(log.clone())
        .build()
        .unwrap();
    let pipeline = pipeline_with(config, FixedPages::new(&["text"]), CannedService::new("[]"));

    let err = pipeline.run(MINIMAL_PDF, None, dir.path()).await.unwrap_err();
    assert!(matches!(err, Pdf2AnkiError::EmptyDeck));
    assert_eq!(log.0.lock().unwrap().last().map(String::as_str), Some("error Packaging"));
}

#[tokio::test]
async fn test_pipeline_future_is_send() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline_with(test_config(), FixedPages::new(&["text"]), CannedService::new(TWO_CARDS));
    let out_dir = dir.path().to_path_buf();

    let output = tokio::spawn(async move { pipeline.run(MINIMAL_PDF, None, &out_dir).await })
        .await
        .expect("spawn must succeed")
        .unwrap();
    assert_eq!(output.card_count(), 2);
}
