//! Pipeline and repair-loop tests against scripted transformations.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    thread,
    time::{Duration, Instant},
};

use serde_json::{Value, json};

use sketchscene::{
    SceneBuilder, SketchError,
    config::{AppConfig, ModelConfig, RepairConfig},
    pipeline::{CancelFlag, Pipeline, PipelineError, RunOutcome, Stage},
    repair::{DEFAULT_MAX_ATTEMPTS, RepairError, RepairLoop},
    transform::{Conversation, ImagePayload, ImageToText, Role, TextRepair, TransformError},
};
use sketchscene_parser::RowParser;

const DRAFT: &str = "type,x,y\nrectangle,0,0";
const REVISED: &str = "```csv\ntype,x,y,text\ntext,10,20,Hello\nrectangle,0,0,\n```";

/// Replays canned responses and records every conversation it receives.
struct Scripted {
    responses: Mutex<VecDeque<Result<String, TransformError>>>,
    calls: Mutex<Vec<Conversation>>,
}

impl Scripted {
    fn new(responses: Vec<Result<&str, TransformError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(
                responses
                    .into_iter()
                    .map(|response| response.map(str::to_string))
                    .collect(),
            ),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn ok(responses: &[&str]) -> Arc<Self> {
        Self::new(responses.iter().copied().map(Ok).collect())
    }

    fn calls(&self) -> Vec<Conversation> {
        self.calls.lock().unwrap().clone()
    }

    fn next(&self, conversation: &Conversation) -> Result<String, TransformError> {
        self.calls.lock().unwrap().push(conversation.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("transformation called more often than scripted")
    }
}

impl ImageToText for Scripted {
    fn complete(
        &self,
        _image: &ImagePayload,
        conversation: &Conversation,
    ) -> Result<String, TransformError> {
        self.next(conversation)
    }
}

impl TextRepair for Scripted {
    fn complete(&self, conversation: &Conversation) -> Result<String, TransformError> {
        self.next(conversation)
    }
}

/// Answers every call after a fixed delay.
struct Slow {
    delay: Duration,
    response: &'static str,
}

impl Slow {
    fn new(delay: Duration, response: &'static str) -> Arc<Self> {
        Arc::new(Self { delay, response })
    }

    fn answer(&self) -> Result<String, TransformError> {
        thread::sleep(self.delay);
        Ok(self.response.to_string())
    }
}

impl ImageToText for Slow {
    fn complete(&self, _: &ImagePayload, _: &Conversation) -> Result<String, TransformError> {
        self.answer()
    }
}

impl TextRepair for Slow {
    fn complete(&self, _: &Conversation) -> Result<String, TransformError> {
        self.answer()
    }
}

/// Raise `cancel` from another thread after `after`.
fn cancel_later(cancel: CancelFlag, after: Duration) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        thread::sleep(after);
        cancel.cancel();
    })
}

fn image() -> ImagePayload {
    ImagePayload::new(vec![0x89, b'P', b'N', b'G', 0, 0])
}

fn echo_document(document: &Value) -> String {
    document.to_string()
}

// ---------------------------------------------------------------------------
// Repair loop
// ---------------------------------------------------------------------------

#[test]
fn test_repair_exhausts_after_exactly_three_attempts() {
    let repair = Scripted::ok(&["{broken", "still broken", "{\"a\": }"]);
    let err = RepairLoop::new(repair.clone())
        .run(&json!({"type": "excalidraw"}))
        .unwrap_err();

    match err {
        RepairError::Exhausted {
            attempts,
            last_error,
        } => {
            assert_eq!(attempts, DEFAULT_MAX_ATTEMPTS);
            assert!(last_error.contains("line 1"), "{last_error}");
        }
        other => panic!("expected exhaustion, got {other:?}"),
    }
    assert_eq!(repair.calls().len(), 3);
}

#[test]
fn test_repair_accepts_quoted_escaped_first_response() {
    let repair = Scripted::ok(&[r#""{\"type\": \"excalidraw\", \"elements\": []}""#]);
    let repaired = RepairLoop::new(repair.clone())
        .run(&json!({"type": "excalidraw"}))
        .unwrap();

    assert_eq!(repaired.attempts(), 1);
    assert_eq!(
        repaired.document(),
        &json!({"type": "excalidraw", "elements": []})
    );
    assert_eq!(repair.calls().len(), 1);
}

#[test]
fn test_repair_conversation_accumulates() {
    let repair = Scripted::ok(&["{oops", "{\"type\": \"excalidraw\"}"]);
    let repaired = RepairLoop::new(repair.clone())
        .run(&json!({"type": "excalidraw", "elements": []}))
        .unwrap();
    assert_eq!(repaired.attempts(), 2);

    let calls = repair.calls();
    assert_eq!(calls[0].len(), 1);
    assert!(calls[0].turns()[0].content().contains("\"elements\":[]"));

    let second = calls[1].turns();
    assert_eq!(second.len(), 3);
    assert_eq!(second[1].role(), Role::Assistant);
    assert_eq!(second[1].content(), "{oops");
    assert_eq!(second[2].role(), Role::User);
    assert!(second[2].content().contains("line 1 column"));
}

#[test]
fn test_repair_budget_is_overridable() {
    let repair = Scripted::ok(&["nope"]);
    let err = RepairLoop::new(repair.clone())
        .with_max_attempts(1)
        .run(&json!({}))
        .unwrap_err();

    assert!(matches!(err, RepairError::Exhausted { attempts: 1, .. }));
    assert_eq!(repair.calls().len(), 1);
}

#[test]
fn test_repair_transform_error_is_not_retried() {
    let repair = Scripted::new(vec![Err(TransformError::Request("connection reset".into()))]);
    let err = RepairLoop::new(repair.clone()).run(&json!({})).unwrap_err();

    assert!(matches!(err, RepairError::Transform(_)));
    assert_eq!(repair.calls().len(), 1);
}

#[test]
fn test_repair_cancelled_before_call() {
    let repair = Scripted::ok(&[]);
    let cancel = CancelFlag::new();
    cancel.cancel();

    let err = RepairLoop::new(repair.clone())
        .with_cancel_flag(cancel)
        .run(&json!({}))
        .unwrap_err();

    assert!(matches!(err, RepairError::Cancelled));
    assert!(repair.calls().is_empty());
}

#[test]
fn test_repair_cancel_abandons_call_in_flight() {
    let repair = Slow::new(Duration::from_millis(1500), "{}");
    let cancel = CancelFlag::new();
    let canceller = cancel_later(cancel.clone(), Duration::from_millis(50));

    let started = Instant::now();
    let err = RepairLoop::new(repair)
        .with_cancel_flag(cancel)
        .run(&json!({}))
        .unwrap_err();
    canceller.join().unwrap();

    assert!(matches!(err, RepairError::Cancelled));
    assert!(
        started.elapsed() < Duration::from_millis(1000),
        "cancel took {:?}",
        started.elapsed()
    );
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

#[test]
fn test_pipeline_runs_all_stages_in_order() {
    let vision = Scripted::ok(&[DRAFT, REVISED]);
    let repair = Scripted::new(vec![]);
    let pipeline = Pipeline::new(vision.clone(), repair.clone()).with_row_parser(RowParser::at(42));

    // The repair transformation echoes the candidate it was given.
    let expected = {
        let assembled = sketchscene_parser::assemble_with(
            sketchscene_parser::strip_code_fence(REVISED),
            RowParser::at(42),
        )
        .unwrap();
        assembled.document().to_json_value()
    };
    repair
        .responses
        .lock()
        .unwrap()
        .push_back(Ok(echo_document(&expected)));

    let outcome = pipeline.run(&image());
    let document = outcome.document().expect("pipeline should succeed");

    assert_eq!(document, &expected);
    assert_eq!(document["elements"].as_array().unwrap().len(), 2);
    assert_eq!(document["elements"][0]["originalText"], "Hello");

    let vision_calls = vision.calls();
    assert_eq!(vision_calls.len(), 2);
    assert_eq!(vision_calls[0].len(), 1);
    assert_eq!(vision_calls[1].len(), 3);
    assert_eq!(vision_calls[1].turns()[1].content(), DRAFT);
    assert_eq!(repair.calls().len(), 1);
}

#[test]
fn test_pipeline_empty_image_fails_first_stage() {
    let vision = Scripted::ok(&[]);
    let repair = Scripted::ok(&[]);
    let outcome = Pipeline::new(vision.clone(), repair.clone()).run(&ImagePayload::default());

    assert_eq!(outcome.failed_stage(), Some(Stage::ImageToText));
    assert!(matches!(
        outcome,
        RunOutcome::Failed {
            error: PipelineError::MissingInput(_),
            ..
        }
    ));
    assert!(vision.calls().is_empty());
}

#[test]
fn test_pipeline_empty_review_fails_second_stage() {
    let vision = Scripted::ok(&[DRAFT, "   "]);
    let repair = Scripted::ok(&[]);
    let outcome = Pipeline::new(vision.clone(), repair.clone()).run(&image());

    assert_eq!(outcome.failed_stage(), Some(Stage::TextSelfReview));
    assert!(repair.calls().is_empty());
}

#[test]
fn test_pipeline_insufficient_data_fails_assemble() {
    let vision = Scripted::ok(&[DRAFT, "type,x,y"]);
    let repair = Scripted::ok(&[]);
    let outcome = Pipeline::new(vision.clone(), repair.clone()).run(&image());

    match outcome {
        RunOutcome::Failed {
            stage: Stage::Assemble,
            error: PipelineError::Parse { err, src },
        } => {
            assert!(err.is_insufficient_data());
            assert_eq!(src, "type,x,y");
        }
        other => panic!("expected assemble failure, got {other:?}"),
    }
    assert!(repair.calls().is_empty());
}

#[test]
fn test_pipeline_transform_error_carries_stage() {
    let vision = Scripted::new(vec![Err(TransformError::Timeout(
        std::time::Duration::from_secs(120),
    ))]);
    let repair = Scripted::ok(&[]);
    let outcome = Pipeline::new(vision.clone(), repair.clone()).run(&image());

    assert_eq!(outcome.failed_stage(), Some(Stage::ImageToText));
    assert!(matches!(
        outcome,
        RunOutcome::Failed {
            error: PipelineError::Transform(TransformError::Timeout(_)),
            ..
        }
    ));
}

#[test]
fn test_pipeline_validation_exhausted_never_calls_fourth_time() {
    let vision = Scripted::ok(&[DRAFT, REVISED]);
    let repair = Scripted::ok(&["{", "{", "{"]);
    let outcome = Pipeline::new(vision.clone(), repair.clone()).run(&image());

    assert_eq!(outcome.failed_stage(), Some(Stage::ValidateRepair));
    assert!(matches!(
        outcome,
        RunOutcome::Failed {
            error: PipelineError::ValidationExhausted { attempts: 3, .. },
            ..
        }
    ));
    assert_eq!(repair.calls().len(), 3);
}

#[test]
fn test_pipeline_cancelled_before_first_call() {
    let vision = Scripted::ok(&[]);
    let repair = Scripted::ok(&[]);
    let pipeline = Pipeline::new(vision.clone(), repair.clone());
    pipeline.cancel_flag().cancel();

    let outcome = pipeline.run(&image());

    assert!(matches!(
        outcome,
        RunOutcome::Failed {
            stage: Stage::ImageToText,
            error: PipelineError::Cancelled,
        }
    ));
    assert!(vision.calls().is_empty());
}

#[test]
fn test_pipeline_cancel_during_first_stage_returns_promptly() {
    let vision = Slow::new(Duration::from_millis(1500), DRAFT);
    let repair = Scripted::ok(&[]);
    let pipeline = Pipeline::new(vision, repair.clone());
    let canceller = cancel_later(pipeline.cancel_flag(), Duration::from_millis(50));

    let started = Instant::now();
    let outcome = pipeline.run(&image());
    let elapsed = started.elapsed();
    canceller.join().unwrap();

    assert!(matches!(
        outcome,
        RunOutcome::Failed {
            stage: Stage::ImageToText,
            error: PipelineError::Cancelled,
        }
    ));
    assert!(elapsed < Duration::from_millis(1000), "cancel took {elapsed:?}");
    assert!(repair.calls().is_empty());
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

#[test]
fn test_builder_convert_with_uses_configured_budget() {
    let config = AppConfig::new(ModelConfig::default(), RepairConfig::new(2));
    let vision = Scripted::ok(&[DRAFT, REVISED]);
    let repair = Scripted::ok(&["{", "{"]);

    let err = SceneBuilder::new(config)
        .convert_with(&image(), vision.clone(), repair.clone())
        .unwrap_err();

    assert_eq!(err.stage(), Some(Stage::ValidateRepair));
    assert_eq!(repair.calls().len(), 2);
}

#[test]
fn test_builder_rejects_zero_attempts() {
    let config = AppConfig::new(ModelConfig::default(), RepairConfig::new(0));
    let vision = Scripted::ok(&[]);
    let repair = Scripted::ok(&[]);

    let err = SceneBuilder::new(config)
        .convert_with(&image(), vision.clone(), repair.clone())
        .unwrap_err();

    assert!(matches!(err, SketchError::Config(_)));
    assert!(vision.calls().is_empty());
}

#[test]
fn test_builder_convert_with_success() {
    let vision = Scripted::ok(&[DRAFT, REVISED]);
    let repair = Scripted::ok(&["{\"type\": \"excalidraw\", \"elements\": []}"]);

    let document = SceneBuilder::default()
        .convert_with(&image(), vision.clone(), repair.clone())
        .unwrap();

    assert_eq!(document["type"], "excalidraw");
}
