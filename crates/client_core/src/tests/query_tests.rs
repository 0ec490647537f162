use super::*;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;
use tokio::time::timeout;

use crate::ServiceError;
use shared::protocol::UploadResponse;

struct TestDocumentService {
    documents: Result<Vec<DocumentSummary>, ServiceError>,
    answer: Result<String, ServiceError>,
    gate: Option<Arc<Notify>>,
    queries: Arc<Mutex<Vec<(Option<DocumentId>, String)>>>,
}

impl TestDocumentService {
    fn answering(answer: impl Into<String>) -> Self {
        Self {
            documents: Ok(Vec::new()),
            answer: Ok(answer.into()),
            gate: None,
            queries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn with_documents(mut self, documents: Vec<DocumentSummary>) -> Self {
        self.documents = Ok(documents);
        self
    }

    fn failing(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self {
            documents: Err(ServiceError::Transport(reason.clone())),
            answer: Err(ServiceError::Transport(reason)),
            gate: None,
            queries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }
}

#[async_trait]
impl DocumentService for TestDocumentService {
    async fn upload_document(
        &self,
        _filename: &str,
        _content: Vec<u8>,
    ) -> Result<UploadResponse, ServiceError> {
        Ok(UploadResponse::default())
    }

    async fn list_documents(&self) -> Result<Vec<DocumentSummary>, ServiceError> {
        self.documents.clone()
    }

    async fn query_documents(
        &self,
        document_id: Option<&DocumentId>,
        question: &str,
    ) -> Result<String, ServiceError> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.queries
            .lock()
            .await
            .push((document_id.cloned(), question.to_string()));
        self.answer.clone()
    }
}

struct TestClipboard {
    fail_with: Option<String>,
    texts: std::sync::Mutex<Vec<String>>,
}

impl TestClipboard {
    fn ok() -> Self {
        Self {
            fail_with: None,
            texts: std::sync::Mutex::new(Vec::new()),
        }
    }

    fn failing(reason: impl Into<String>) -> Self {
        Self {
            fail_with: Some(reason.into()),
            texts: std::sync::Mutex::new(Vec::new()),
        }
    }
}

impl Clipboard for TestClipboard {
    fn set_text(&self, text: &str) -> anyhow::Result<()> {
        if let Some(reason) = &self.fail_with {
            return Err(anyhow::anyhow!(reason.clone()));
        }
        self.texts
            .lock()
            .expect("clipboard lock")
            .push(text.to_string());
        Ok(())
    }
}

fn sample_documents() -> Vec<DocumentSummary> {
    vec![
        DocumentSummary {
            id: DocumentId::from("1"),
            title: "handbook.txt".to_string(),
            file_type: Some("txt".to_string()),
            created_at: None,
        },
        DocumentSummary {
            id: DocumentId::from("2"),
            title: "notes.txt".to_string(),
            file_type: None,
            created_at: None,
        },
    ]
}

async fn next_event(rx: &mut broadcast::Receiver<Notification>) -> Notification {
    timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("notification timeout")
        .expect("notification")
}

#[tokio::test]
async fn load_document_list_populates_and_notifies() {
    let service =
        Arc::new(TestDocumentService::answering("").with_documents(sample_documents()));
    let controller = QueryController::new(service);
    let mut rx = controller.subscribe_events();

    controller.load_document_list().await;

    assert_eq!(
        next_event(&mut rx).await,
        Notification::DocumentListLoaded { count: 2 }
    );
    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.documents, sample_documents());
}

#[tokio::test]
async fn load_failure_leaves_list_empty_but_search_all_still_works() {
    let service = Arc::new(TestDocumentService::failing("connection refused"));
    let queries = service.queries.clone();
    let controller = QueryController::new(service);
    let mut rx = controller.subscribe_events();

    controller.load_document_list().await;

    match next_event(&mut rx).await {
        Notification::DocumentListFailed { reason } => {
            assert!(reason.contains("connection refused"));
        }
        other => panic!("unexpected notification: {other:?}"),
    }
    assert!(controller.snapshot().await.documents.is_empty());

    controller.set_question_text("still works?").await;
    assert!(controller.submit_query().await);
    next_event(&mut rx).await;
    assert_eq!(queries.lock().await.len(), 1);
}

#[tokio::test]
async fn stale_selection_is_dropped_on_list_refresh() {
    let service =
        Arc::new(TestDocumentService::answering("").with_documents(sample_documents()));
    let controller = QueryController::new(service);
    controller
        .set_selected_document(Some(DocumentId::from("99")))
        .await;

    controller.load_document_list().await;

    assert_eq!(controller.snapshot().await.selected_document, None);
}

#[tokio::test]
async fn blank_question_is_rejected_without_service_call() {
    let service = Arc::new(TestDocumentService::answering("unused"));
    let queries = service.queries.clone();
    let controller = QueryController::new(service);

    controller.set_question_text("   \n\t").await;

    assert!(!controller.submit_query().await);
    assert!(queries.lock().await.is_empty());
    assert_eq!(controller.snapshot().await.status, UiStatus::Idle);
}

#[tokio::test]
async fn successful_query_stores_collapsed_answer_and_returns_idle() {
    let service = Arc::new(TestDocumentService::answering("the capital is Paris"));
    let controller = QueryController::new(service);
    let mut rx = controller.subscribe_events();
    controller.set_question_text("capital of France?").await;

    assert!(controller.submit_query().await);

    assert_eq!(next_event(&mut rx).await, Notification::AnswerReady);
    let snapshot = controller.snapshot().await;
    let answer = snapshot.answer.expect("answer");
    assert!(!answer.is_failure());
    assert!(!answer.expanded);
    assert_eq!(answer.text(), "the capital is Paris");
    assert_eq!(snapshot.status, UiStatus::Idle);
}

#[tokio::test]
async fn failed_query_renders_fixed_failure_text() {
    let service = Arc::new(TestDocumentService::failing("gateway timeout"));
    let controller = QueryController::new(service);
    let mut rx = controller.subscribe_events();
    controller.set_question_text("anything").await;

    assert!(controller.submit_query().await);

    assert_eq!(next_event(&mut rx).await, Notification::AnswerReady);
    let snapshot = controller.snapshot().await;
    let answer = snapshot.answer.expect("answer");
    assert!(answer.is_failure());
    assert_eq!(answer.text(), QUERY_FAILURE_TEXT);
    assert_eq!(snapshot.status, UiStatus::Idle);
}

#[tokio::test]
async fn submit_while_busy_is_rejected() {
    let gate = Arc::new(Notify::new());
    let service = Arc::new(TestDocumentService::answering("slow answer").gated(gate.clone()));
    let queries = service.queries.clone();
    let controller = QueryController::new(service);
    let mut rx = controller.subscribe_events();
    controller.set_question_text("first question").await;

    assert!(controller.submit_query().await);
    assert_eq!(controller.snapshot().await.status, UiStatus::Busy);
    assert!(!controller.submit_query().await);

    gate.notify_one();
    next_event(&mut rx).await;
    assert_eq!(queries.lock().await.len(), 1);
}

#[tokio::test]
async fn resubmit_clears_previous_answer_and_resets_expanded() {
    let gate = Arc::new(Notify::new());
    let service = Arc::new(TestDocumentService::answering("an answer").gated(gate.clone()));
    let controller = QueryController::new(service);
    let mut rx = controller.subscribe_events();

    controller.set_question_text("first question").await;
    gate.notify_one();
    assert!(controller.submit_query().await);
    next_event(&mut rx).await;
    controller.toggle_expanded().await;
    assert!(controller.snapshot().await.answer.expect("answer").expanded);

    controller.set_question_text("second question").await;
    assert!(controller.submit_query().await);
    // Prior answer is gone while the new request is in flight.
    assert_eq!(controller.snapshot().await.answer, None);

    gate.notify_one();
    next_event(&mut rx).await;
    let answer = controller.snapshot().await.answer.expect("answer");
    assert!(!answer.expanded);
}

#[tokio::test]
async fn selected_document_id_is_forwarded_to_the_service() {
    let service =
        Arc::new(TestDocumentService::answering("scoped").with_documents(sample_documents()));
    let queries = service.queries.clone();
    let controller = QueryController::new(service);
    let mut rx = controller.subscribe_events();
    controller.load_document_list().await;
    next_event(&mut rx).await;

    controller
        .set_selected_document(Some(DocumentId::from("2")))
        .await;
    controller.set_question_text("scoped question").await;
    assert!(controller.submit_query().await);
    next_event(&mut rx).await;

    controller.set_selected_document(None).await;
    controller.set_question_text("broad question").await;
    assert!(controller.submit_query().await);
    next_event(&mut rx).await;

    let recorded = queries.lock().await.clone();
    assert_eq!(
        recorded,
        vec![
            (Some(DocumentId::from("2")), "scoped question".to_string()),
            (None, "broad question".to_string()),
        ]
    );
}

#[test]
fn long_answer_detection_counts_characters() {
    let short = AnswerResult {
        outcome: AnswerOutcome::Answered("a".repeat(500)),
        expanded: false,
    };
    assert!(!short.is_long());

    let long = AnswerResult {
        outcome: AnswerOutcome::Answered("a".repeat(501)),
        expanded: false,
    };
    assert!(long.is_long());

    // Multi-byte characters count once each.
    let multibyte = AnswerResult {
        outcome: AnswerOutcome::Answered("é".repeat(500)),
        expanded: false,
    };
    assert!(!multibyte.is_long());
}

#[tokio::test]
async fn toggle_expanded_without_answer_is_a_noop() {
    let controller = QueryController::new(Arc::new(TestDocumentService::answering("")));

    controller.toggle_expanded().await;

    assert_eq!(controller.snapshot().await.answer, None);
}

#[tokio::test]
async fn copy_answer_sends_displayed_text_to_clipboard() {
    let clipboard = Arc::new(TestClipboard::ok());
    let service = Arc::new(TestDocumentService::answering("copy me"));
    let controller = QueryController::new_with_clipboard(service, clipboard.clone());
    let mut rx = controller.subscribe_events();
    controller.set_question_text("question").await;
    assert!(controller.submit_query().await);
    next_event(&mut rx).await;

    controller.copy_answer_to_clipboard().await;

    assert_eq!(next_event(&mut rx).await, Notification::AnswerCopied);
    assert_eq!(
        clipboard.texts.lock().expect("clipboard lock").clone(),
        vec!["copy me".to_string()]
    );
    assert_eq!(controller.snapshot().await.status, UiStatus::Idle);
}

#[tokio::test]
async fn copy_failure_notifies_without_touching_status() {
    let clipboard = Arc::new(TestClipboard::failing("clipboard unavailable"));
    let service = Arc::new(TestDocumentService::answering("copy me"));
    let controller = QueryController::new_with_clipboard(service, clipboard);
    let mut rx = controller.subscribe_events();
    controller.set_question_text("question").await;
    assert!(controller.submit_query().await);
    next_event(&mut rx).await;

    controller.copy_answer_to_clipboard().await;

    match next_event(&mut rx).await {
        Notification::AnswerCopyFailed { reason } => {
            assert!(reason.contains("clipboard unavailable"));
        }
        other => panic!("unexpected notification: {other:?}"),
    }
    assert_eq!(controller.snapshot().await.status, UiStatus::Idle);
}

#[tokio::test]
async fn copy_without_answer_does_nothing() {
    let clipboard = Arc::new(TestClipboard::ok());
    let service = Arc::new(TestDocumentService::answering(""));
    let controller = QueryController::new_with_clipboard(service, clipboard.clone());
    let mut rx = controller.subscribe_events();

    controller.copy_answer_to_clipboard().await;

    assert!(rx.try_recv().is_err());
    assert!(clipboard.texts.lock().expect("clipboard lock").is_empty());
}

#[tokio::test]
async fn shutdown_aborts_inflight_query_and_returns_idle() {
    let gate = Arc::new(Notify::new());
    let service = Arc::new(TestDocumentService::answering("never delivered").gated(gate.clone()));
    let queries = service.queries.clone();
    let controller = QueryController::new(service);
    controller.set_question_text("question").await;

    assert!(controller.submit_query().await);
    controller.shutdown().await;

    assert_eq!(controller.snapshot().await.status, UiStatus::Idle);
    gate.notify_one();
    tokio::task::yield_now().await;
    assert!(queries.lock().await.is_empty());
}
