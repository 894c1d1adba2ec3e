//! The chat session: transcript, input lock and the single in-flight request.

use std::sync::Arc;

use chrono::Local;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::client::ChatBackend;
use crate::error::RequestFailure;
use crate::input::InputLine;
use crate::state::{LockState, Role, Transcript, Turn};
use crate::tui::AppEvent;
use crate::view::{render_turn, ChatView};

pub const DEFAULT_FALLBACK_MESSAGE: &str = "⚠️ Error connecting to Alfred.";

pub struct ChatSession {
    transcript: Transcript,
    lock: LockState,
    view: ChatView,
    backend: Arc<dyn ChatBackend>,
    replies: mpsc::UnboundedSender<AppEvent>,
    fallback_message: String,
}

impl ChatSession {
    pub fn new(backend: Arc<dyn ChatBackend>, replies: mpsc::UnboundedSender<AppEvent>) -> Self {
        Self {
            transcript: Transcript::new(),
            lock: LockState::Idle,
            view: ChatView::new(),
            backend,
            replies,
            fallback_message: DEFAULT_FALLBACK_MESSAGE.to_string(),
        }
    }

    pub fn with_fallback_message(mut self, message: impl Into<String>) -> Self {
        self.fallback_message = message.into();
        self
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn lock_state(&self) -> LockState {
        self.lock
    }

    pub fn is_locked(&self) -> bool {
        self.lock.is_locked()
    }

    pub fn view(&self) -> &ChatView {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut ChatView {
        &mut self.view
    }

    /// Submit whatever is in `input`.
    ///
    /// Returns `false` without touching anything when the trimmed text is
    /// empty or a request is already outstanding. Otherwise locks input,
    /// echoes the user turn, clears the field and spawns one request carrying
    /// the whole transcript. The outcome comes back as [`AppEvent::Reply`].
    pub fn submit_message(&mut self, input: &mut InputLine) -> bool {
        let text = input.text().trim();
        if text.is_empty() || self.lock.is_locked() {
            return false;
        }
        let text = text.to_string();

        self.lock = LockState::Pending;
        self.view.set_pending(true);

        self.transcript.push(Turn::user(text.as_str()));
        self.view.push(render_turn(Role::User, &text, Local::now()));

        input.clear();

        let messages = self.transcript.turns().to_vec();
        let backend = Arc::clone(&self.backend);
        let replies = self.replies.clone();
        info!(messages = messages.len(), "sending transcript");
        tokio::spawn(async move {
            let outcome = backend.complete(&messages).await;
            if replies.send(AppEvent::Reply(outcome)).is_err() {
                debug!("reply dropped, event loop has shut down");
            }
        });

        true
    }

    /// Apply the outcome of the outstanding request and release the lock.
    ///
    /// Failures render the fallback message for display only; the transcript
    /// keeps just the user's turn.
    pub fn settle(&mut self, outcome: Result<String, RequestFailure>) {
        if !self.lock.is_locked() {
            debug!("ignoring reply with no request outstanding");
            return;
        }

        match outcome {
            Ok(answer) => {
                info!(chars = answer.chars().count(), "received answer");
                self.transcript.push(Turn::assistant(answer.as_str()));
                self.view.push(render_turn(Role::Assistant, &answer, Local::now()));
            }
            Err(e) => {
                warn!(kind = e.kind(), error = %e, "chat request failed");
                let placeholder =
                    render_turn(Role::Assistant, &self.fallback_message, Local::now()).error();
                self.view.push(placeholder);
            }
        }

        self.lock = LockState::Idle;
        self.view.set_pending(false);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tokio::sync::Notify;

    /// Backend that records every transcript it is sent and replays canned
    /// answers. `Err` entries become a malformed-body failure.
    #[derive(Default)]
    pub(crate) struct FakeBackend {
        pub(crate) requests: Mutex<Vec<Vec<Turn>>>,
        answers: Mutex<VecDeque<Result<String, String>>>,
        gate: Option<Arc<Notify>>,
    }

    impl FakeBackend {
        pub(crate) fn answering(answers: Vec<Result<&str, &str>>) -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                answers: Mutex::new(
                    answers
                        .into_iter()
                        .map(|a| a.map(str::to_string).map_err(str::to_string))
                        .collect(),
                ),
                gate: None,
            }
        }

        fn gated(mut self, gate: Arc<Notify>) -> Self {
            self.gate = Some(gate);
            self
        }
    }

    #[async_trait]
    impl ChatBackend for FakeBackend {
        async fn complete(&self, messages: &[Turn]) -> Result<String, RequestFailure> {
            self.requests.lock().unwrap().push(messages.to_vec());
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            let next = self
                .answers
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err("no canned answer".to_string()));
            next.map_err(|raw| {
                RequestFailure::MalformedBody(serde_json::from_str::<serde_json::Value>(&raw).unwrap_err())
            })
        }
    }

    fn session_with(
        backend: Arc<FakeBackend>,
    ) -> (ChatSession, mpsc::UnboundedReceiver<AppEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ChatSession::new(backend, tx), rx)
    }

    fn input(text: &str) -> InputLine {
        let mut line = InputLine::new();
        for c in text.chars() {
            line.insert(c);
        }
        line
    }

    async fn next_reply(rx: &mut mpsc::UnboundedReceiver<AppEvent>) -> Result<String, RequestFailure> {
        match rx.recv().await {
            Some(AppEvent::Reply(outcome)) => outcome,
            other => panic!("expected reply, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_hello_scenario() {
        let backend = Arc::new(FakeBackend::answering(vec![Ok("Hi there")]));
        let (mut session, mut rx) = session_with(backend.clone());

        let mut field = input("  Hello ");
        assert!(session.submit_message(&mut field));
        assert!(field.is_empty());
        assert!(session.is_locked());
        assert_eq!(session.transcript().turns(), &[Turn::user("Hello")]);

        let outcome = next_reply(&mut rx).await;
        session.settle(outcome);

        assert_eq!(
            session.transcript().turns(),
            &[Turn::user("Hello"), Turn::assistant("Hi there")]
        );
        let rendered: Vec<(Role, &str)> = session
            .view()
            .entries()
            .iter()
            .map(|e| (e.role, e.text.as_str()))
            .collect();
        assert_eq!(rendered, vec![(Role::User, "Hello"), (Role::Assistant, "Hi there")]);
        assert_eq!(session.lock_state(), LockState::Idle);
        assert!(!session.view().is_pending());
    }

    #[tokio::test]
    async fn test_blank_input_is_noop() {
        let backend = Arc::new(FakeBackend::answering(vec![]));
        let (mut session, mut rx) = session_with(backend.clone());

        for text in ["", "   ", "\n\t "] {
            let mut field = input(text);
            assert!(!session.submit_message(&mut field));
            assert_eq!(field.text(), text);
        }

        assert!(session.transcript().is_empty());
        assert!(session.view().entries().is_empty());
        assert!(!session.is_locked());
        tokio::task::yield_now().await;
        assert!(backend.requests.lock().unwrap().is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_user_turn_appended_before_request() {
        let gate = Arc::new(Notify::new());
        let backend = Arc::new(FakeBackend::answering(vec![Ok("ok")]).gated(gate.clone()));
        let (mut session, mut rx) = session_with(backend.clone());

        session.submit_message(&mut input("first"));
        assert_eq!(session.transcript().len(), 1);

        // Let the spawned request run until it blocks on the gate
        while backend.requests.lock().unwrap().is_empty() {
            tokio::task::yield_now().await;
        }
        assert_eq!(backend.requests.lock().unwrap()[0], vec![Turn::user("first")]);

        gate.notify_one();
        let outcome = next_reply(&mut rx).await;
        session.settle(outcome);
        assert_eq!(session.transcript().len(), 2);
    }

    #[tokio::test]
    async fn test_second_submission_rejected_while_pending() {
        let gate = Arc::new(Notify::new());
        let backend = Arc::new(
            FakeBackend::answering(vec![Ok("first answer"), Ok("second answer")]).gated(gate.clone()),
        );
        let (mut session, mut rx) = session_with(backend.clone());

        assert!(session.submit_message(&mut input("Hello")));

        let mut field = input("test");
        assert!(!session.submit_message(&mut field));
        assert_eq!(field.text(), "test");
        assert_eq!(session.transcript().len(), 1);
        assert!(session.is_locked());

        gate.notify_one();
        let outcome = next_reply(&mut rx).await;
        assert!(session.is_locked());
        session.settle(outcome);
        assert!(!session.is_locked());

        // Now the held text goes through
        assert!(session.submit_message(&mut field));
        gate.notify_one();
        let outcome = next_reply(&mut rx).await;
        session.settle(outcome);

        assert_eq!(backend.requests.lock().unwrap().len(), 2);
        assert_eq!(
            session.transcript().turns(),
            &[
                Turn::user("Hello"),
                Turn::assistant("first answer"),
                Turn::user("test"),
                Turn::assistant("second answer"),
            ]
        );
    }

    #[tokio::test]
    async fn test_failure_renders_fallback_without_touching_transcript() {
        let backend = Arc::new(FakeBackend::answering(vec![Err("not json"), Ok("recovered")]));
        let (mut session, mut rx) = session_with(backend.clone());

        session.submit_message(&mut input("Hello"));
        let outcome = next_reply(&mut rx).await;
        assert!(outcome.is_err());
        session.settle(outcome);

        assert_eq!(session.transcript().turns(), &[Turn::user("Hello")]);
        let last = session.view().entries().last().unwrap();
        assert!(last.is_error);
        assert_eq!(last.role, Role::Assistant);
        assert_eq!(last.text, DEFAULT_FALLBACK_MESSAGE);
        assert!(!session.is_locked());

        // The placeholder is never replayed to the endpoint
        session.submit_message(&mut input("again"));
        let outcome = next_reply(&mut rx).await;
        session.settle(outcome);

        let requests = backend.requests.lock().unwrap();
        assert_eq!(requests[1], vec![Turn::user("Hello"), Turn::user("again")]);
        assert_eq!(session.view().entries().len(), 4);
    }

    #[tokio::test]
    async fn test_each_request_carries_full_transcript() {
        let backend = Arc::new(FakeBackend::answering(vec![Ok("a1"), Ok("a2"), Ok("a3")]));
        let (mut session, mut rx) = session_with(backend.clone());

        for text in ["q1", "q2", "q3"] {
            session.submit_message(&mut input(text));
            let outcome = next_reply(&mut rx).await;
            session.settle(outcome);
        }

        let requests = backend.requests.lock().unwrap();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0], vec![Turn::user("q1")]);
        assert_eq!(
            requests[2],
            vec![
                Turn::user("q1"),
                Turn::assistant("a1"),
                Turn::user("q2"),
                Turn::assistant("a2"),
                Turn::user("q3"),
            ]
        );
    }

    #[tokio::test]
    async fn test_custom_fallback_message() {
        let backend = Arc::new(FakeBackend::answering(vec![Err("")]));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut session = ChatSession::new(backend, tx).with_fallback_message("offline");

        session.submit_message(&mut input("Hello"));
        let outcome = next_reply(&mut rx).await;
        session.settle(outcome);

        assert_eq!(session.view().entries()[1].text, "offline");
    }

    #[test]
    fn test_settle_while_idle_is_ignored() {
        let backend = Arc::new(FakeBackend::answering(vec![]));
        let (mut session, _rx) = session_with(backend);

        session.settle(Ok("stray".to_string()));
        assert!(session.transcript().is_empty());
        assert!(session.view().entries().is_empty());
    }
}
