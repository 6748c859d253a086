// ABOUTME: Mock channel implementations for exercising the dispatch core in tests.
// ABOUTME: Scripted per-endpoint replies plus call and emission recording.

use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::traits::{
    AnalysisOutcome, BackendChannel, ChannelEvent, ContextOutcome, EventChannel, GenerateOutcome,
    GenerateRequest, PromptOutcome, PromptRequest, ReviewOutcome, ReviewRequest, SessionCreated,
};

/// A scripted reply for one endpoint: a value, a transport fault, or nothing.
#[derive(Debug, Clone)]
enum Scripted<T> {
    Reply(T),
    Fault(String),
    Unscripted,
}

impl<T: Clone> Scripted<T> {
    fn resolve(&self, endpoint: &str) -> Result<T> {
        match self {
            Scripted::Reply(value) => Ok(value.clone()),
            Scripted::Fault(message) => anyhow::bail!("{}", message),
            Scripted::Unscripted => anyhow::bail!("no scripted reply for {}", endpoint),
        }
    }
}

/// Request/response channel with scripted outcomes and call recording.
pub struct MockBackend {
    session: Scripted<SessionCreated>,
    prompt: Scripted<PromptOutcome>,
    context: Scripted<ContextOutcome>,
    analysis: Scripted<AnalysisOutcome>,
    generate: Scripted<GenerateOutcome>,
    review: Scripted<ReviewOutcome>,
    calls: Mutex<Vec<String>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            session: Scripted::Unscripted,
            prompt: Scripted::Unscripted,
            context: Scripted::Unscripted,
            analysis: Scripted::Unscripted,
            generate: Scripted::Unscripted,
            review: Scripted::Unscripted,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_session(mut self, session_id: &str) -> Self {
        self.session = Scripted::Reply(SessionCreated {
            session_id: session_id.to_string(),
        });
        self
    }

    pub fn with_session_fault(mut self, message: &str) -> Self {
        self.session = Scripted::Fault(message.to_string());
        self
    }

    pub fn with_prompt(mut self, outcome: PromptOutcome) -> Self {
        self.prompt = Scripted::Reply(outcome);
        self
    }

    pub fn with_prompt_fault(mut self, message: &str) -> Self {
        self.prompt = Scripted::Fault(message.to_string());
        self
    }

    pub fn with_context(mut self, outcome: ContextOutcome) -> Self {
        self.context = Scripted::Reply(outcome);
        self
    }

    pub fn with_analysis(mut self, outcome: AnalysisOutcome) -> Self {
        self.analysis = Scripted::Reply(outcome);
        self
    }

    pub fn with_generate(mut self, outcome: GenerateOutcome) -> Self {
        self.generate = Scripted::Reply(outcome);
        self
    }

    pub fn with_generate_fault(mut self, message: &str) -> Self {
        self.generate = Scripted::Fault(message.to_string());
        self
    }

    pub fn with_review(mut self, outcome: ReviewOutcome) -> Self {
        self.review = Scripted::Reply(outcome);
        self
    }

    pub fn with_review_fault(mut self, message: &str) -> Self {
        self.review = Scripted::Fault(message.to_string());
        self
    }

    /// Endpoints hit, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, endpoint: &str) {
        self.calls.lock().unwrap().push(endpoint.to_string());
    }
}

#[async_trait]
impl BackendChannel for MockBackend {
    async fn create_session(&self, _user_id: &str) -> Result<SessionCreated> {
        self.record("create_session");
        self.session.resolve("create_session")
    }

    async fn process_prompt(&self, _request: PromptRequest) -> Result<PromptOutcome> {
        self.record("process_prompt");
        self.prompt.resolve("process_prompt")
    }

    async fn parse_context(
        &self,
        _session_id: &str,
        _context_text: &str,
        _model: &str,
    ) -> Result<ContextOutcome> {
        self.record("parse_context");
        self.context.resolve("parse_context")
    }

    async fn analyze_code(&self, _session_id: &str) -> Result<AnalysisOutcome> {
        self.record("analyze_code");
        self.analysis.resolve("analyze_code")
    }

    async fn generate(&self, _request: GenerateRequest) -> Result<GenerateOutcome> {
        self.record("generate");
        self.generate.resolve("generate")
    }

    async fn review(&self, _request: ReviewRequest) -> Result<ReviewOutcome> {
        self.record("review");
        self.review.resolve("review")
    }
}

/// Persistent channel that records joins/sends and lets tests emit events.
pub struct MockEventChannel {
    events: broadcast::Sender<ChannelEvent>,
    joined: Mutex<Vec<String>>,
    sent: Mutex<Vec<(String, String)>>,
    fail_sends: bool,
}

impl Default for MockEventChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEventChannel {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            events,
            joined: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
            fail_sends: false,
        }
    }

    /// A channel whose sends fail with a connection fault.
    pub fn failing() -> Self {
        Self {
            fail_sends: true,
            ..Self::new()
        }
    }

    /// Emit an event as the server would.
    pub fn emit(&self, event: ChannelEvent) {
        let _ = self.events.send(event);
    }

    pub fn joined_rooms(&self) -> Vec<String> {
        self.joined.lock().unwrap().clone()
    }

    pub fn sent_messages(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventChannel for MockEventChannel {
    async fn join_room(&self, conversation_id: &str) -> Result<()> {
        self.joined.lock().unwrap().push(conversation_id.to_string());
        Ok(())
    }

    async fn send_message(&self, conversation_id: &str, text: &str) -> Result<()> {
        if self.fail_sends {
            anyhow::bail!("connection lost");
        }
        self.sent
            .lock()
            .unwrap()
            .push((conversation_id.to_string(), text.to_string()));
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<ChannelEvent> {
        self.events.subscribe()
    }
}
