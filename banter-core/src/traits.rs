// ABOUTME: Channel traits and per-endpoint outcome types the dispatch router works against.
// ABOUTME: Backend-reported failure is data (Rejected); transport faults are errors.

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::broadcast;

// =============================================================================
// Request payloads
// =============================================================================

/// Multi-turn prompt through the established agent session.
#[derive(Debug, Clone)]
pub struct PromptRequest {
    pub session_id: String,
    pub user_id: String,
    pub prompt: String,
    pub model: String,
}

/// Single-turn generation through the stateless path.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub prompt: String,
    pub language: String,
    pub model: String,
}

/// Code review request.
#[derive(Debug, Clone)]
pub struct ReviewRequest {
    pub code: String,
    pub language: String,
    pub review_type: String,
    pub model: String,
}

// =============================================================================
// Per-endpoint outcomes
// =============================================================================

/// Result of session establishment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCreated {
    pub session_id: String,
}

/// Outcome of an agent prompt. When both `generated_code` and `message` are
/// present, formatting favors `generated_code`.
#[derive(Debug, Clone, PartialEq)]
pub enum PromptOutcome {
    Completed {
        intent: Option<String>,
        generated_code: Option<String>,
        message: Option<String>,
    },
    Rejected {
        error_message: String,
    },
}

/// Outcome of stateless generation.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerateOutcome {
    Completed {
        explanation: String,
        generated_code: String,
        language: String,
    },
    Rejected {
        error_message: String,
    },
}

/// Outcome of context parsing. `confidence_score` is 0 when the backend
/// omits it.
#[derive(Debug, Clone, PartialEq)]
pub enum ContextOutcome {
    Parsed {
        confidence_score: f64,
        context_json: serde_json::Value,
    },
    Rejected {
        error_message: String,
    },
}

/// Outcome of code analysis.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    Completed { code_analysis: String },
    Rejected { error_message: String },
}

/// A single issue raised by a code review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewIssue {
    pub severity: String,
    pub description: String,
    pub suggestion: String,
}

/// Outcome of a code review.
#[derive(Debug, Clone, PartialEq)]
pub enum ReviewOutcome {
    Completed {
        overall_score: f64,
        summary: String,
        issues: Vec<ReviewIssue>,
        improvements: Vec<String>,
    },
    Rejected {
        error_message: String,
    },
}

// =============================================================================
// Request/response channel
// =============================================================================

/// Stateless request/response backend channel.
///
/// One call per logical request, no retries. `Err` means a transport fault
/// (network, timeout, malformed body) carrying the best available
/// diagnostic; a backend that answered but reported failure comes back as
/// a `Rejected` outcome instead.
#[async_trait]
pub trait BackendChannel: Send + Sync {
    /// Establish an agent session for the given user.
    async fn create_session(&self, user_id: &str) -> Result<SessionCreated>;

    /// Process a prompt through the agent orchestration path.
    async fn process_prompt(&self, request: PromptRequest) -> Result<PromptOutcome>;

    /// Parse free-form context text into a structured JSON value.
    async fn parse_context(
        &self,
        session_id: &str,
        context_text: &str,
        model: &str,
    ) -> Result<ContextOutcome>;

    /// Analyze the code generated in the current session.
    async fn analyze_code(&self, session_id: &str) -> Result<AnalysisOutcome>;

    /// Single-turn direct generation, no session required.
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateOutcome>;

    /// Review a piece of code.
    async fn review(&self, request: ReviewRequest) -> Result<ReviewOutcome>;
}

// =============================================================================
// Persistent channel
// =============================================================================

/// Asynchronous event emitted by the persistent channel. The channel emits
/// exactly one event per in-flight send, correlated by room membership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    MessageReceived { text: String },
    Fault { message: String },
}

/// Always-open bidirectional transport grouped into rooms keyed by
/// conversation id. Opened once at activation, closed on client teardown.
#[async_trait]
pub trait EventChannel: Send + Sync {
    /// Switch room membership to the given conversation.
    async fn join_room(&self, conversation_id: &str) -> Result<()>;

    /// Publish a message to the conversation's room.
    async fn send_message(&self, conversation_id: &str, text: &str) -> Result<()>;

    /// Subscribe to events emitted by the channel.
    fn subscribe(&self) -> broadcast::Receiver<ChannelEvent>;
}
