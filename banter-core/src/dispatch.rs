// ABOUTME: Dispatch router — routes classified input to a backend channel and records the outcome.
// ABOUTME: Enforces one outstanding request per conversation view, always returning to a sendable state.

use std::sync::Arc;

use crate::classify::{classify, RoutedInput};
use crate::registrar::RoutingMode;
use crate::store::{Conversation, ConversationStore, Message, Sender};
use crate::traits::{
    AnalysisOutcome, BackendChannel, ChannelEvent, ContextOutcome, EventChannel, GenerateOutcome,
    GenerateRequest, PromptOutcome, PromptRequest, ReviewIssue, ReviewOutcome, ReviewRequest,
};
use crate::view::{ViewEvent, ViewHub};

/// Blocking notice raised when input arrives with no conversation selected.
pub const NOTICE_SELECT_CONVERSATION: &str = "Select a conversation first";
/// Blocking notice raised when a request is already outstanding.
pub const NOTICE_REQUEST_OUTSTANDING: &str = "A request is already in flight";

/// What became of a submitted input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The request ran to completion and a system message was appended.
    Completed,
    /// The request was handed to the persistent channel; the reply arrives
    /// later as a `ChannelEvent` and PENDING stays set until it does.
    AwaitingChannel,
    /// Empty input; nothing was dispatched, no message created.
    Ignored,
    /// No conversation selected; a blocking notice was raised.
    NoConversation,
    /// A request is already outstanding for this conversation view.
    Busy,
}

/// Per-view dispatch state machine: IDLE → PENDING → IDLE.
///
/// Owns the conversation store and the transport seams. Every validated
/// input appends exactly one user message and leads to exactly one system
/// message (success, backend error, or fault); the transition back to IDLE
/// is unconditional.
pub struct Dispatcher {
    store: ConversationStore,
    backend: Arc<dyn BackendChannel>,
    realtime: Option<Arc<dyn EventChannel>>,
    routing: RoutingMode,
    model: String,
    language: String,
    active: Option<String>,
    pending: bool,
    hub: ViewHub,
}

impl Dispatcher {
    pub fn new(
        store: ConversationStore,
        backend: Arc<dyn BackendChannel>,
        realtime: Option<Arc<dyn EventChannel>>,
        routing: RoutingMode,
        model: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            store,
            backend,
            realtime,
            routing,
            model: model.into(),
            language: language.into(),
            active: None,
            pending: false,
            hub: ViewHub::new(),
        }
    }

    pub fn hub(&self) -> &ViewHub {
        &self.hub
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn routing(&self) -> &RoutingMode {
        &self.routing
    }

    pub fn pending(&self) -> bool {
        self.pending
    }

    pub fn active_conversation(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Create a conversation and make it the active one.
    pub async fn create_conversation(&mut self, title: &str) -> anyhow::Result<Conversation> {
        let conversation = self.store.create_conversation(title)?;
        self.select_conversation(&conversation.id).await;
        Ok(conversation)
    }

    /// Select a conversation, loading its persisted history and switching
    /// room membership on the persistent channel.
    ///
    /// The pending flag is view-scoped and deliberately not reconciled
    /// across a switch.
    pub async fn select_conversation(&mut self, conversation_id: &str) -> Vec<Message> {
        self.active = Some(conversation_id.to_string());
        let messages = self.store.select_conversation(conversation_id);

        if let Some(channel) = self.realtime.clone() {
            if let Err(e) = channel.join_room(conversation_id).await {
                tracing::warn!(
                    conversation_id = %conversation_id,
                    error = %e,
                    "Failed to join conversation room"
                );
            }
        }

        messages
    }

    /// Submit user input.
    ///
    /// Validation faults (empty input, no conversation, already pending)
    /// are rejected before classification and never create a message.
    pub async fn send(&mut self, input: &str) -> SendOutcome {
        let text = input.trim();
        if text.is_empty() {
            return SendOutcome::Ignored;
        }
        let Some(conversation_id) = self.active.clone() else {
            self.hub.broadcast(ViewEvent::Notice {
                text: NOTICE_SELECT_CONVERSATION.to_string(),
            });
            return SendOutcome::NoConversation;
        };
        if self.pending {
            self.hub.broadcast(ViewEvent::Notice {
                text: NOTICE_REQUEST_OUTSTANDING.to_string(),
            });
            return SendOutcome::Busy;
        }

        self.append(&conversation_id, Sender::User, text.to_string());
        self.set_pending(&conversation_id, true);

        let routed = classify(text, &self.routing);

        // Generate intents go over the persistent channel when one is
        // connected; the reply arrives out-of-band and clears PENDING.
        if matches!(
            routed,
            RoutedInput::AgentGenerate { .. } | RoutedInput::DirectGenerate { .. }
        ) {
            if let Some(channel) = self.realtime.clone() {
                match channel.send_message(&conversation_id, text).await {
                    Ok(()) => return SendOutcome::AwaitingChannel,
                    Err(e) => {
                        let reply = format_fault(&e);
                        self.append(&conversation_id, Sender::System, reply);
                        self.finish(&conversation_id);
                        return SendOutcome::Completed;
                    }
                }
            }
        }

        let reply = self.route(routed).await;
        self.append(&conversation_id, Sender::System, reply);
        self.finish(&conversation_id);
        SendOutcome::Completed
    }

    /// Review a piece of code through the review endpoint, with the same
    /// validation and pending discipline as `send`.
    pub async fn review(&mut self, code: &str, language: &str) -> SendOutcome {
        if code.trim().is_empty() {
            return SendOutcome::Ignored;
        }
        let Some(conversation_id) = self.active.clone() else {
            self.hub.broadcast(ViewEvent::Notice {
                text: NOTICE_SELECT_CONVERSATION.to_string(),
            });
            return SendOutcome::NoConversation;
        };
        if self.pending {
            self.hub.broadcast(ViewEvent::Notice {
                text: NOTICE_REQUEST_OUTSTANDING.to_string(),
            });
            return SendOutcome::Busy;
        }

        self.append(
            &conversation_id,
            Sender::User,
            format!("Review code:\n```{}\n{}\n```", language, code),
        );
        self.set_pending(&conversation_id, true);

        let request = ReviewRequest {
            code: code.to_string(),
            language: language.to_string(),
            review_type: "general".to_string(),
            model: self.model.clone(),
        };
        let reply = match self.backend.review(request).await {
            Ok(ReviewOutcome::Completed {
                overall_score,
                summary,
                issues,
                improvements,
            }) => format_review_reply(overall_score, &summary, &issues, &improvements),
            Ok(ReviewOutcome::Rejected { error_message }) => format_backend_error(&error_message),
            Err(e) => format!("⚠️ Could not review code: {:#}", e),
        };

        self.append(&conversation_id, Sender::System, reply);
        self.finish(&conversation_id);
        SendOutcome::Completed
    }

    /// Consume an event from the persistent channel.
    ///
    /// Exactly one event arrives per in-flight send; both the response and
    /// the fault variant clear PENDING so the conversation never sticks.
    pub fn handle_channel_event(&mut self, event: ChannelEvent) {
        let Some(conversation_id) = self.active.clone() else {
            tracing::debug!("Channel event with no active conversation, dropping");
            return;
        };

        let text = match event {
            ChannelEvent::MessageReceived { text } => text,
            ChannelEvent::Fault { message } => format!("⚠️ {}", message),
        };
        self.append(&conversation_id, Sender::System, text);

        if self.pending {
            self.finish(&conversation_id);
        }
    }

    // =========================================================================
    // Routing
    // =========================================================================

    async fn route(&self, routed: RoutedInput) -> String {
        match routed {
            RoutedInput::ContextParse { payload } => {
                let Some(session) = self.routing.session() else {
                    return "⚠️ Agent session is not available".to_string();
                };
                match self
                    .backend
                    .parse_context(&session.session_id, &payload, &self.model)
                    .await
                {
                    Ok(ContextOutcome::Parsed {
                        confidence_score,
                        context_json,
                    }) => format_context_reply(confidence_score, &context_json),
                    Ok(ContextOutcome::Rejected { error_message }) => {
                        format_backend_error(&error_message)
                    }
                    Err(e) => format_fault(&e),
                }
            }
            RoutedInput::CodeAnalyze => {
                let Some(session) = self.routing.session() else {
                    return "⚠️ Agent session is not available".to_string();
                };
                match self.backend.analyze_code(&session.session_id).await {
                    Ok(AnalysisOutcome::Completed { code_analysis }) => {
                        format_analysis_reply(&code_analysis)
                    }
                    Ok(AnalysisOutcome::Rejected { error_message }) => {
                        format_backend_error(&error_message)
                    }
                    Err(e) => format_fault(&e),
                }
            }
            RoutedInput::AgentGenerate { prompt } => match self.routing.session() {
                Some(session) => {
                    let request = PromptRequest {
                        session_id: session.session_id.clone(),
                        user_id: session.user_id.clone(),
                        prompt,
                        model: self.model.clone(),
                    };
                    match self.backend.process_prompt(request).await {
                        Ok(PromptOutcome::Completed {
                            intent,
                            generated_code,
                            message,
                        }) => format_agent_reply(
                            &self.language,
                            intent.as_deref(),
                            generated_code.as_deref(),
                            message.as_deref(),
                        ),
                        Ok(PromptOutcome::Rejected { error_message }) => {
                            format_backend_error(&error_message)
                        }
                        Err(e) => format_fault(&e),
                    }
                }
                // Classification consults the routing tag, so this arm is
                // unreachable in practice; degrade to the stateless path.
                None => self.direct_generate(prompt).await,
            },
            RoutedInput::DirectGenerate { prompt } => self.direct_generate(prompt).await,
        }
    }

    async fn direct_generate(&self, prompt: String) -> String {
        let request = GenerateRequest {
            prompt,
            language: self.language.clone(),
            model: self.model.clone(),
        };
        match self.backend.generate(request).await {
            Ok(GenerateOutcome::Completed {
                explanation,
                generated_code,
                language,
            }) => format_direct_reply(&explanation, &language, &generated_code),
            Ok(GenerateOutcome::Rejected { error_message }) => format_backend_error(&error_message),
            Err(e) => format_fault(&e),
        }
    }

    // =========================================================================
    // State transitions
    // =========================================================================

    fn append(&mut self, conversation_id: &str, sender: Sender, text: String) {
        let message = Message::new(conversation_id, sender, text);
        self.store.append_message(message.clone());
        self.hub.broadcast(ViewEvent::MessageAppended {
            conversation_id: conversation_id.to_string(),
            message,
        });
    }

    fn set_pending(&mut self, conversation_id: &str, pending: bool) {
        self.pending = pending;
        self.hub.broadcast(ViewEvent::PendingChanged {
            conversation_id: conversation_id.to_string(),
            pending,
        });
    }

    /// Return to IDLE and hand focus back to the composer.
    fn finish(&mut self, conversation_id: &str) {
        self.set_pending(conversation_id, false);
        self.hub.broadcast(ViewEvent::ComposerFocus);
    }
}

// =============================================================================
// Reply formatting
// =============================================================================

fn format_agent_reply(
    language: &str,
    intent: Option<&str>,
    generated_code: Option<&str>,
    message: Option<&str>,
) -> String {
    let mut reply = String::new();
    if let Some(intent) = intent {
        reply.push_str(&format!("🎯 Intent: {}\n\n", intent));
    }
    // Documented precedence: generated_code wins over message.
    match generated_code {
        Some(code) => reply.push_str(&format!("```{}\n{}\n```", language, code)),
        None => reply.push_str(message.unwrap_or_default()),
    }
    reply
}

fn format_direct_reply(explanation: &str, language: &str, code: &str) -> String {
    format!("{}\n\n```{}\n{}\n```", explanation, language, code)
}

fn format_context_reply(confidence_score: f64, context_json: &serde_json::Value) -> String {
    let pretty = serde_json::to_string_pretty(context_json)
        .unwrap_or_else(|_| context_json.to_string());
    format!(
        "✅ Context parsed! (Confidence: {:.0}%)\n\n```json\n{}\n```",
        confidence_score * 100.0,
        pretty
    )
}

fn format_analysis_reply(code_analysis: &str) -> String {
    format!("📊 Code Analysis:\n\n{}", code_analysis)
}

fn format_backend_error(error_message: &str) -> String {
    format!("⚠️ {}", error_message)
}

fn format_fault(error: &anyhow::Error) -> String {
    format!("⚠️ Could not reach the assistant: {:#}", error)
}

fn format_review_reply(
    overall_score: f64,
    summary: &str,
    issues: &[ReviewIssue],
    improvements: &[String],
) -> String {
    let mut reply = format!(
        "📊 **Code Review Result**\n\n**Score**: {}/10\n\n**Summary**: {}\n\n",
        overall_score, summary
    );

    if !issues.is_empty() {
        reply.push_str("**Issues Found**:\n");
        for (idx, issue) in issues.iter().enumerate() {
            reply.push_str(&format!(
                "{}. [{}] {}\n   💡 Suggestion: {}\n\n",
                idx + 1,
                issue.severity.to_uppercase(),
                issue.description,
                issue.suggestion
            ));
        }
    }

    if !improvements.is_empty() {
        reply.push_str("**Improvements**:\n");
        for (idx, improvement) in improvements.iter().enumerate() {
            reply.push_str(&format!("{}. {}\n", idx + 1, improvement));
        }
    }

    reply
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_agent_reply_prefers_generated_code() {
        let reply = format_agent_reply(
            "python",
            Some("create_new"),
            Some("print('hi')"),
            Some("ignored"),
        );
        assert!(reply.starts_with("🎯 Intent: create_new\n\n"));
        assert!(reply.contains("```python\nprint('hi')\n```"));
        assert!(!reply.contains("ignored"));
    }

    #[test]
    fn test_format_agent_reply_plain_message() {
        let reply = format_agent_reply("python", None, None, Some("hello there"));
        assert_eq!(reply, "hello there");
    }

    #[test]
    fn test_format_direct_reply() {
        let reply = format_direct_reply("A sorter.", "python", "sorted(xs)");
        assert_eq!(reply, "A sorter.\n\n```python\nsorted(xs)\n```");
    }

    #[test]
    fn test_format_context_reply_rounds_percentage() {
        let json = serde_json::json!({"goal": "demo"});
        let reply = format_context_reply(0.85, &json);
        assert!(reply.starts_with("✅ Context parsed! (Confidence: 85%)"));
        assert!(reply.contains("```json\n"));
        assert!(reply.contains("\"goal\": \"demo\""));
    }

    #[test]
    fn test_format_context_reply_zero_when_absent() {
        let reply = format_context_reply(0.0, &serde_json::json!({}));
        assert!(reply.contains("(Confidence: 0%)"));
    }

    #[test]
    fn test_format_analysis_reply() {
        let reply = format_analysis_reply("looks fine");
        assert_eq!(reply, "📊 Code Analysis:\n\nlooks fine");
    }

    #[test]
    fn test_format_review_reply_sections() {
        let issues = vec![ReviewIssue {
            severity: "high".to_string(),
            description: "SQL injection".to_string(),
            suggestion: "use parameters".to_string(),
        }];
        let improvements = vec!["add tests".to_string()];
        let reply = format_review_reply(7.5, "decent", &issues, &improvements);
        assert!(reply.contains("**Score**: 7.5/10"));
        assert!(reply.contains("**Summary**: decent"));
        assert!(reply.contains("1. [HIGH] SQL injection"));
        assert!(reply.contains("💡 Suggestion: use parameters"));
        assert!(reply.contains("**Improvements**:\n1. add tests"));
    }

    #[test]
    fn test_format_review_reply_omits_empty_sections() {
        let reply = format_review_reply(9.0, "clean", &[], &[]);
        assert!(!reply.contains("Issues Found"));
        assert!(!reply.contains("Improvements"));
    }

    #[test]
    fn test_format_backend_error() {
        assert_eq!(format_backend_error("quota exceeded"), "⚠️ quota exceeded");
    }
}
