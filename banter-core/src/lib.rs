// ABOUTME: Platform-agnostic conversation dispatch core for the banter client.
// ABOUTME: Stores, classification, routing, rendering, and the transport trait seams.

pub mod classify;
pub mod dispatch;
pub mod registrar;
pub mod render;
pub mod store;
pub mod testing;
pub mod traits;
pub mod view;

pub use classify::{classify, RoutedInput, ANALYZE_DIRECTIVE, CONTEXT_DIRECTIVE};
pub use dispatch::{Dispatcher, SendOutcome};
pub use registrar::{establish, RoutingMode, SessionHandle};
pub use render::{escape_html, render, CodeBlock, Segment};
pub use store::{Conversation, ConversationStore, Message, Sender};
pub use view::{ViewEvent, ViewHub};

// Re-export channel traits and outcome types for convenient access
pub use traits::{
    AnalysisOutcome, BackendChannel, ChannelEvent, ContextOutcome, EventChannel, GenerateOutcome,
    GenerateRequest, PromptOutcome, PromptRequest, ReviewIssue, ReviewOutcome, ReviewRequest,
    SessionCreated,
};
