// ABOUTME: Classifies trimmed user input into one of four routing intents.
// ABOUTME: Directive tokens take precedence, then session availability picks the generate path.

use crate::registrar::RoutingMode;

/// Directive token that routes the remainder of the input to context parsing.
pub const CONTEXT_DIRECTIVE: &str = "/context";
/// Directive token that triggers code analysis of the current session.
pub const ANALYZE_DIRECTIVE: &str = "/analyze";

/// Routing decision for a single user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutedInput {
    /// `/context <payload>` — parse the payload into a structured context.
    ContextParse { payload: String },
    /// `/analyze` — analyze the code generated in the current session.
    CodeAnalyze,
    /// Multi-turn generation through the established agent session.
    AgentGenerate { prompt: String },
    /// Single-turn generation through the stateless path.
    DirectGenerate { prompt: String },
}

/// Classify a trimmed, non-empty input.
///
/// Precedence: context directive prefix, analyze directive equality, then
/// agent vs. direct generation depending on whether a session was
/// established. Directive matching is case-insensitive; the context payload
/// keeps the original casing.
pub fn classify(text: &str, routing: &RoutingMode) -> RoutedInput {
    let lower = text.to_lowercase();

    // The directive and its trailing space are ASCII, so the byte offset in
    // the lowered string is valid in the original.
    let prefix_len = CONTEXT_DIRECTIVE.len() + 1;
    if lower.starts_with(CONTEXT_DIRECTIVE) && lower[CONTEXT_DIRECTIVE.len()..].starts_with(' ') {
        return RoutedInput::ContextParse {
            payload: text[prefix_len..].to_string(),
        };
    }

    if lower == ANALYZE_DIRECTIVE {
        return RoutedInput::CodeAnalyze;
    }

    if routing.is_agent() {
        RoutedInput::AgentGenerate {
            prompt: text.to_string(),
        }
    } else {
        RoutedInput::DirectGenerate {
            prompt: text.to_string(),
        }
    }
}
