// ABOUTME: One-shot agent session establishment at client activation.
// ABOUTME: Failure degrades to the stateless path for the rest of the activation, no retry.

use crate::traits::BackendChannel;

/// Backend session handle used by the stateful routing path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHandle {
    pub session_id: String,
    pub user_id: String,
}

/// Which routing path is available for this activation.
///
/// The tag is decided once, at activation: `Agent` when session
/// establishment succeeded, `Direct` otherwise (or when the agent path is
/// disabled by config). There is no implicit null check and no per-message
/// retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingMode {
    /// Stateful agent path with an established session.
    Agent { session: SessionHandle },
    /// Stateless fallback path.
    Direct,
}

impl RoutingMode {
    pub fn is_agent(&self) -> bool {
        matches!(self, RoutingMode::Agent { .. })
    }

    pub fn session(&self) -> Option<&SessionHandle> {
        match self {
            RoutingMode::Agent { session } => Some(session),
            RoutingMode::Direct => None,
        }
    }
}

/// Establish an agent session, once, at client activation.
///
/// Any failure (network fault, malformed response) disables stateful
/// routing for the remainder of the activation. The failure is logged but
/// never surfaced as a conversation message.
pub async fn establish(backend: &dyn BackendChannel, user_id: &str) -> RoutingMode {
    match backend.create_session(user_id).await {
        Ok(created) => {
            tracing::info!(
                session_id = %created.session_id,
                user_id = %user_id,
                "Agent session established"
            );
            RoutingMode::Agent {
                session: SessionHandle {
                    session_id: created.session_id,
                    user_id: user_id.to_string(),
                },
            }
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                "Agent session establishment failed, using direct generation for this activation"
            );
            RoutingMode::Direct
        }
    }
}
