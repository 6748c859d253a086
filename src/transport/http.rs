// ABOUTME: HTTP request/response adapter for the assistant backend API.
// ABOUTME: Maps optional-field wire responses into the core's tagged outcomes.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use banter_core::traits::{
    AnalysisOutcome, BackendChannel, ContextOutcome, GenerateOutcome, GenerateRequest,
    PromptOutcome, PromptRequest, ReviewIssue, ReviewOutcome, ReviewRequest, SessionCreated,
};

/// Stateless request/response transport. One call per logical request, no
/// retries; the core relies on transport-level completion for timeouts.
#[derive(Clone)]
pub struct RestTransport {
    base_url: String,
    client: reqwest::Client,
}

impl RestTransport {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    async fn execute<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T> {
        let response = request.send().await.context("Request failed")?;
        if !response.status().is_success() {
            return Err(read_fault(response).await);
        }
        response.json::<T>().await.context("Malformed response body")
    }
}

/// Extract the best available diagnostic from a non-2xx response: the
/// server's structured `detail` field when present, else the status.
async fn read_fault(response: reqwest::Response) -> anyhow::Error {
    let status = response.status();
    if let Ok(body) = response.json::<serde_json::Value>().await {
        if let Some(detail) = body.get("detail").and_then(|d| d.as_str()) {
            return anyhow::anyhow!("{}", detail);
        }
    }
    anyhow::anyhow!("request failed with status {}", status)
}

// =============================================================================
// Wire shapes
// =============================================================================

#[derive(Debug, Serialize)]
struct SessionCreateBody<'a> {
    user_id: &'a str,
    metadata: SessionMetadata,
}

#[derive(Debug, Serialize)]
struct SessionMetadata {
    source: &'static str,
}

#[derive(Debug, Deserialize)]
struct SessionWire {
    session_id: String,
}

#[derive(Debug, Serialize)]
struct PromptBody<'a> {
    session_id: &'a str,
    user_id: &'a str,
    prompt: &'a str,
    model: &'a str,
}

#[derive(Debug, Deserialize)]
struct PromptWire {
    success: bool,
    intent: Option<String>,
    generated_code: Option<String>,
    message: Option<String>,
    error_message: Option<String>,
}

impl From<PromptWire> for PromptOutcome {
    fn from(wire: PromptWire) -> Self {
        if wire.success {
            PromptOutcome::Completed {
                intent: wire.intent,
                generated_code: wire.generated_code,
                message: wire.message,
            }
        } else {
            PromptOutcome::Rejected {
                error_message: unwrap_error(wire.error_message),
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ContextWire {
    success: bool,
    confidence_score: Option<f64>,
    context_json: Option<serde_json::Value>,
    error_message: Option<String>,
}

impl From<ContextWire> for ContextOutcome {
    fn from(wire: ContextWire) -> Self {
        if wire.success {
            ContextOutcome::Parsed {
                confidence_score: wire.confidence_score.unwrap_or(0.0),
                context_json: wire.context_json.unwrap_or(serde_json::Value::Null),
            }
        } else {
            ContextOutcome::Rejected {
                error_message: unwrap_error(wire.error_message),
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct AnalysisWire {
    success: bool,
    code_analysis: Option<String>,
    error_message: Option<String>,
}

impl From<AnalysisWire> for AnalysisOutcome {
    fn from(wire: AnalysisWire) -> Self {
        if wire.success {
            AnalysisOutcome::Completed {
                code_analysis: wire.code_analysis.unwrap_or_default(),
            }
        } else {
            AnalysisOutcome::Rejected {
                error_message: unwrap_error(wire.error_message),
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateBody<'a> {
    prompt: &'a str,
    language: &'a str,
    model: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateWire {
    success: bool,
    explanation: Option<String>,
    generated_code: Option<String>,
    language: Option<String>,
    error_message: Option<String>,
}

impl GenerateWire {
    /// The backend occasionally omits `language`; fall back to the language
    /// the request asked for.
    fn into_outcome(self, requested_language: &str) -> GenerateOutcome {
        if self.success {
            GenerateOutcome::Completed {
                explanation: self.explanation.unwrap_or_default(),
                generated_code: self.generated_code.unwrap_or_default(),
                language: self
                    .language
                    .unwrap_or_else(|| requested_language.to_string()),
            }
        } else {
            GenerateOutcome::Rejected {
                error_message: unwrap_error(self.error_message),
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct ReviewBody<'a> {
    code: &'a str,
    language: &'a str,
    review_type: &'a str,
    model: &'a str,
}

#[derive(Debug, Deserialize)]
struct ReviewIssueWire {
    #[serde(default)]
    severity: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    suggestion: String,
}

#[derive(Debug, Deserialize)]
struct ReviewWire {
    success: bool,
    #[serde(default)]
    overall_score: f64,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    issues: Vec<ReviewIssueWire>,
    #[serde(default)]
    improvements: Vec<String>,
    error_message: Option<String>,
}

impl From<ReviewWire> for ReviewOutcome {
    fn from(wire: ReviewWire) -> Self {
        if wire.success {
            ReviewOutcome::Completed {
                overall_score: wire.overall_score,
                summary: wire.summary,
                issues: wire
                    .issues
                    .into_iter()
                    .map(|issue| ReviewIssue {
                        severity: issue.severity,
                        description: issue.description,
                        suggestion: issue.suggestion,
                    })
                    .collect(),
                improvements: wire.improvements,
            }
        } else {
            ReviewOutcome::Rejected {
                error_message: unwrap_error(wire.error_message),
            }
        }
    }
}

fn unwrap_error(error_message: Option<String>) -> String {
    error_message.unwrap_or_else(|| "backend reported failure".to_string())
}

// =============================================================================
// BackendChannel implementation
// =============================================================================

#[async_trait]
impl BackendChannel for RestTransport {
    async fn create_session(&self, user_id: &str) -> Result<SessionCreated> {
        let url = format!("{}/agent/session/create", self.base_url);
        let body = SessionCreateBody {
            user_id,
            metadata: SessionMetadata {
                source: "banter_client",
            },
        };
        let wire: SessionWire = self.execute(self.client.post(&url).json(&body)).await?;
        Ok(SessionCreated {
            session_id: wire.session_id,
        })
    }

    async fn process_prompt(&self, request: PromptRequest) -> Result<PromptOutcome> {
        let url = format!("{}/agent/prompt/process", self.base_url);
        let body = PromptBody {
            session_id: &request.session_id,
            user_id: &request.user_id,
            prompt: &request.prompt,
            model: &request.model,
        };
        let wire: PromptWire = self.execute(self.client.post(&url).json(&body)).await?;
        Ok(wire.into())
    }

    async fn parse_context(
        &self,
        session_id: &str,
        context_text: &str,
        model: &str,
    ) -> Result<ContextOutcome> {
        let url = format!("{}/agent/context/parse", self.base_url);
        let wire: ContextWire = self
            .execute(self.client.post(&url).query(&[
                ("session_id", session_id),
                ("context_text", context_text),
                ("model", model),
            ]))
            .await?;
        Ok(wire.into())
    }

    async fn analyze_code(&self, session_id: &str) -> Result<AnalysisOutcome> {
        let url = format!("{}/agent/code/analyze", self.base_url);
        let wire: AnalysisWire = self
            .execute(self.client.post(&url).query(&[("session_id", session_id)]))
            .await?;
        Ok(wire.into())
    }

    async fn generate(&self, request: GenerateRequest) -> Result<GenerateOutcome> {
        let url = format!("{}/ai/generate", self.base_url);
        let body = GenerateBody {
            prompt: &request.prompt,
            language: &request.language,
            model: &request.model,
        };
        let wire: GenerateWire = self.execute(self.client.post(&url).json(&body)).await?;
        Ok(wire.into_outcome(&request.language))
    }

    async fn review(&self, request: ReviewRequest) -> Result<ReviewOutcome> {
        let url = format!("{}/ai/review", self.base_url);
        let body = ReviewBody {
            code: &request.code,
            language: &request.language,
            review_type: &request.review_type,
            model: &request.model,
        };
        let wire: ReviewWire = self.execute(self.client.post(&url).json(&body)).await?;
        Ok(wire.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_wire_success_maps_to_completed() {
        let wire: PromptWire = serde_json::from_value(serde_json::json!({
            "success": true,
            "intent": "create_new",
            "generated_code": "print('hi')"
        }))
        .unwrap();
        let outcome: PromptOutcome = wire.into();
        assert_eq!(
            outcome,
            PromptOutcome::Completed {
                intent: Some("create_new".to_string()),
                generated_code: Some("print('hi')".to_string()),
                message: None,
            }
        );
    }

    #[test]
    fn test_prompt_wire_failure_carries_error_message() {
        let wire: PromptWire = serde_json::from_value(serde_json::json!({
            "success": false,
            "error_message": "quota exceeded"
        }))
        .unwrap();
        let outcome: PromptOutcome = wire.into();
        assert_eq!(
            outcome,
            PromptOutcome::Rejected {
                error_message: "quota exceeded".to_string()
            }
        );
    }

    #[test]
    fn test_prompt_wire_failure_without_message_gets_generic_text() {
        let wire: PromptWire =
            serde_json::from_value(serde_json::json!({ "success": false })).unwrap();
        let outcome: PromptOutcome = wire.into();
        assert_eq!(
            outcome,
            PromptOutcome::Rejected {
                error_message: "backend reported failure".to_string()
            }
        );
    }

    #[test]
    fn test_context_wire_defaults_confidence_to_zero() {
        let wire: ContextWire = serde_json::from_value(serde_json::json!({
            "success": true,
            "context_json": {"goal": "demo"}
        }))
        .unwrap();
        match ContextOutcome::from(wire) {
            ContextOutcome::Parsed {
                confidence_score,
                context_json,
            } => {
                assert_eq!(confidence_score, 0.0);
                assert_eq!(context_json["goal"], "demo");
            }
            other => panic!("Expected Parsed, got {:?}", other),
        }
    }

    #[test]
    fn test_generate_wire_falls_back_to_requested_language() {
        let wire: GenerateWire = serde_json::from_value(serde_json::json!({
            "success": true,
            "explanation": "a sorter",
            "generated_code": "sorted(xs)"
        }))
        .unwrap();
        assert_eq!(
            wire.into_outcome("python"),
            GenerateOutcome::Completed {
                explanation: "a sorter".to_string(),
                generated_code: "sorted(xs)".to_string(),
                language: "python".to_string(),
            }
        );
    }

    #[test]
    fn test_review_wire_maps_issues_and_improvements() {
        let wire: ReviewWire = serde_json::from_value(serde_json::json!({
            "success": true,
            "overall_score": 7.5,
            "summary": "decent",
            "issues": [
                {"severity": "high", "description": "injection", "suggestion": "parameterize"}
            ],
            "improvements": ["add tests"]
        }))
        .unwrap();
        match ReviewOutcome::from(wire) {
            ReviewOutcome::Completed {
                overall_score,
                summary,
                issues,
                improvements,
            } => {
                assert_eq!(overall_score, 7.5);
                assert_eq!(summary, "decent");
                assert_eq!(issues.len(), 1);
                assert_eq!(issues[0].severity, "high");
                assert_eq!(improvements, vec!["add tests".to_string()]);
            }
            other => panic!("Expected Completed, got {:?}", other),
        }
    }

    #[test]
    fn test_analysis_wire_failure() {
        let wire: AnalysisWire = serde_json::from_value(serde_json::json!({
            "success": false,
            "error_message": "no code generated yet"
        }))
        .unwrap();
        assert_eq!(
            AnalysisOutcome::from(wire),
            AnalysisOutcome::Rejected {
                error_message: "no code generated yet".to_string()
            }
        );
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let transport = RestTransport::new("http://localhost:8000/");
        assert_eq!(transport.base_url, "http://localhost:8000");
    }
}
