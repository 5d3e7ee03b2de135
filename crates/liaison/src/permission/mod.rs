pub mod confirm;
pub mod patterns;
pub mod question;

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::decision_log::{DecisionLog, DecisionRecord};
use crate::permission::patterns::{ReadOnlyAllowlist, WritePatternSet};
use crate::prompt::Prompter;

/// Name of the clarifying-question tool, handled by its own sub-protocol.
pub const ASK_QUESTION_TOOL: &str = "ask_question";

/// Final verdict for a tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionOutcome {
    Allow,
    Ask,
    Deny,
}

#[derive(Debug, Clone)]
pub struct PermissionDecision {
    pub outcome: PermissionOutcome,
    pub reason: String,
}

/// What static classification determined, before any interaction.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// The clarifying-question tool: allowed, routed to the Q&A flow.
    Question,
    Allow {
        reason: &'static str,
    },
    /// A write operation needing confirmation.
    Ask {
        description: &'static str,
        complex: bool,
    },
}

/// Outcome of [`PermissionGate::decide`].
///
/// `answers` is populated only by the question flow; the session uses it as
/// the tool's result instead of running an executor.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub decision: PermissionDecision,
    pub answers: Option<serde_json::Value>,
}

/// Decides, per tool call, whether to execute, confirm first, or refuse.
///
/// Classification is name-and-pattern based, recomputed for every call and
/// never cached: only the question tool inspects its arguments. The pattern
/// tables are immutable and shared read-only across sessions.
pub struct PermissionGate {
    allowlist: ReadOnlyAllowlist,
    patterns: WritePatternSet,
    auto_approve: bool,
    confirm_timeout: Duration,
    prompter: Arc<dyn Prompter>,
    decision_log: Arc<dyn DecisionLog>,
    session_id: Uuid,
}

impl PermissionGate {
    pub fn new(
        auto_approve: bool,
        confirm_timeout: Duration,
        prompter: Arc<dyn Prompter>,
        decision_log: Arc<dyn DecisionLog>,
        session_id: Uuid,
    ) -> Self {
        Self {
            allowlist: ReadOnlyAllowlist::builtin(),
            patterns: WritePatternSet::builtin(),
            auto_approve,
            confirm_timeout,
            prompter,
            decision_log,
            session_id,
        }
    }

    pub fn with_tables(
        mut self,
        allowlist: ReadOnlyAllowlist,
        patterns: WritePatternSet,
    ) -> Self {
        self.allowlist = allowlist;
        self.patterns = patterns;
        self
    }

    /// Static classification of a tool call. Pure: no prompting, no logging.
    pub fn classify(&self, tool_name: &str, input: &serde_json::Value) -> Classification {
        if tool_name == ASK_QUESTION_TOOL {
            return Classification::Question;
        }
        if self.allowlist.contains(tool_name) {
            return Classification::Allow {
                reason: "read-only tool",
            };
        }
        if self.auto_approve {
            return Classification::Allow {
                reason: "auto-approve enabled",
            };
        }
        if let Some(matched) = self.patterns.find_match(tool_name, input) {
            return Classification::Ask {
                description: matched.description,
                complex: matched.complex,
            };
        }
        Classification::Allow {
            reason: "no write pattern matched",
        }
    }

    /// Classify, drive any confirmation or question flow, and record the
    /// decision.
    pub async fn decide(&self, tool_name: &str, input: &serde_json::Value) -> Resolution {
        let resolution = match self.classify(tool_name, input) {
            Classification::Question => {
                match question::run_questions(self.prompter.as_ref(), input).await {
                    Ok(answers) => Resolution {
                        decision: PermissionDecision {
                            outcome: PermissionOutcome::Allow,
                            reason: "clarifying question answered".into(),
                        },
                        answers: Some(answers),
                    },
                    Err(problem) => Resolution {
                        decision: PermissionDecision {
                            outcome: PermissionOutcome::Deny,
                            reason: problem,
                        },
                        answers: None,
                    },
                }
            }
            Classification::Allow { reason } => Resolution {
                decision: PermissionDecision {
                    outcome: PermissionOutcome::Allow,
                    reason: reason.into(),
                },
                answers: None,
            },
            Classification::Ask {
                description,
                complex,
            } => {
                let approved = if complex {
                    confirm::confirm_complex(
                        self.prompter.as_ref(),
                        description,
                        tool_name,
                        input,
                        self.confirm_timeout,
                    )
                    .await
                } else {
                    confirm::confirm_simple(
                        self.prompter.as_ref(),
                        description,
                        self.confirm_timeout,
                    )
                    .await
                };

                let decision = if approved {
                    PermissionDecision {
                        outcome: PermissionOutcome::Allow,
                        reason: format!("user approved: {description}"),
                    }
                } else {
                    PermissionDecision {
                        outcome: PermissionOutcome::Deny,
                        reason: format!("user declined or timed out: {description}"),
                    }
                };
                Resolution {
                    decision,
                    answers: None,
                }
            }
        };

        tracing::info!(
            tool = tool_name,
            outcome = ?resolution.decision.outcome,
            reason = %resolution.decision.reason,
            "permission decision"
        );
        self.decision_log
            .record(DecisionRecord::new(
                self.session_id,
                tool_name,
                resolution.decision.outcome,
                resolution.decision.reason.clone(),
            ))
            .await;

        resolution
    }
}
