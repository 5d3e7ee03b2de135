use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::backend::Backend;
use crate::backend::types::{
    CompletionRequest, ContentBlock, Message, Role, ToolCall, ToolResult,
};
use crate::classify::{self, ErrorKind};
use crate::config::LiaisonConfig;
use crate::decision_log::{DecisionLog, InMemoryDecisionLog};
use crate::hooks::{HookAction, HookSet};
use crate::permission::{PermissionGate, PermissionOutcome};
use crate::prompt::Prompter;
use crate::recovery::{self, ErrorContext};
use crate::spool::Spool;
use crate::tool::{ToolRegistry, validate_tool_input};
use crate::truncate::{budget_for_attempt, truncate};

/// Output emitted by one [`ConversationSession::send`] turn.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionChunk {
    /// Final assistant text for the turn.
    Text(String),
    ToolStarted { name: String },
    ToolFinished { name: String, is_error: bool },
    /// A recovery turn was appended after a context overflow.
    Recovery { attempt: u32 },
    /// Terminal failure for the turn.
    Error(String),
}

/// Result text fed back when a tool call is refused or interrupted.
const CANCELLED_RESULT: &str = "Operation cancelled by user";

type OnChunk = Box<dyn Fn(&SessionChunk) + Send + Sync>;

/// A multi-turn conversation with a tool-calling backend.
///
/// One session is one logical thread of control: tool calls within a turn
/// run strictly sequentially, and the message history is append-only until
/// [`clear`](Self::clear). Sessions share nothing mutable except the
/// decision log.
pub struct ConversationSession<B: Backend> {
    backend: B,
    registry: ToolRegistry,
    gate: PermissionGate,
    hooks: HookSet,
    spool: Spool,
    config: LiaisonConfig,
    system_prompt: String,
    max_tokens: u32,
    cancel: CancellationToken,
    on_chunk: Option<OnChunk>,
    session_id: Uuid,
    history: Vec<Message>,
}

pub struct SessionBuilder<B: Backend> {
    backend: B,
    prompter: Arc<dyn Prompter>,
    registry: ToolRegistry,
    hooks: HookSet,
    config: LiaisonConfig,
    decision_log: Option<Arc<dyn DecisionLog>>,
    system_prompt: String,
    max_tokens: u32,
    cancel: CancellationToken,
    on_chunk: Option<OnChunk>,
}

impl<B: Backend> SessionBuilder<B> {
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn tools(mut self, registry: ToolRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn hooks(mut self, hooks: HookSet) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn config(mut self, config: LiaisonConfig) -> Self {
        self.config = config;
        self
    }

    pub fn decision_log(mut self, log: Arc<dyn DecisionLog>) -> Self {
        self.decision_log = Some(log);
        self
    }

    pub fn cancellation_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Observe chunks as they are produced, before `send` returns them.
    pub fn on_chunk(mut self, callback: impl Fn(&SessionChunk) + Send + Sync + 'static) -> Self {
        self.on_chunk = Some(Box::new(callback));
        self
    }

    pub fn build(self) -> ConversationSession<B> {
        let session_id = Uuid::new_v4();
        let decision_log = self
            .decision_log
            .unwrap_or_else(|| Arc::new(InMemoryDecisionLog::new()));
        let gate = PermissionGate::new(
            self.config.auto_approve,
            Duration::from_secs(self.config.confirm_timeout_secs),
            self.prompter,
            decision_log,
            session_id,
        );
        let spool = Spool::new(self.config.spool.clone());

        ConversationSession {
            backend: self.backend,
            registry: self.registry,
            gate,
            hooks: self.hooks,
            spool,
            config: self.config,
            system_prompt: self.system_prompt,
            max_tokens: self.max_tokens,
            cancel: self.cancel,
            on_chunk: self.on_chunk,
            session_id,
            history: Vec::new(),
        }
    }
}

impl<B: Backend> ConversationSession<B> {
    pub fn builder(backend: B, prompter: Arc<dyn Prompter>) -> SessionBuilder<B> {
        SessionBuilder {
            backend,
            prompter,
            registry: ToolRegistry::new(),
            hooks: HookSet::new(),
            config: LiaisonConfig::default(),
            decision_log: None,
            system_prompt: String::new(),
            max_tokens: 4096,
            cancel: CancellationToken::new(),
            on_chunk: None,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Drop the accumulated conversation. The only way history shrinks.
    pub fn clear(&mut self) {
        self.history.clear();
    }

    /// Run one user turn to completion.
    ///
    /// The returned chunk sequence is finite and ends with exactly one
    /// `Text` or `Error` chunk. Terminal failures are folded into the chunk
    /// stream rather than raised, so a rendering surface can always show
    /// something.
    pub async fn send(&mut self, user_message: impl Into<String>) -> Vec<SessionChunk> {
        let mut chunks = Vec::new();
        self.history.push(Message::user(user_message));

        let mut attempt: u32 = 0;
        let mut last_invocation: Option<String> = None;
        let mut last_tool_name: Option<String> = None;

        loop {
            if self.cancel.is_cancelled() {
                self.emit(&mut chunks, SessionChunk::Error("cancelled by user".into()));
                break;
            }

            let request = CompletionRequest {
                system: self.system_prompt.clone(),
                messages: self.history.clone(),
                tools: self.registry.definitions(),
                max_tokens: self.max_tokens,
            };

            let response = match self.backend.send(request).await {
                Ok(response) => response,
                Err(error) => {
                    let kind = classify::classify(&error);
                    if kind == ErrorKind::ContextTooLarge && attempt < self.config.retry.max_attempts
                    {
                        attempt += 1;
                        self.emit(&mut chunks, SessionChunk::Recovery { attempt });
                        self.recover(
                            &error,
                            attempt,
                            last_invocation.clone(),
                            last_tool_name.as_deref(),
                        );
                        continue;
                    }
                    tracing::warn!(kind = ?kind, error = %error, "terminal backend error");
                    self.emit(
                        &mut chunks,
                        SessionChunk::Error(classify::preview(&error.to_string(), 500)),
                    );
                    break;
                }
            };

            let calls = response.tool_calls();
            self.history.push(Message {
                role: Role::Assistant,
                content: response.content.clone(),
            });

            if calls.is_empty() {
                self.emit(&mut chunks, SessionChunk::Text(response.text()));
                break;
            }

            let mut results = Vec::with_capacity(calls.len());
            let mut executed_any = false;
            for call in calls {
                if self.cancel.is_cancelled() {
                    // keep the tool_use/tool_result pairing intact
                    results.push(ToolResult::error(call.id, CANCELLED_RESULT));
                    continue;
                }

                self.emit(
                    &mut chunks,
                    SessionChunk::ToolStarted {
                        name: call.name.clone(),
                    },
                );
                last_invocation = Some(format!("{} {}", call.name, call.input));
                last_tool_name = Some(call.name.clone());

                let (result, executed) = self.run_tool_call(&call, attempt).await;
                self.emit(
                    &mut chunks,
                    SessionChunk::ToolFinished {
                        name: call.name,
                        is_error: result.is_error,
                    },
                );
                executed_any |= executed;
                results.push(result);
            }
            self.history.push(Message::tool_results(results));

            if executed_any {
                attempt = 0;
            }
        }

        chunks
    }

    fn emit(&self, chunks: &mut Vec<SessionChunk>, chunk: SessionChunk) {
        if let Some(callback) = &self.on_chunk {
            callback(&chunk);
        }
        chunks.push(chunk);
    }

    /// Gate, validate, and execute one tool call.
    ///
    /// Returns the result to feed back plus whether the executor actually
    /// ran to completion (which resets the recovery budget). Refusals and
    /// execution failures come back as failure-text results, never as raised
    /// errors.
    async fn run_tool_call(&self, call: &ToolCall, attempt: u32) -> (ToolResult, bool) {
        let mut input = call.input.clone();

        match self.hooks.run_pre(&call.name, &input) {
            HookAction::Allow => {}
            HookAction::Deny { reason } => {
                return (
                    ToolResult::error(&call.id, format!("{CANCELLED_RESULT}: {reason}")),
                    false,
                );
            }
            HookAction::Augment { input: augmented } => input = augmented,
        }

        let resolution = self.gate.decide(&call.name, &input).await;
        if resolution.decision.outcome == PermissionOutcome::Deny {
            return (ToolResult::error(&call.id, CANCELLED_RESULT), false);
        }
        if let Some(answers) = resolution.answers {
            // question flow already collected the result interactively
            return (ToolResult::success(&call.id, answers.to_string()), true);
        }

        let Some(tool) = self.registry.get(&call.name) else {
            return (
                ToolResult::error(&call.id, format!("unknown tool: {}", call.name)),
                false,
            );
        };

        if let Err(problem) = validate_tool_input(&tool.definition().input_schema, &input) {
            return (ToolResult::error(&call.id, problem), false);
        }

        let output = tokio::select! {
            _ = self.cancel.cancelled() => {
                return (ToolResult::error(&call.id, CANCELLED_RESULT), false);
            }
            output = tool.execute(input) => output,
        };

        match output {
            Ok(output) => {
                let spool_note = match self.spool.maybe_spool(&call.name, &output.content) {
                    Ok(Some(path)) => Some(format!("\n[full output: {}]", path.display())),
                    Ok(None) => None,
                    Err(error) => {
                        tracing::warn!(error = %error, "spooling failed, continuing");
                        None
                    }
                };

                let budget = budget_for_attempt(attempt, &self.config.retry);
                let mut content = truncate(&output.content, budget);
                content = self.hooks.run_post(&call.name, content);
                if let Some(note) = spool_note {
                    content.push_str(&note);
                }

                let result = ToolResult {
                    tool_use_id: call.id.clone(),
                    content,
                    is_error: output.is_error,
                };
                (result, true)
            }
            Err(error) => (
                ToolResult::error(&call.id, format!("tool execution failed: {error}")),
                false,
            ),
        }
    }

    /// Append a recovery turn after a context overflow.
    ///
    /// The oversized prior tool output is re-truncated in place to the
    /// aggressive budget so the retry does not re-send the content that blew
    /// the window.
    fn recover(
        &mut self,
        error: &crate::error::Error,
        attempt: u32,
        original_command: Option<String>,
        last_tool_name: Option<&str>,
    ) {
        let budget = budget_for_attempt(attempt, &self.config.retry);
        let previous_output = self.retruncate_last_tool_result(budget);

        let (status_code, raw_message) = match error {
            crate::error::Error::Api { status, message } => (*status, message.clone()),
            other => (0, other.to_string()),
        };

        let ctx = ErrorContext {
            status_code,
            raw_message,
            kind: ErrorKind::ContextTooLarge,
            attempt,
            original_command,
            previous_output,
        };

        let help = if self.config.retry.enable_help_lookup {
            last_tool_name
                .and_then(|name| self.registry.get(name))
                .and_then(|tool| tool.help_text())
        } else {
            None
        };

        let message = recovery::generate(&ctx, help.as_deref());
        self.history.push(Message::user(message));
    }

    /// Shrink the most recent tool-result block to `budget` chars. Returns
    /// the shrunken content for the error context.
    fn retruncate_last_tool_result(&mut self, budget: usize) -> Option<String> {
        for message in self.history.iter_mut().rev() {
            for block in message.content.iter_mut().rev() {
                if let ContentBlock::ToolResult { content, .. } = block {
                    *content = truncate(content, budget);
                    return Some(content.clone());
                }
            }
        }
        None
    }
}
