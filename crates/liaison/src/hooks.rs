use std::sync::Arc;

use regex::Regex;

use crate::error::Error;

/// What a pre-execution hook decided for a tool call.
#[derive(Debug, Clone, PartialEq)]
pub enum HookAction {
    Allow,
    Deny { reason: String },
    Augment { input: serde_json::Value },
}

type PreHookFn = Arc<dyn Fn(&str, &serde_json::Value) -> HookAction + Send + Sync>;
type PostHookFn = Arc<dyn Fn(&str, &str) -> Option<String> + Send + Sync>;

/// Ordered pre/post tool-execution hooks.
///
/// Each hook pairs a tool-name regex with a handler. Hooks run in
/// registration order; the first pre-hook `Deny` short-circuits the call,
/// while `Augment` replaces the input seen by later hooks and the tool
/// itself. Post-hooks may rewrite the tool's output, also in order.
#[derive(Default, Clone)]
pub struct HookSet {
    pre: Vec<(Regex, PreHookFn)>,
    post: Vec<(Regex, PostHookFn)>,
}

impl HookSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_pre<F>(&mut self, tool_pattern: &str, handler: F) -> Result<(), Error>
    where
        F: Fn(&str, &serde_json::Value) -> HookAction + Send + Sync + 'static,
    {
        let regex = Regex::new(tool_pattern)
            .map_err(|e| Error::Config(format!("invalid hook pattern {tool_pattern:?}: {e}")))?;
        self.pre.push((regex, Arc::new(handler)));
        Ok(())
    }

    pub fn add_post<F>(&mut self, tool_pattern: &str, handler: F) -> Result<(), Error>
    where
        F: Fn(&str, &str) -> Option<String> + Send + Sync + 'static,
    {
        let regex = Regex::new(tool_pattern)
            .map_err(|e| Error::Config(format!("invalid hook pattern {tool_pattern:?}: {e}")))?;
        self.post.push((regex, Arc::new(handler)));
        Ok(())
    }

    /// Run every matching pre-hook against a pending tool call.
    ///
    /// Returns `Deny` on the first denial, `Augment` with the final input
    /// when any hook rewrote it, `Allow` otherwise.
    pub fn run_pre(&self, tool_name: &str, input: &serde_json::Value) -> HookAction {
        let mut current = input.clone();
        let mut augmented = false;

        for (pattern, handler) in &self.pre {
            if !pattern.is_match(tool_name) {
                continue;
            }
            match handler(tool_name, &current) {
                HookAction::Allow => {}
                HookAction::Deny { reason } => {
                    tracing::info!(tool = tool_name, reason = %reason, "pre-hook denied tool call");
                    return HookAction::Deny { reason };
                }
                HookAction::Augment { input } => {
                    current = input;
                    augmented = true;
                }
            }
        }

        if augmented {
            HookAction::Augment { input: current }
        } else {
            HookAction::Allow
        }
    }

    /// Run every matching post-hook over the tool's output, threading each
    /// rewrite into the next.
    pub fn run_post(&self, tool_name: &str, output: String) -> String {
        let mut current = output;
        for (pattern, handler) in &self.post {
            if pattern.is_match(tool_name)
                && let Some(rewritten) = handler(tool_name, &current)
            {
                current = rewritten;
            }
        }
        current
    }
}
