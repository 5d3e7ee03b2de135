pub mod types;

use crate::backend::types::{CompletionRequest, CompletionResponse};

/// The language-model service boundary.
///
/// A transport failure surfaces as `Error::Api { status, message }` (HTTP
/// error with a body) or `Error::Http` (network-level failure). The caller
/// distinguishes final text from requested tool calls via the response's
/// content blocks.
///
/// Implementors must be thread-safe (`Send + Sync`) so a shared client can
/// serve concurrent sessions.
pub trait Backend: Send + Sync {
    fn send(
        &self,
        request: CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, crate::error::Error>> + Send;
}
