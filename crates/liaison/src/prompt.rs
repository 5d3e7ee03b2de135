use std::future::Future;
use std::pin::Pin;

/// UI adapter boundary for interactive prompts.
///
/// The core never talks to a terminal or browser directly; confirmation and
/// clarifying-question flows go through this trait. A `None` return from any
/// ask method means the user dismissed or cancelled the prompt, which callers
/// treat as a denial.
///
/// Dyn-compatible (`Pin<Box<dyn Future>>` returns) so a session can hold an
/// `Arc<dyn Prompter>` supplied by the embedding surface.
pub trait Prompter: Send + Sync {
    /// Present `options` and return the chosen index.
    fn ask_selection(
        &self,
        header: &str,
        options: &[String],
    ) -> Pin<Box<dyn Future<Output = Option<usize>> + Send + '_>>;

    /// Free-form text input.
    fn ask_text(&self, prompt: &str) -> Pin<Box<dyn Future<Output = Option<String>> + Send + '_>>;

    /// Yes/no question. The embedding surface should default to no.
    fn ask_confirmation(
        &self,
        prompt: &str,
    ) -> Pin<Box<dyn Future<Output = Option<bool>> + Send + '_>>;

    /// Show a message without expecting input.
    fn display_message(&self, message: &str) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}
