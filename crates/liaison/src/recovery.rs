use crate::classify::ErrorKind;

/// Everything known about a transport failure at recovery time. Created when
/// the backend call fails, discarded once the recovery turn is appended or
/// the error surfaces as terminal.
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub status_code: u16,
    pub raw_message: String,
    pub kind: ErrorKind,
    pub attempt: u32,
    /// The tool invocation whose output most likely blew the context, when
    /// the session can identify one.
    pub original_command: Option<String>,
    pub previous_output: Option<String>,
}

/// Flags that mark a help line as useful for shrinking output.
const FILTER_FLAG_KEYWORDS: &[&str] = &[
    "--limit", "--filter", "--fields", "--query", "--top", "--select", "--max",
];

const MAX_HELP_LINES: usize = 8;
const MAX_HELP_LINE_CHARS: usize = 100;

/// Build the corrective user-role turn sent back to the backend after a
/// context overflow.
///
/// The message tells the model its previous request produced too much data
/// and walks it toward a narrower retry: generic mitigations first, then the
/// failing command, then filter flags mined from the tool's own help text,
/// then one worked example.
pub fn generate(ctx: &ErrorContext, help_text: Option<&str>) -> String {
    let mut msg = String::new();

    msg.push_str(&format!(
        "The previous request failed because the response was too large for \
         the context window (attempt {} of recovery).\n\n",
        ctx.attempt
    ));

    msg.push_str(
        "You must retry the previous operation in a way that produces \
         strictly less output.\n\n",
    );

    msg.push_str("Ways to reduce the output size:\n");
    msg.push_str("1. Use a smaller result-count limit (fetch fewer items).\n");
    msg.push_str("2. Select only the fields you actually need.\n");
    msg.push_str("3. Add filters to narrow the query before fetching.\n");

    if let Some(command) = &ctx.original_command {
        msg.push_str(&format!("\nThe failing invocation was:\n{command}\n"));
    }

    if let Some(help) = help_text {
        let lines = extract_filter_help(help);
        if !lines.is_empty() {
            msg.push_str("\nRelevant options from the tool's help:\n");
            for line in lines {
                msg.push_str(line);
                msg.push('\n');
            }
        }
    }

    msg.push_str(
        "\nExample: instead of fetching every open item, request the 10 most \
         recent with only id, title, and status fields.\n",
    );

    tracing::debug!(
        attempt = ctx.attempt,
        status = ctx.status_code,
        has_command = ctx.original_command.is_some(),
        "generated recovery instructions"
    );

    msg
}

/// Pull the lines from a help blob that document filter/limit flags.
///
/// Keeps short lines only: long prose paragraphs that happen to mention a
/// flag are noise, option tables are what we want.
fn extract_filter_help(help: &str) -> Vec<&str> {
    help.lines()
        .map(str::trim)
        .filter(|line| {
            line.chars().count() < MAX_HELP_LINE_CHARS
                && FILTER_FLAG_KEYWORDS.iter().any(|k| line.contains(k))
        })
        .take(MAX_HELP_LINES)
        .collect()
}
