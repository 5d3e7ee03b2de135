use std::time::Duration;

use tokio::time::timeout;

use crate::prompt::Prompter;

/// Keys worth surfacing in a confirmation summary, in display order.
const SUMMARY_KEYS: &[&str] = &[
    "title", "id", "name", "branch", "path", "target", "description", "assignee",
];

const MAX_SUMMARY_FIELDS: usize = 5;
const MAX_FIELD_VALUE_CHARS: usize = 80;

/// How many invalid menu selections a complex confirmation tolerates.
const MAX_CONFIRM_TRIES: u32 = 3;

/// Single yes/no confirmation. Timeout, cancellation, and "no" all read as
/// a refusal.
pub async fn confirm_simple(
    prompter: &dyn Prompter,
    description: &str,
    wait: Duration,
) -> bool {
    let prompt = format!("{description} — proceed?");
    match timeout(wait, prompter.ask_confirmation(&prompt)).await {
        Ok(Some(answer)) => answer,
        Ok(None) => false,
        Err(_) => {
            tracing::warn!("confirmation timed out, denying");
            false
        }
    }
}

/// Structured confirmation for operations worth more than a yes/no.
///
/// Shows the operation description plus a handful of fields extracted from
/// the tool input, then offers approve / deny / view-full-json. Viewing the
/// full JSON re-presents the menu; invalid selections retry up to
/// [`MAX_CONFIRM_TRIES`] before denying.
pub async fn confirm_complex(
    prompter: &dyn Prompter,
    description: &str,
    tool_name: &str,
    input: &serde_json::Value,
    wait: Duration,
) -> bool {
    let header = build_summary(description, tool_name, input);
    let options = vec![
        "approve".to_string(),
        "deny".to_string(),
        "view-full-json".to_string(),
    ];

    let mut tries = 0;
    while tries < MAX_CONFIRM_TRIES {
        let choice = match timeout(wait, prompter.ask_selection(&header, &options)).await {
            Ok(Some(i)) => i,
            Ok(None) => return false,
            Err(_) => {
                tracing::warn!(tool = tool_name, "confirmation timed out, denying");
                return false;
            }
        };

        match choice {
            0 => return true,
            1 => return false,
            2 => {
                let full = serde_json::to_string_pretty(input)
                    .unwrap_or_else(|_| input.to_string());
                prompter.display_message(&full).await;
                // viewing does not count as an invalid entry
            }
            _ => {
                prompter
                    .display_message("Invalid selection, choose approve, deny, or view-full-json.")
                    .await;
                tries += 1;
            }
        }
    }

    false
}

/// Compose the multi-field summary shown for a complex confirmation.
fn build_summary(description: &str, tool_name: &str, input: &serde_json::Value) -> String {
    let mut summary = format!("{description} ({tool_name})");
    for (key, value) in extract_fields(input) {
        summary.push_str(&format!("\n  {key}: {value}"));
    }
    summary
}

/// Pull up to [`MAX_SUMMARY_FIELDS`] recognized fields out of the input,
/// capping each rendered value.
fn extract_fields(input: &serde_json::Value) -> Vec<(String, String)> {
    let Some(map) = input.as_object() else {
        return Vec::new();
    };

    SUMMARY_KEYS
        .iter()
        .filter_map(|key| {
            map.get(*key).map(|value| {
                let rendered = match value {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (capitalize(key), cap_chars(&rendered, MAX_FIELD_VALUE_CHARS))
            })
        })
        .take(MAX_SUMMARY_FIELDS)
        .collect()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn cap_chars(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        value.to_string()
    } else {
        let cut: String = value.chars().take(max).collect();
        format!("{cut}…")
    }
}
