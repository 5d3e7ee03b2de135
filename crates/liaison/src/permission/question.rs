use serde::Deserialize;

use crate::prompt::Prompter;

/// Input shape of the clarifying-question tool.
#[derive(Debug, Deserialize)]
pub struct QuestionInput {
    pub questions: Vec<Question>,
}

#[derive(Debug, Deserialize)]
pub struct Question {
    pub question: String,
    #[serde(default)]
    pub header: Option<String>,
    pub options: Vec<String>,
    #[serde(default)]
    pub multiple: bool,
}

/// How many invalid entries a multi-select accepts before giving up.
const MAX_INPUT_TRIES: u32 = 3;

/// Run the interactive Q&A sub-protocol and return the collected answers as
/// the tool's result value.
///
/// Each question is presented in order. Single-select questions go through
/// `ask_selection`; multi-select questions take comma-separated 1-based
/// indices via `ask_text` and revalidate on out-of-range input, bounded at
/// [`MAX_INPUT_TRIES`]. Cancellation of any prompt aborts the whole exchange.
pub async fn run_questions(
    prompter: &dyn Prompter,
    input: &serde_json::Value,
) -> Result<serde_json::Value, String> {
    let parsed: QuestionInput = serde_json::from_value(input.clone())
        .map_err(|e| format!("invalid question input: {e}"))?;
    if parsed.questions.is_empty() {
        return Err("invalid question input: no questions given".into());
    }

    let mut answers = Vec::with_capacity(parsed.questions.len());
    for question in &parsed.questions {
        if question.options.len() < 2 {
            return Err(format!(
                "invalid question input: {:?} needs at least two options",
                question.question
            ));
        }

        let header = question.header.as_deref().unwrap_or(&question.question);
        let selected = if question.multiple {
            ask_multi(prompter, header, question).await?
        } else {
            let index = prompter
                .ask_selection(header, &question.options)
                .await
                .filter(|i| *i < question.options.len())
                .ok_or("question cancelled by user")?;
            vec![question.options[index].clone()]
        };

        answers.push(serde_json::json!({
            "question": question.question,
            "selected": selected,
        }));
    }

    Ok(serde_json::json!({ "answers": answers }))
}

/// Multi-select entry: comma-separated 1-based option numbers.
async fn ask_multi(
    prompter: &dyn Prompter,
    header: &str,
    question: &Question,
) -> Result<Vec<String>, String> {
    let menu: Vec<String> = question
        .options
        .iter()
        .enumerate()
        .map(|(i, opt)| format!("{}. {opt}", i + 1))
        .collect();
    let prompt = format!(
        "{header}\n{}\nEnter option numbers, comma-separated:",
        menu.join("\n")
    );

    for _ in 0..MAX_INPUT_TRIES {
        let raw = prompter
            .ask_text(&prompt)
            .await
            .ok_or("question cancelled by user")?;

        match parse_indices(&raw, question.options.len()) {
            Ok(indices) => {
                return Ok(indices
                    .into_iter()
                    .map(|i| question.options[i].clone())
                    .collect());
            }
            Err(problem) => {
                prompter
                    .display_message(&format!("Invalid selection: {problem}. Try again."))
                    .await;
            }
        }
    }

    Err("question answer invalid after repeated attempts".into())
}

/// Parse comma-separated 1-based indices, rejecting anything out of range.
fn parse_indices(raw: &str, option_count: usize) -> Result<Vec<usize>, String> {
    let mut indices = Vec::new();
    for part in raw.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let number: usize = part
            .parse()
            .map_err(|_| format!("{part:?} is not a number"))?;
        if number == 0 || number > option_count {
            return Err(format!("{number} is out of range 1..={option_count}"));
        }
        indices.push(number - 1);
    }
    if indices.is_empty() {
        return Err("no options selected".into());
    }
    Ok(indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::test_support::ScriptedPrompter;
    use serde_json::json;

    fn single_question(multiple: bool) -> serde_json::Value {
        json!({
            "questions": [{
                "question": "Which environment?",
                "header": "Deployment target",
                "options": ["staging", "production", "local"],
                "multiple": multiple,
            }]
        })
    }

    #[tokio::test]
    async fn single_select_returns_chosen_option() {
        let prompter = ScriptedPrompter::selecting(vec![Some(1)]);
        let answers = run_questions(&prompter, &single_question(false))
            .await
            .unwrap();
        assert_eq!(
            answers["answers"][0]["selected"],
            json!(["production"])
        );
        assert_eq!(
            answers["answers"][0]["question"],
            "Which environment?"
        );
    }

    #[tokio::test]
    async fn single_select_cancellation_aborts() {
        let prompter = ScriptedPrompter::selecting(vec![None]);
        let err = run_questions(&prompter, &single_question(false))
            .await
            .unwrap_err();
        assert!(err.contains("cancelled"));
    }

    #[tokio::test]
    async fn out_of_range_selection_index_reads_as_cancellation() {
        let prompter = ScriptedPrompter::selecting(vec![Some(99)]);
        assert!(
            run_questions(&prompter, &single_question(false))
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn multi_select_parses_comma_separated_indices() {
        let prompter = ScriptedPrompter {
            texts: std::sync::Mutex::new(vec![Some("1, 3".into())]),
            ..ScriptedPrompter::default()
        };
        let answers = run_questions(&prompter, &single_question(true))
            .await
            .unwrap();
        assert_eq!(
            answers["answers"][0]["selected"],
            json!(["staging", "local"])
        );
    }

    #[tokio::test]
    async fn multi_select_revalidates_out_of_range_then_accepts() {
        let prompter = ScriptedPrompter {
            texts: std::sync::Mutex::new(vec![Some("7".into()), Some("2".into())]),
            ..ScriptedPrompter::default()
        };
        let answers = run_questions(&prompter, &single_question(true))
            .await
            .unwrap();
        assert_eq!(answers["answers"][0]["selected"], json!(["production"]));

        let shown = prompter.shown.lock().unwrap();
        assert!(shown.iter().any(|s| s.contains("Invalid selection")));
    }

    #[tokio::test]
    async fn multi_select_gives_up_after_bounded_retries() {
        let prompter = ScriptedPrompter {
            texts: std::sync::Mutex::new(vec![
                Some("bad".into()),
                Some("0".into()),
                Some("nope".into()),
                Some("1".into()), // never reached
            ]),
            ..ScriptedPrompter::default()
        };
        let err = run_questions(&prompter, &single_question(true))
            .await
            .unwrap_err();
        assert!(err.contains("repeated attempts"));
    }

    #[tokio::test]
    async fn multiple_questions_answered_in_order() {
        let input = json!({
            "questions": [
                {"question": "Q1", "options": ["a", "b"]},
                {"question": "Q2", "options": ["x", "y"]},
            ]
        });
        let prompter = ScriptedPrompter::selecting(vec![Some(0), Some(1)]);
        let answers = run_questions(&prompter, &input).await.unwrap();
        assert_eq!(answers["answers"][0]["selected"], json!(["a"]));
        assert_eq!(answers["answers"][1]["selected"], json!(["y"]));
    }

    #[tokio::test]
    async fn rejects_questions_with_too_few_options() {
        let input = json!({
            "questions": [{"question": "Q", "options": ["only one"]}]
        });
        let prompter = ScriptedPrompter::default();
        let err = run_questions(&prompter, &input).await.unwrap_err();
        assert!(err.contains("at least two options"));
    }

    #[tokio::test]
    async fn rejects_malformed_input() {
        let prompter = ScriptedPrompter::default();
        assert!(
            run_questions(&prompter, &json!({"wrong": true}))
                .await
                .is_err()
        );
        assert!(
            run_questions(&prompter, &json!({"questions": []}))
                .await
                .is_err()
        );
    }

    #[test]
    fn parse_indices_handles_spacing_and_blanks() {
        assert_eq!(parse_indices(" 1 ,2, 3 ", 3).unwrap(), vec![0, 1, 2]);
        assert_eq!(parse_indices("2,", 3).unwrap(), vec![1]);
        assert!(parse_indices("", 3).is_err());
        assert!(parse_indices("4", 3).is_err());
        assert!(parse_indices("0", 3).is_err());
    }
}
