use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use super::conversation_state::ConversationState;
use super::error::GenerationError;
use super::knowledge;
use super::ports::TextGenerator;

/// Phrases a generated question must not contain.
const EXCLUDED_TOPICS: &[&str] = &["snake", "moved away", "safe distance", "location", "area"];

/// Builds the prompt for a generated follow-up question.
pub fn question_prompt(utterance: &str, state: &ConversationState) -> String {
    let mut prompt = String::from(
        "You are a snake bite first aid assistant talking to someone\n\
         helping a bitten person over text messages.\n\
         Ask exactly ONE short follow-up question that moves their care forward.\n\n\
         # Rules\n\
         - Never repeat a previously asked question.\n\
         - Never ask about the snake or where the hazard is.\n\
         - The question must end in a question mark.\n\
         - Reply with the question only.\n\n\
         # First aid reference\n",
    );
    prompt.push_str(&knowledge::reference_text());

    prompt.push_str("\n# Previously asked questions\n");
    if state.asked_questions.is_empty() {
        prompt.push_str("- none\n");
    }
    for question in &state.asked_questions {
        prompt.push_str(&format!("- {}\n", question));
    }

    prompt.push_str("\n# Actions already completed\n");
    if state.completed_actions.is_empty() {
        prompt.push_str("- none\n");
    }
    for action in &state.completed_actions {
        prompt.push_str(&format!("- {:?}\n", action));
    }

    prompt.push_str(&format!("\n# Latest message\n{}\n\nQuestion:", utterance.trim()));
    prompt
}

/// Builds the prompt for a generated opening guidance block.
pub fn guidance_prompt(utterance: &str) -> String {
    format!(
        "You are a snake bite emergency response system.\n\
         Give immediate, clear and safe guidance.\n\n\
         # Rules\n\
         1. Always prioritize getting medical help immediately.\n\
         2. Never attempt to identify the snake species.\n\
         3. Keep it short, one line per step, no question at the end.\n\
         4. Mention the emergency number 999.\n\
         5. Address the writer if they were bitten themselves,\n\
         otherwise talk about the bitten person.\n\n\
         Cover these steps in this order, varying the wording naturally:\n{}\n\
         User message: {}\n\nResponse:",
        knowledge::reference_text(),
        utterance.trim()
    )
}

/// Asks the generator for a follow-up question and checks it is usable.
pub async fn generate_dynamic_question(
    generator: &dyn TextGenerator,
    utterance: &str,
    state: &ConversationState,
) -> Result<String, GenerationError> {
    let prompt = question_prompt(utterance, state);
    let raw = generator.generate(&prompt).await?;
    debug!(sender = %state.sender_id, raw = %raw, "Generated question");

    let mut question = clean_question(&raw).ok_or(GenerationError::EmptyResponse)?;
    if !question.ends_with('?') {
        question.push('?');
    }

    let lower = question.to_lowercase();
    if EXCLUDED_TOPICS.iter().any(|topic| lower.contains(topic)) {
        return Err(GenerationError::ExcludedTopic(question));
    }
    if state.asked_questions.contains(&question) {
        return Err(GenerationError::Repeated(question));
    }
    Ok(question)
}

/// First non-empty line of the reply without labels, quotes or repeated
/// whitespace.
fn clean_question(raw: &str) -> Option<String> {
    let line = raw.lines().map(str::trim).find(|line| !line.is_empty())?;

    let text = label_pattern().replace(line, "");
    let text = whitespace_pattern().replace_all(&text, " ");
    let text = text.trim_matches(|c: char| c == '"' || c == '\'' || c == '*' || c.is_whitespace());

    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

fn label_pattern() -> &'static Regex {
    static LABEL: OnceLock<Regex> = OnceLock::new();
    LABEL.get_or_init(|| {
        Regex::new(r"(?i)^(\*\*)?question(\*\*)?\s*[:\-]\s*").expect("valid label pattern")
    })
}

fn whitespace_pattern() -> &'static Regex {
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();
    WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace pattern"))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::guide::conversation_state::CompletedAction;

    struct Scripted {
        reply: Result<String, ()>,
        prompts: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn replying(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for Scripted {
        async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply
                .clone()
                .map_err(|_| GenerationError::Unavailable("scripted failure".to_string()))
        }
    }

    #[tokio::test]
    async fn appends_missing_question_mark() {
        let generator = Scripted::replying("Question: Is the swelling spreading up the leg");
        let state = ConversationState::new("s");
        let question = generate_dynamic_question(&generator, "ok", &state).await.unwrap();
        assert_eq!(question, "Is the swelling spreading up the leg?");
    }

    #[tokio::test]
    async fn keeps_first_line_only() {
        let generator =
            Scripted::replying("\n  \"Is the person   still awake?\"\nSome extra text.");
        let state = ConversationState::new("s");
        let question = generate_dynamic_question(&generator, "ok", &state).await.unwrap();
        assert_eq!(question, "Is the person still awake?");
    }

    #[test]
    fn strips_bold_labels_and_collapses_spaces() {
        assert_eq!(
            clean_question("**Question:**   Is the bite\tstill bleeding?").as_deref(),
            Some("Is the bite still bleeding?")
        );
        assert_eq!(clean_question("question - Any swelling?").as_deref(), Some("Any swelling?"));
        assert!(std::ptr::eq(label_pattern(), label_pattern()));
    }

    #[tokio::test]
    async fn rejects_excluded_topics() {
        let generator = Scripted::replying("Which area were you in when it happened?");
        let state = ConversationState::new("s");
        let err = generate_dynamic_question(&generator, "ok", &state).await.unwrap_err();
        assert!(matches!(err, GenerationError::ExcludedTopic(_)));
    }

    #[tokio::test]
    async fn rejects_repeated_question() {
        let generator = Scripted::replying("Is the person calm and still?");
        let mut state = ConversationState::new("s");
        state.record_question("Is the person calm and still?");
        let err = generate_dynamic_question(&generator, "yes", &state).await.unwrap_err();
        assert!(matches!(err, GenerationError::Repeated(_)));
    }

    #[tokio::test]
    async fn empty_reply_is_an_error() {
        let generator = Scripted::replying("   \n ");
        let state = ConversationState::new("s");
        let err = generate_dynamic_question(&generator, "ok", &state).await.unwrap_err();
        assert!(matches!(err, GenerationError::EmptyResponse));
    }

    #[tokio::test]
    async fn service_errors_pass_through() {
        let generator = Scripted {
            reply: Err(()),
            prompts: Mutex::new(Vec::new()),
        };
        let state = ConversationState::new("s");
        let err = generate_dynamic_question(&generator, "ok", &state).await.unwrap_err();
        assert!(matches!(err, GenerationError::Unavailable(_)));
    }

    #[tokio::test]
    async fn prompt_carries_history_and_rules() {
        let generator = Scripted::replying("Is the person breathing normally?");
        let mut state = ConversationState::new("s");
        state.record_question("How long ago did the bite happen?");
        state.completed_actions.insert(CompletedAction::RemovedTightItems);
        generate_dynamic_question(&generator, "about ten minutes", &state).await.unwrap();

        let prompts = generator.prompts.lock().unwrap();
        let prompt = &prompts[0];
        assert!(prompt.contains("- How long ago did the bite happen?"));
        assert!(prompt.contains("RemovedTightItems"));
        assert!(prompt.contains("about ten minutes"));
        assert!(prompt.contains("Never repeat a previously asked question"));
        assert!(prompt.contains(knowledge::STRETCHER_METHODS));
    }
}
