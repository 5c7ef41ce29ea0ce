use std::path::PathBuf;

use rustyline::{Config, Editor, Result};

pub fn generate_prompt(sender: &str) -> String {
    format!("[{}] > ", sender)
}

pub fn rl() -> Result<Editor<()>> {
    let config = Config::builder()
        .history_ignore_space(true)
        .completion_type(rustyline::CompletionType::List)
        .build();
    Editor::with_config(config)
}

/// Where the REPL keeps its input history, if a home directory exists.
pub fn history_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".firstaid_guide_history"))
}
