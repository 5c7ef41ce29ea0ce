pub mod delivery;
pub mod prompt;

use std::io::Write;
use std::process::ExitCode;
use std::sync::{Arc, Mutex, PoisonError};

use color_print::cformat;
use eyre::Result;
use tracing::{info, warn};

use delivery::{ConsoleChannel, SharedOutput};
use firstaid_guide::config::GuideConfig;
use firstaid_guide::gemini_client::GeminiClient;
use firstaid_guide::guide::session::SessionStore;
use firstaid_guide::guide::TurnOrchestrator;
use prompt::generate_prompt;

const WELCOME_TEXT: &str = "
Type what the person helping a snake bite victim would text.
Your first message starts a new conversation for the current sender.

/help         Show the help dialogue
/quit         Quit the application
";

const HELP_TEXT: &str = "
First-aid guide

/reset        Forget the current sender's conversation
/sender ID    Switch to another sender
/state        Show the current sender's conversation state
/sessions     List every sender the guide is talking to
/help         Show this help dialogue
/quit         Quit the application
";

/// A line typed at the prompt.
#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Help,
    Reset,
    State,
    Sessions,
    Sender(Option<&'a str>),
    Message(&'a str),
}

impl<'a> Command<'a> {
    fn parse(input: &'a str) -> Self {
        let input = input.trim();
        match input {
            "/help" => return Self::Help,
            "/reset" => return Self::Reset,
            "/state" => return Self::State,
            "/sessions" => return Self::Sessions,
            _ => {}
        }

        match input.strip_prefix("/sender") {
            Some(rest) if rest.is_empty() || rest.starts_with(char::is_whitespace) => {
                let id = rest.trim();
                Self::Sender((!id.is_empty()).then_some(id))
            }
            _ => Self::Message(input),
        }
    }
}

/// Console stand-in for a messaging transport.
pub struct ChatContext {
    output: SharedOutput,
    input: Option<String>,
    interactive: bool,
    sender: String,
    orchestrator: TurnOrchestrator,
}

impl ChatContext {
    pub fn new(
        output: Box<dyn Write + Send>,
        input: Option<String>,
        interactive: bool,
        sender: String,
        config: &GuideConfig,
    ) -> Result<Self> {
        let output: SharedOutput = Arc::new(Mutex::new(output));

        let mut orchestrator = TurnOrchestrator::new(SessionStore::new())
            .with_delivery(Arc::new(ConsoleChannel::new(Arc::clone(&output))))
            .with_strategy(config.strategy)
            .with_generation_timeout(config.generation_timeout);

        if let Some(api_key) = &config.gemini_api_key {
            let client =
                GeminiClient::new(api_key, &config.gemini_model, config.generation_timeout)?;
            orchestrator = orchestrator.with_generator(Arc::new(client));
        }
        if let Some(seed) = config.seed {
            orchestrator = orchestrator.with_seed(seed);
        }
        if orchestrator.strategy() != config.strategy {
            warn!("GEMINI_API_KEY not set, using {} questions", orchestrator.strategy());
        }

        Ok(Self {
            output,
            input,
            interactive,
            sender,
            orchestrator,
        })
    }

    pub async fn run(&mut self) -> Result<ExitCode> {
        info!("Question strategy: {}", self.orchestrator.strategy());

        // Single message, non-interactive
        if let Some(input) = self.input.take() {
            self.handle_input(&input).await?;
            return Ok(ExitCode::SUCCESS);
        }

        if self.interactive {
            self.print_welcome()?;
            self.run_interactive().await?;
        }

        Ok(ExitCode::SUCCESS)
    }

    fn write(&self, text: &str) -> Result<()> {
        let mut output = self.output.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(output, "{}", text)?;
        output.flush()?;
        Ok(())
    }

    fn print_welcome(&self) -> Result<()> {
        self.write(&cformat!("<bold>Snake bite first-aid guide</>"))?;
        self.write(WELCOME_TEXT)
    }

    async fn run_interactive(&mut self) -> Result<()> {
        let mut rl = prompt::rl()?;
        let history = prompt::history_path();
        if let Some(path) = &history {
            let _ = rl.load_history(path);
        }

        loop {
            let readline = rl.readline(&generate_prompt(&self.sender));

            match readline {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }

                    rl.add_history_entry(line.as_str());

                    if line.trim() == "/quit" {
                        break;
                    }

                    if let Err(e) = self.handle_input(&line).await {
                        self.write(&format!("Error: {}", e))?;
                    }
                }
                Err(e) => {
                    self.write(&format!("Error: {}", e))?;
                    break;
                }
            }
        }

        if let Some(path) = &history {
            if let Err(e) = rl.save_history(path) {
                warn!("Failed to save history: {}", e);
            }
        }

        Ok(())
    }

    async fn handle_input(&mut self, input: &str) -> Result<()> {
        match Command::parse(input) {
            Command::Help => self.write(HELP_TEXT)?,
            Command::Reset => match self.orchestrator.reset_session(&self.sender) {
                Ok(()) => self.write(&format!("Conversation with {} reset.", self.sender))?,
                Err(e) => self.write(&format!("Nothing to reset: {}", e))?,
            },
            Command::State => match self.orchestrator.sessions().snapshot(&self.sender).await {
                Some(state) => self.write(&serde_json::to_string_pretty(&state)?)?,
                None => self.write(&format!("No conversation with {} yet.", self.sender))?,
            },
            Command::Sessions => self.print_sessions().await?,
            Command::Sender(Some(sender)) => {
                self.sender = sender.to_string();
                self.write(&format!("Now texting as {}.", self.sender))?;
            }
            Command::Sender(None) => self.write("Usage: /sender ID")?,
            Command::Message(body) => self.process_message(body).await?,
        }

        Ok(())
    }

    async fn print_sessions(&self) -> Result<()> {
        let summaries = self.orchestrator.sessions().summaries().await;
        if summaries.is_empty() {
            return self.write("No conversations yet.");
        }
        for summary in summaries {
            self.write(&format!(
                "{}  replies: {}  last active: {}",
                summary.sender_id,
                summary.replies_received,
                summary.last_activity.format("%H:%M:%S")
            ))?;
        }
        Ok(())
    }

    async fn process_message(&self, body: &str) -> Result<()> {
        let first_contact = !self.orchestrator.sessions().contains(&self.sender);
        let reply = self.orchestrator.respond(&self.sender, body, first_contact).await;

        // Echo whatever the channel could not deliver
        if !reply.delivered {
            self.write(&reply.text)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(Command::parse(" /help "), Command::Help);
        assert_eq!(Command::parse("/reset"), Command::Reset);
        assert_eq!(Command::parse("/state"), Command::State);
        assert_eq!(Command::parse("/sessions"), Command::Sessions);
        assert_eq!(Command::parse("/sender sms:+44"), Command::Sender(Some("sms:+44")));
    }

    #[test]
    fn sender_without_id_is_not_a_message() {
        assert_eq!(Command::parse("/sender"), Command::Sender(None));
        assert_eq!(Command::parse("/sender   "), Command::Sender(None));
    }

    #[test]
    fn anything_else_is_a_message() {
        assert_eq!(Command::parse("  he was bitten "), Command::Message("he was bitten"));
        assert_eq!(Command::parse("/senders"), Command::Message("/senders"));
    }
}
