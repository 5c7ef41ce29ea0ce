use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use color_print::cformat;

use firstaid_guide::guide::error::DeliveryError;
use firstaid_guide::guide::ports::DeliveryChannel;

pub type SharedOutput = Arc<Mutex<Box<dyn Write + Send>>>;

/// Prints outbound messages to the terminal as if they arrived on a phone.
pub struct ConsoleChannel {
    output: SharedOutput,
}

impl ConsoleChannel {
    pub fn new(output: SharedOutput) -> Self {
        Self { output }
    }
}

#[async_trait]
impl DeliveryChannel for ConsoleChannel {
    async fn deliver(&self, recipient: &str, body: &str) -> Result<(), DeliveryError> {
        let mut output = self.output.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(output, "{}", cformat!("<green><bold>to {}</></>", recipient))?;
        writeln!(output, "{}\n", body)?;
        output.flush()?;
        Ok(())
    }
}
