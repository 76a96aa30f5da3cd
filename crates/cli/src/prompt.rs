//! Interactive answers for merge and upsert questions.

use std::io::IsTerminal;

use contextual_registry::{DecisionError, DecisionPolicy};
use dialoguer::Confirm;
use dialoguer::theme::ColorfulTheme;

fn interactive() -> bool {
	std::io::stdin().is_terminal() && std::io::stderr().is_terminal()
}

/// Uses fixed answers where given and asks on the terminal otherwise.
///
/// Without a terminal every open question is declined. A prompt that fails
/// aborts the operation it belongs to.
#[derive(Debug, Default)]
pub struct PromptPolicy {
	overwrite: Option<bool>,
	placeholders: Option<bool>,
}

impl PromptPolicy {
	pub fn new(overwrite: Option<bool>, placeholders: Option<bool>) -> Self {
		Self { overwrite, placeholders }
	}

	fn ask(&self, prompt: String) -> Result<bool, DecisionError> {
		if !interactive() {
			tracing::warn!(prompt = %prompt, "cli.prompt.declined");
			return Ok(false);
		}
		Confirm::with_theme(&ColorfulTheme::default())
			.with_prompt(prompt)
			.default(false)
			.interact()
			.map_err(DecisionError::new)
	}
}

impl DecisionPolicy for PromptPolicy {
	fn should_create_placeholder(&mut self, parent_id: &str) -> Result<bool, DecisionError> {
		match self.placeholders {
			Some(answer) => Ok(answer),
			None => self.ask(format!(r#"Parent "{parent_id}" does not exist. Do you want to create it as a folder?"#)),
		}
	}

	fn should_overwrite(&mut self, id: &str) -> Result<bool, DecisionError> {
		match self.overwrite {
			Some(answer) => Ok(answer),
			None => self.ask(format!(r#"Engine with id "{id}" already exists. Do you want to overwrite it?"#)),
		}
	}
}
