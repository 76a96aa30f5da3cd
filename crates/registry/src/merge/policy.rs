use std::collections::VecDeque;
use std::error::Error;

use rustc_hash::FxHashMap;

/// A question could not be answered. The whole operation is abandoned and
/// nothing is written.
#[derive(Debug, thiserror::Error)]
#[error("no answer: {0}")]
pub struct DecisionError(#[source] Box<dyn Error + Send + Sync>);

impl DecisionError {
	pub fn new(err: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
		Self(err.into())
	}
}

/// Answers the questions a merge or upsert raises.
///
/// Front ends adapt their confirmation prompts to this trait; tests use the
/// deterministic implementations below.
pub trait DecisionPolicy {
	/// A candidate references `parent_id`, which does not exist. Returning
	/// `true` creates a placeholder container with that id; `false` skips the
	/// candidate.
	fn should_create_placeholder(&mut self, parent_id: &str) -> Result<bool, DecisionError>;

	/// A candidate's `id` is already taken. Returning `true` replaces the
	/// existing record in place; `false` skips the candidate.
	fn should_overwrite(&mut self, id: &str) -> Result<bool, DecisionError>;
}

/// Overwrites duplicates and creates every missing parent.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysOverwrite;

impl DecisionPolicy for AlwaysOverwrite {
	fn should_create_placeholder(&mut self, _parent_id: &str) -> Result<bool, DecisionError> {
		Ok(true)
	}

	fn should_overwrite(&mut self, _id: &str) -> Result<bool, DecisionError> {
		Ok(true)
	}
}

/// Skips duplicates and candidates with missing parents.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysSkip;

impl DecisionPolicy for AlwaysSkip {
	fn should_create_placeholder(&mut self, _parent_id: &str) -> Result<bool, DecisionError> {
		Ok(false)
	}

	fn should_overwrite(&mut self, _id: &str) -> Result<bool, DecisionError> {
		Ok(false)
	}
}

/// Independent fixed answers for the two questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fixed {
	pub overwrite: bool,
	pub placeholders: bool,
}

impl DecisionPolicy for Fixed {
	fn should_create_placeholder(&mut self, _parent_id: &str) -> Result<bool, DecisionError> {
		Ok(self.placeholders)
	}

	fn should_overwrite(&mut self, _id: &str) -> Result<bool, DecisionError> {
		Ok(self.overwrite)
	}
}

/// A question put to a [`DecisionPolicy`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Prompt {
	Placeholder(String),
	Overwrite(String),
}

/// Replays queued answers in order and records every question asked.
///
/// Once the script runs out every answer is `false`.
#[derive(Debug, Clone, Default)]
pub struct Scripted {
	answers: VecDeque<bool>,
	asked: Vec<Prompt>,
}

impl Scripted {
	pub fn new(answers: impl IntoIterator<Item = bool>) -> Self {
		Self {
			answers: answers.into_iter().collect(),
			asked: Vec::new(),
		}
	}

	/// Questions asked so far, oldest first.
	pub fn asked(&self) -> &[Prompt] {
		&self.asked
	}

	fn answer(&mut self, prompt: Prompt) -> bool {
		self.asked.push(prompt);
		self.answers.pop_front().unwrap_or(false)
	}
}

impl DecisionPolicy for Scripted {
	fn should_create_placeholder(&mut self, parent_id: &str) -> Result<bool, DecisionError> {
		Ok(self.answer(Prompt::Placeholder(parent_id.to_string())))
	}

	fn should_overwrite(&mut self, id: &str) -> Result<bool, DecisionError> {
		Ok(self.answer(Prompt::Overwrite(id.to_string())))
	}
}

/// Puts each question to `inner` once per operation.
///
/// A conflicting write recomputes the merge from a fresh read; the recompute
/// replays the answers already given, by question and by how often it was
/// asked, and only reaches `inner` for questions the earlier pass never saw.
pub(crate) struct Remembered<'a> {
	inner: &'a mut dyn DecisionPolicy,
	answers: FxHashMap<Prompt, Vec<bool>>,
	asked: FxHashMap<Prompt, usize>,
}

impl<'a> Remembered<'a> {
	pub(crate) fn new(inner: &'a mut dyn DecisionPolicy) -> Self {
		Self {
			inner,
			answers: FxHashMap::default(),
			asked: FxHashMap::default(),
		}
	}

	/// Starts a new pass over the same questions.
	pub(crate) fn rewind(&mut self) {
		self.asked.clear();
	}

	fn recall(&mut self, prompt: &Prompt) -> Option<bool> {
		let nth = self.asked.entry(prompt.clone()).or_default();
		let answer = self.answers.get(prompt).and_then(|given| given.get(*nth)).copied();
		*nth += 1;
		answer
	}

	fn remember(&mut self, prompt: Prompt, answer: bool) -> bool {
		self.answers.entry(prompt).or_default().push(answer);
		answer
	}
}

impl DecisionPolicy for Remembered<'_> {
	fn should_create_placeholder(&mut self, parent_id: &str) -> Result<bool, DecisionError> {
		let prompt = Prompt::Placeholder(parent_id.to_string());
		if let Some(answer) = self.recall(&prompt) {
			return Ok(answer);
		}
		let answer = self.inner.should_create_placeholder(parent_id)?;
		Ok(self.remember(prompt, answer))
	}

	fn should_overwrite(&mut self, id: &str) -> Result<bool, DecisionError> {
		let prompt = Prompt::Overwrite(id.to_string());
		if let Some(answer) = self.recall(&prompt) {
			return Ok(answer);
		}
		let answer = self.inner.should_overwrite(id)?;
		Ok(self.remember(prompt, answer))
	}
}
