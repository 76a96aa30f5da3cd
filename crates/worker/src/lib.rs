//! Shared worker primitives.
//!
//! Everything that runs off the caller's thread goes through [`spawn`] or
//! [`spawn_blocking`] so it is tagged with a [`TaskClass`] in traces. Trigger
//! style messages (menu rebuild requests) travel through a [`Mailbox`].

mod class;
mod mailbox;
mod spawn;

pub use class::TaskClass;
pub use mailbox::{Mailbox, MailboxReceiver, MailboxSendError, MailboxSendOutcome, MailboxSender};
pub use spawn::{spawn, spawn_blocking};

/// Extracts the panic message carried by a failed join, if the task panicked.
pub fn join_error_panic_message(err: tokio::task::JoinError) -> Option<String> {
	if !err.is_panic() {
		return None;
	}
	let payload = err.into_panic();
	if let Some(msg) = payload.downcast_ref::<&'static str>() {
		return Some((*msg).to_string());
	}
	payload.downcast_ref::<String>().cloned()
}
