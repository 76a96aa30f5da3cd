//! Single-flight menu rebuilds driven by registry changes.
//!
//! # Role
//!
//! Owns the [`MenuSynchronizer`] on one task. Registry change notifications
//! become triggers in a single-slot [`Mailbox`] where the newest trigger
//! replaces any still queued, so a burst of changes while a rebuild runs
//! collapses into one follow-up rebuild.
//!
//! # Invariants
//!
//! - At most one rebuild runs at a time.
//! - Each rebuild renders the registry's newest collection, read when the
//!   rebuild starts; a revision that is already on the surface is skipped.

use std::sync::Arc;

use contextual_registry::{EngineRegistry, RegistryError, RegistryEvent, Revision, SubscriptionId};
use contextual_worker::{
	Mailbox, MailboxReceiver, MailboxSendError, MailboxSendOutcome, MailboxSender, TaskClass,
};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::surface::MenuSurface;
use crate::sync::{MenuSynchronizer, RebuildReport, SyncError};

/// Why a rebuild did not complete.
#[derive(Debug, thiserror::Error)]
enum RebuildFailure {
	#[error(transparent)]
	Registry(#[from] RegistryError),
	#[error(transparent)]
	Sync(#[from] SyncError),
}

/// Counters kept by the scheduler task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
	pub rebuilds: usize,
	/// Triggers that found their revision already rendered.
	pub skipped: usize,
	pub failures: usize,
	pub last_rendered: Option<Revision>,
}

pub struct RebuildScheduler {
	registry: Arc<EngineRegistry>,
	subscription: SubscriptionId,
	trigger: MailboxSender<Revision>,
	cancel: CancellationToken,
	stats: Arc<Mutex<SchedulerStats>>,
	rendered: watch::Receiver<Option<Revision>>,
	task: Option<JoinHandle<()>>,
}

impl RebuildScheduler {
	/// Spawns the rebuild task, subscribes it to `registry`, and queues an
	/// initial rebuild.
	pub fn start<S>(registry: Arc<EngineRegistry>, synchronizer: MenuSynchronizer<S>) -> Self
	where
		S: MenuSurface + 'static,
	{
		let mailbox = Mailbox::new();
		let trigger = mailbox.sender();
		let cancel = CancellationToken::new();
		let stats = Arc::new(Mutex::new(SchedulerStats::default()));
		let (rendered_tx, rendered) = watch::channel(None);

		let task = contextual_worker::spawn(
			TaskClass::Interactive,
			run(RebuildTask {
				registry: Arc::clone(&registry),
				synchronizer: Arc::new(Mutex::new(synchronizer)),
				triggers: mailbox.receiver(),
				cancel: cancel.clone(),
				stats: Arc::clone(&stats),
				rendered: rendered_tx,
			}),
		);

		let listener = trigger.clone();
		let subscription = registry.subscribe(move |event| match *event {
			RegistryEvent::Changed { revision, .. } => {
				if let Err(err) = listener.send(revision) {
					tracing::trace!(revision, error = %err, "menu.scheduler.trigger_dropped");
				}
			}
		});

		let scheduler = Self {
			registry,
			subscription,
			trigger,
			cancel,
			stats,
			rendered,
			task: Some(task),
		};
		// A fresh mailbox is open and empty.
		let _ = scheduler.request();
		scheduler
	}

	/// Queues a rebuild of whatever the registry holds when it runs.
	pub fn request(&self) -> Result<MailboxSendOutcome, MailboxSendError> {
		self.trigger.send(0)
	}

	pub fn stats(&self) -> SchedulerStats {
		*self.stats.lock()
	}

	/// Watch of the last revision put on the surface.
	pub fn rendered(&self) -> watch::Receiver<Option<Revision>> {
		self.rendered.clone()
	}

	/// Stops after the current rebuild, dropping queued triggers.
	pub fn cancel(&self) {
		self.cancel.cancel();
	}

	/// Stops listening, lets queued triggers drain, and waits for the task.
	pub async fn shutdown(mut self) -> SchedulerStats {
		self.detach();
		if let Some(task) = self.task.take()
			&& let Err(err) = task.await
		{
			match contextual_worker::join_error_panic_message(err) {
				Some(msg) => tracing::error!(panic = %msg, "menu.scheduler.panicked"),
				None => tracing::warn!("menu.scheduler.cancelled"),
			}
		}
		self.stats()
	}

	fn detach(&self) {
		self.registry.unsubscribe(self.subscription);
		self.trigger.close();
	}
}

impl Drop for RebuildScheduler {
	fn drop(&mut self) {
		if self.task.is_some() {
			self.detach();
			self.cancel.cancel();
		}
	}
}

struct RebuildTask<S> {
	registry: Arc<EngineRegistry>,
	synchronizer: Arc<Mutex<MenuSynchronizer<S>>>,
	triggers: MailboxReceiver<Revision>,
	cancel: CancellationToken,
	stats: Arc<Mutex<SchedulerStats>>,
	rendered: watch::Sender<Option<Revision>>,
}

async fn run<S: MenuSurface + 'static>(task: RebuildTask<S>) {
	loop {
		let trigger = tokio::select! {
			biased;
			_ = task.cancel.cancelled() => break,
			trigger = task.triggers.recv() => trigger,
		};
		let Some(trigger) = trigger else {
			break;
		};

		let last_rendered = *task.rendered.borrow();
		let registry = Arc::clone(&task.registry);
		let synchronizer = Arc::clone(&task.synchronizer);
		let job = contextual_worker::spawn_blocking(TaskClass::Background, move || {
			rebuild_latest(&registry, &mut synchronizer.lock(), last_rendered)
		});

		let outcome = match job.await {
			Ok(outcome) => outcome,
			Err(err) => {
				let msg = contextual_worker::join_error_panic_message(err);
				tracing::error!(panic = ?msg, "menu.rebuild.panicked");
				task.stats.lock().failures += 1;
				continue;
			}
		};

		match outcome {
			Ok(Some((revision, report))) => {
				{
					let mut stats = task.stats.lock();
					stats.rebuilds += 1;
					stats.last_rendered = Some(revision);
				}
				tracing::debug!(trigger, revision, entries = report.entries(), "menu.scheduler.rendered");
				task.rendered.send_replace(Some(revision));
			}
			Ok(None) => {
				task.stats.lock().skipped += 1;
				tracing::trace!(trigger, "menu.scheduler.up_to_date");
			}
			Err(err) => {
				{
					let mut stats = task.stats.lock();
					stats.failures += 1;
					stats.last_rendered = None;
				}
				tracing::warn!(trigger, error = %err, "menu.scheduler.rebuild_failed");
				// The surface no longer shows any revision.
				task.rendered.send_replace(None);
			}
		}
	}
	tracing::debug!("menu.scheduler.stopped");
}

/// Rebuilds from the newest collection unless it is already rendered.
fn rebuild_latest<S: MenuSurface>(
	registry: &EngineRegistry,
	synchronizer: &mut MenuSynchronizer<S>,
	last_rendered: Option<Revision>,
) -> Result<Option<(Revision, RebuildReport)>, RebuildFailure> {
	let snapshot = registry.snapshot()?;
	if last_rendered == Some(snapshot.revision) {
		return Ok(None);
	}
	let report = synchronizer.rebuild(&snapshot.records)?;
	Ok(Some((snapshot.revision, report)))
}
