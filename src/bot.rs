//! The bot event loop
//!
//! One task owns the raid slot, the dispatcher and the overlay. It waits on
//! three sources at once: chat events, finished shoutout jobs, and overlay
//! signals. Jobs run as separate tasks, so raids keep being recorded while
//! a selection is paging through clips.

use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};
use tokio::time::error::Elapsed;
use tracing::{error, info, warn};

use crate::dispatch::{CommandDispatcher, ShoutoutJob};
use crate::models::{ChatEvent, Shoutout};
use crate::overlay::{Overlay, OverlayEvent, OverlaySurface, ShowOutcome};
use crate::raid::RaidTracker;
use crate::selector::SelectError;

type JobOutcome = Result<Result<Option<Shoutout>, SelectError>, Elapsed>;

enum Step {
    Chat(Option<ChatEvent>),
    Finished(Result<(String, JobOutcome), JoinError>),
    Overlay(OverlayEvent),
}

pub struct Bot<S: OverlaySurface> {
    dispatcher: CommandDispatcher,
    raids: RaidTracker,
    overlay: Overlay<S>,
    command_timeout: Duration,
    jobs: JoinSet<(String, JobOutcome)>,
}

impl<S: OverlaySurface> Bot<S> {
    pub fn new(dispatcher: CommandDispatcher, overlay: Overlay<S>, command_timeout: Duration) -> Self {
        Self {
            dispatcher,
            raids: RaidTracker::new(),
            overlay,
            command_timeout,
            jobs: JoinSet::new(),
        }
    }

    pub fn raids(&self) -> &RaidTracker {
        &self.raids
    }

    pub fn overlay(&self) -> &Overlay<S> {
        &self.overlay
    }

    /// Jobs still selecting a clip
    pub fn in_flight(&self) -> usize {
        self.jobs.len()
    }

    /// Run until the chat stream closes, then wait for in-flight jobs
    pub async fn run(
        &mut self,
        chat: &mut mpsc::Receiver<ChatEvent>,
        overlay_events: &mut mpsc::UnboundedReceiver<OverlayEvent>,
    ) -> Result<()> {
        info!(command = %self.dispatcher.command(), "bot running");

        loop {
            let step = tokio::select! {
                event = chat.recv() => Step::Chat(event),
                Some(joined) = self.jobs.join_next(), if !self.jobs.is_empty() => Step::Finished(joined),
                Some(event) = overlay_events.recv() => Step::Overlay(event),
            };

            match step {
                Step::Chat(Some(event)) => self.handle_chat(event),
                Step::Chat(None) => break,
                Step::Finished(joined) => self.finish(joined),
                Step::Overlay(event) => self.overlay.handle(event),
            }
        }

        info!(in_flight = self.jobs.len(), "chat closed, waiting for running commands");
        while let Some(joined) = self.jobs.join_next().await {
            self.finish(joined);
        }
        Ok(())
    }

    /// Record a raid or start a shoutout job
    pub fn handle_chat(&mut self, event: ChatEvent) {
        match event {
            ChatEvent::Raid(notice) => self.raids.record(&notice),
            ChatEvent::Message(message) => {
                if let Some(job) = self.dispatcher.on_chat_message(&message, &self.raids) {
                    self.spawn(job);
                }
            }
        }
    }

    fn spawn(&mut self, job: ShoutoutJob) {
        let login = job.login().to_string();
        let timeout = self.command_timeout;
        info!(target_channel = %login, "shoutout started");

        self.jobs.spawn(async move {
            let outcome = tokio::time::timeout(timeout, job.run()).await;
            (login, outcome)
        });
    }

    fn finish(&mut self, joined: Result<(String, JobOutcome), JoinError>) {
        let (login, outcome) = match joined {
            Ok(done) => done,
            Err(e) => {
                error!(error = %e, "shoutout task failed");
                return;
            }
        };

        match outcome {
            Ok(Ok(Some(shoutout))) => match self.overlay.show(shoutout) {
                ShowOutcome::Started(_) => {}
                ShowOutcome::Queued | ShowOutcome::Replaced => {
                    info!(target_channel = %login, "overlay busy, shoutout queued");
                }
            },
            Ok(Ok(None)) => {}
            Ok(Err(SelectError::UserNotFound(user))) => {
                warn!(target_channel = %user, "no such user");
            }
            Ok(Err(e)) => error!(target_channel = %login, error = %e, "shoutout failed"),
            Err(_) => error!(
                target_channel = %login,
                timeout_secs = self.command_timeout.as_secs(),
                "shoutout timed out"
            ),
        }
    }
}
