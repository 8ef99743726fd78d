//! Background health/status poll. Failures are swallowed; the latest
//! observation is published on a watch channel.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, Duration, MissedTickBehavior};

use crate::api::{Health, IndexApi, InboxStatus};
use crate::logging::{log, obj, v_str, Domain, Level};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ServerStatus {
    pub health: Health,
    /// `None` until `/status` has answered at least once.
    pub inbox: Option<InboxStatus>,
    pub polls: u64,
}

impl ServerStatus {
    pub fn summary(&self) -> String {
        match self.inbox {
            Some(st) => format!(
                "inbox: processed={} invalid={} queued={}",
                st.processed, st.invalid, st.queued
            ),
            None => "inbox: unknown".to_string(),
        }
    }
}

/// One poll: health always, status only if it answers. Keeps the previous inbox on failure.
pub async fn poll_once(api: &dyn IndexApi, previous: Option<InboxStatus>) -> (Health, Option<InboxStatus>) {
    let health = api.health().await;
    let inbox = match api.status().await {
        Ok(st) => Some(st),
        Err(err) => {
            log(
                Level::Trace,
                Domain::Server,
                "status_poll_failed",
                obj(&[("reason", v_str(&err.to_string()))]),
            );
            previous
        }
    };
    (health, inbox)
}

pub struct StatusPoller {
    pub handle: JoinHandle<()>,
    pub updates: watch::Receiver<Option<ServerStatus>>,
}

impl StatusPoller {
    /// First poll after `initial_delay`, then every `every`.
    pub fn spawn(api: Arc<dyn IndexApi>, initial_delay: Duration, every: Duration) -> Self {
        let (tx, rx) = watch::channel(None);
        let handle = tokio::spawn(async move {
            sleep(initial_delay).await;
            let mut ticker = interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut inbox = None;
            let mut polls = 0u64;
            loop {
                ticker.tick().await;
                let (health, next_inbox) = poll_once(api.as_ref(), inbox).await;
                inbox = next_inbox;
                polls += 1;
                if tx.send(Some(ServerStatus { health, inbox, polls })).is_err() {
                    break;
                }
            }
        });
        Self { handle, updates: rx }
    }

    pub fn stop(self) {
        self.handle.abort();
    }
}
