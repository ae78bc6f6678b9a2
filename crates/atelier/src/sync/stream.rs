//! Channel-based progress delivery with heartbeats.
//!
//! Long runs can go quiet for minutes while a detail fetch backs off. The
//! relay interleaves progress events with periodic heartbeats from its own
//! timer so a consumer can tell a slow run from a dead one.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

use super::progress::{ProgressCallback, SyncProgress};

/// Default heartbeat period.
pub const DEFAULT_HEARTBEAT: Duration = Duration::from_secs(10);

/// An item on the relayed stream.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    Progress(SyncProgress),
    Heartbeat { at: DateTime<Utc> },
}

/// A callback that forwards every event into an unbounded channel.
///
/// Dropping the callback closes the channel.
pub fn progress_channel() -> (ProgressCallback, mpsc::UnboundedReceiver<SyncProgress>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let callback: ProgressCallback = Box::new(move |event| {
        // Receiver gone means nobody is listening any more.
        let _ = tx.send(event);
    });
    (callback, rx)
}

/// Forward progress from `rx` to `tx`, adding a heartbeat every `every`.
///
/// Returns when the progress side closes or the consumer goes away.
pub async fn relay_with_heartbeat(
    mut rx: mpsc::UnboundedReceiver<SyncProgress>,
    every: Duration,
    tx: mpsc::Sender<StreamEvent>,
) {
    let mut ticker = interval_at(Instant::now() + every, every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            event = rx.recv() => {
                let Some(event) = event else { break };
                if tx.send(StreamEvent::Progress(event)).await.is_err() {
                    break;
                }
            }
            _ = ticker.tick() => {
                if tx.send(StreamEvent::Heartbeat { at: Utc::now() }).await.is_err() {
                    break;
                }
            }
        }
    }
    tracing::debug!("Progress relay finished");
}
