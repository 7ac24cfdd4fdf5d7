//! Timeline Session - Lifecycle of one live timeline watch
//!
//! The session owns the synchronizer and the transport on a single task, so
//! every callback (connect, disconnect, inbound event, shutdown) runs one at
//! a time against the same state:
//! 1. Connect, with exponential backoff between attempts
//! 2. On every connect, mark connected and join the task room
//! 3. Feed status updates into the synchronizer
//! 4. On connection loss, mark disconnected and go back to 1
//! 5. On stop, leave the room and hand the synchronizer back

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, info_span, warn, Instrument};

use super::transport::{InboundEvent, Transport};
use crate::sync::error::SyncError;
use crate::sync::synchronizer::{Timeline, TimelineSynchronizer};
use crate::sync::view::TimelineView;
use crate::timeline::{OverallState, ReconnectConfig};

pub struct TimelineSession<V: TimelineView + 'static> {
    session_id: String,
    shutdown: watch::Sender<bool>,
    state: watch::Receiver<Timeline>,
    handle: JoinHandle<TimelineSynchronizer<V>>,
}

impl<V: TimelineView + 'static> TimelineSession<V> {
    /// Spawn the session task. Apply any initial state to `sync` before
    /// calling this so it is visible before the first connect.
    pub fn start<T: Transport + 'static>(
        sync: TimelineSynchronizer<V>,
        transport: T,
        reconnect: ReconnectConfig,
    ) -> Self {
        let session_id = uuid::Uuid::new_v4().to_string();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (state_tx, state_rx) = watch::channel(sync.timeline().clone());

        let span = info_span!(
            "timeline_session",
            session_id = %session_id,
            task_id = %sync.task_id()
        );
        let handle = tokio::spawn(
            run_session(sync, transport, reconnect, state_tx, shutdown_rx).instrument(span),
        );

        Self {
            session_id,
            shutdown: shutdown_tx,
            state: state_rx,
            handle,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Receiver that sees the rendered timeline after every change
    pub fn state(&self) -> watch::Receiver<Timeline> {
        self.state.clone()
    }

    pub fn current(&self) -> Timeline {
        self.state.borrow().clone()
    }

    /// Wait until the workflow reaches success or fail
    pub async fn wait_for_finish(&self) -> OverallState {
        let mut state = self.state.clone();
        let finished = state
            .wait_for(|timeline| timeline.overall().is_finished())
            .await
            .map(|timeline| timeline.overall());

        match finished {
            Ok(overall) => overall,
            Err(_) => state.borrow().overall(),
        }
    }

    /// Leave the task room, close the channel, and return the synchronizer
    #[tracing::instrument(skip(self), fields(session_id = %self.session_id))]
    pub async fn stop(self) -> Result<TimelineSynchronizer<V>, SyncError> {
        let _ = self.shutdown.send(true);
        self.handle
            .await
            .map_err(|e| SyncError::SessionFailed(e.to_string()))
    }
}

fn publish<V: TimelineView>(state_tx: &watch::Sender<Timeline>, sync: &TimelineSynchronizer<V>) {
    state_tx.send_replace(sync.timeline().clone());
}

async fn run_session<V: TimelineView, T: Transport>(
    mut sync: TimelineSynchronizer<V>,
    mut transport: T,
    reconnect: ReconnectConfig,
    state_tx: watch::Sender<Timeline>,
    mut shutdown: watch::Receiver<bool>,
) -> TimelineSynchronizer<V> {
    let mut attempt: u32 = 0;

    loop {
        if *shutdown.borrow() {
            break;
        }

        let connected = tokio::select! {
            result = transport.connect() => result,
            _ = shutdown.changed() => break,
        };

        match connected {
            Ok(()) => {
                attempt = 0;
                let join = sync.on_connect();
                publish(&state_tx, &sync);

                match transport.emit(&join).await {
                    Ok(()) => info!(room = %join.room(), "Joined task room"),
                    Err(e) => warn!(error = %e, "Failed to send join request"),
                }

                loop {
                    tokio::select! {
                        _ = shutdown.changed() => {
                            let leave = sync.leave();
                            match transport.emit(&leave).await {
                                Ok(()) => info!(room = %leave.room(), "Left task room"),
                                Err(e) => debug!(error = %e, "Failed to send leave request"),
                            }
                            transport.close().await;
                            return sync;
                        }
                        event = transport.next_event() => match event {
                            Ok(InboundEvent::StatusUpdate(update)) => {
                                debug!(step_id = %update.step_id, status = %update.status, "Received status update");
                                sync.on_status_event(update);
                                publish(&state_tx, &sync);
                            }
                            Err(e) => {
                                warn!(error = %e, "Live status channel lost");
                                sync.on_disconnect();
                                publish(&state_tx, &sync);
                                break;
                            }
                        }
                    }
                }
            }
            Err(e) => {
                debug!(error = %e, attempt, "Failed to connect to live status channel");
            }
        }

        attempt = attempt.saturating_add(1);
        let delay = Duration::from_millis(reconnect.delay_for(attempt));
        debug!(delay_ms = delay.as_millis() as u64, "Reconnecting");

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = shutdown.changed() => break,
        }
    }

    transport.close().await;
    sync
}
