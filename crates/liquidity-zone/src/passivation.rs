//! The Passivation Timer (§4.5): a cooperative idle-timeout companion.
//!
//! Modelled as its own task with its own mailbox, matching the source's
//! actor-per-concern design (§9 "Actor model -> single-writer task") even
//! though it runs inside the same process as its validator - the validator
//! only ever talks to it through [`PassivationHandle`].

use tokio::sync::mpsc;
use tokio::time::{Duration, Instant};

/// Messages the validator sends the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerCommand {
    /// A client connected; stop counting down (no passivation while clients
    /// are connected).
    Stop,
    /// The last client disconnected; resume counting down from now.
    Start,
    /// A command was accepted; restart the countdown if it is running.
    CommandReceived,
}

/// A handle the validator holds to drive the timer task.
#[derive(Clone)]
pub struct PassivationHandle {
    tx: mpsc::Sender<TimerCommand>,
}

impl PassivationHandle {
    pub async fn stop(&self) {
        let _ = self.tx.send(TimerCommand::Stop).await;
    }

    pub async fn start(&self) {
        let _ = self.tx.send(TimerCommand::Start).await;
    }

    pub async fn command_received(&self) {
        let _ = self.tx.send(TimerCommand::CommandReceived).await;
    }
}

/// Signal sent back to the validator's own mailbox when the timeout fires.
pub trait TimeoutSink: Send + Sync + 'static {
    fn timeout(&self);
}

impl<F: Fn() + Send + Sync + 'static> TimeoutSink for F {
    fn timeout(&self) {
        (self)()
    }
}

/// Spawn the timer, started (counting down) immediately - "Started at
/// validator construction" (§4.5). Returns a handle to drive it; the timer
/// task exits when the handle (and every clone) is dropped.
pub fn spawn(timeout: Duration, on_timeout: impl TimeoutSink) -> PassivationHandle {
    let (tx, mut rx) = mpsc::channel(8);
    tokio::spawn(async move {
        let mut counting_down = true;
        let sleep = tokio::time::sleep(timeout);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                command = rx.recv() => {
                    match command {
                        Some(TimerCommand::Stop) => counting_down = false,
                        Some(TimerCommand::Start) => {
                            counting_down = true;
                            sleep.as_mut().reset(Instant::now() + timeout);
                        }
                        Some(TimerCommand::CommandReceived) => {
                            if counting_down {
                                sleep.as_mut().reset(Instant::now() + timeout);
                            }
                        }
                        None => return, // every handle dropped; validator is gone
                    }
                }
                _ = &mut sleep, if counting_down => {
                    on_timeout.timeout();
                    // Wait for the validator to either stop us for good or
                    // acknowledge with a fresh Start/CommandReceived; firing
                    // twice for one idle period would be pointless.
                    counting_down = false;
                }
            }
        }
    });
    PassivationHandle { tx }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn fires_after_idle_timeout() {
        let fired = Arc::new(AtomicUsize::new(0));
        let sink = {
            let fired = fired.clone();
            move || {
                fired.fetch_add(1, Ordering::SeqCst);
            }
        };
        let _handle = spawn(Duration::from_secs(1), sink);
        tokio::time::advance(Duration::from_millis(1100)).await;
        tokio::task::yield_now().await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_suppresses_timeout_while_gated() {
        let fired = Arc::new(AtomicUsize::new(0));
        let sink = {
            let fired = fired.clone();
            move || {
                fired.fetch_add(1, Ordering::SeqCst);
            }
        };
        let handle = spawn(Duration::from_secs(1), sink);
        handle.stop().await;
        tokio::time::advance(Duration::from_secs(5)).await;
        tokio::task::yield_now().await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn command_received_restarts_the_countdown() {
        let fired = Arc::new(AtomicUsize::new(0));
        let sink = {
            let fired = fired.clone();
            move || {
                fired.fetch_add(1, Ordering::SeqCst);
            }
        };
        let handle = spawn(Duration::from_secs(1), sink);
        tokio::time::advance(Duration::from_millis(800)).await;
        handle.command_received().await;
        tokio::time::advance(Duration::from_millis(800)).await;
        tokio::task::yield_now().await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        tokio::time::advance(Duration::from_millis(300)).await;
        tokio::task::yield_now().await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
