//! The session clock: idle timers and the warning countdown.

use repairhub_protocol::SessionPolicy;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Events the clock feeds into the controller's event loop.
///
/// Every event carries the generation it was scheduled under; the
/// controller discards events from a superseded generation, so a timer
/// that fired just before a re-arm cannot act on the new window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockEvent {
    /// `T - W` elapsed without activity.
    WarningDue { generation: u64 },
    /// The full timeout `T` elapsed.
    ExpiryDue { generation: u64 },
    /// One countdown tick. `remaining_secs == 0` forces logout through
    /// the same path as [`ClockEvent::ExpiryDue`].
    CountdownTick { generation: u64, remaining_secs: u64 },
}

/// Warning/expiry timer pair plus the countdown ticker.
///
/// Pure scheduling - no session logic lives here. The two idle timers are
/// always armed and disarmed together; re-arming cancels everything
/// scheduled and bumps the generation. The controller is the only caller.
pub struct SessionClock {
    events: mpsc::UnboundedSender<ClockEvent>,
    generation: u64,
    warning: Option<JoinHandle<()>>,
    expiry: Option<JoinHandle<()>>,
    countdown: Option<JoinHandle<()>>,
}

impl SessionClock {
    /// Create a disarmed clock feeding the given channel.
    pub fn new(events: mpsc::UnboundedSender<ClockEvent>) -> Self {
        Self {
            events,
            generation: 0,
            warning: None,
            expiry: None,
            countdown: None,
        }
    }

    /// The generation of the most recent arm.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Arm both idle timers from this moment, cancelling any previous
    /// schedule (including a running countdown).
    pub fn arm(&mut self, policy: &SessionPolicy) {
        self.disarm();
        self.generation += 1;
        let generation = self.generation;

        let warning_delay = policy.warning_delay();
        let tx = self.events.clone();
        self.warning = Some(tokio::spawn(async move {
            tokio::time::sleep(warning_delay).await;
            let _ = tx.send(ClockEvent::WarningDue { generation });
        }));

        let total = policy.total_timeout;
        let tx = self.events.clone();
        self.expiry = Some(tokio::spawn(async move {
            tokio::time::sleep(total).await;
            let _ = tx.send(ClockEvent::ExpiryDue { generation });
        }));
    }

    /// Start the visible countdown for the warning window just entered.
    /// Runs under the current generation; a re-arm cancels it.
    pub fn start_countdown(&mut self, policy: &SessionPolicy) {
        if let Some(handle) = self.countdown.take() {
            handle.abort();
        }
        let generation = self.generation;
        let tick = policy.countdown_tick;
        let tx = self.events.clone();
        let mut remaining_secs = policy.countdown_start_secs();
        self.countdown = Some(tokio::spawn(async move {
            loop {
                let _ = tx.send(ClockEvent::CountdownTick {
                    generation,
                    remaining_secs,
                });
                if remaining_secs == 0 {
                    break;
                }
                tokio::time::sleep(tick).await;
                remaining_secs -= 1;
            }
        }));
    }

    /// Cancel everything scheduled. Idempotent.
    pub fn disarm(&mut self) {
        for handle in [
            self.warning.take(),
            self.expiry.take(),
            self.countdown.take(),
        ]
        .into_iter()
        .flatten()
        {
            handle.abort();
        }
    }
}

impl Drop for SessionClock {
    fn drop(&mut self) {
        self.disarm();
    }
}
