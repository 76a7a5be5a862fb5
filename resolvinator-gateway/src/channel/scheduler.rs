//! Cancellable reconnect timer.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::debug;

/// Periodic timer driving reconnect attempts.
///
/// Ticks are delivered to the connection loop, never handled on the timer's
/// own task.
pub trait ReconnectScheduler: Send {
    /// Starts ticking, restarting the period if already running.
    fn start(&mut self);

    /// Stops ticking. Safe to call when stopped.
    fn stop(&mut self);

    /// Returns true while ticks are scheduled.
    fn is_running(&self) -> bool;
}

/// Fixed-interval scheduler backed by a tokio task.
#[derive(Debug)]
pub struct IntervalScheduler {
    period: Duration,
    ticks: mpsc::UnboundedSender<()>,
    task: Option<JoinHandle<()>>,
}

impl IntervalScheduler {
    /// Creates a stopped scheduler that sends one `()` to `ticks` per period.
    #[must_use]
    pub fn new(period: Duration, ticks: mpsc::UnboundedSender<()>) -> Self {
        Self {
            period,
            ticks,
            task: None,
        }
    }
}

impl ReconnectScheduler for IntervalScheduler {
    fn start(&mut self) {
        self.stop();
        let period = self.period;
        let ticks = self.ticks.clone();
        debug!(period = ?period, "Reconnect timer started");
        self.task = Some(tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if ticks.send(()).is_err() {
                    break;
                }
            }
        }));
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("Reconnect timer stopped");
        }
    }

    fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for IntervalScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Scheduler that only records calls; ticks are injected by the test.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub(crate) struct ManualScheduler {
    state: std::sync::Arc<parking_lot::Mutex<ManualState>>,
}

#[cfg(test)]
#[derive(Debug, Default)]
struct ManualState {
    running: bool,
    starts: usize,
}

#[cfg(test)]
impl ManualScheduler {
    pub(crate) fn starts(&self) -> usize {
        self.state.lock().starts
    }

    pub(crate) fn running(&self) -> bool {
        self.state.lock().running
    }
}

#[cfg(test)]
impl ReconnectScheduler for ManualScheduler {
    fn start(&mut self) {
        let mut state = self.state.lock();
        state.running = true;
        state.starts += 1;
    }

    fn stop(&mut self) {
        self.state.lock().running = false;
    }

    fn is_running(&self) -> bool {
        self.state.lock().running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_ticks_every_period() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut scheduler = IntervalScheduler::new(Duration::from_secs(5), tx);
        scheduler.start();
        assert!(scheduler.is_running());

        tokio::time::sleep(Duration::from_millis(4_900)).await;
        assert!(rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(rx.try_recv().is_ok());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_pending_tick() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut scheduler = IntervalScheduler::new(Duration::from_secs(5), tx);
        scheduler.start();
        tokio::time::sleep(Duration::from_secs(3)).await;
        scheduler.stop();
        assert!(!scheduler.is_running());

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_resets_period() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut scheduler = IntervalScheduler::new(Duration::from_secs(5), tx);
        scheduler.start();
        tokio::time::sleep(Duration::from_secs(4)).await;
        scheduler.start();

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert!(rx.try_recv().is_err());
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(rx.try_recv().is_ok());
    }
}
