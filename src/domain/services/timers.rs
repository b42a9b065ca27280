#[cfg(test)]
#[path = "timers_test.rs"]
mod tests;

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time;
use tokio_util::sync::CancellationToken;

/// Owns a spawned timer. Dropping or cancelling the handle stops the timer
/// before it delivers anything else.
#[derive(Debug)]
pub struct TimerHandle {
    token: CancellationToken,
}

impl TimerHandle {
    /// Delivers `event` once after `delay`.
    pub fn after<E: Send + 'static>(
        delay: Duration,
        tx: mpsc::UnboundedSender<E>,
        event: E,
    ) -> TimerHandle {
        let token = CancellationToken::new();
        let child = token.clone();

        tokio::spawn(async move {
            tokio::select! {
                _ = child.cancelled() => {}
                _ = time::sleep(delay) => {
                    let _ = tx.send(event);
                }
            }
        });

        return TimerHandle { token };
    }

    /// Delivers `make(n)` every `period`, starting with `n = 1` one period
    /// after the call.
    pub fn every<E, F>(period: Duration, tx: mpsc::UnboundedSender<E>, make: F) -> TimerHandle
    where
        E: Send + 'static,
        F: Fn(u64) -> E + Send + 'static,
    {
        let token = CancellationToken::new();
        let child = token.clone();

        tokio::spawn(async move {
            let mut interval = time::interval_at(time::Instant::now() + period, period);
            let mut ticks = 0;
            loop {
                tokio::select! {
                    _ = child.cancelled() => return,
                    _ = interval.tick() => {
                        ticks += 1;
                        if tx.send(make(ticks)).is_err() {
                            return;
                        }
                    }
                }
            }
        });

        return TimerHandle { token };
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        return self.token.is_cancelled();
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Collapses repeated triggers into one event delivered after a quiet period.
#[derive(Debug)]
pub struct Debouncer {
    quiet: Duration,
    pending: Option<TimerHandle>,
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Debouncer {
        return Debouncer {
            quiet,
            pending: None,
        };
    }

    pub fn is_immediate(&self) -> bool {
        return self.quiet.is_zero();
    }

    /// Restarts the quiet period, dropping any event still waiting.
    pub fn trigger<E: Send + 'static>(&mut self, tx: &mpsc::UnboundedSender<E>, event: E) {
        self.pending = Some(TimerHandle::after(self.quiet, tx.clone(), event));
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        return self.pending.is_some();
    }

    /// Called once the debounced event has been handled.
    pub fn fired(&mut self) {
        self.pending = None;
    }
}
