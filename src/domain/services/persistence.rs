#[cfg(test)]
#[path = "persistence_test.rs"]
mod tests;

use std::time::Duration;

use tokio::sync::mpsc;

use super::Debouncer;
use crate::domain::models::SaveTrigger;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveDecision {
    /// Issue the save right away.
    Now,
    /// A debounced save will be delivered later.
    Deferred,
    /// Not enough history, nothing is sent.
    Skip,
}

/// Decides when the active conversation gets written to the server.
#[derive(Debug)]
pub struct PersistenceScheduler {
    debouncer: Debouncer,
}

impl PersistenceScheduler {
    pub fn new(autosave_debounce: Duration) -> PersistenceScheduler {
        return PersistenceScheduler {
            debouncer: Debouncer::new(autosave_debounce),
        };
    }

    /// For `SaveTrigger::Exchange` with a non zero debounce, `due` is sent on
    /// `tx` once the quiet period passes and the caller saves then.
    pub fn decide<E: Send + 'static>(
        &mut self,
        trigger: SaveTrigger,
        history_len: usize,
        tx: &mpsc::UnboundedSender<E>,
        due: E,
    ) -> SaveDecision {
        if history_len < trigger.min_history() {
            tracing::debug!(%trigger, history_len, "Skipping save");
            return SaveDecision::Skip;
        }

        if trigger == SaveTrigger::Exchange && !self.debouncer.is_immediate() {
            self.debouncer.trigger(tx, due);
            return SaveDecision::Deferred;
        }

        // Any other save supersedes a debounced one.
        self.debouncer.cancel();
        return SaveDecision::Now;
    }

    /// Called when a debounced save is delivered.
    pub fn debounce_fired(&mut self) {
        self.debouncer.fired();
    }

    pub fn cancel_pending(&mut self) {
        self.debouncer.cancel();
    }

    #[cfg(test)]
    pub fn has_pending(&self) -> bool {
        return self.debouncer.is_pending();
    }
}
