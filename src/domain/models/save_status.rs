#[cfg(test)]
#[path = "save_status_test.rs"]
mod tests;

use std::time::Duration;

/// What asked for the conversation to be persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum SaveTrigger {
    Exchange,
    NewChat,
    Unload,
    Manual,
}

impl SaveTrigger {
    /// Fewest history entries worth persisting for this trigger.
    pub fn min_history(&self) -> usize {
        match self {
            SaveTrigger::NewChat => return 1,
            _ => return 2,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SaveStatus {
    Idle,
    Saving,
    Saved,
    Error(String),
}

impl SaveStatus {
    /// How long a terminal state stays visible before falling back to idle.
    pub fn visible_for(&self) -> Option<Duration> {
        match self {
            SaveStatus::Saved => return Some(Duration::from_secs(2)),
            SaveStatus::Error(_) => return Some(Duration::from_secs(4)),
            _ => return None,
        }
    }

    pub fn label(&self) -> String {
        match self {
            SaveStatus::Idle => return "".to_string(),
            SaveStatus::Saving => return "Saving...".to_string(),
            SaveStatus::Saved => return "Saved".to_string(),
            SaveStatus::Error(msg) => {
                if msg.is_empty() {
                    return "Error".to_string();
                }
                return msg.to_string();
            }
        }
    }
}

/// Save badge state. Every transition bumps the generation so a hide timer
/// armed for an older transition can't clear a newer one.
#[derive(Debug)]
pub struct SaveIndicator {
    status: SaveStatus,
    generation: u64,
}

impl Default for SaveIndicator {
    fn default() -> SaveIndicator {
        return SaveIndicator {
            status: SaveStatus::Idle,
            generation: 0,
        };
    }
}

impl SaveIndicator {
    pub fn status(&self) -> &SaveStatus {
        return &self.status;
    }

    /// Applies a transition, returning the generation to hand back to
    /// `expire` once `visible_for` has elapsed.
    pub fn set(&mut self, status: SaveStatus) -> u64 {
        self.generation += 1;
        self.status = status;
        return self.generation;
    }

    /// Returns true if the badge went back to idle.
    pub fn expire(&mut self, generation: u64) -> bool {
        if generation != self.generation || self.status == SaveStatus::Idle {
            return false;
        }

        self.status = SaveStatus::Idle;
        return true;
    }
}
