//! Guard configuration.

/// What to do when a panel's commit fails after the user chose to save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SaveFailurePolicy {
    /// Show the exit prompt again so the user can retry, discard, or cancel.
    #[default]
    Reprompt,
    /// Refuse the transition and keep the dirty panel active.
    Deny,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardConfig {
    /// Let activation pass through when the previously active panel is no longer
    /// watched (hidden), even if it still holds unsaved changes.
    pub skip_unwatched_previous: bool,
    pub on_save_failure: SaveFailurePolicy,
    /// Upper bound on prompts shown for one transition under
    /// [`SaveFailurePolicy::Reprompt`]. The transition is denied once exhausted.
    pub max_save_attempts: usize,
}

pub const DEFAULT_MAX_SAVE_ATTEMPTS: usize = 3;

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            skip_unwatched_previous: false,
            on_save_failure: SaveFailurePolicy::default(),
            max_save_attempts: DEFAULT_MAX_SAVE_ATTEMPTS,
        }
    }
}

impl GuardConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_skip_unwatched_previous(mut self, skip: bool) -> Self {
        self.skip_unwatched_previous = skip;
        self
    }

    pub fn with_save_failure_policy(mut self, policy: SaveFailurePolicy) -> Self {
        self.on_save_failure = policy;
        self
    }

    pub fn with_max_save_attempts(mut self, attempts: usize) -> Self {
        self.max_save_attempts = attempts.max(1);
        self
    }

    /// Number of prompts allowed for one transition.
    pub fn prompt_budget(&self) -> usize {
        match self.on_save_failure {
            SaveFailurePolicy::Reprompt => self.max_save_attempts.max(1),
            SaveFailurePolicy::Deny => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_base_contract() {
        let cfg = GuardConfig::default();
        assert!(!cfg.skip_unwatched_previous);
        assert_eq!(cfg.on_save_failure, SaveFailurePolicy::Reprompt);
        assert_eq!(cfg.prompt_budget(), DEFAULT_MAX_SAVE_ATTEMPTS);
    }

    #[test]
    fn attempts_clamp_to_one() {
        let cfg = GuardConfig::new().with_max_save_attempts(0);
        assert_eq!(cfg.max_save_attempts, 1);
        let cfg = GuardConfig::new()
            .with_max_save_attempts(5)
            .with_save_failure_policy(SaveFailurePolicy::Deny);
        assert_eq!(cfg.prompt_budget(), 1);
    }
}
