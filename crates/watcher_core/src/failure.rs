use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escalation {
    /// Send an escalation notice for this failure.
    Notify,
    /// Log only.
    Quiet,
}

/// Consecutive cycle failures, owned by the monitor loop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FailureState {
    consecutive_failures: u32,
    last_error: Option<String>,
    escalated: bool,
}

impl FailureState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Counts a failed cycle. Escalates on the first failure and then on
    /// every count divisible by `every`.
    pub fn record_failure(&mut self, error: impl fmt::Display, every: u32) -> Escalation {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.last_error = Some(error.to_string());

        let count = self.consecutive_failures;
        let due = count == 1 || every <= 1 || count % every == 0;
        if due {
            self.escalated = true;
            Escalation::Notify
        } else {
            Escalation::Quiet
        }
    }

    /// Resets after a successful cycle. Returns the number of failures that
    /// preceded it when an escalation had gone out, so a recovery notice can
    /// be sent.
    pub fn record_success(&mut self) -> Option<u32> {
        let recovered = self.escalated.then_some(self.consecutive_failures);
        *self = Self::default();
        recovered.filter(|&count| count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escalates_on_first_and_every_nth() {
        let mut state = FailureState::new();
        let notified: Vec<u32> = (1..=15)
            .filter(|_| state.record_failure("boom", 5) == Escalation::Notify)
            .collect();
        assert_eq!(notified, vec![1, 5, 10, 15]);
        assert_eq!(state.consecutive_failures(), 15);
        assert_eq!(state.last_error(), Some("boom"));
    }

    #[test]
    fn every_of_zero_or_one_escalates_always() {
        let mut state = FailureState::new();
        assert_eq!(state.record_failure("a", 0), Escalation::Notify);
        assert_eq!(state.record_failure("b", 1), Escalation::Notify);
    }

    #[test]
    fn success_resets_and_reports_recovery() {
        let mut state = FailureState::new();
        state.record_failure("a", 5);
        state.record_failure("b", 5);
        assert_eq!(state.record_success(), Some(2));
        assert_eq!(state.consecutive_failures(), 0);
        assert_eq!(state.last_error(), None);
        assert_eq!(state.record_success(), None);
    }
}
