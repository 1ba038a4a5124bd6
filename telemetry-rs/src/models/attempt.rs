use log::{debug, error};
use uuid::Uuid;

use crate::models::outcome::{PublishFailure, PublishOutcome};

/// Lifecycle of a single publish attempt.
///
/// `Idle -> TokenReady -> Sending -> Succeeded | Failed`. `Failed` is also reachable
/// from `Idle` and `TokenReady` when encoding or signing fails. Terminal states never
/// go back to `Idle`: every publish call starts a fresh attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishState {
    Idle,
    TokenReady,
    Sending,
    Succeeded,
    Failed,
}

impl PublishState {
    pub fn can_transition_to(self, next: PublishState) -> bool {
        use PublishState::*;
        matches!(
            (self, next),
            (Idle, TokenReady)
                | (TokenReady, Sending)
                | (Sending, Succeeded)
                | (Idle, Failed)
                | (TokenReady, Failed)
                | (Sending, Failed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, PublishState::Succeeded | PublishState::Failed)
    }
}

/// Tracks one publish call through `PublishState`, tagged with an id for log correlation.
#[derive(Debug)]
pub struct PublishAttempt {
    id: Uuid,
    state: PublishState,
}

impl PublishAttempt {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: PublishState::Idle,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> PublishState {
        self.state
    }

    /// Moves to `next`. Returns false and keeps the current state if the transition is illegal.
    pub fn advance(&mut self, next: PublishState) -> bool {
        if !self.state.can_transition_to(next) {
            error!(
                "[{}] Illegal publish transition {:?} -> {:?}",
                self.id, self.state, next
            );
            return false;
        }
        debug!("[{}] {:?} -> {:?}", self.id, self.state, next);
        self.state = next;
        true
    }

    /// Moves to the terminal state matching `outcome` and hands the outcome back.
    pub fn finish(&mut self, outcome: PublishOutcome) -> PublishOutcome {
        let next = if outcome.is_success() {
            PublishState::Succeeded
        } else {
            PublishState::Failed
        };
        self.advance(next);
        outcome
    }

    pub fn fail(&mut self, failure: PublishFailure) -> PublishOutcome {
        self.finish(PublishOutcome::Failure(failure))
    }
}

impl Default for PublishAttempt {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::outcome::FailureKind;

    #[test]
    fn test_happy_path() {
        let mut attempt = PublishAttempt::new();
        assert_eq!(attempt.state(), PublishState::Idle);
        assert!(attempt.advance(PublishState::TokenReady));
        assert!(attempt.advance(PublishState::Sending));
        let outcome = attempt.finish(PublishOutcome::Success {
            status: 200,
            body: String::new(),
        });
        assert!(outcome.is_success());
        assert_eq!(attempt.state(), PublishState::Succeeded);
        assert!(attempt.state().is_terminal());
    }

    #[test]
    fn test_failure_before_token() {
        let mut attempt = PublishAttempt::new();
        attempt.fail(PublishFailure::new(FailureKind::InvalidInput, None, "nan"));
        assert_eq!(attempt.state(), PublishState::Failed);
    }

    #[test]
    fn test_illegal_transitions_are_refused() {
        let mut attempt = PublishAttempt::new();
        assert!(!attempt.advance(PublishState::Sending));
        assert!(!attempt.advance(PublishState::Succeeded));
        assert_eq!(attempt.state(), PublishState::Idle);

        attempt.fail(PublishFailure::new(FailureKind::SigningError, None, "empty key"));
        assert!(!attempt.advance(PublishState::Idle));
        assert!(!attempt.advance(PublishState::TokenReady));
        assert_eq!(attempt.state(), PublishState::Failed);
    }

    #[test]
    fn test_attempt_ids_are_unique() {
        assert_ne!(PublishAttempt::new().id(), PublishAttempt::new().id());
    }
}
