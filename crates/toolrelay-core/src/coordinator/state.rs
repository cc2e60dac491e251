//! Round-trip state machine

use thiserror::Error;

use super::error::ErrorKind;

/// Where a round trip stands
///
/// ```text
/// AwaitingFirstResponse ──answer──────────────────────────► Answered
///        │ tool calls                                          ▲
///        ▼                                                     │ answer
/// AwaitingToolResults ──results sent──► AwaitingSecondResponse ┘
///        ▲                                   │ more tool calls
///        └───────────────────────────────────┘
/// ```
///
/// Any non-terminal state may move to `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundTripState {
    AwaitingFirstResponse,
    AwaitingToolResults,
    AwaitingSecondResponse,
    Answered,
    Failed(ErrorKind),
}

impl RoundTripState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RoundTripState::Answered | RoundTripState::Failed(_))
    }

    /// Whether `next` may follow this state
    pub fn can_transition_to(&self, next: RoundTripState) -> bool {
        use RoundTripState::*;
        match (self, next) {
            (Answered | Failed(_), _) => false,
            (_, Failed(_)) => true,
            (AwaitingFirstResponse, Answered | AwaitingToolResults) => true,
            (AwaitingToolResults, AwaitingSecondResponse) => true,
            (AwaitingSecondResponse, Answered | AwaitingToolResults) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for RoundTripState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoundTripState::AwaitingFirstResponse => write!(f, "AwaitingFirstResponse"),
            RoundTripState::AwaitingToolResults => write!(f, "AwaitingToolResults"),
            RoundTripState::AwaitingSecondResponse => write!(f, "AwaitingSecondResponse"),
            RoundTripState::Answered => write!(f, "Answered"),
            RoundTripState::Failed(kind) => write!(f, "Failed({})", kind),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("illegal round-trip transition: {from} -> {to}")]
pub struct IllegalTransition {
    pub from: RoundTripState,
    pub to: RoundTripState,
}

/// Current state plus every state visited, in order
#[derive(Debug, Clone)]
pub struct StateTracker {
    history: Vec<RoundTripState>,
}

impl Default for StateTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl StateTracker {
    pub fn new() -> Self {
        Self {
            history: vec![RoundTripState::AwaitingFirstResponse],
        }
    }

    pub fn current(&self) -> RoundTripState {
        // history always starts with AwaitingFirstResponse
        self.history
            .last()
            .copied()
            .unwrap_or(RoundTripState::AwaitingFirstResponse)
    }

    pub fn transition(&mut self, next: RoundTripState) -> Result<(), IllegalTransition> {
        let from = self.current();
        if !from.can_transition_to(next) {
            return Err(IllegalTransition { from, to: next });
        }
        self.history.push(next);
        Ok(())
    }

    pub fn history(&self) -> &[RoundTripState] {
        &self.history
    }

    pub fn into_history(self) -> Vec<RoundTripState> {
        self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use RoundTripState::*;

    #[test]
    fn test_direct_answer_path() {
        let mut tracker = StateTracker::new();
        tracker.transition(Answered).unwrap();
        assert!(tracker.current().is_terminal());
        assert_eq!(tracker.history(), &[AwaitingFirstResponse, Answered]);
    }

    #[test]
    fn test_tool_loop_path() {
        let mut tracker = StateTracker::new();
        for next in [
            AwaitingToolResults,
            AwaitingSecondResponse,
            AwaitingToolResults,
            AwaitingSecondResponse,
            Answered,
        ] {
            tracker.transition(next).unwrap();
        }
        assert_eq!(tracker.history().len(), 6);
    }

    #[test]
    fn test_illegal_transitions_rejected() {
        let mut tracker = StateTracker::new();
        let err = tracker.transition(AwaitingSecondResponse).unwrap_err();
        assert_eq!(
            err.to_string(),
            "illegal round-trip transition: AwaitingFirstResponse -> AwaitingSecondResponse"
        );

        tracker.transition(Failed(ErrorKind::Cancelled)).unwrap();
        assert!(tracker.transition(Answered).is_err());
        assert!(tracker.transition(Failed(ErrorKind::ProviderUnavailable)).is_err());
        assert_eq!(tracker.current(), Failed(ErrorKind::Cancelled));
    }
}
