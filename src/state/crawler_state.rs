//! Crawl controller lifecycle
//!
//! The controller moves strictly forward: `Idle → Running → Closed`.
//! There is no pause or resume, and a closed controller cannot be restarted.

use std::fmt;

/// Represents the current state of the crawl controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlerState {
    /// Created, no request issued yet
    Idle,

    /// Start requests issued, branches in flight
    Running,

    /// All requests drained (or crawl stopped); summary emitted
    Closed,
}

impl CrawlerState {
    /// Returns true if the controller has finished
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Returns true if moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: CrawlerState) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Running) | (Self::Running, Self::Closed)
        )
    }

    /// Short lowercase name used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for CrawlerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions() {
        assert!(CrawlerState::Idle.can_transition_to(CrawlerState::Running));
        assert!(CrawlerState::Running.can_transition_to(CrawlerState::Closed));
    }

    #[test]
    fn test_rejected_transitions() {
        assert!(!CrawlerState::Idle.can_transition_to(CrawlerState::Closed));
        assert!(!CrawlerState::Running.can_transition_to(CrawlerState::Idle));
        assert!(!CrawlerState::Running.can_transition_to(CrawlerState::Running));
        assert!(!CrawlerState::Closed.can_transition_to(CrawlerState::Running));
        assert!(!CrawlerState::Closed.can_transition_to(CrawlerState::Idle));
    }

    #[test]
    fn test_is_terminal() {
        assert!(!CrawlerState::Idle.is_terminal());
        assert!(!CrawlerState::Running.is_terminal());
        assert!(CrawlerState::Closed.is_terminal());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", CrawlerState::Idle), "idle");
        assert_eq!(format!("{}", CrawlerState::Running), "running");
        assert_eq!(format!("{}", CrawlerState::Closed), "closed");
    }
}
