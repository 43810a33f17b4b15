//! Request lifecycle for one operation kind (ingestion or querying).
//!
//! Each operation holds at most one pending attempt. Starting an attempt hands out a
//! [`Ticket`]; only a completion carrying the pending ticket is committed.

use tracing::warn;

use crate::error::RequestError;

/// Identifies one attempt of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

impl Ticket {
    /// Returns the attempt number (1 for the first attempt).
    pub fn attempt(self) -> u64 {
        self.0
    }
}

/// Lifecycle of an operation.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationState<T> {
    /// Nothing submitted yet.
    Idle,
    /// A request is in flight.
    Pending(Ticket),
    /// The most recent attempt succeeded.
    Succeeded(T),
    /// The most recent attempt failed.
    Failed(RequestError),
}

/// Result of handing a completion to [`Operation::settle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settled {
    /// The completion matched the pending attempt and is now the terminal state.
    Committed,
    /// The completion did not belong to the pending attempt and was dropped.
    Stale,
}

/// One operation's state machine.
#[derive(Debug, Clone)]
pub struct Operation<T> {
    state: OperationState<T>,
    issued: u64,
}

impl<T> Operation<T> {
    /// Creates an idle operation.
    pub fn new() -> Self {
        Self {
            state: OperationState::Idle,
            issued: 0,
        }
    }

    /// Returns the current state.
    pub fn state(&self) -> &OperationState<T> {
        &self.state
    }

    /// Returns true while a request is in flight.
    pub fn is_pending(&self) -> bool {
        matches!(self.state, OperationState::Pending(_))
    }

    /// Returns the committed success value, if any.
    pub fn value(&self) -> Option<&T> {
        match &self.state {
            OperationState::Succeeded(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the committed failure, if any.
    pub fn error(&self) -> Option<&RequestError> {
        match &self.state {
            OperationState::Failed(error) => Some(error),
            _ => None,
        }
    }

    /// Starts a new attempt, superseding any terminal value.
    ///
    /// Returns `None` and leaves the pending attempt untouched if one is in flight.
    ///
    /// # Examples
    ///
    /// ```
    /// use minirag::coordinator::Operation;
    ///
    /// let mut op: Operation<u32> = Operation::new();
    /// let ticket = op.begin().expect("idle operation starts");
    /// assert!(op.begin().is_none());
    /// assert!(op.is_pending());
    /// # let _ = ticket;
    /// ```
    pub fn begin(&mut self) -> Option<Ticket> {
        if self.is_pending() {
            return None;
        }
        self.issued += 1;
        let ticket = Ticket(self.issued);
        self.state = OperationState::Pending(ticket);
        Some(ticket)
    }

    /// Commits the outcome of `ticket` if it is the pending attempt.
    pub fn settle(&mut self, ticket: Ticket, outcome: Result<T, RequestError>) -> Settled {
        if !matches!(self.state, OperationState::Pending(pending) if pending == ticket) {
            warn!(
                attempt = ticket.attempt(),
                "dropping completion for an attempt that is no longer pending"
            );
            return Settled::Stale;
        }

        self.state = match outcome {
            Ok(value) => OperationState::Succeeded(value),
            Err(error) => OperationState::Failed(error),
        };
        Settled::Committed
    }
}

impl<T> Default for Operation<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport_error() -> RequestError {
        RequestError::Transport("HTTP error: status 500".to_string())
    }

    #[test]
    fn starts_idle() {
        let op: Operation<u32> = Operation::new();
        assert_eq!(op.state(), &OperationState::Idle);
        assert!(!op.is_pending());
        assert!(op.value().is_none());
    }

    #[test]
    fn success_is_committed() {
        let mut op = Operation::new();
        let ticket = op.begin().unwrap();

        assert_eq!(op.settle(ticket, Ok(7)), Settled::Committed);
        assert_eq!(op.value(), Some(&7));
    }

    #[test]
    fn failure_is_committed() {
        let mut op: Operation<u32> = Operation::new();
        let ticket = op.begin().unwrap();

        assert_eq!(op.settle(ticket, Err(transport_error())), Settled::Committed);
        assert_eq!(op.error(), Some(&transport_error()));
    }

    #[test]
    fn begin_while_pending_is_rejected_and_keeps_attempt() {
        let mut op: Operation<u32> = Operation::new();
        let ticket = op.begin().unwrap();

        assert!(op.begin().is_none());
        assert_eq!(op.state(), &OperationState::Pending(ticket));
    }

    #[test]
    fn terminal_states_can_start_again() {
        let mut op = Operation::new();
        let first = op.begin().unwrap();
        op.settle(first, Ok(1));

        let second = op.begin().unwrap();
        assert_ne!(first, second);
        assert!(op.value().is_none(), "new attempt supersedes the old value");

        op.settle(second, Err(transport_error()));
        let third = op.begin().unwrap();
        assert_eq!(third.attempt(), 3);
    }

    #[test]
    fn completion_for_old_ticket_is_stale() {
        let mut op = Operation::new();
        let first = op.begin().unwrap();
        op.settle(first, Ok(1));
        let second = op.begin().unwrap();

        assert_eq!(op.settle(first, Ok(99)), Settled::Stale);
        assert_eq!(op.state(), &OperationState::Pending(second));
    }

    #[test]
    fn completion_without_pending_attempt_is_stale() {
        let mut op: Operation<u32> = Operation::new();
        let ticket = op.begin().unwrap();
        op.settle(ticket, Ok(1));

        assert_eq!(op.settle(ticket, Ok(2)), Settled::Stale);
        assert_eq!(op.value(), Some(&1));
    }
}
