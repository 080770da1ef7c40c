// src/auth/flow.rs

//! States of one email-change attempt as seen by the requesting client.
//!
//! `EmailChangeService` walks these on every call and hands the final state
//! back with the result; publishing the identity change waits on `Completed`.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    Validation,
    Auth,
    InvalidCredentials,
    Delivery,
    InvalidOrExpiredCode,
    Persistence,
}

/// Which half of the protocol a failure happened in; decides where a retry
/// starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Request,
    Verify,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailChangeState {
    Idle,
    RequestPending,
    CodeIssued,
    Verifying,
    Completed,
    Failed { reason: FailureReason, phase: Phase },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowEvent {
    /// New email + password submitted.
    Submit,
    /// Code stored and delivered to the current address.
    CodeDelivered,
    /// Code submitted for confirmation.
    SubmitCode,
    /// Identity record updated.
    Confirmed,
    Fail(FailureReason),
}

impl EmailChangeState {
    /// Next state, or `None` when `event` is not legal here.
    pub fn advance(self, event: FlowEvent) -> Option<EmailChangeState> {
        use EmailChangeState::*;
        use FlowEvent::*;

        match (self, event) {
            (Idle | CodeIssued | Completed, Submit) => Some(RequestPending),
            (Failed { .. }, Submit) => Some(RequestPending),
            (RequestPending, CodeDelivered) => Some(CodeIssued),
            (RequestPending, Fail(reason)) => Some(Failed {
                reason,
                phase: Phase::Request,
            }),
            (CodeIssued, SubmitCode) => Some(Verifying),
            (
                Failed {
                    phase: Phase::Verify,
                    ..
                },
                SubmitCode,
            ) => Some(Verifying),
            (Verifying, Confirmed) => Some(Completed),
            (Verifying, Fail(reason)) => Some(Failed {
                reason,
                phase: Phase::Verify,
            }),
            _ => None,
        }
    }

    /// Like [`advance`](Self::advance) but stays put on an illegal event.
    pub fn step(self, event: FlowEvent) -> EmailChangeState {
        match self.advance(event) {
            Some(next) => {
                tracing::debug!(from = %self, to = %next, "email change transition");
                next
            }
            None => {
                tracing::warn!(state = %self, ?event, "ignored illegal email change event");
                self
            }
        }
    }
}

impl fmt::Display for EmailChangeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmailChangeState::Idle => f.write_str("Idle"),
            EmailChangeState::RequestPending => f.write_str("RequestPending"),
            EmailChangeState::CodeIssued => f.write_str("CodeIssued"),
            EmailChangeState::Verifying => f.write_str("Verifying"),
            EmailChangeState::Completed => f.write_str("Completed"),
            EmailChangeState::Failed { reason, .. } => write!(f, "Failed({reason:?})"),
        }
    }
}
