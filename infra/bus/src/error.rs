use crate::subscription::HandlerError;
use crate::token::SubscriptionToken;
use std::borrow::Cow;
use std::fmt;

pub type Result<T, E = BusError> = std::result::Result<T, E>;

/// Errors returned by [`Bus::publish`](crate::Bus::publish).
///
/// Subscribing and unsubscribing never fail; every variant here describes
/// what went wrong while handlers were being invoked.
#[typebus_derive::bus_error]
pub enum BusError {
    /// A handler returned an error under [`DispatchPolicy::FailFast`](crate::DispatchPolicy::FailFast).
    /// Handlers after `position` were not invoked.
    #[error("Handler {token} failed at position {position}{}: {source}", format_context(.context))]
    Handler {
        token: SubscriptionToken,
        position: usize,
        source: HandlerError,
        context: Option<Cow<'static, str>>,
    },

    /// One or more handlers failed under [`DispatchPolicy::Isolate`](crate::DispatchPolicy::Isolate).
    /// All handlers were invoked; `delivered` of them completed.
    #[error(
        "Dispatch incomplete{}: {} handler(s) failed, {delivered} delivered",
        format_context(.context),
        .failures.len()
    )]
    Dispatch {
        delivered: usize,
        failures: Vec<HandlerFailure>,
        context: Option<Cow<'static, str>>,
    },

    /// Occurs when an erased subscription receives a message of another type.
    /// This indicates an invariant violation in the type registry.
    #[error("Type mismatch{}: {message}", format_context(.context))]
    TypeMismatch { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

/// A single handler failure collected during isolated dispatch.
#[derive(Debug)]
pub struct HandlerFailure {
    pub token: SubscriptionToken,
    pub position: usize,
    pub cause: FailureCause,
}

#[derive(Debug)]
pub enum FailureCause {
    /// The handler returned `Err`.
    Error(HandlerError),
    /// The handler panicked; holds the panic message when it was a string.
    Panic(String),
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error(err) => write!(f, "error: {err}"),
            Self::Panic(message) => write!(f, "panic: {message}"),
        }
    }
}

impl fmt::Display for HandlerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handler {} at position {}: {}", self.token, self.position, self.cause)
    }
}

impl BusError {
    /// Failures collected during isolated dispatch; empty for other variants.
    #[must_use]
    pub fn failures(&self) -> &[HandlerFailure] {
        match self {
            Self::Dispatch { failures, .. } => failures,
            _ => &[],
        }
    }
}
