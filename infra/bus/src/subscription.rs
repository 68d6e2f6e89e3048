use crate::key::Message;
use crate::token::SubscriptionToken;
use std::any::{Any, type_name};
use std::fmt;
use std::sync::Arc;

/// Error type a fallible handler may return.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub(crate) type HandlerFn<T> = Box<dyn Fn(&T) -> Result<(), HandlerError> + Send + Sync>;

pub(crate) enum InvokeError {
    Handler(HandlerError),
    TypeMismatch { expected: &'static str },
}

/// Type-erased view of a [`Subscription`], so lists for different message
/// types can share one registry.
pub(crate) trait ErasedHandler: Send + Sync {
    fn token(&self) -> SubscriptionToken;

    /// Recovers the concrete message type and runs the handler.
    fn invoke(&self, message: &dyn Any) -> Result<(), InvokeError>;
}

pub(crate) struct Subscription<T> {
    token: SubscriptionToken,
    handler: HandlerFn<T>,
}

impl<T: Message> Subscription<T> {
    pub(crate) fn new(token: SubscriptionToken, handler: HandlerFn<T>) -> Self {
        Self { token, handler }
    }
}

impl<T: Message> ErasedHandler for Subscription<T> {
    fn token(&self) -> SubscriptionToken {
        self.token
    }

    fn invoke(&self, message: &dyn Any) -> Result<(), InvokeError> {
        let message = message
            .downcast_ref::<T>()
            .ok_or(InvokeError::TypeMismatch { expected: type_name::<T>() })?;
        (self.handler)(message).map_err(InvokeError::Handler)
    }
}

impl<T> fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("token", &self.token).finish_non_exhaustive()
    }
}

pub(crate) type Entry = Arc<dyn ErasedHandler>;

/// Ordered, copy-on-write list of subscriptions for one message type.
///
/// Cloning the inner `Arc` yields a snapshot; mutations made while a
/// snapshot is alive copy the vector first, so in-flight dispatch never sees
/// them.
#[derive(Default, Clone)]
pub(crate) struct SubscriptionList {
    entries: Arc<Vec<Entry>>,
}

impl SubscriptionList {
    pub(crate) fn push(&mut self, entry: Entry) {
        Arc::make_mut(&mut self.entries).push(entry);
    }

    /// Removes the entry for `token`, handing it back so the caller can drop
    /// it outside the registry lock.
    pub(crate) fn remove(&mut self, token: SubscriptionToken) -> Option<Entry> {
        let position = self.entries.iter().position(|entry| entry.token() == token)?;
        Some(Arc::make_mut(&mut self.entries).remove(position))
    }

    pub(crate) fn contains(&self, token: SubscriptionToken) -> bool {
        self.entries.iter().any(|entry| entry.token() == token)
    }

    pub(crate) fn snapshot(&self) -> Arc<Vec<Entry>> {
        Arc::clone(&self.entries)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

impl fmt::Debug for SubscriptionList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries.iter().map(|entry| entry.token())).finish()
    }
}
