use crate::config::{BusConfig, DispatchPolicy};
use crate::error::{BusError, FailureCause, HandlerFailure};
use crate::key::{Message, MessageTypeKey};
use crate::subscription::{Entry, HandlerError, InvokeError, Subscription, SubscriptionList};
use crate::token::{SubscriptionGuard, SubscriptionToken};
use fxhash::FxHashMap;
use parking_lot::RwLock;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, trace, warn};

type Registry = FxHashMap<MessageTypeKey, SubscriptionList>;

pub(crate) struct BusInner {
    config: BusConfig,
    registry: RwLock<Registry>,
}

impl BusInner {
    /// Removes a subscription by token. The removed handler is dropped after
    /// the registry lock is released, since its captures may call back into
    /// the bus.
    pub(crate) fn remove(&self, token: SubscriptionToken) -> bool {
        let key = token.message_type();
        let removed = self.registry.write().get_mut(&key).and_then(|list| list.remove(token));

        let found = removed.is_some();
        trace!(event = key.type_name(), token = token.id(), found, "Handler unsubscribed");
        drop(removed);
        found
    }
}

impl fmt::Debug for BusInner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BusInner")
            .field("config", &self.config)
            .field("types", &self.registry.read().len())
            .finish()
    }
}

/// A synchronous, thread-safe message bus.
///
/// Handlers are indexed by the [`TypeId`](std::any::TypeId) of the message
/// they accept and run on the publishing thread, in subscription order.
/// Cloning a `Bus` yields another handle to the same registry; the registry
/// is torn down when the last handle is dropped.
///
/// A handler that captures a `Bus` clone is itself such a handle, so the
/// registry then outlives every external handle. Subscribe it through
/// [`Bus::subscribe_scoped`] or call [`Bus::shutdown`] to release it.
#[derive(Debug, Clone)]
pub struct Bus {
    inner: Arc<BusInner>,
}

impl Default for Bus {
    fn default() -> Self {
        Self::with_config(BusConfig::default())
    }
}

impl Bus {
    /// Creates a new, empty `Bus` with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(config: BusConfig) -> Self {
        let registry = Registry::with_capacity_and_hasher(config.initial_types, Default::default());
        Self { inner: Arc::new(BusInner { config, registry: RwLock::new(registry) }) }
    }

    #[must_use]
    pub fn config(&self) -> &BusConfig {
        &self.inner.config
    }

    /// Subscribes `handler` to messages of type `T`.
    ///
    /// The returned token is the only way to remove this subscription again.
    ///
    /// # Examples
    /// ```rust
    /// use typebus::Bus;
    ///
    /// struct Tick(u64);
    ///
    /// let bus = Bus::new();
    /// let token = bus.subscribe(|tick: &Tick| assert_eq!(tick.0, 1));
    /// assert_eq!(bus.publish(&Tick(1)).unwrap(), 1);
    /// assert!(bus.unsubscribe::<Tick>(token));
    /// ```
    pub fn subscribe<T, F>(&self, handler: F) -> SubscriptionToken
    where
        T: Message,
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.try_subscribe(move |message: &T| {
            handler(message);
            Ok(())
        })
    }

    /// Subscribes a fallible handler to messages of type `T`.
    ///
    /// An `Err` returned by `handler` is reported by [`Bus::publish`]
    /// according to the configured [`DispatchPolicy`].
    pub fn try_subscribe<T, F>(&self, handler: F) -> SubscriptionToken
    where
        T: Message,
        F: Fn(&T) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        let key = MessageTypeKey::of::<T>();
        let token = SubscriptionToken::issue(key);
        let entry: Entry = Arc::new(Subscription::<T>::new(token, Box::new(handler)));

        let subscribers = {
            let mut registry = self.inner.registry.write();
            let list = registry.entry(key).or_insert_with(|| {
                debug!(event = key.type_name(), "Initializing new subscription list");
                SubscriptionList::default()
            });
            list.push(entry);
            list.len()
        };

        trace!(event = key.type_name(), token = token.id(), subscribers, "Handler subscribed");
        token
    }

    /// Subscribes `handler` and ties the subscription to the returned guard.
    ///
    /// # Examples
    /// ```rust
    /// use typebus::Bus;
    ///
    /// struct Ping;
    ///
    /// let bus = Bus::new();
    /// let guard = bus.subscribe_scoped(|_: &Ping| {});
    /// assert_eq!(bus.subscriber_count::<Ping>(), Some(1));
    /// drop(guard);
    /// assert_eq!(bus.subscriber_count::<Ping>(), Some(0));
    /// ```
    pub fn subscribe_scoped<T, F>(&self, handler: F) -> SubscriptionGuard
    where
        T: Message,
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.guard(self.subscribe(handler))
    }

    /// Fallible counterpart of [`Bus::subscribe_scoped`].
    pub fn try_subscribe_scoped<T, F>(&self, handler: F) -> SubscriptionGuard
    where
        T: Message,
        F: Fn(&T) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.guard(self.try_subscribe(handler))
    }

    fn guard(&self, token: SubscriptionToken) -> SubscriptionGuard {
        SubscriptionGuard::new(token, Arc::downgrade(&self.inner))
    }

    /// Removes the subscription identified by `token` from `T`'s list.
    ///
    /// Returns `false` when nothing was removed: the token was already
    /// removed, was issued by another bus, or belongs to a different message
    /// type.
    pub fn unsubscribe<T: Message>(&self, token: SubscriptionToken) -> bool {
        let key = MessageTypeKey::of::<T>();
        if token.message_type() != key {
            trace!(
                event = key.type_name(),
                token = %token,
                "Token was issued for a different message type"
            );
            return false;
        }
        self.inner.remove(token)
    }

    /// Publishes `message` to every handler currently subscribed to `T`.
    ///
    /// Handlers run synchronously on the calling thread, in subscription
    /// order, over a snapshot of the list taken when the call starts.
    /// Handlers may subscribe, unsubscribe or publish re-entrantly; such
    /// changes take effect from the next `publish`.
    ///
    /// Returns the number of handlers that completed. Publishing a type
    /// nobody subscribed to returns `Ok(0)`.
    ///
    /// # Errors
    /// Under [`DispatchPolicy::FailFast`], returns [`BusError::Handler`] for
    /// the first handler that fails; the remaining handlers are skipped.
    /// Under [`DispatchPolicy::Isolate`], returns [`BusError::Dispatch`] with
    /// every failure (including panics) once all handlers have run.
    ///
    /// # Panics
    /// Under [`DispatchPolicy::FailFast`] a panicking handler unwinds out of
    /// this call.
    pub fn publish<T: Message>(&self, message: &T) -> Result<usize, BusError> {
        let key = MessageTypeKey::of::<T>();
        let snapshot = { self.inner.registry.read().get(&key).map(SubscriptionList::snapshot) };

        let Some(snapshot) = snapshot else {
            trace!(event = key.type_name(), "Event dropped: no subscribers registered");
            return Ok(0);
        };

        match self.inner.config.policy {
            DispatchPolicy::FailFast => dispatch_fail_fast(key, &snapshot, message),
            DispatchPolicy::Isolate => dispatch_isolated(key, &snapshot, message),
        }
    }

    /// Number of live subscriptions for `T`.
    ///
    /// Returns `None` if `T` was never subscribed to, and `Some(0)` for a
    /// known type whose handlers were all removed.
    #[must_use]
    pub fn subscriber_count<T: Message>(&self) -> Option<usize> {
        self.inner.registry.read().get(&MessageTypeKey::of::<T>()).map(SubscriptionList::len)
    }

    /// Whether `token` still identifies a live subscription for `T`.
    #[must_use]
    pub fn contains<T: Message>(&self, token: SubscriptionToken) -> bool {
        let key = MessageTypeKey::of::<T>();
        token.message_type() == key
            && self.inner.registry.read().get(&key).is_some_and(|list| list.contains(token))
    }

    /// Drops every subscription list. Outstanding tokens become inert.
    ///
    /// Returns the number of message types that were cleared. The bus stays
    /// usable afterwards.
    #[must_use]
    pub fn shutdown(&self) -> usize {
        let drained = std::mem::take(&mut *self.inner.registry.write());
        let count = drained.len();
        drop(drained);

        debug!(types = count, "Message bus registry cleared");
        count
    }
}

fn dispatch_fail_fast(
    key: MessageTypeKey,
    snapshot: &[Entry],
    message: &dyn Any,
) -> Result<usize, BusError> {
    for (position, entry) in snapshot.iter().enumerate() {
        match entry.invoke(message) {
            Ok(()) => {},
            Err(InvokeError::Handler(source)) => {
                let token = entry.token();
                warn!(
                    event = key.type_name(),
                    token = token.id(),
                    position,
                    error = %source,
                    "Handler failed; aborting delivery"
                );
                return Err(BusError::Handler { token, position, source, context: None });
            },
            Err(InvokeError::TypeMismatch { expected }) => return Err(type_mismatch(key, expected)),
        }
    }

    trace!(event = key.type_name(), count = snapshot.len(), "Event dispatched");
    Ok(snapshot.len())
}

fn dispatch_isolated(
    key: MessageTypeKey,
    snapshot: &[Entry],
    message: &dyn Any,
) -> Result<usize, BusError> {
    let mut failures = Vec::new();

    for (position, entry) in snapshot.iter().enumerate() {
        let cause = match panic::catch_unwind(AssertUnwindSafe(|| entry.invoke(message))) {
            Ok(Ok(())) => continue,
            Ok(Err(InvokeError::Handler(source))) => FailureCause::Error(source),
            Ok(Err(InvokeError::TypeMismatch { expected })) => {
                return Err(type_mismatch(key, expected));
            },
            Err(payload) => FailureCause::Panic(panic_message(payload.as_ref())),
        };

        let token = entry.token();
        warn!(
            event = key.type_name(),
            token = token.id(),
            position,
            cause = %cause,
            "Handler failed; continuing delivery"
        );
        failures.push(HandlerFailure { token, position, cause });
    }

    let delivered = snapshot.len() - failures.len();
    if failures.is_empty() {
        trace!(event = key.type_name(), count = delivered, "Event dispatched");
        Ok(delivered)
    } else {
        Err(BusError::Dispatch { delivered, failures, context: None })
    }
}

fn type_mismatch(key: MessageTypeKey, expected: &'static str) -> BusError {
    BusError::TypeMismatch {
        message: format!("subscription for {expected} registered under {key}").into(),
        context: Some("Unexpected message type".into()),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_remove_drops_handler_outside_lock() {
        // A handler owning a guard for another subscription: dropping the
        // handler re-enters the bus through the guard.
        let bus = Bus::new();
        let inner_guard = bus.subscribe_scoped(|_: &u16| {});
        let token = bus.subscribe(move |_: &u8| {
            let _ = &inner_guard;
        });

        assert!(bus.unsubscribe::<u8>(token));
        assert_eq!(bus.subscriber_count::<u16>(), Some(0));
    }

    #[test]
    fn test_shutdown_drops_handlers_outside_lock() {
        let bus = Bus::new();
        let inner_guard = bus.subscribe_scoped(|_: &u16| {});
        bus.subscribe(move |_: &u8| {
            let _ = &inner_guard;
        });

        assert_eq!(bus.shutdown(), 2);
        assert_eq!(bus.subscriber_count::<u8>(), None);
    }

    #[test]
    fn test_guard_outliving_bus_is_inert() {
        let bus = Bus::new();
        let guard = bus.subscribe_scoped(|_: &u8| {});
        drop(bus);
        drop(guard);
    }

    #[test]
    fn test_handler_holding_a_bus_clone_keeps_registry_alive() {
        let bus = Bus::new();
        let registry = Arc::downgrade(&bus.inner);
        let handle = bus.clone();
        bus.subscribe(move |_: &u8| {
            let _ = &handle;
        });
        drop(bus);

        let revived = Bus { inner: registry.upgrade().expect("handler keeps the registry alive") };
        assert_eq!(revived.shutdown(), 1);
        drop(revived);
        assert!(registry.upgrade().is_none());
    }

    #[test]
    fn test_dropping_guard_releases_self_referencing_handler() {
        let bus = Bus::new();
        let registry = Arc::downgrade(&bus.inner);
        let handle = bus.clone();
        let guard = bus.subscribe_scoped(move |_: &u8| {
            let _ = &handle;
        });

        drop(guard);
        drop(bus);
        assert!(registry.upgrade().is_none());
    }

    #[test]
    fn test_with_config_reserves_registry() {
        let bus = Bus::with_config(BusConfig::default().with_initial_types(64));
        assert!(bus.inner.registry.read().capacity() >= 64);
        assert_eq!(bus.config().initial_types, 64);
    }

    #[test]
    fn test_clones_share_registry() {
        let bus = Bus::new();
        let other = bus.clone();
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&calls);
        bus.subscribe(move |_: &u8| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(other.publish(&1u8).unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_panic_message_extraction() {
        let payload: Box<dyn Any + Send> = Box::new("static message");
        assert_eq!(panic_message(payload.as_ref()), "static message");

        let payload: Box<dyn Any + Send> = Box::new(String::from("owned message"));
        assert_eq!(panic_message(payload.as_ref()), "owned message");

        let payload: Box<dyn Any + Send> = Box::new(42u32);
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }
}
