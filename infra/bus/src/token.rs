use crate::bus::BusInner;
use crate::key::MessageTypeKey;
use std::fmt;
use std::sync::Weak;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide so tokens stay unambiguous across independent buses.
static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

/// Opaque handle identifying exactly one subscription.
///
/// Tokens compare by identity: the issued id plus the message type the
/// subscription was made for. They never inspect the handler itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionToken {
    id: u64,
    key: MessageTypeKey,
}

impl SubscriptionToken {
    pub(crate) fn issue(key: MessageTypeKey) -> Self {
        Self { id: NEXT_TOKEN.fetch_add(1, Ordering::Relaxed), key }
    }

    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// The message type this token was issued for.
    #[must_use]
    pub const fn message_type(&self) -> MessageTypeKey {
        self.key
    }
}

impl fmt::Display for SubscriptionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.key, self.id)
    }
}

/// RAII subscription returned by [`Bus::subscribe_scoped`](crate::Bus::subscribe_scoped).
///
/// Dropping the guard unsubscribes the handler. The guard holds the bus
/// weakly, so it never keeps a torn-down bus alive.
#[must_use = "dropping the guard unsubscribes the handler immediately"]
#[derive(Debug)]
pub struct SubscriptionGuard {
    token: SubscriptionToken,
    bus: Weak<BusInner>,
    armed: bool,
}

impl SubscriptionGuard {
    pub(crate) const fn new(token: SubscriptionToken, bus: Weak<BusInner>) -> Self {
        Self { token, bus, armed: true }
    }

    #[must_use]
    pub const fn token(&self) -> SubscriptionToken {
        self.token
    }

    /// Keeps the subscription alive beyond the guard and hands back its token.
    pub fn detach(mut self) -> SubscriptionToken {
        self.armed = false;
        self.token
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Some(bus) = self.bus.upgrade() {
            bus.remove(self.token);
        }
    }
}
