use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Marker trait for types that can travel over the [`Bus`](crate::Bus).
///
/// Any `'static` type implements it automatically; there is no base type to
/// inherit from and no `Clone`/`Send` requirement on the message itself.
pub trait Message: Any {}
impl<T: Any> Message for T {}

/// Identity of a message type, used as the registry key.
///
/// Equality and hashing look at the [`TypeId`] only. The type name is kept
/// for logs and error messages.
#[derive(Clone, Copy)]
pub struct MessageTypeKey {
    id: TypeId,
    name: &'static str,
}

impl MessageTypeKey {
    /// Returns the key for message type `T`.
    #[must_use]
    pub fn of<T: Message>() -> Self {
        Self { id: TypeId::of::<T>(), name: type_name::<T>() }
    }

    #[must_use]
    pub const fn type_id(&self) -> TypeId {
        self.id
    }

    /// Human-readable type name, as reported by [`std::any::type_name`].
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for MessageTypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for MessageTypeKey {}

impl Hash for MessageTypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for MessageTypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MessageTypeKey").field(&self.name).finish()
    }
}

impl fmt::Display for MessageTypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
