//! # Typebus
//!
//! A type-indexed, synchronous publish/subscribe bus for decoupling
//! components inside one process.
//!
//! ## Overview
//!
//! Components subscribe a handler for a message *type*; publishing a value of
//! that type invokes every subscribed handler in registration order, on the
//! calling thread, before `publish` returns. Publishers and subscribers only
//! share the [`Bus`] handle and the message type.
//!
//! ## Features
//!
//! * **Type-Safe**: Messages are identified by their Rust type; handlers are
//!   recovered with a checked downcast.
//! * **Token-based removal**: [`Bus::subscribe`] returns a [`SubscriptionToken`];
//!   [`Bus::subscribe_scoped`] returns a guard that unsubscribes on drop.
//! * **Re-entrant**: handlers may subscribe, unsubscribe or publish while a
//!   publish is in flight; each publish iterates a snapshot.
//! * **Explicit failure policy**: see [`DispatchPolicy`].
//! * **Thread-safe**: `FxHashMap` + `parking_lot::RwLock`, no lock held while
//!   handlers run.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use typebus::{Bus, BusError};
//!
//! struct UserCreated { id: u64 }
//!
//! fn main() -> Result<(), BusError> {
//!     let bus = Bus::new();
//!     let last_seen = Arc::new(AtomicU64::new(0));
//!
//!     let sink = Arc::clone(&last_seen);
//!     let token = bus.subscribe(move |event: &UserCreated| {
//!         sink.store(event.id, Ordering::SeqCst);
//!     });
//!
//!     assert_eq!(bus.publish(&UserCreated { id: 42 })?, 1);
//!     assert_eq!(last_seen.load(Ordering::SeqCst), 42);
//!
//!     assert!(bus.unsubscribe::<UserCreated>(token));
//!     assert_eq!(bus.publish(&UserCreated { id: 7 })?, 0);
//!     Ok(())
//! }
//! ```

mod bus;
mod config;
mod error;
mod key;
mod subscription;
mod token;

pub use bus::Bus;
pub use config::{BusConfig, DispatchPolicy};
pub use error::{BusError, BusErrorExt, FailureCause, HandlerFailure, Result};
pub use key::{Message, MessageTypeKey};
pub use subscription::HandlerError;
pub use token::{SubscriptionGuard, SubscriptionToken};
