//! # Reactive Primitives for View-Models
//!
//! Push-based, single-threaded reactivity for keeping view state in step
//! with remote data.
//!
//! ## Core Types
//!
//! - [`Property<T>`] / [`ReadProperty<T>`]: observable values. Writes that do
//!   not change the value are dropped.
//! - [`derive`], [`derive2`], [`derive3`], [`filter_map`]: synchronous
//!   derivations.
//! - [`switch_map`], [`switch_future`]: switch-latest derivations through
//!   nested properties and asynchronous work.
//! - [`EventStream<T>`]: discrete events.
//! - [`ObservableCollection<K>`]: a sorted collection emitting a [`Delta`]
//!   per change.
//! - [`Model`]: teardown bag owned by each view-model.
//!
//! ## Propagation
//!
//! Writes are propagated synchronously through a per-thread scheduler that
//! runs reactions in height order, so derived values never observe a mix of
//! old and new inputs. [`batch`] groups several writes into one tick, and
//! subscriber callbacks run only after every derivation has settled.
//!
//! ```rust,ignore
//! use tideline_core::reactive::{derive2, Property};
//!
//! let mentions = Property::new(0);
//! let unread = Property::new(false);
//! let highlighted = derive2(&mentions, &unread, |m, u| *m > 0 || *u);
//! mentions.set(2);
//! assert!(highlighted.get());
//! ```

mod collection;
mod delta;
mod derive;
mod event;
mod model;
mod property;
mod runtime;
mod subscription;

pub use collection::ObservableCollection;
pub use delta::{apply_delta, Delta, DeltaError};
pub use derive::{derive, derive2, derive3, filter_map, switch_future, switch_map};
pub use event::EventStream;
pub use model::Model;
pub use property::{Observable, Property, ReadProperty, WeakProperty};
pub use runtime::{batch, is_propagating};
pub use subscription::Subscription;
