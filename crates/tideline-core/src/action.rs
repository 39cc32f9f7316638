//! Serialized asynchronous actions
//!
//! An [`Action`] wraps an async operation invoked by the UI (scroll back,
//! scroll forward, reload). Actions sharing an [`ActionLock`] run one at a
//! time in invocation order, so each invocation observes the state left by
//! the previous one.

use crate::errors::Result;
use crate::reactive::{EventStream, Property, ReadProperty};
use crate::TidelineError;
use futures::future::LocalBoxFuture;
use futures::FutureExt;
use std::fmt;
use std::rc::Rc;

/// Lock shared by actions that must not interleave.
pub type ActionLock = Rc<async_lock::Mutex<()>>;

type Operation<T> = Rc<dyn Fn() -> LocalBoxFuture<'static, Result<T>>>;

/// A named async operation with observable outcome.
pub struct Action<T> {
    name: &'static str,
    lock: ActionLock,
    operation: Operation<T>,
    in_flight: Property<bool>,
    result: Property<Option<T>>,
    results: EventStream<T>,
    errors: EventStream<TidelineError>,
}

impl<T> Clone for Action<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            lock: self.lock.clone(),
            operation: self.operation.clone(),
            in_flight: self.in_flight.clone(),
            result: self.result.clone(),
            results: self.results.clone(),
            errors: self.errors.clone(),
        }
    }
}

struct InFlightGuard(Property<bool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl<T: Clone + PartialEq + 'static> Action<T> {
    /// Create an action with its own lock.
    pub fn new<F>(name: &'static str, operation: F) -> Self
    where
        F: Fn() -> LocalBoxFuture<'static, Result<T>> + 'static,
    {
        Self::with_lock(name, new_lock(), operation)
    }

    /// Create an action serialized through `lock`.
    pub fn with_lock<F>(name: &'static str, lock: ActionLock, operation: F) -> Self
    where
        F: Fn() -> LocalBoxFuture<'static, Result<T>> + 'static,
    {
        Self {
            name,
            lock,
            operation: Rc::new(operation),
            in_flight: Property::new(false),
            result: Property::new(None),
            results: EventStream::new(),
            errors: EventStream::new(),
        }
    }

    /// Run the operation once the lock is free.
    ///
    /// On success the value is stored in [`result`](Self::result) and emitted
    /// on [`results`](Self::results); failures are emitted on
    /// [`errors`](Self::errors). Either way the outcome is returned.
    pub fn execute(&self) -> LocalBoxFuture<'static, Result<T>> {
        let this = self.clone();
        async move {
            let _lock = this.lock.lock().await;
            this.in_flight.set(true);
            let guard = InFlightGuard(this.in_flight.clone());
            let outcome = (this.operation)().await;
            drop(guard);
            match &outcome {
                Ok(value) => {
                    tracing::debug!(action = this.name, "action completed");
                    this.result.set(Some(value.clone()));
                    this.results.emit(value.clone());
                }
                Err(err) => {
                    tracing::warn!(action = this.name, error = %err, "action failed");
                    this.errors.emit(err.clone());
                }
            }
            outcome
        }
        .boxed_local()
    }

    /// Action name, used in logs.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether an invocation is currently running.
    pub fn in_flight(&self) -> ReadProperty<bool> {
        self.in_flight.read()
    }

    /// Most recent successful result.
    pub fn result(&self) -> ReadProperty<Option<T>> {
        self.result.read()
    }

    /// Every successful result, including repeats of the same value.
    pub fn results(&self) -> &EventStream<T> {
        &self.results
    }

    /// Every failure.
    pub fn errors(&self) -> &EventStream<TidelineError> {
        &self.errors
    }
}

/// Create a fresh action lock.
pub fn new_lock() -> ActionLock {
    Rc::new(async_lock::Mutex::new(()))
}

impl<T> fmt::Debug for Action<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action").field("name", &self.name).finish()
    }
}
