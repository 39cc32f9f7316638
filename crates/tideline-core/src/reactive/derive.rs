//! Derived properties
//!
//! Each function returns a [`ReadProperty`] that owns the reaction keeping it
//! up to date. Sources only hold weak references to that reaction, so
//! dropping the derived property stops the derivation.

use super::property::{Observable, ReadProperty, WeakProperty};
use super::runtime::Reaction;
use super::subscription::Subscription;
use crate::effects::TaskSpawner;
use futures::future::{AbortHandle, Abortable, LocalBoxFuture};
use futures::FutureExt;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

fn link<U: Clone + PartialEq + 'static>(
    target: &ReadProperty<U>,
    sources: &[u32],
    run: impl FnMut() + 'static,
) -> Rc<Reaction> {
    let height = target.height();
    let reaction = Reaction::new(height, run);
    debug_assert!(sources.iter().all(|h| *h < height));
    target.add_link(Subscription::from_reaction(reaction.clone()));
    reaction
}

/// Map one property through `f`.
pub fn derive<A, U>(source: &impl Observable<A>, f: impl Fn(&A) -> U + 'static) -> ReadProperty<U>
where
    A: Clone + PartialEq + 'static,
    U: Clone + PartialEq + 'static,
{
    let source = source.read();
    let target = ReadProperty::with_height(source.with(&f), source.height() + 1);
    let weak = target.downgrade();
    let reaction = link(&target, &[source.height()], {
        let source = source.clone();
        move || {
            weak.set(source.with(&f));
        }
    });
    source.add_observer(&reaction);
    target
}

/// Joint derivation over two properties.
///
/// When both sources change in the same tick, `f` runs once with both new
/// values.
pub fn derive2<A, B, U>(
    a: &impl Observable<A>,
    b: &impl Observable<B>,
    f: impl Fn(&A, &B) -> U + 'static,
) -> ReadProperty<U>
where
    A: Clone + PartialEq + 'static,
    B: Clone + PartialEq + 'static,
    U: Clone + PartialEq + 'static,
{
    let (a, b) = (a.read(), b.read());
    let compute = move |a: &ReadProperty<A>, b: &ReadProperty<B>| a.with(|a| b.with(|b| f(a, b)));
    let height = a.height().max(b.height()) + 1;
    let target = ReadProperty::with_height(compute(&a, &b), height);
    let weak = target.downgrade();
    let reaction = link(&target, &[a.height(), b.height()], {
        let (a, b) = (a.clone(), b.clone());
        move || {
            weak.set(compute(&a, &b));
        }
    });
    a.add_observer(&reaction);
    b.add_observer(&reaction);
    target
}

/// Joint derivation over three properties.
pub fn derive3<A, B, C, U>(
    a: &impl Observable<A>,
    b: &impl Observable<B>,
    c: &impl Observable<C>,
    f: impl Fn(&A, &B, &C) -> U + 'static,
) -> ReadProperty<U>
where
    A: Clone + PartialEq + 'static,
    B: Clone + PartialEq + 'static,
    C: Clone + PartialEq + 'static,
    U: Clone + PartialEq + 'static,
{
    let (a, b, c) = (a.read(), b.read(), c.read());
    let compute = move |a: &ReadProperty<A>, b: &ReadProperty<B>, c: &ReadProperty<C>| {
        a.with(|a| b.with(|b| c.with(|c| f(a, b, c))))
    };
    let height = a.height().max(b.height()).max(c.height()) + 1;
    let target = ReadProperty::with_height(compute(&a, &b, &c), height);
    let weak = target.downgrade();
    let reaction = link(&target, &[a.height(), b.height(), c.height()], {
        let (a, b, c) = (a.clone(), b.clone(), c.clone());
        move || {
            weak.set(compute(&a, &b, &c));
        }
    });
    a.add_observer(&reaction);
    b.add_observer(&reaction);
    c.add_observer(&reaction);
    target
}

/// Map through `f`, keeping the previous value while `f` returns `None`.
///
/// `initial` is used only when `f` yields nothing for the starting value.
pub fn filter_map<A, U>(
    source: &impl Observable<A>,
    initial: U,
    f: impl Fn(&A) -> Option<U> + 'static,
) -> ReadProperty<U>
where
    A: Clone + PartialEq + 'static,
    U: Clone + PartialEq + 'static,
{
    let source = source.read();
    let start = source.with(&f).unwrap_or(initial);
    let target = ReadProperty::with_height(start, source.height() + 1);
    let weak = target.downgrade();
    let reaction = link(&target, &[source.height()], {
        let source = source.clone();
        move || {
            if let Some(value) = source.with(&f) {
                weak.set(value);
            }
        }
    });
    source.add_observer(&reaction);
    target
}

/// Follow the property selected by `f` (switch-latest).
///
/// Whenever the source changes, the previously selected inner property is
/// released before the new one is observed. While `f` returns `None` the
/// target keeps its last value.
pub fn switch_map<A, U>(
    source: &impl Observable<A>,
    initial: U,
    f: impl Fn(&A) -> Option<ReadProperty<U>> + 'static,
) -> ReadProperty<U>
where
    A: Clone + PartialEq + 'static,
    U: Clone + PartialEq + 'static,
{
    let source = source.read();
    let target = ReadProperty::with_height(initial, source.height() + 1);
    let weak = target.downgrade();
    let current: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));

    let mut outer = {
        let source = source.clone();
        let weak = weak.clone();
        let current = current.clone();
        move || {
            // release the old inner property first
            let previous = current.borrow_mut().take();
            drop(previous);
            let Some(inner) = source.with(&f) else {
                return;
            };
            if let Some(target) = weak.upgrade() {
                target.raise_height(inner.height() + 1);
            }
            weak.set(inner.get());
            let follow = Reaction::new(inner.height() + 1, {
                let inner = inner.clone();
                let weak = weak.clone();
                move || {
                    weak.set(inner.get());
                }
            });
            inner.add_observer(&follow);
            *current.borrow_mut() = Some(Subscription::from_reaction(follow));
        }
    };
    outer();
    let reaction = link(&target, &[source.height()], outer);
    target.add_link(Subscription::from_fn(move || {
        current.borrow_mut().take();
    }));
    source.add_observer(&reaction);
    target
}

struct InFlight {
    generation: Rc<Cell<u64>>,
    abort: Option<AbortHandle>,
}

impl InFlight {
    fn supersede(&mut self) -> u64 {
        if let Some(handle) = self.abort.take() {
            handle.abort();
        }
        let next = self.generation.get().wrapping_add(1);
        self.generation.set(next);
        next
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.supersede();
    }
}

/// Asynchronously remap each source value (switch-latest).
///
/// Starting a new computation aborts the previous one, and a generation
/// check guarantees a superseded result is never applied. While `f` returns
/// `None` the target keeps its last value.
pub fn switch_future<A, U>(
    source: &impl Observable<A>,
    spawner: Rc<dyn TaskSpawner>,
    initial: U,
    f: impl Fn(&A) -> Option<LocalBoxFuture<'static, U>> + 'static,
) -> ReadProperty<U>
where
    A: Clone + PartialEq + 'static,
    U: Clone + PartialEq + 'static,
{
    let source = source.read();
    let target = ReadProperty::with_height(initial, source.height() + 1);
    let weak: WeakProperty<U> = target.downgrade();
    let mut in_flight = InFlight {
        generation: Rc::new(Cell::new(0)),
        abort: None,
    };

    let mut run = {
        let source = source.clone();
        move || {
            let generation = in_flight.supersede();
            let Some(fut) = source.with(&f) else {
                return;
            };
            let (handle, registration) = AbortHandle::new_pair();
            in_flight.abort = Some(handle);
            let current = in_flight.generation.clone();
            let weak = weak.clone();
            spawner.spawn(
                async move {
                    match Abortable::new(fut, registration).await {
                        Ok(value) if current.get() == generation => {
                            weak.set(value);
                        }
                        Ok(_) => tracing::trace!(generation, "discarding superseded result"),
                        Err(_) => tracing::trace!(generation, "async derivation aborted"),
                    }
                }
                .boxed_local(),
            );
        }
    };
    run();
    let reaction = link(&target, &[source.height()], run);
    source.add_observer(&reaction);
    target
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::{batch, Property};
    use futures::channel::oneshot;
    use futures::executor::LocalPool;

    #[test]
    fn test_derive_follows_source() {
        let p = Property::new(2);
        let doubled = derive(&p, |v| v * 2);
        assert_eq!(doubled.get(), 4);
        p.set(5);
        assert_eq!(doubled.get(), 10);
    }

    #[test]
    fn test_derivation_stops_when_dropped() {
        let p = Property::new(1);
        let calls = Rc::new(Cell::new(0));
        let d = {
            let calls = calls.clone();
            derive(&p, move |v| {
                calls.set(calls.get() + 1);
                *v
            })
        };
        p.set(2);
        drop(d);
        p.set(3);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_diamond_recomputes_once() {
        let p = Property::new(1);
        let left = derive(&p, |v| v + 1);
        let right = derive(&p, |v| v * 10);
        let calls = Rc::new(Cell::new(0));
        let sum = {
            let calls = calls.clone();
            derive2(&left, &right, move |l, r| {
                calls.set(calls.get() + 1);
                l + r
            })
        };
        let seen = Rc::new(RefCell::new(Vec::new()));
        let _sub = {
            let seen = seen.clone();
            sum.subscribe(move |v| seen.borrow_mut().push(*v))
        };

        p.set(2);
        assert_eq!(sum.get(), 23);
        // initial computation plus exactly one recomputation
        assert_eq!(calls.get(), 2);
        assert_eq!(*seen.borrow(), vec![23]);
    }

    #[test]
    fn test_batch_coalesces_source_writes() {
        let a = Property::new(0);
        let b = Property::new(0);
        let c = Property::new(0);
        let calls = Rc::new(Cell::new(0));
        let total = {
            let calls = calls.clone();
            derive3(&a, &b, &c, move |a, b, c| {
                calls.set(calls.get() + 1);
                a + b + c
            })
        };
        batch(|| {
            a.set(1);
            b.set(2);
            c.set(3);
        });
        assert_eq!(total.get(), 6);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_filter_map_retains_prior_value() {
        let p = Property::new(Some(1));
        let last = filter_map(&p, 0, |v| *v);
        assert_eq!(last.get(), 1);
        p.set(None);
        assert_eq!(last.get(), 1);
        p.set(Some(7));
        assert_eq!(last.get(), 7);

        let empty = Property::new(None::<i32>);
        assert_eq!(filter_map(&empty, -1, |v| *v).get(), -1);
    }

    #[test]
    fn test_switch_map_follows_latest_inner() {
        let first = Property::new("one".to_string());
        let second = Property::new("two".to_string());
        let selector = Property::new(Some(0usize));

        let followed = {
            let (first, second) = (first.read(), second.read());
            switch_map(&selector, String::new(), move |sel| match sel {
                Some(0) => Some(first.clone()),
                Some(_) => Some(second.clone()),
                None => None,
            })
        };
        assert_eq!(followed.get(), "one");

        first.set("uno".to_string());
        assert_eq!(followed.get(), "uno");

        selector.set(Some(1));
        assert_eq!(followed.get(), "two");

        // the old inner property no longer drives the target
        first.set("eins".to_string());
        assert_eq!(followed.get(), "two");

        selector.set(None);
        second.set("zwei".to_string());
        assert_eq!(followed.get(), "two");
    }

    #[test]
    fn test_switch_future_applies_only_latest() {
        let mut pool = LocalPool::new();
        let spawner: Rc<dyn TaskSpawner> = Rc::new(pool.spawner());
        let senders: Rc<RefCell<Vec<oneshot::Sender<String>>>> = Rc::default();

        let source = Property::new(1u32);
        let target = {
            let senders = senders.clone();
            switch_future(&source, spawner, String::from("init"), move |_| {
                let (tx, rx) = oneshot::channel();
                senders.borrow_mut().push(tx);
                Some(async move { rx.await.unwrap_or_default() }.boxed_local())
            })
        };
        source.set(2);
        source.set(3);
        pool.run_until_stalled();

        let mut pending: Vec<_> = senders.borrow_mut().drain(..).collect();
        assert_eq!(pending.len(), 3);
        let latest = pending.pop().unwrap();
        let stale = pending.pop().unwrap();
        let _ = stale.send("stale".to_string());
        let _ = latest.send("latest".to_string());
        pool.run_until_stalled();

        assert_eq!(target.get(), "latest");
    }
}
