//! Per-thread propagation scheduler
//!
//! Every derivation and subscriber is a [`Reaction`]. Writing a property
//! schedules the reactions observing it; the scheduler then runs pending
//! reactions lowest height first, so a node only recomputes once everything
//! it depends on has settled. Sources sit at height 0, each derivation one
//! above its highest dependency, and render-tier subscribers at
//! [`RENDER_HEIGHT`].

use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::rc::Rc;

/// Height of subscriber callbacks; they run after every derivation.
pub(crate) const RENDER_HEIGHT: u32 = u32::MAX;

thread_local! {
    static SCHEDULER: Scheduler = Scheduler::default();
}

#[derive(Default)]
struct Scheduler {
    queue: RefCell<BinaryHeap<Pending>>,
    seq: Cell<u64>,
    batch_depth: Cell<usize>,
    flushing: Cell<bool>,
}

struct Pending {
    height: u32,
    seq: u64,
    reaction: Rc<Reaction>,
}

impl PartialEq for Pending {
    fn eq(&self, other: &Self) -> bool {
        self.height == other.height && self.seq == other.seq
    }
}

impl Eq for Pending {}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pending {
    // BinaryHeap is a max-heap; invert so the lowest (height, seq) pops first.
    fn cmp(&self, other: &Self) -> Ordering {
        (other.height, other.seq).cmp(&(self.height, self.seq))
    }
}

/// A scheduled unit of propagation work.
pub(crate) struct Reaction {
    height: Cell<u32>,
    scheduled: Cell<bool>,
    disposed: Cell<bool>,
    run: RefCell<Option<Box<dyn FnMut()>>>,
}

impl Reaction {
    pub(crate) fn new(height: u32, run: impl FnMut() + 'static) -> Rc<Self> {
        Rc::new(Self {
            height: Cell::new(height),
            scheduled: Cell::new(false),
            disposed: Cell::new(false),
            run: RefCell::new(Some(Box::new(run))),
        })
    }

    pub(crate) fn height(&self) -> u32 {
        self.height.get()
    }

    /// Raise the height after a dynamic dependency was added.
    pub(crate) fn raise_height(&self, height: u32) {
        if height > self.height.get() {
            self.height.set(height);
        }
    }

    pub(crate) fn is_disposed(&self) -> bool {
        self.disposed.get()
    }

    /// Stop the reaction; queued runs are skipped and the closure is freed.
    pub(crate) fn dispose(&self) {
        self.disposed.set(true);
        // a running reaction frees its closure when it returns
        if let Ok(mut run) = self.run.try_borrow_mut() {
            run.take();
        }
    }

    /// Queue this reaction for the current tick.
    pub(crate) fn schedule(self: &Rc<Self>) {
        if self.disposed.get() || self.scheduled.get() {
            return;
        }
        self.scheduled.set(true);
        SCHEDULER.with(|s| {
            let seq = s.seq.get();
            s.seq.set(seq.wrapping_add(1));
            s.queue.borrow_mut().push(Pending {
                height: self.height.get(),
                seq,
                reaction: self.clone(),
            });
        });
    }

    fn fire(&self) {
        self.scheduled.set(false);
        if self.disposed.get() {
            return;
        }
        let Ok(mut run) = self.run.try_borrow_mut() else {
            tracing::trace!("skipping re-entrant reaction");
            return;
        };
        if let Some(f) = run.as_mut() {
            f();
        }
        if self.disposed.get() {
            run.take();
        }
    }
}

struct FlushGuard;

impl Drop for FlushGuard {
    fn drop(&mut self) {
        SCHEDULER.with(|s| s.flushing.set(false));
    }
}

struct BatchGuard;

impl Drop for BatchGuard {
    fn drop(&mut self) {
        SCHEDULER.with(|s| s.batch_depth.set(s.batch_depth.get().saturating_sub(1)));
    }
}

/// Run pending reactions unless a batch or flush is already in progress.
pub(crate) fn flush() {
    let idle = SCHEDULER.with(|s| {
        if s.batch_depth.get() > 0 || s.flushing.get() {
            false
        } else {
            s.flushing.set(true);
            true
        }
    });
    if !idle {
        return;
    }
    let _guard = FlushGuard;
    let mut ran = 0usize;
    while let Some(next) = SCHEDULER.with(|s| s.queue.borrow_mut().pop()) {
        next.reaction.fire();
        ran += 1;
    }
    if ran > 0 {
        tracing::trace!(reactions = ran, "propagation tick settled");
    }
}

/// Defer propagation until `f` returns.
///
/// Several source writes made inside one batch produce a single downstream
/// recomputation per affected derivation.
pub fn batch<R>(f: impl FnOnce() -> R) -> R {
    SCHEDULER.with(|s| s.batch_depth.set(s.batch_depth.get() + 1));
    let result = {
        let _guard = BatchGuard;
        f()
    };
    flush();
    result
}

/// Whether the current thread is inside a propagation tick or batch.
pub fn is_propagating() -> bool {
    SCHEDULER.with(|s| s.flushing.get() || s.batch_depth.get() > 0)
}
