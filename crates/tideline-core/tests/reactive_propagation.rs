//! Propagation behaviour across derivation chains

#![allow(clippy::unwrap_used, clippy::expect_used)]

use futures::channel::oneshot;
use futures::executor::LocalPool;
use futures::FutureExt;
use std::cell::RefCell;
use std::rc::Rc;
use tideline_core::reactive::{
    batch, derive, derive2, switch_future, switch_map, ObservableCollection, Property,
    ReadProperty,
};
use tideline_core::TaskSpawner;

#[derive(Clone, Debug, PartialEq)]
struct Record {
    mentions: u32,
    unread: bool,
}

fn record(mentions: u32, unread: bool) -> Record {
    Record { mentions, unread }
}

#[test]
fn test_joint_derivation_has_no_transient_values() {
    let model = Property::new(record(0, false));
    let mentions = derive(&model, |r| r.mentions);
    let unread = derive(&model, |r| r.unread);
    let highlighted = derive2(&mentions, &unread, |m, u| *m > 0 || *u);

    let observed = Rc::new(RefCell::new(vec![highlighted.get()]));
    let _sub = {
        let observed = observed.clone();
        highlighted.subscribe(move |v| observed.borrow_mut().push(*v))
    };

    model.set(record(1, false));
    model.set(record(1, true));
    model.set(record(0, true));
    model.set(record(0, false));

    assert_eq!(*observed.borrow(), vec![false, true, false]);
}

#[test]
fn test_switch_future_ignores_out_of_order_completion() {
    let mut pool = LocalPool::new();
    let spawner: Rc<dyn TaskSpawner> = Rc::new(pool.spawner());
    let pending: Rc<RefCell<Vec<(u32, oneshot::Sender<u32>)>>> = Rc::default();

    let source = Property::new(0u32);
    let target = {
        let pending = pending.clone();
        switch_future(&source, spawner, 0u32, move |v| {
            if *v == 0 {
                return None;
            }
            let (tx, rx) = oneshot::channel();
            pending.borrow_mut().push((*v, tx));
            Some(async move { rx.await.unwrap_or(0) }.boxed_local())
        })
    };
    let applied = Rc::new(RefCell::new(Vec::new()));
    let _sub = {
        let applied = applied.clone();
        target.subscribe(move |v| applied.borrow_mut().push(*v))
    };

    source.set(1);
    source.set(2);
    pool.run_until_stalled();

    // the second request finishes first, then the first one
    let mut senders = std::mem::take(&mut *pending.borrow_mut());
    let (second_key, second) = senders.pop().unwrap();
    let (first_key, first) = senders.pop().unwrap();
    assert_eq!((first_key, second_key), (1, 2));
    let _ = second.send(20);
    pool.run_until_stalled();
    let _ = first.send(10);
    pool.run_until_stalled();

    assert_eq!(target.get(), 20);
    assert_eq!(*applied.borrow(), vec![20]);
}

#[test]
fn test_switch_map_through_live_cells() {
    // a list of nested cells, selected by index
    let cells: Vec<Property<String>> = vec![Property::new("a".into()), Property::new("b".into())];
    let reads: Vec<ReadProperty<String>> = cells.iter().map(Property::read).collect();
    let selected = Property::new(0usize);
    let shown = switch_map(&selected, String::new(), move |i| reads.get(*i).cloned());
    let upper = derive(&shown, |s| s.to_uppercase());

    assert_eq!(upper.get(), "A");
    cells[0].set("aa".into());
    assert_eq!(upper.get(), "AA");
    selected.set(1);
    assert_eq!(upper.get(), "B");
    cells[0].set("ignored".into());
    assert_eq!(upper.get(), "B");
    selected.set(7);
    assert_eq!(upper.get(), "B");
}

#[test]
fn test_collection_derive_inside_batch() {
    let items = ObservableCollection::natural();
    let len = items.derive(|c| c.len());
    let seen = Rc::new(RefCell::new(Vec::new()));
    let _sub = {
        let seen = seen.clone();
        len.subscribe(move |v| seen.borrow_mut().push(*v))
    };
    batch(|| {
        items.insert_one(3);
        items.insert_one(1);
        items.insert(vec![2, 4]);
    });
    assert_eq!(*seen.borrow(), vec![4]);
}
