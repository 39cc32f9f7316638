//! Pagination state machine: loader termination, scrolling and failures

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use tideline_app::{MessagesView, MessagesViewModel};
use tideline_core::{ChannelId, ClientConfig};
use tideline_testkit::fixtures::message;
use tideline_testkit::TestHarness;

fn general() -> ChannelId {
    ChannelId::new("C1")
}

fn harness_with_scan(max_page_scan: u32) -> TestHarness {
    let mut config = ClientConfig::default();
    config.paging.page_span_secs = 1000;
    config.paging.max_page_scan = max_page_scan;
    TestHarness::with_config(config, 10_000)
}

#[test]
fn test_loader_terminates_on_empty_channel() {
    let mut h = harness_with_scan(3);
    let view = MessagesView::new(&h.store, &h.source(), &general());
    h.settle();
    assert_eq!(view.view_model().message_page().get(), 8);

    for _ in 0..4 {
        assert_eq!(h.run(view.load_more_rows()).unwrap(), 0);
    }
    assert_eq!(view.view_model().message_page().get(), 0);

    let pages = h.requested_pages();
    assert!(pages.iter().all(|p| *p >= 0), "negative page requested: {pages:?}");
    let distinct: HashSet<_> = pages.iter().collect();
    assert_eq!(distinct.len(), pages.len(), "page fetched twice: {pages:?}");
    assert_eq!(pages.iter().min(), Some(&0));
}

#[test]
fn test_loader_pulls_older_pages() {
    let mut h = harness_with_scan(30);
    h.api.add_message(message("C1", 2100, "U1", "old"));
    h.api.add_message(message("C1", 2200, "U1", "older page"));
    h.api.add_message(message("C1", 5100, "U1", "recent"));
    let view = MessagesView::new(&h.store, &h.source(), &general());
    h.settle();
    assert_eq!(view.row_count(), 1);

    let rows = h.run(view.load_more_rows()).unwrap();
    assert_eq!(rows, 3);
    assert_eq!(view.view_model().message_page().get(), 0);
    assert!((0..3).all(|i| view.is_row_loaded(i)));
}

#[test]
fn test_loader_stops_at_batch_size() {
    let mut config = ClientConfig::default();
    config.paging.page_span_secs = 1000;
    config.paging.load_more_batch = 1;
    let mut h = TestHarness::with_config(config, 10_000);
    for page in [2u64, 4, 6] {
        h.api.add_message(message("C1", page * 1000 + 10, "U1", "hi"));
    }
    let view = MessagesView::new(&h.store, &h.source(), &general());
    h.settle();
    assert_eq!(view.view_model().message_page().get(), 6);

    assert_eq!(h.run(view.load_more_rows()).unwrap(), 2);
    assert_eq!(view.view_model().message_page().get(), 4);
    assert_eq!(h.run(view.load_more_rows()).unwrap(), 3);
    assert_eq!(view.view_model().message_page().get(), 2);
}

#[test]
fn test_scroll_next_returns_to_current_page() {
    let mut h = harness_with_scan(30);
    h.api.add_message(message("C1", 3100, "U1", "three"));
    h.api.add_message(message("C1", 7100, "U1", "seven"));
    let vm = MessagesViewModel::new(&h.store, &h.source(), &general());

    assert_eq!(h.run(vm.get_messages_for_current_page()).unwrap(), 7);
    h.run(vm.settled());
    assert_eq!(h.run(vm.scroll_previous_page()).unwrap(), 3);
    h.run(vm.settled());
    assert_eq!(vm.messages().len(), 2);

    assert_eq!(h.run(vm.scroll_next_page()).unwrap(), 10);
    assert_eq!(vm.message_page().get(), 10);
}

#[test]
fn test_failed_scroll_keeps_page() {
    let mut h = harness_with_scan(30);
    h.api.add_message(message("C1", 5100, "U1", "five"));
    let vm = MessagesViewModel::new(&h.store, &h.source(), &general());
    h.run(vm.get_messages_for_current_page()).unwrap();
    h.run(vm.settled());

    let errors = Rc::new(RefCell::new(Vec::new()));
    let _sub = {
        let errors = errors.clone();
        vm.scroll_previous_action()
            .errors()
            .listen(move |err| errors.borrow_mut().push(err.clone()))
    };
    h.api.fail_next_history(1);
    assert!(h.run(vm.scroll_previous_page()).is_err());
    assert_eq!(vm.message_page().get(), 5);
    assert_eq!(errors.borrow().len(), 1);

    // retry is up to the caller
    assert_eq!(h.run(vm.scroll_previous_page()).unwrap(), 0);
    assert_eq!(vm.message_page().get(), 0);
}
