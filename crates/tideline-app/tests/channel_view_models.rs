//! Channel rows: highlight state, direct message peers and selection

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::cell::RefCell;
use std::rc::Rc;
use tideline_app::{ChannelListViewModel, ChannelViewModel, ViewModel};
use tideline_core::{ChannelId, ClientConfig, Timestamp, UserId};
use tideline_store::StoreEvent;
use tideline_testkit::fixtures::{channel, channel_with_unreads, dm, partial_user, user};
use tideline_testkit::TestHarness;

fn row(list: &ChannelListViewModel, index: usize) -> Rc<ChannelViewModel> {
    list.list().get_view_model(index).expect("row view-model")
}

#[test]
fn test_highlight_follows_mentions_and_unreads() {
    let mut h = TestHarness::new(10_000);
    h.api.add_channel(channel_with_unreads("C1", "general", 0, false));
    let list = ChannelListViewModel::new(&h.store, &h.source(), [ChannelId::new("C1")]);
    h.settle();

    let vm = row(&list, 0);
    assert!(!vm.highlighted().get());
    let seen = Rc::new(RefCell::new(Vec::new()));
    let _sub = {
        let seen = seen.clone();
        vm.highlighted()
            .subscribe(move |v: &bool| seen.borrow_mut().push(*v))
    };

    let id = ChannelId::new("C1");
    for (mentions, unreads) in [(1, false), (1, true), (0, true)] {
        h.store.channels().apply(
            &h.source(),
            &id,
            channel_with_unreads("C1", "general", mentions, unreads),
        );
    }
    assert_eq!(*seen.borrow(), vec![true]);

    // both inputs flip in one write: no transient `false`
    h.store
        .channels()
        .apply(&h.source(), &id, channel_with_unreads("C1", "general", 1, false));
    assert_eq!(*seen.borrow(), vec![true]);
    assert_eq!(vm.mentions().get(), 1);

    h.store.ingest(StoreEvent::ChannelMarked {
        source: h.source(),
        channel: id,
        ts: Timestamp::from_secs(9_000),
    });
    assert_eq!(*seen.borrow(), vec![true, false]);
}

#[test]
fn test_direct_message_uses_peer_profile() {
    let mut h = TestHarness::new(10_000);
    h.api.add_channel(dm("D1", "U1"));
    h.api.add_user(user("U1", "ann", Some("Ann Lee"), "ann.png"));
    let list = ChannelListViewModel::new(&h.store, &h.source(), [ChannelId::new("D1")]);

    let vm = row(&list, 0);
    assert_eq!(vm.display_name().get(), "D1");
    assert_eq!(vm.profile_image().get(), "default-avatar.png");

    h.settle();
    assert_eq!(vm.display_name().get(), "Ann Lee");
    assert_eq!(vm.profile_image().get(), "ann.png");
    assert_eq!(h.api.user_calls(), vec![UserId::new("U1")]);
}

#[test]
fn test_partial_peer_is_refetched() {
    let mut h = TestHarness::new(10_000);
    let peer = UserId::new("U1");
    h.api.add_channel(dm("D1", "U1"));
    h.api.script_user(&peer, Some(partial_user("U1", "ann")));
    h.api.add_user(user("U1", "ann", Some("Ann Lee"), "ann.png"));
    let list = ChannelListViewModel::new(&h.store, &h.source(), [ChannelId::new("D1")]);
    h.settle();

    let vm = row(&list, 0);
    assert_eq!(vm.profile_image().get(), "ann.png");
    assert_eq!(vm.display_name().get(), "Ann Lee");
    assert_eq!(h.api.user_calls(), vec![peer.clone(), peer]);
}

#[test]
fn test_unknown_peer_keeps_channel_name() {
    let mut h = TestHarness::new(10_000);
    h.api.add_channel(dm("D1", "U9"));
    let list = ChannelListViewModel::new(&h.store, &h.source(), [ChannelId::new("D1")]);
    h.settle();

    let vm = row(&list, 0);
    assert_eq!(vm.display_name().get(), "U9");
    assert_eq!(vm.profile_image().get(), "default-avatar.png");
}

#[test]
fn test_long_names_are_truncated() {
    let mut config = ClientConfig::default();
    config.display.max_display_name_len = 5;
    let mut h = TestHarness::with_config(config, 10_000);
    h.api.add_channel(channel("C1", "announcements"));
    let list = ChannelListViewModel::new(&h.store, &h.source(), [ChannelId::new("C1")]);
    h.settle();

    assert_eq!(row(&list, 0).display_name().get(), "annou...");
}

#[test]
fn test_select_channel_updates_list() {
    let mut h = TestHarness::new(10_000);
    h.api.add_channel(channel("C1", "general"));
    h.api.add_channel(channel("C2", "random"));
    let list = ChannelListViewModel::new(
        &h.store,
        &h.source(),
        [ChannelId::new("C2"), ChannelId::new("C1")],
    );

    // unresolved rows cannot be selected
    row(&list, 1).select_channel();
    assert_eq!(list.selected().get(), None);

    h.settle();
    let vm = row(&list, 1);
    assert_eq!(vm.id(), &ChannelId::new("C2"));
    vm.select_channel();
    assert_eq!(
        list.selected().get().map(|c| c.name),
        Some("random".to_string())
    );
}

#[test]
fn test_created_channels_join_the_list() {
    let mut h = TestHarness::new(10_000);
    h.api.add_channel(channel("C1", "general"));
    let list = ChannelListViewModel::new(&h.store, &h.source(), [ChannelId::new("C1")]);
    h.settle();

    h.store
        .ingest_json(
            &h.source(),
            r#"{"type":"channel_created","channel":{"id":"C0","name":"dev"}}"#,
        )
        .unwrap();
    assert_eq!(list.list().row_count(), 2);
    let joined = row(&list, 0);
    assert_eq!(joined.display_name().get(), "dev");

    // events of other accounts are not ours
    h.store.ingest(StoreEvent::Channel {
        source: "T2".into(),
        channel: channel("C5", "other"),
    });
    assert_eq!(list.list().row_count(), 2);
}

#[test]
fn test_torn_down_list_releases_rows() {
    let mut h = TestHarness::new(10_000);
    h.api.add_channel(channel("C1", "general"));
    let list = ChannelListViewModel::new(&h.store, &h.source(), [ChannelId::new("C1")]);
    h.settle();
    let vm = row(&list, 0);

    list.lifecycle().teardown();
    assert!(vm.lifecycle().is_torn_down());
    h.store.ingest(StoreEvent::Channel {
        source: h.source(),
        channel: channel("C0", "dev"),
    });
    assert_eq!(list.list().row_count(), 1);
    assert_eq!(list.list().pool_len(), 0);
}
