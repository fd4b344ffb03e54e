//! End-to-end tests of the channel facade over the in-memory store
//!
//! Run with: cargo test -p integration-tests --test facade_tests

use std::sync::Arc;

use chan_core::{ChannelEvent, ErrorKind, Snowflake};
use chan_db::MemoryChannelStore;
use chan_service::{ChannelFacade, CreateChannelRequest, ServiceContext};
use integration_tests::{assert_kind, chain, unique_name, user, FailingSink, TestEngine, Tree};

// ============================================================================
// Creation
// ============================================================================

#[tokio::test]
async fn test_create_public_channel_then_get() {
    let engine = TestEngine::start();
    let creator = user();
    let parent = engine
        .facade
        .create_public_channel("general", None, creator)
        .await
        .unwrap();

    let name = unique_name("child");
    let created = engine
        .facade
        .create_public_channel(&name, Some(parent.id), creator)
        .await
        .unwrap();

    let channel = engine.facade.get_channel(created.id).await.unwrap();
    assert_eq!(channel.name, name);
    assert_eq!(channel.parent_id, Some(parent.id));
    assert!(channel.is_public());
    assert!(channel.is_visible);
    assert!(!channel.is_forced);
    assert!(channel.is_active());
    assert!(channel.archived_at.is_none());
    assert!(channel.created_at.timestamp() > 0);
    assert!(channel.updated_at.timestamp() > 0);
    assert_eq!(channel.creator_id, creator);
    assert_eq!(channel.updater_id, creator);
}

#[tokio::test]
async fn test_duplicate_name_leaves_original_untouched() {
    let engine = TestEngine::start();
    let creator = user();
    let original = engine
        .facade
        .create_public_channel("general", None, creator)
        .await
        .unwrap();

    assert_kind(
        engine.facade.create_public_channel("general", None, user()).await,
        ErrorKind::AlreadyExists,
    );
    // Case-insensitive among siblings
    assert_kind(
        engine.facade.create_public_channel("GENERAL", None, creator).await,
        ErrorKind::AlreadyExists,
    );

    assert_eq!(engine.facade.get_channel(original.id).await.unwrap(), original);
    assert_eq!(engine.facade.get_children_channel_ids(None).await.unwrap(), vec![original.id]);
}

#[tokio::test]
async fn test_same_name_under_different_parents() {
    let engine = TestEngine::start();
    let creator = user();
    let a = engine.facade.create_public_channel("a", None, creator).await.unwrap();
    let b = engine.facade.create_public_channel("b", None, creator).await.unwrap();

    engine.facade.create_child_channel("shared", a.id, creator).await.unwrap();
    engine.facade.create_child_channel("shared", b.id, creator).await.unwrap();
}

#[tokio::test]
async fn test_five_levels_allowed_sixth_rejected() {
    let engine = TestEngine::start();
    let creator = user();
    let channels = chain(&engine.facade, creator, 5).await.unwrap();

    assert_eq!(engine.facade.get_channel_depth(channels[0].id).await.unwrap(), 5);
    assert_kind(
        engine
            .facade
            .create_child_channel("level6", channels[4].id, creator)
            .await,
        ErrorKind::ChannelDepthLimitation,
    );
}

#[tokio::test]
async fn test_invalid_inputs() {
    let engine = TestEngine::start();
    let creator = user();

    assert_kind(
        engine.facade.create_public_channel("a/b", None, creator).await,
        ErrorKind::ArgumentInvalid,
    );
    assert_kind(
        engine.facade.create_public_channel("", None, creator).await,
        ErrorKind::ArgumentInvalid,
    );
    assert_kind(
        engine
            .facade
            .create_public_channel("twentyonecharacters__", None, creator)
            .await,
        ErrorKind::ArgumentInvalid,
    );
    assert_kind(
        engine.facade.create_public_channel("ok", None, Snowflake::NIL).await,
        ErrorKind::NilId,
    );
    assert_kind(
        engine.facade.create_child_channel("ok", Snowflake::NIL, creator).await,
        ErrorKind::NilId,
    );
    assert_kind(engine.facade.get_channel(Snowflake::NIL).await, ErrorKind::NilId);
    assert_kind(engine.facade.get_channel(Snowflake::new(42)).await, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_nil_parent_means_top_level() {
    let engine = TestEngine::start();
    let channel = engine
        .facade
        .create_public_channel("top", Some(Snowflake::NIL), user())
        .await
        .unwrap();
    assert!(channel.is_root());
}

#[tokio::test]
async fn test_parent_must_be_active_public_channel() {
    let engine = TestEngine::start();
    let creator = user();
    let private = engine
        .facade
        .create_private_channel("secret", creator, &[])
        .await
        .unwrap();
    let archived = engine.facade.create_public_channel("old", None, creator).await.unwrap();
    engine.facade.delete_channel(archived.id).await.unwrap();

    for parent in [private.id, archived.id, Snowflake::new(999_999)] {
        assert_kind(
            engine.facade.create_child_channel("child", parent, creator).await,
            ErrorKind::Forbidden,
        );
    }
}

#[tokio::test]
async fn test_create_private_channel_members() {
    let engine = TestEngine::start();
    let creator = user();
    let guest = user();

    let channel = engine
        .facade
        .create_private_channel("secret", creator, &[guest, guest, creator])
        .await
        .unwrap();
    assert!(!channel.is_public());
    assert!(channel.is_root());

    let mut members = engine.facade.get_private_channel_member_ids(channel.id).await.unwrap();
    members.sort();
    let mut expected = vec![creator, guest];
    expected.sort();
    assert_eq!(members, expected);

    // Private channels are not part of the public tree
    assert!(!engine.facade.get_children_channel_ids(None).await.unwrap().contains(&channel.id));
    // and do not take part in sibling-name checks
    engine.facade.create_public_channel("secret", None, creator).await.unwrap();
    engine.facade.create_private_channel("secret", creator, &[]).await.unwrap();
}

#[tokio::test]
async fn test_create_channel_request_dispatch() {
    let engine = TestEngine::start();
    let creator = user();
    let parent = engine.facade.create_public_channel("parent", None, creator).await.unwrap();
    let guest = user();

    let request: CreateChannelRequest = serde_json::from_value(serde_json::json!({
        "name": "child",
        "parent_id": parent.id.to_string(),
    }))
    .unwrap();
    let child = engine.facade.create_channel(creator, request).await.unwrap();
    assert_eq!(child.parent_id, Some(parent.id));

    let request: CreateChannelRequest = serde_json::from_value(serde_json::json!({
        "name": "hideout",
        "private": true,
        "members": [guest.to_string()],
    }))
    .unwrap();
    let private = engine.facade.create_channel(creator, request).await.unwrap();
    assert!(!private.is_public());
    assert!(engine.facade.is_channel_accessible_to_user(guest, private.id).await.unwrap());

    let request: CreateChannelRequest =
        serde_json::from_value(serde_json::json!({ "name": "" })).unwrap();
    assert_kind(engine.facade.create_channel(creator, request).await, ErrorKind::ArgumentInvalid);
}

#[tokio::test]
async fn test_dm_channel_is_get_or_create() {
    let engine = TestEngine::start();
    let (alice, bob) = (user(), user());

    let dm = engine.facade.create_dm_channel(alice, bob).await.unwrap();
    assert!(dm.is_dm());
    assert!(dm.name.starts_with("dm_"));
    assert_eq!(engine.facade.create_dm_channel(bob, alice).await.unwrap().id, dm.id);

    let mut members = engine.facade.get_private_channel_member_ids(dm.id).await.unwrap();
    members.sort();
    let mut expected = vec![alice, bob];
    expected.sort();
    assert_eq!(members, expected);

    assert_kind(engine.facade.create_dm_channel(alice, alice).await, ErrorKind::ArgumentInvalid);
    assert_kind(engine.facade.create_dm_channel(alice, Snowflake::NIL).await, ErrorKind::NilId);
    assert_kind(engine.facade.change_channel_name(dm.id, "renamed").await, ErrorKind::Forbidden);
    assert_kind(engine.facade.change_channel_parent(dm.id, None).await, ErrorKind::Forbidden);
    assert_kind(engine.facade.add_private_members(dm.id, &[user()]).await, ErrorKind::Forbidden);
}

// ============================================================================
// Hierarchy queries
// ============================================================================

#[tokio::test]
async fn test_depth_ascendants_and_descendants() {
    let engine = TestEngine::start();
    let tree = Tree::create(&engine.facade, user()).await.unwrap();
    let facade = &engine.facade;

    assert_eq!(facade.get_channel_depth(tree.c1.id).await.unwrap(), 4);
    assert_eq!(facade.get_channel_depth(tree.c2.id).await.unwrap(), 3);
    assert_eq!(facade.get_channel_depth(tree.c3.id).await.unwrap(), 2);
    assert_eq!(facade.get_channel_depth(tree.c4.id).await.unwrap(), 1);
    assert_eq!(facade.get_channel_depth(tree.c5.id).await.unwrap(), 1);

    let mut descendants = facade.get_descendant_ids(tree.c1.id).await.unwrap();
    descendants.sort();
    let mut expected = vec![tree.c2.id, tree.c3.id, tree.c4.id, tree.c5.id];
    expected.sort();
    assert_eq!(descendants, expected);

    assert_eq!(
        facade.get_ascendant_ids(tree.c5.id).await.unwrap(),
        vec![tree.c3.id, tree.c2.id, tree.c1.id]
    );
    assert!(facade.get_ascendant_ids(tree.c1.id).await.unwrap().is_empty());

    let mut children = facade.get_children_channel_ids(Some(tree.c2.id)).await.unwrap();
    children.sort();
    let mut expected = vec![tree.c3.id, tree.c4.id];
    expected.sort();
    assert_eq!(children, expected);
}

#[tokio::test]
async fn test_channel_path() {
    let engine = TestEngine::start();
    let creator = user();
    let a = engine.facade.create_public_channel("a", None, creator).await.unwrap();
    let b = engine.facade.create_child_channel("b", a.id, creator).await.unwrap();
    let c = engine.facade.create_child_channel("c", b.id, creator).await.unwrap();

    assert_eq!(engine.facade.get_channel_path(c.id).await.unwrap(), "a/b/c");
    assert_eq!(engine.facade.get_channel_path(a.id).await.unwrap(), "a");
}

#[tokio::test]
async fn test_channel_by_message_id() {
    let engine = TestEngine::start();
    let channel = engine.facade.create_public_channel("general", None, user()).await.unwrap();
    let message_id = Snowflake::new(777);
    engine.store.register_message(message_id, channel.id);

    let found = engine.facade.get_channel_by_message_id(message_id).await.unwrap();
    assert_eq!(found.id, channel.id);

    assert_kind(
        engine.facade.get_channel_by_message_id(Snowflake::new(778)).await,
        ErrorKind::NotFound,
    );
    assert_kind(engine.facade.get_channel_by_message_id(Snowflake::NIL).await, ErrorKind::NilId);

    engine.facade.delete_channel(channel.id).await.unwrap();
    assert_kind(engine.facade.get_channel_by_message_id(message_id).await, ErrorKind::NotFound);
}

// ============================================================================
// Rename and reparent
// ============================================================================

#[tokio::test]
async fn test_rename_checks_siblings() {
    let engine = TestEngine::start();
    let creator = user();
    let a = engine.facade.create_public_channel("alpha", None, creator).await.unwrap();
    engine.facade.create_public_channel("beta", None, creator).await.unwrap();

    assert_kind(engine.facade.change_channel_name(a.id, "Beta").await, ErrorKind::AlreadyExists);
    assert_kind(
        engine.facade.change_channel_name(a.id, "bad name").await,
        ErrorKind::ArgumentInvalid,
    );

    // Renaming to its own name, in another case, is fine
    let renamed = engine.facade.change_channel_name(a.id, "ALPHA").await.unwrap();
    assert_eq!(renamed.name, "ALPHA");
    let renamed = engine.facade.change_channel_name(a.id, "gamma").await.unwrap();
    assert_eq!(engine.facade.get_channel(a.id).await.unwrap().name, renamed.name);
}

#[tokio::test]
async fn test_reparent_rejects_cycles() {
    let engine = TestEngine::start();
    let tree = Tree::create(&engine.facade, user()).await.unwrap();

    assert_kind(
        engine.facade.change_channel_parent(tree.c1.id, Some(tree.c3.id)).await,
        ErrorKind::Forbidden,
    );
    assert_kind(
        engine.facade.change_channel_parent(tree.c2.id, Some(tree.c2.id)).await,
        ErrorKind::Forbidden,
    );
    // Nothing moved
    assert_eq!(engine.facade.get_channel(tree.c1.id).await.unwrap().parent_id, None);
}

#[tokio::test]
async fn test_reparent_depth_limit() {
    let engine = TestEngine::start();
    let creator = user();
    let tree = Tree::create(&engine.facade, creator).await.unwrap();
    let other = chain(&engine.facade, creator, 2).await.unwrap();

    // c2 has height 3; under a node with one ascendant the path becomes 3 + 1 + 1 = 5
    let moved = engine
        .facade
        .change_channel_parent(tree.c2.id, Some(other[1].id))
        .await
        .unwrap();
    assert_eq!(moved.parent_id, Some(other[1].id));
    assert_eq!(engine.facade.get_channel_depth(other[0].id).await.unwrap(), 5);
    assert_eq!(
        engine.facade.get_channel_path(tree.c5.id).await.unwrap(),
        "level1/level2/c2/c3/c5"
    );

    // One level deeper would make 6
    let deep = engine.facade.create_child_channel("deep", tree.c5.id, creator).await;
    assert_kind(deep, ErrorKind::ChannelDepthLimitation);
    assert_kind(
        engine.facade.change_channel_parent(tree.c3.id, Some(tree.c4.id)).await,
        ErrorKind::ChannelDepthLimitation,
    );
}

#[tokio::test]
async fn test_reparent_to_top_level_and_name_clash() {
    let engine = TestEngine::start();
    let creator = user();
    let tree = Tree::create(&engine.facade, creator).await.unwrap();
    engine.facade.create_public_channel("c4", None, creator).await.unwrap();

    assert_kind(
        engine.facade.change_channel_parent(tree.c4.id, None).await,
        ErrorKind::AlreadyExists,
    );

    let moved = engine.facade.change_channel_parent(tree.c3.id, None).await.unwrap();
    assert!(moved.is_root());
    assert_eq!(engine.facade.get_channel_path(tree.c5.id).await.unwrap(), "c3/c5");
    assert_eq!(engine.facade.get_channel_depth(tree.c1.id).await.unwrap(), 3);

    // Moving under the current parent is a no-op
    let same = engine.facade.change_channel_parent(tree.c5.id, Some(tree.c3.id)).await.unwrap();
    assert_eq!(same.parent_id, Some(tree.c3.id));
}

#[tokio::test]
async fn test_reparent_private_channel_forbidden() {
    let engine = TestEngine::start();
    let creator = user();
    let parent = engine.facade.create_public_channel("parent", None, creator).await.unwrap();
    let private = engine.facade.create_private_channel("secret", creator, &[]).await.unwrap();

    assert_kind(
        engine.facade.change_channel_parent(private.id, Some(parent.id)).await,
        ErrorKind::Forbidden,
    );
    assert_kind(
        engine.facade.change_channel_parent(parent.id, Some(private.id)).await,
        ErrorKind::Forbidden,
    );
}

// ============================================================================
// Field updates
// ============================================================================

#[tokio::test]
async fn test_topic_and_attribute_updates() {
    let engine = TestEngine::start();
    let creator = user();
    let editor = user();
    let channel = engine.facade.create_public_channel("general", None, creator).await.unwrap();

    let updated = engine
        .facade
        .update_channel_topic(channel.id, "weekly sync", editor)
        .await
        .unwrap();
    assert_eq!(updated.topic, "weekly sync");
    assert_eq!(updated.updater_id, editor);
    assert!(updated.updated_at >= channel.updated_at);

    let updated = engine
        .facade
        .update_channel_attributes(channel.id, None, Some(true))
        .await
        .unwrap();
    assert!(updated.is_visible);
    assert!(updated.is_forced);

    let updated = engine
        .facade
        .update_channel_attributes(channel.id, Some(false), None)
        .await
        .unwrap();
    assert!(!updated.is_visible);
    assert!(updated.is_forced);
    assert_eq!(updated.topic, "weekly sync");

    assert_kind(
        engine.facade.update_channel_topic(channel.id, "x", Snowflake::NIL).await,
        ErrorKind::NilId,
    );
}

// ============================================================================
// Archival
// ============================================================================

#[tokio::test]
async fn test_delete_archives_whole_subtree() {
    let engine = TestEngine::start();
    let creator = user();
    let tree = Tree::create(&engine.facade, creator).await.unwrap();
    let sibling = engine.facade.create_public_channel("sibling", None, creator).await.unwrap();
    let nephew = engine.facade.create_child_channel("nephew", sibling.id, creator).await.unwrap();

    let archived = engine.facade.delete_channel(tree.c1.id).await.unwrap();
    assert_eq!(archived.len(), 5);
    assert_eq!(archived[0], tree.c1.id);

    for id in tree.ids() {
        assert_kind(engine.facade.get_channel(id).await, ErrorKind::NotFound);
    }
    assert!(engine.facade.get_channel(sibling.id).await.is_ok());
    assert!(engine.facade.get_channel(nephew.id).await.is_ok());

    // Archived is terminal
    assert_kind(engine.facade.delete_channel(tree.c1.id).await, ErrorKind::NotFound);
    assert_kind(engine.facade.delete_channel(tree.c3.id).await, ErrorKind::NotFound);
    assert_kind(engine.facade.change_channel_name(tree.c2.id, "back").await, ErrorKind::NotFound);

    // The name is free again
    engine.facade.create_public_channel("c1", None, creator).await.unwrap();
}

#[tokio::test]
async fn test_delete_middle_of_tree() {
    let engine = TestEngine::start();
    let tree = Tree::create(&engine.facade, user()).await.unwrap();

    let mut archived = engine.facade.delete_channel(tree.c3.id).await.unwrap();
    archived.sort();
    let mut expected = vec![tree.c3.id, tree.c5.id];
    expected.sort();
    assert_eq!(archived, expected);

    assert_eq!(engine.facade.get_channel_depth(tree.c1.id).await.unwrap(), 3);
    assert_eq!(engine.facade.get_descendant_ids(tree.c2.id).await.unwrap(), vec![tree.c4.id]);
}

// ============================================================================
// Membership and subscriptions
// ============================================================================

#[tokio::test]
async fn test_subscribe_is_idempotent() {
    let engine = TestEngine::start();
    let u = user();
    let channel = engine.facade.create_public_channel("news", None, user()).await.unwrap();

    engine.facade.subscribe_channel(u, channel.id).await.unwrap();
    engine.facade.subscribe_channel(u, channel.id).await.unwrap();

    assert_eq!(engine.facade.get_subscribing_user_ids(channel.id).await.unwrap(), vec![u]);
    assert_eq!(engine.facade.get_subscribed_channel_ids(u).await.unwrap(), vec![channel.id]);

    engine.facade.unsubscribe_channel(u, channel.id).await.unwrap();
    engine.facade.unsubscribe_channel(u, channel.id).await.unwrap();
    assert!(engine.facade.get_subscribing_user_ids(channel.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_subscription_edge_cases() {
    let engine = TestEngine::start();
    let u = user();
    let channel = engine.facade.create_public_channel("news", None, user()).await.unwrap();

    assert_kind(
        engine.facade.subscribe_channel(Snowflake::NIL, channel.id).await,
        ErrorKind::NilId,
    );
    assert_kind(engine.facade.subscribe_channel(u, Snowflake::NIL).await, ErrorKind::NilId);
    assert_kind(
        engine.facade.subscribe_channel(u, Snowflake::new(31337)).await,
        ErrorKind::NotFound,
    );
    assert_kind(engine.facade.unsubscribe_channel(u, Snowflake::NIL).await, ErrorKind::NilId);

    assert!(engine.facade.get_subscribing_user_ids(Snowflake::NIL).await.unwrap().is_empty());
    assert!(engine.facade.get_subscribed_channel_ids(Snowflake::NIL).await.unwrap().is_empty());
    assert!(engine.facade.get_subscribed_channel_ids(user()).await.unwrap().is_empty());

    // Archival hides the subscription from reads
    engine.facade.subscribe_channel(u, channel.id).await.unwrap();
    engine.facade.delete_channel(channel.id).await.unwrap();
    assert!(engine.facade.get_subscribed_channel_ids(u).await.unwrap().is_empty());
    assert_kind(engine.facade.subscribe_channel(u, channel.id).await, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_accessibility() {
    let engine = TestEngine::start();
    let (owner, member, stranger) = (user(), user(), user());

    let public = engine.facade.create_public_channel("lobby", None, owner).await.unwrap();
    let private = engine
        .facade
        .create_private_channel("staff", owner, &[member])
        .await
        .unwrap();
    let dm = engine.facade.create_dm_channel(owner, member).await.unwrap();

    let facade = &engine.facade;
    assert!(facade.is_channel_accessible_to_user(stranger, public.id).await.unwrap());
    assert!(facade.is_channel_accessible_to_user(member, private.id).await.unwrap());
    assert!(facade.is_channel_accessible_to_user(owner, private.id).await.unwrap());
    assert!(!facade.is_channel_accessible_to_user(stranger, private.id).await.unwrap());
    assert!(facade.is_channel_accessible_to_user(member, dm.id).await.unwrap());
    assert!(!facade.is_channel_accessible_to_user(stranger, dm.id).await.unwrap());
    assert!(!facade.is_channel_accessible_to_user(owner, Snowflake::new(4242)).await.unwrap());
    assert!(!facade.is_channel_accessible_to_user(owner, Snowflake::NIL).await.unwrap());

    facade.add_private_members(private.id, &[stranger]).await.unwrap();
    assert!(facade.is_channel_accessible_to_user(stranger, private.id).await.unwrap());
    assert_kind(facade.add_private_members(public.id, &[stranger]).await, ErrorKind::Forbidden);

    let visible: Vec<_> = facade
        .get_accessible_channels(stranger)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.id)
        .collect();
    assert!(visible.contains(&public.id));
    assert!(visible.contains(&private.id));
    assert!(!visible.contains(&dm.id));

    for id in [public.id, private.id, dm.id] {
        facade.delete_channel(id).await.unwrap();
        assert!(!facade.is_channel_accessible_to_user(owner, id).await.unwrap());
        assert!(!facade.is_channel_accessible_to_user(member, id).await.unwrap());
    }
    assert!(facade.get_accessible_channels(owner).await.unwrap().is_empty());
}

// ============================================================================
// Events and integrity
// ============================================================================

#[tokio::test]
async fn test_events_follow_commits() {
    let engine = TestEngine::start();
    let creator = user();
    let a = engine.facade.create_public_channel("a", None, creator).await.unwrap();
    let b = engine.facade.create_public_channel("b", None, creator).await.unwrap();
    engine.facade.change_channel_name(b.id, "bee").await.unwrap();
    engine.facade.change_channel_parent(b.id, Some(a.id)).await.unwrap();
    engine.facade.update_channel_topic(a.id, "hello", creator).await.unwrap();
    // Failed operations publish nothing
    engine.facade.create_public_channel("a", None, creator).await.unwrap_err();
    engine.facade.delete_channel(a.id).await.unwrap();

    assert_eq!(
        engine.events.event_types(),
        vec![
            "CHANNEL_CREATED",
            "CHANNEL_CREATED",
            "CHANNEL_RENAMED",
            "CHANNEL_REPARENTED",
            "CHANNEL_UPDATED",
            "CHANNEL_ARCHIVED",
        ]
    );
    let Some(ChannelEvent::ChannelArchived(archived)) = engine.events.events().pop() else {
        panic!("last event should be an archival");
    };
    assert_eq!(archived.archived_ids, vec![a.id, b.id]);
}

#[tokio::test]
async fn test_sink_failure_does_not_fail_mutation() {
    let ctx = ServiceContext::builder()
        .memory_store(MemoryChannelStore::new())
        .event_sink(Arc::new(FailingSink))
        .build()
        .unwrap();
    let facade = ChannelFacade::new(ctx);

    let channel = facade.create_public_channel("loud", None, user()).await.unwrap();
    facade.change_channel_name(channel.id, "quiet").await.unwrap();
    assert_eq!(facade.get_channel(channel.id).await.unwrap().name, "quiet");
    assert_eq!(facade.delete_channel(channel.id).await.unwrap(), vec![channel.id]);
}

#[tokio::test]
async fn test_forest_stays_valid() {
    let engine = TestEngine::start();
    let creator = user();
    let tree = Tree::create(&engine.facade, creator).await.unwrap();
    let other = engine.facade.create_public_channel("other", None, creator).await.unwrap();

    engine.facade.change_channel_parent(tree.c3.id, Some(other.id)).await.unwrap();
    engine.facade.change_channel_name(tree.c4.id, "four").await.unwrap();
    engine.facade.create_private_channel("p", creator, &[user()]).await.unwrap();
    engine.facade.create_dm_channel(creator, user()).await.unwrap();
    engine.facade.delete_channel(tree.c2.id).await.unwrap();
    engine.facade.change_channel_parent(tree.c3.id, None).await.unwrap();

    assert!(engine.facade.verify_forest().await.unwrap().is_empty());
}
