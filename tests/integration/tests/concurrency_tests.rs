//! Serialization conflicts and retry behavior
//!
//! Run with: cargo test -p integration-tests --test concurrency_tests

use chan_core::traits::{ChannelReader, ChannelStore, ChannelTransaction};
use chan_core::{Channel, ChannelName, ErrorKind, Snowflake};
use chan_db::MemoryChannelStore;
use chan_service::TransactionConfig;
use integration_tests::{assert_kind, user, InterferingStore, TestEngine};

fn name(raw: &str) -> ChannelName {
    ChannelName::parse(raw).unwrap()
}

fn top_level(id: i64, raw: &str) -> Channel {
    Channel::new_public(Snowflake::new(id), name(raw), None, Snowflake::new(1))
}

#[tokio::test]
async fn test_conflict_is_retried() {
    let store = InterferingStore::new(MemoryChannelStore::new());
    let facade = TestEngine::interfering(&store, TransactionConfig { max_retries: 2 });

    // Lands in the root child set the create just read
    store.interfere_with(top_level(900_001, "rival"));

    let channel = facade.create_public_channel("mine", None, user()).await.unwrap();
    assert_eq!(store.pending(), 0);

    let mut top = facade.get_children_channel_ids(None).await.unwrap();
    top.sort();
    let mut expected = vec![Snowflake::new(900_001), channel.id];
    expected.sort();
    assert_eq!(top, expected);
}

#[tokio::test]
async fn test_conflict_surfaces_without_retries() {
    let store = InterferingStore::new(MemoryChannelStore::new());
    let facade = TestEngine::interfering(&store, TransactionConfig { max_retries: 0 });

    store.interfere_with(top_level(900_002, "rival"));

    let result = facade.create_public_channel("mine", None, user()).await;
    assert_kind(result, ErrorKind::Conflict);
    // The losing transaction left nothing behind
    assert_eq!(
        facade.get_children_channel_ids(None).await.unwrap(),
        vec![Snowflake::new(900_002)]
    );
}

#[tokio::test]
async fn test_retry_rechecks_names() {
    let store = InterferingStore::new(MemoryChannelStore::new());
    let facade = TestEngine::interfering(&store, TransactionConfig::default());

    // The rival takes the very name being created
    store.interfere_with(top_level(900_003, "general"));

    let result = facade.create_public_channel("general", None, user()).await;
    assert_kind(result, ErrorKind::AlreadyExists);
    assert!(facade.verify_forest().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_retry_rechecks_depth() {
    let store = InterferingStore::new(MemoryChannelStore::new());
    let facade = TestEngine::interfering(&store, TransactionConfig::default());
    let creator = user();

    let mut parent = None;
    let mut channels = Vec::new();
    for level in 1..=4 {
        let channel = facade
            .create_public_channel(&format!("level{level}"), parent, creator)
            .await
            .unwrap();
        parent = Some(channel.id);
        channels.push(channel);
    }

    // A leaf appears under level4 while level1 is being moved under a
    // fresh top-level node; the subtree grows past the limit
    let host = facade.create_public_channel("host", None, creator).await.unwrap();
    let leaf = Channel::new_public(
        Snowflake::new(900_004),
        name("leaf"),
        Some(channels[3].id),
        creator,
    );
    store.interfere_with(leaf);

    let result = facade.change_channel_parent(channels[0].id, Some(host.id)).await;
    assert_kind(result, ErrorKind::ChannelDepthLimitation);
    assert_eq!(facade.get_channel(channels[0].id).await.unwrap().parent_id, None);
}

#[tokio::test]
async fn test_disjoint_subtrees_commit_independently() {
    let store = MemoryChannelStore::new();
    let creator = Snowflake::new(1);

    let mut setup = store.begin().await.unwrap();
    let a = top_level(1, "a");
    let b = top_level(2, "b");
    setup.insert_channel(&a).await.unwrap();
    setup.insert_channel(&b).await.unwrap();
    setup.commit().await.unwrap();

    let mut first = store.begin().await.unwrap();
    let mut second = store.begin().await.unwrap();

    assert!(first.find_channel(a.id).await.unwrap().is_some());
    assert!(!first.public_name_taken(&name("child"), Some(a.id), None).await.unwrap());
    first
        .insert_channel(&Channel::new_public(Snowflake::new(3), name("child"), Some(a.id), creator))
        .await
        .unwrap();

    assert!(second.find_channel(b.id).await.unwrap().is_some());
    assert!(!second.public_name_taken(&name("child"), Some(b.id), None).await.unwrap());
    second
        .insert_channel(&Channel::new_public(Snowflake::new(4), name("child"), Some(b.id), creator))
        .await
        .unwrap();

    first.commit().await.unwrap();
    second.commit().await.unwrap();

    let mut reader = store.reader().await.unwrap();
    assert_eq!(reader.find_child_ids(Some(a.id)).await.unwrap(), vec![Snowflake::new(3)]);
    assert_eq!(reader.find_child_ids(Some(b.id)).await.unwrap(), vec![Snowflake::new(4)]);
}

#[tokio::test]
async fn test_overlapping_siblings_conflict() {
    let store = MemoryChannelStore::new();
    let creator = Snowflake::new(1);

    let mut setup = store.begin().await.unwrap();
    let a = top_level(1, "a");
    setup.insert_channel(&a).await.unwrap();
    setup.commit().await.unwrap();

    let mut first = store.begin().await.unwrap();
    let mut second = store.begin().await.unwrap();
    for (tx, id) in [(&mut first, 3), (&mut second, 4)] {
        assert!(!tx.public_name_taken(&name("dup"), Some(a.id), None).await.unwrap());
        let channel = Channel::new_public(Snowflake::new(id), name("dup"), Some(a.id), creator);
        tx.insert_channel(&channel).await.unwrap();
    }

    first.commit().await.unwrap();
    let err = second.commit().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let mut reader = store.reader().await.unwrap();
    assert_eq!(reader.find_child_ids(Some(a.id)).await.unwrap(), vec![Snowflake::new(3)]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_creates_keep_names_unique() {
    let engine = TestEngine::start();
    let creator = user();

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let facade = engine.facade.clone();
            tokio::spawn(async move { facade.create_public_channel("race", None, creator).await })
        })
        .collect();

    let mut created = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => created += 1,
            Err(e) => assert!(
                matches!(e.kind(), ErrorKind::AlreadyExists | ErrorKind::Conflict),
                "unexpected error: {e}"
            ),
        }
    }

    assert_eq!(created, 1);
    assert_eq!(engine.facade.get_children_channel_ids(None).await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_archive_races_with_reparent_of_descendant() {
    for _ in 0..50 {
        let engine = TestEngine::start();
        let creator = user();
        let facade = &engine.facade;

        let c1 = facade.create_public_channel("c1", None, creator).await.unwrap();
        let c2 = facade.create_child_channel("c2", c1.id, creator).await.unwrap();
        let c3 = facade.create_child_channel("c3", c2.id, creator).await.unwrap();
        let other = facade.create_public_channel("other", None, creator).await.unwrap();

        let archiving = {
            let facade = facade.clone();
            tokio::spawn(async move { facade.delete_channel(c1.id).await })
        };
        let moving = {
            let facade = facade.clone();
            tokio::spawn(async move { facade.change_channel_parent(c3.id, Some(other.id)).await })
        };
        let archived = archiving.await.unwrap().unwrap();
        let moved = moving.await.unwrap();

        assert!(facade.verify_forest().await.unwrap().is_empty());
        assert_kind(facade.get_channel(c1.id).await, ErrorKind::NotFound);
        assert_kind(facade.get_channel(c2.id).await, ErrorKind::NotFound);

        match moved {
            // The move committed first; c3 escaped the archival
            Ok(channel) => {
                assert_eq!(archived, vec![c1.id, c2.id]);
                assert_eq!(channel.parent_id, Some(other.id));
                let current = facade.get_channel(c3.id).await.unwrap();
                assert_eq!(current.parent_id, Some(other.id));
                assert_eq!(facade.get_ascendant_ids(c3.id).await.unwrap(), vec![other.id]);
            }
            // The archival committed first; c3 went with it
            Err(e) => {
                assert_eq!(e.kind(), ErrorKind::NotFound, "unexpected error: {e}");
                assert_eq!(archived, vec![c1.id, c2.id, c3.id]);
                assert_kind(facade.get_channel(c3.id).await, ErrorKind::NotFound);
            }
        }
        assert!(facade.get_descendant_ids(other.id).await.unwrap().len() <= 1);
    }
}
