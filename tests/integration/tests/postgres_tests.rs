//! Facade tests against a real PostgreSQL database
//!
//! Skipped unless DATABASE_URL is set. Names and ids come from the snowflake
//! generator so runs can share one database.
//!
//! Run with: cargo test -p integration-tests --test postgres_tests

use chan_core::{ErrorKind, Snowflake};
use chan_service::ChannelFacade;
use integration_tests::{assert_kind, postgres_facade};

fn fresh_user(facade: &ChannelFacade) -> Snowflake {
    facade.context().generate_id()
}

/// A top-level name that earlier runs cannot have left behind
fn fresh_name(facade: &ChannelFacade, prefix: &str) -> String {
    format!("{prefix}{}", facade.context().generate_id().into_inner() % 10_000_000_000)
}

#[tokio::test]
async fn test_pg_create_and_read_tree() {
    let Some(facade) = postgres_facade().await else {
        return;
    };
    let creator = fresh_user(&facade);

    let root_name = fresh_name(&facade, "pgroot");
    let root = facade.create_public_channel(&root_name, None, creator).await.unwrap();
    let mid = facade.create_child_channel("mid", root.id, creator).await.unwrap();
    let leaf = facade.create_child_channel("leaf", mid.id, creator).await.unwrap();

    let fetched = facade.get_channel(leaf.id).await.unwrap();
    assert_eq!(fetched.name, "leaf");
    assert_eq!(fetched.parent_id, Some(mid.id));
    assert_eq!(fetched.creator_id, creator);

    assert_eq!(facade.get_channel_depth(root.id).await.unwrap(), 3);
    assert_eq!(facade.get_ascendant_ids(leaf.id).await.unwrap(), vec![mid.id, root.id]);
    assert_eq!(
        facade.get_channel_path(leaf.id).await.unwrap(),
        format!("{root_name}/mid/leaf")
    );
    assert_kind(
        facade.create_child_channel("MID", root.id, creator).await,
        ErrorKind::AlreadyExists,
    );

    facade.delete_channel(root.id).await.unwrap();
}

#[tokio::test]
async fn test_pg_depth_limit_and_cycles() {
    let Some(facade) = postgres_facade().await else {
        return;
    };
    let creator = fresh_user(&facade);

    let root = facade
        .create_public_channel(&fresh_name(&facade, "pgdeep"), None, creator)
        .await
        .unwrap();
    let mut ids = vec![root.id];
    for level in 2..=5 {
        let parent = *ids.last().unwrap();
        let channel = facade
            .create_child_channel(&format!("level{level}"), parent, creator)
            .await
            .unwrap();
        ids.push(channel.id);
    }

    assert_kind(
        facade.create_child_channel("level6", ids[4], creator).await,
        ErrorKind::ChannelDepthLimitation,
    );
    assert_kind(
        facade.change_channel_parent(ids[0], Some(ids[2])).await,
        ErrorKind::Forbidden,
    );

    facade.delete_channel(root.id).await.unwrap();
}

#[tokio::test]
async fn test_pg_reparent_and_archive() {
    let Some(facade) = postgres_facade().await else {
        return;
    };
    let creator = fresh_user(&facade);

    let a = facade.create_public_channel(&fresh_name(&facade, "pga"), None, creator).await.unwrap();
    let b = facade.create_public_channel(&fresh_name(&facade, "pgb"), None, creator).await.unwrap();
    let child = facade.create_child_channel("child", a.id, creator).await.unwrap();
    let grandchild = facade.create_child_channel("grand", child.id, creator).await.unwrap();

    let moved = facade.change_channel_parent(child.id, Some(b.id)).await.unwrap();
    assert_eq!(moved.parent_id, Some(b.id));
    assert!(facade.get_descendant_ids(a.id).await.unwrap().is_empty());

    let mut archived = facade.delete_channel(b.id).await.unwrap();
    archived.sort();
    let mut expected = vec![b.id, child.id, grandchild.id];
    expected.sort();
    assert_eq!(archived, expected);

    assert_kind(facade.get_channel(grandchild.id).await, ErrorKind::NotFound);
    assert!(facade.get_channel(a.id).await.is_ok());

    facade.delete_channel(a.id).await.unwrap();
}

#[tokio::test]
async fn test_pg_membership() {
    let Some(facade) = postgres_facade().await else {
        return;
    };
    let (owner, member, stranger) = (fresh_user(&facade), fresh_user(&facade), fresh_user(&facade));

    let private = facade
        .create_private_channel(&fresh_name(&facade, "pgpriv"), owner, &[member])
        .await
        .unwrap();
    assert!(facade.is_channel_accessible_to_user(member, private.id).await.unwrap());
    assert!(!facade.is_channel_accessible_to_user(stranger, private.id).await.unwrap());

    facade.subscribe_channel(member, private.id).await.unwrap();
    facade.subscribe_channel(member, private.id).await.unwrap();
    assert_eq!(facade.get_subscribing_user_ids(private.id).await.unwrap(), vec![member]);

    let dm = facade.create_dm_channel(owner, stranger).await.unwrap();
    assert_eq!(facade.create_dm_channel(stranger, owner).await.unwrap().id, dm.id);
    assert!(facade.is_channel_accessible_to_user(stranger, dm.id).await.unwrap());

    facade.delete_channel(private.id).await.unwrap();
    facade.delete_channel(dm.id).await.unwrap();
    assert!(!facade.is_channel_accessible_to_user(member, private.id).await.unwrap());
    assert!(facade.get_subscribed_channel_ids(member).await.unwrap().is_empty());
}
