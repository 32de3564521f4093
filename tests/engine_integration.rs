//! Integration tests for the ordering engine over the in-memory store.
//!
//! These exercise whole scenarios end to end: rank shifting, compaction,
//! all-or-nothing writes, concurrent mutation of one sibling group, and
//! re-numbering through an outline session.

use std::sync::Arc;
use std::time::Duration;

use outliner::core::types::{NodeId, NodeKind, Rank, RelationKind};
use outliner::core::verify::{verify_group, verify_snapshot, RankedEntry};
use outliner::engine::{Command, EngineError, OrderingEngine};
use outliner::outline::Outline;
use outliner::store::memory::FailOn;
use outliner::store::{GraphStore, MemoryStore, StoreError};

async fn setup() -> (MemoryStore, Arc<OrderingEngine>, NodeId) {
    let store = MemoryStore::new();
    let engine = Arc::new(OrderingEngine::new(Arc::new(store.clone())));
    let root = engine.create_node(NodeKind::Root, "Thesis").await.unwrap();
    (store, engine, root)
}

async fn insert_n(engine: &OrderingEngine, parent: &NodeId, kind: NodeKind, n: usize) -> Vec<NodeId> {
    let mut ids = Vec::with_capacity(n);
    for i in 0..n {
        ids.push(engine.insert_child(parent, kind, &format!("n{i}")).await.unwrap());
    }
    ids
}

/// Ids of a group in rank order.
async fn group_order(store: &MemoryStore, parent: &NodeId, kind: NodeKind) -> Vec<NodeId> {
    store
        .read_children(parent, kind)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.id)
        .collect()
}

async fn assert_contiguous(store: &MemoryStore, parent: &NodeId, kind: NodeKind) {
    let entries: Vec<RankedEntry> = store
        .read_children(parent, kind)
        .await
        .unwrap()
        .into_iter()
        .map(|c| (c.id, c.rank))
        .collect();
    verify_group(&entries).unwrap_or_else(|e| panic!("group not contiguous: {e}"));
}

// =============================================================================
// Ranking scenarios
// =============================================================================

#[tokio::test]
async fn move_last_to_first_shifts_the_rest() {
    let (store, engine, root) = setup().await;
    let ids = insert_n(&engine, &root, NodeKind::Branch, 4).await;
    let (a, b, c, d) = (ids[0], ids[1], ids[2], ids[3]);

    engine.reorder(&d, 1).await.unwrap();

    assert_eq!(group_order(&store, &root, NodeKind::Branch).await, vec![d, a, b, c]);
    let ranks: Vec<u32> = store
        .read_children(&root, NodeKind::Branch)
        .await
        .unwrap()
        .iter()
        .filter_map(|c| c.rank.map(Rank::get))
        .collect();
    assert_eq!(ranks, vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn move_first_to_middle() {
    let (store, engine, root) = setup().await;
    let ids = insert_n(&engine, &root, NodeKind::Branch, 5).await;

    engine.reorder(&ids[0], 3).await.unwrap();

    assert_eq!(
        group_order(&store, &root, NodeKind::Branch).await,
        vec![ids[1], ids[2], ids[0], ids[3], ids[4]]
    );
}

#[tokio::test]
async fn delete_second_compacts_preserving_order() {
    let (store, engine, root) = setup().await;
    let ids = insert_n(&engine, &root, NodeKind::Branch, 4).await;

    assert!(engine.delete_node(&ids[1]).await.unwrap());

    assert_eq!(
        group_order(&store, &root, NodeKind::Branch).await,
        vec![ids[0], ids[2], ids[3]]
    );
    assert_contiguous(&store, &root, NodeKind::Branch).await;
    assert!(!engine.delete_node(&ids[1]).await.unwrap());
}

#[tokio::test]
async fn mixed_operations_keep_every_group_contiguous() {
    let (store, engine, root) = setup().await;
    let sections = insert_n(&engine, &root, NodeKind::Branch, 3).await;
    let paras = insert_n(&engine, &sections[0], NodeKind::Leaf, 4).await;
    let subs = insert_n(&engine, &sections[0], NodeKind::Branch, 2).await;

    engine.reorder(&paras[3], 2).await.unwrap();
    engine.delete_node(&paras[0]).await.unwrap();
    engine.reorder(&subs[1], 1).await.unwrap();
    engine.delete_node(&sections[2]).await.unwrap();

    let verdict = verify_snapshot(&store.full_snapshot());
    assert!(verdict.ok, "{:?}", verdict.errors);
    assert_eq!(
        group_order(&store, &sections[0], NodeKind::Leaf).await,
        vec![paras[3], paras[1], paras[2]]
    );
}

// =============================================================================
// Atomicity
// =============================================================================

#[tokio::test]
async fn failed_delete_leaves_store_untouched() {
    let (store, engine, root) = setup().await;
    let ids = insert_n(&engine, &root, NodeKind::Branch, 4).await;
    insert_n(&engine, &ids[1], NodeKind::Leaf, 2).await;
    let before = store.full_snapshot().fingerprint();

    // The subtree removal is staged, then the compaction step fails.
    store.set_fail_on(FailOn::ApplyAtOp {
        index: 1,
        error: StoreError::Unavailable("connection reset".into()),
    });
    let err = engine.delete_node(&ids[1]).await.unwrap_err();
    assert!(matches!(err, EngineError::StoreUnavailable(_)));
    assert!(err.is_retryable());
    assert_eq!(store.full_snapshot().fingerprint(), before);

    store.clear_fail_on();
    assert!(engine.delete_node(&ids[1]).await.unwrap());
    assert_ne!(store.full_snapshot().fingerprint(), before);
    assert_contiguous(&store, &root, NodeKind::Branch).await;
}

#[tokio::test]
async fn failed_reorder_and_move_leave_store_untouched() {
    let (store, engine, root) = setup().await;
    let sections = insert_n(&engine, &root, NodeKind::Branch, 2).await;
    let subs = insert_n(&engine, &sections[0], NodeKind::Branch, 3).await;
    let before = store.full_snapshot().fingerprint();

    // A reorder is a single rank write.
    store.set_fail_on(FailOn::ApplyAtOp {
        index: 0,
        error: StoreError::Unavailable("timeout".into()),
    });
    assert!(engine.reorder(&subs[2], 1).await.is_err());
    assert_eq!(store.full_snapshot().fingerprint(), before);

    // A move stages edge removal and compaction before the new edge.
    store.set_fail_on(FailOn::ApplyAtOp {
        index: 2,
        error: StoreError::Unavailable("timeout".into()),
    });
    assert!(engine
        .attach(&sections[1], &subs[0], RelationKind::Contains)
        .await
        .is_err());
    assert_eq!(store.full_snapshot().fingerprint(), before);
}

// =============================================================================
// Containment moves
// =============================================================================

#[tokio::test]
async fn move_between_parents_compacts_old_and_appends_new() {
    let (store, engine, root) = setup().await;
    let sections = insert_n(&engine, &root, NodeKind::Branch, 2).await;
    let left = insert_n(&engine, &sections[0], NodeKind::Leaf, 3).await;
    let right = insert_n(&engine, &sections[1], NodeKind::Leaf, 2).await;

    let rank = engine
        .attach(&sections[1], &left[0], RelationKind::Contains)
        .await
        .unwrap();
    assert_eq!(rank, Some(Rank::new(3).unwrap()));

    assert_eq!(
        group_order(&store, &sections[0], NodeKind::Leaf).await,
        vec![left[1], left[2]]
    );
    assert_eq!(
        group_order(&store, &sections[1], NodeKind::Leaf).await,
        vec![right[0], right[1], left[0]]
    );
    assert_contiguous(&store, &sections[0], NodeKind::Leaf).await;
    assert_contiguous(&store, &sections[1], NodeKind::Leaf).await;
    assert_eq!(store.read_parent(&left[0]).await.unwrap(), Some(sections[1]));
}

#[tokio::test]
async fn moving_a_section_under_itself_is_refused() {
    let (_store, engine, root) = setup().await;
    let section = insert_n(&engine, &root, NodeKind::Branch, 1).await[0];
    let child = insert_n(&engine, &section, NodeKind::Branch, 1).await[0];

    let err = engine
        .attach(&child, &section, RelationKind::Contains)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::WouldCycle { .. }));
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_mutations_of_one_group_stay_contiguous() {
    let store = MemoryStore::new().with_latency(Duration::from_millis(1));
    let engine = Arc::new(OrderingEngine::new(Arc::new(store.clone())));
    let root = engine.create_node(NodeKind::Root, "Thesis").await.unwrap();
    let ids = insert_n(&engine, &root, NodeKind::Branch, 12).await;

    let mut tasks = Vec::new();
    for (i, id) in ids.iter().copied().enumerate() {
        let engine = engine.clone();
        tasks.push(tokio::spawn(async move {
            match i % 3 {
                0 => engine.delete_node(&id).await.map(|_| ()),
                1 => engine.reorder(&id, 1).await,
                _ => engine
                    .insert_child(&root, NodeKind::Branch, "late")
                    .await
                    .map(|_| ()),
            }
        }));
    }
    for task in tasks {
        match task.await.unwrap() {
            Ok(()) => {}
            // A reorder can race with deletes that shrink the group.
            Err(EngineError::RankOutOfRange { .. }) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert_contiguous(&store, &root, NodeKind::Branch).await;
    assert_eq!(store.read_children(&root, NodeKind::Branch).await.unwrap().len(), 12);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn crossing_moves_do_not_deadlock() {
    let store = MemoryStore::new().with_latency(Duration::from_millis(1));
    let engine = Arc::new(OrderingEngine::new(Arc::new(store.clone())));
    let root = engine.create_node(NodeKind::Root, "Thesis").await.unwrap();
    let sections = insert_n(&engine, &root, NodeKind::Branch, 2).await;
    let left = insert_n(&engine, &sections[0], NodeKind::Leaf, 4).await;
    let right = insert_n(&engine, &sections[1], NodeKind::Leaf, 4).await;

    let mut tasks = Vec::new();
    for (from, to) in left.iter().map(|id| (*id, sections[1])).chain(right.iter().map(|id| (*id, sections[0]))) {
        let engine = engine.clone();
        tasks.push(tokio::spawn(async move {
            engine.attach(&to, &from, RelationKind::Contains).await
        }));
    }
    let all = tokio::time::timeout(Duration::from_secs(10), async {
        for task in tasks {
            task.await.unwrap().unwrap();
        }
    })
    .await;
    assert!(all.is_ok(), "moves did not finish");

    assert_contiguous(&store, &sections[0], NodeKind::Leaf).await;
    assert_contiguous(&store, &sections[1], NodeKind::Leaf).await;
    let total = store.read_children(&sections[0], NodeKind::Leaf).await.unwrap().len()
        + store.read_children(&sections[1], NodeKind::Leaf).await.unwrap().len();
    assert_eq!(total, 8);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn deleting_a_node_and_its_ancestor_together_succeeds() {
    for _ in 0..20 {
        let store = MemoryStore::new().with_latency(Duration::from_millis(2));
        let engine = Arc::new(OrderingEngine::new(Arc::new(store.clone())));
        let root = engine.create_node(NodeKind::Root, "Thesis").await.unwrap();
        let section = engine.insert_child(&root, NodeKind::Branch, "Section").await.unwrap();
        let sub = engine.insert_child(&section, NodeKind::Branch, "Sub").await.unwrap();
        let late = engine.clone();

        let child = tokio::spawn({
            let engine = engine.clone();
            async move { engine.delete_node(&sub).await }
        });
        let parent = tokio::spawn(async move { engine.delete_node(&section).await });
        let insert = tokio::spawn(async move {
            late.insert_child(&section, NodeKind::Leaf, "late").await
        });

        child.await.unwrap().unwrap();
        assert!(parent.await.unwrap().unwrap());
        match insert.await.unwrap() {
            Ok(_) | Err(EngineError::ParentNotFound(_)) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }

        assert!(store.read_node(&section).await.unwrap().is_none());
        assert!(store.read_node(&sub).await.unwrap().is_none());
        assert!(verify_snapshot(&store.full_snapshot()).ok);
    }
}

// =============================================================================
// Re-numbering
// =============================================================================

#[tokio::test]
async fn renumbering_is_idempotent_and_tracks_moves() {
    let (_store, engine, _root) = setup().await;
    let mut outline = Outline::create(engine.clone(), "Draft").await.unwrap();
    let root = outline.root();
    let ids = insert_n(&engine, &root, NodeKind::Branch, 3).await;
    let nested = insert_n(&engine, &ids[2], NodeKind::Branch, 1).await[0];

    // Changes made outside the session are picked up on refresh.
    let diff = outline.refresh().await.unwrap();
    assert_eq!(diff.changed.len(), 4);
    assert_eq!(outline.numbers()[&nested], "3.1.");
    assert!(outline.refresh().await.unwrap().is_empty());

    let update = outline
        .apply(&Command::Reorder { node: ids[2], rank: 1 })
        .await
        .unwrap();
    assert_eq!(update.diff.changed[&ids[2]], "1.");
    assert_eq!(update.diff.changed[&nested], "1.1.");
    assert_eq!(outline.numbers()[&ids[0]], "2.");
    assert!(outline.refresh().await.unwrap().is_empty());
}
