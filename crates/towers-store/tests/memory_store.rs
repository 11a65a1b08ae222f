//! Integration tests for `MemoryStore` against real game states.

use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use towers_engine::{EngineConfig, GameState, GameStatus};
use towers_protocol::{GameId, PlayerId};
use towers_store::{GameStore, MemoryStore, StoreError};

fn dealt(id: &str) -> GameState {
    let players = [PlayerId::from("alice"), PlayerId::from("bob"), PlayerId::from("cara")];
    GameState::start(
        GameId::from(id),
        &players,
        EngineConfig::default(),
        &mut StdRng::seed_from_u64(7),
    )
    .unwrap()
}

#[tokio::test]
async fn test_loaded_state_matches_created_state() {
    let store = MemoryStore::new();
    let id = GameId::from("g1");

    let created = store.create(&id, dealt("g1")).await.unwrap();
    let loaded = store.load(&id).await.unwrap();

    assert_eq!(loaded, created);
    assert_eq!(loaded.state.status, GameStatus::Setup);
    assert_eq!(loaded.state.card_count(), 52);
}

#[tokio::test]
async fn test_commit_bumps_version_each_time() {
    let store = MemoryStore::new();
    let id = GameId::from("g1");
    let mut current = store.create(&id, dealt("g1")).await.unwrap();

    for expected in 2..=5 {
        current = store
            .commit(&id, current.state.clone(), current.version)
            .await
            .unwrap();
        assert_eq!(current.version, expected);
        assert_eq!(current.state.version, expected);
    }
    assert_eq!(store.load(&id).await.unwrap().version, 5);
}

#[tokio::test]
async fn test_commit_to_unknown_game_is_not_found() {
    let store = MemoryStore::new();
    let err = store
        .commit(&GameId::from("ghost"), dealt("ghost"), 1)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_commits_from_same_read_have_one_winner() {
    let store = Arc::new(MemoryStore::new());
    let id = GameId::from("race");
    let base = store.create(&id, dealt("race")).await.unwrap();
    let expected = base.version;

    let mut handles = Vec::new();
    for i in 0..16u64 {
        let store = Arc::clone(&store);
        let id = id.clone();
        let mut state = base.state.clone();
        state.updated_at_ms = i;
        handles.push(tokio::spawn(async move {
            store.commit(&id, state, expected).await
        }));
    }

    let mut winners = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(v) => {
                assert_eq!(v.version, 2);
                winners += 1;
            }
            Err(StoreError::VersionConflict { expected, actual }) => {
                assert_eq!((expected, actual), (1, 2));
                conflicts += 1;
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(winners, 1);
    assert_eq!(conflicts, 15);
    assert_eq!(store.load(&id).await.unwrap().version, 2);
}

#[tokio::test]
async fn test_games_are_isolated_by_id() {
    let store = MemoryStore::new();
    let a = GameId::from("a");
    let b = GameId::from("b");
    store.create(&a, dealt("a")).await.unwrap();
    store.create(&b, dealt("b")).await.unwrap();

    let loaded_a = store.load(&a).await.unwrap();
    store.commit(&a, loaded_a.state, 1).await.unwrap();

    assert_eq!(store.load(&a).await.unwrap().version, 2);
    assert_eq!(store.load(&b).await.unwrap().version, 1);
    assert_eq!(store.len().await, 2);
}
