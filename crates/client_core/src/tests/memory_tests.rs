use super::MemoryStore;
use crate::{error::ControllerError, Collection, RecordSource};

use std::time::Duration;

use shared::domain::{Record, RecordId, UserProfile};

fn user(id: i64, username: &str, email: &str) -> Record {
    let mut profile = UserProfile::new(username);
    profile.email = email.to_string();
    Record::loaded(RecordId(id), profile)
}

#[tokio::test]
async fn search_matches_case_insensitively_and_tracks_current_set() {
    let store = MemoryStore::new(vec![
        user(1, "ada", "ada@example.org"),
        user(2, "alan", "alan@EXAMPLE.net"),
        user(3, "grace", "grace@example.org"),
    ]);
    assert!(!store.contains(RecordId(1)));

    let found = store.search("example.NET").await.expect("search");
    assert_eq!(found.ids(), vec![RecordId(2)]);
    assert!(store.contains(RecordId(2)));
    assert!(!store.contains(RecordId(1)));

    let all = store.search("").await.expect("search");
    assert_eq!(all.len(), 3);
    assert_eq!(store.search_calls(), 2);
}

#[tokio::test]
async fn upsert_and_remove_show_up_on_next_search() {
    let store = MemoryStore::new(vec![user(1, "ada", "ada@example.org")]);
    store.search("").await.expect("search");

    store.upsert(user(1, "ada.l", "ada@example.org"));
    store.upsert(user(9, "nina", "nina@example.org"));
    assert!(!store.contains(RecordId(9)));

    let all = store.search("").await.expect("search");
    assert_eq!(all.ids(), vec![RecordId(1), RecordId(9)]);
    assert_eq!(
        all.get(RecordId(1))
            .and_then(|record| record.profile.as_ref())
            .map(|profile| profile.username.as_str()),
        Some("ada.l")
    );

    assert!(store.remove(RecordId(9)));
    assert!(!store.remove(RecordId(9)));
    assert_eq!(store.search("nina").await.expect("search").len(), 0);
}

#[tokio::test]
async fn fetch_reports_missing_records() {
    let store = MemoryStore::new(vec![user(4, "grace", "grace@example.org")]);
    let record = store.fetch(RecordId(4)).await.expect("fetch");
    assert!(record.is_loaded());
    assert_eq!(
        store.fetch(RecordId(5)).await,
        Err(ControllerError::NotFound(RecordId(5)))
    );
    assert_eq!(store.fetch_calls(), 2);
}

#[tokio::test]
async fn late_older_search_does_not_replace_the_current_set() {
    let store = MemoryStore::new(vec![
        user(1, "ada", "ada@example.org"),
        user(2, "alan", "alan@example.net"),
    ])
    .with_latency(Duration::from_millis(20));

    let mut older = store.search("ada");
    assert!(futures::poll!(&mut older).is_pending());

    let newer = store.search("alan").await.expect("search");
    assert_eq!(newer.ids(), vec![RecordId(2)]);

    let late = older.await.expect("search");
    assert_eq!(late.ids(), vec![RecordId(1)]);
    assert!(store.contains(RecordId(2)));
    assert!(!store.contains(RecordId(1)));
}
