use super::helpers::test_database;
use narrator_backend::domain::narration::{Tone, Voice};
use narrator_backend::domain::session::{ChunkReport, Session, SessionOptions};
use narrator_backend::infrastructure::repositories::{
    PgSessionRepository, RepositoryError, SessionRepository,
};
use pretty_assertions::assert_eq;

fn session(ttl: chrono::Duration) -> Session {
    Session::new(
        vec!["One.".to_string(), "Two.".to_string(), "Three.".to_string()],
        SessionOptions {
            voice: Voice::Fable,
            tone: Tone::Professional,
            translate: true,
            source_url: None,
            title: Some("Numbers".to_string()),
            max_chunk_length: None,
        },
        ttl,
    )
}

#[tokio::test]
#[ignore = "needs Docker"]
async fn test_session_round_trips_through_postgres() {
    let db = test_database().await;
    let repo = PgSessionRepository::new(db.pool.clone());
    let session = session(chrono::Duration::hours(1));

    repo.create(&session).await.unwrap();
    let found = repo.find(session.id).await.unwrap().unwrap();

    assert_eq!(found.chunks, session.chunks);
    assert_eq!(found.next_index, 0);
    assert_eq!(found.voice, Voice::Fable);
    assert_eq!(found.tone, Tone::Professional);
    assert_eq!(found.title.as_deref(), Some("Numbers"));
    assert!(found.reports.is_empty());
}

#[tokio::test]
#[ignore = "needs Docker"]
async fn test_commit_is_compare_and_set() {
    let db = test_database().await;
    let repo = PgSessionRepository::new(db.pool.clone());
    let session = session(chrono::Duration::hours(1));
    repo.create(&session).await.unwrap();

    let report = ChunkReport::failed(0, "One.", "speech synthesis failed: boom");
    assert!(repo.commit_chunk(session.id, 0, report.clone()).await.unwrap());
    assert!(!repo.commit_chunk(session.id, 0, report.clone()).await.unwrap());

    let found = repo.find(session.id).await.unwrap().unwrap();
    assert_eq!(found.next_index, 1);
    assert_eq!(found.reports, vec![report]);
}

#[tokio::test]
#[ignore = "needs Docker"]
async fn test_expired_sessions_are_hidden_and_purged() {
    let db = test_database().await;
    let repo = PgSessionRepository::new(db.pool.clone());
    let expired = session(chrono::Duration::seconds(-1));
    let live = session(chrono::Duration::hours(1));
    repo.create(&expired).await.unwrap();
    repo.create(&live).await.unwrap();

    assert!(repo.find(expired.id).await.unwrap().is_none());
    let err = repo
        .commit_chunk(expired.id, 0, ChunkReport::failed(0, "One.", "late"))
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound(id) if id == expired.id));

    assert_eq!(repo.purge_expired().await.unwrap(), 1);
    assert!(repo.find(live.id).await.unwrap().is_some());
}
