use super::helpers::{new_record, new_translation, test_database};
use narrator_backend::domain::narration::fingerprint::{StrictKey, TranslationKey};
use narrator_backend::domain::narration::{content_key, Tone, UpsertOutcome, Voice};
use narrator_backend::infrastructure::repositories::{
    NarrationRepository, PgNarrationRepository, RepositoryError,
};
use pretty_assertions::assert_eq;

#[tokio::test]
#[ignore = "needs Docker"]
async fn test_insert_and_find_complete() {
    let db = test_database().await;
    let repo = PgNarrationRepository::new(db.pool.clone());

    let outcome = repo
        .upsert_with_audio(&new_record("Hello.", None, Voice::Nova, Tone::Calm), None)
        .await
        .unwrap();
    let inserted = match outcome {
        UpsertOutcome::Inserted(record) => record,
        other => panic!("expected insert, got {:?}", other),
    };
    assert!(inserted.audio_present);
    assert_eq!(inserted.content_key, content_key("Hello.", None));

    let key = StrictKey::new("Hello.", false, Voice::Nova, Tone::Calm);
    let found = repo.find_complete(&key).await.unwrap().unwrap();
    assert_eq!(found.id, inserted.id);

    let other_tone = StrictKey::new("Hello.", false, Voice::Nova, Tone::Warm);
    assert!(repo.find_complete(&other_tone).await.unwrap().is_none());

    let translated = StrictKey::new("Hello.", true, Voice::Nova, Tone::Calm);
    assert!(repo.find_complete(&translated).await.unwrap().is_none());

    let audio = repo.fetch_audio(inserted.id).await.unwrap().unwrap();
    assert_eq!(audio, b"mp3:Hello.".to_vec());
}

#[tokio::test]
#[ignore = "needs Docker"]
async fn test_long_text_is_found_by_exact_match() {
    let db = test_database().await;
    let repo = PgNarrationRepository::new(db.pool.clone());
    let long_text = "A fairly long sentence that repeats. ".repeat(300);

    repo.upsert_with_audio(&new_record(&long_text, None, Voice::Echo, Tone::Neutral), None)
        .await
        .unwrap();

    let key = StrictKey::new(&long_text, false, Voice::Echo, Tone::Neutral);
    assert!(repo.find_complete(&key).await.unwrap().is_some());

    let truncated = StrictKey::new(&long_text[..long_text.len() - 1], false, Voice::Echo, Tone::Neutral);
    assert!(repo.find_complete(&truncated).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "needs Docker"]
async fn test_standalone_translation_upgrade_keeps_id() {
    let db = test_database().await;
    let repo = PgNarrationRepository::new(db.pool.clone());

    let standalone = repo
        .save_standalone_translation(new_translation("Hi.", "你好。"))
        .await
        .unwrap();
    let found = repo
        .find_standalone_translation(&TranslationKey::new("Hi.", true))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, standalone.id);

    let outcome = repo
        .upsert_with_audio(
            &new_record("Hi.", Some("你好。"), Voice::Shimmer, Tone::Friendly),
            Some(standalone.id),
        )
        .await
        .unwrap();

    let upgraded = match outcome {
        UpsertOutcome::Upgraded(record) => record,
        other => panic!("expected upgrade, got {:?}", other),
    };
    assert_eq!(upgraded.id, standalone.id);
    assert_eq!(upgraded.voice, Some(Voice::Shimmer));
    assert!(upgraded.updated_at.is_some());
    assert_eq!(
        upgraded.source_url.as_deref(),
        Some("https://example.com/article")
    );

    // No longer standalone
    assert!(repo
        .find_standalone_translation(&TranslationKey::new("Hi.", true))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
#[ignore = "needs Docker"]
async fn test_upgrade_never_overwrites_existing_audio() {
    let db = test_database().await;
    let repo = PgNarrationRepository::new(db.pool.clone());

    let first = repo
        .upsert_with_audio(&new_record("Hi.", Some("你好。"), Voice::Nova, Tone::Calm), None)
        .await
        .unwrap()
        .into_record();

    let second = repo
        .upsert_with_audio(
            &new_record("Hi.", Some("你好。"), Voice::Onyx, Tone::Serious),
            Some(first.id),
        )
        .await
        .unwrap();

    assert!(matches!(second, UpsertOutcome::Inserted(_)));
    assert_ne!(second.record().id, first.id);

    let untouched = repo.find_by_id(first.id).await.unwrap().unwrap();
    assert_eq!(untouched.voice, Some(Voice::Nova));
}

#[tokio::test]
#[ignore = "needs Docker"]
async fn test_listing_stats_and_maintenance() {
    let db = test_database().await;
    let repo = PgNarrationRepository::new(db.pool.clone());

    let a = repo
        .upsert_with_audio(&new_record("A.", None, Voice::Nova, Tone::Calm), None)
        .await
        .unwrap()
        .into_record();
    let b = repo
        .upsert_with_audio(&new_record("B.", Some("乙。"), Voice::Echo, Tone::Calm), None)
        .await
        .unwrap()
        .into_record();
    repo.save_standalone_translation(new_translation("C.", "丙。"))
        .await
        .unwrap();

    let recent = repo.list_recent(2, 0).await.unwrap();
    assert_eq!(recent.len(), 2);
    assert!(recent[0].created_at >= recent[1].created_at);

    let stats = repo.stats().await.unwrap();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.with_audio, 2);
    assert_eq!(stats.translated, 2);
    assert_eq!(stats.standalone_translations, 1);
    assert_eq!(stats.by_tone.get("calm"), Some(&2));

    repo.set_content_key(a.id, "recomputed").await.unwrap();
    let summaries = repo.list_summaries().await.unwrap();
    assert!(summaries
        .iter()
        .any(|s| s.id == a.id && s.content_key == "recomputed"));

    assert!(repo.delete(b.id).await.unwrap());
    assert!(!repo.delete(b.id).await.unwrap());

    let missing = repo
        .set_content_key(b.id, "gone")
        .await
        .unwrap_err();
    assert!(matches!(missing, RepositoryError::NotFound(id) if id == b.id));
}
