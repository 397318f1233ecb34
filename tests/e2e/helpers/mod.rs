use narrator_backend::domain::narration::{NewRecord, NewTranslation, Tone, Voice};
use narrator_backend::infrastructure::db::DbPool;
use once_cell::sync::Lazy;
use std::sync::Arc;
use testcontainers::{clients::Cli, Container};
use testcontainers_modules::postgres::Postgres;

pub mod db_pool;

use db_pool::{DatabasePool, PooledDatabase};

// Docker client for test containers
static DOCKER: Lazy<Cli> = Lazy::new(Cli::default);

// Shared PostgreSQL container for all tests
static SHARED_CONTAINER: Lazy<SharedContainer> = Lazy::new(SharedContainer::new);

static DB_POOL: Lazy<DatabasePool> = Lazy::new(|| DatabasePool::new(SHARED_CONTAINER.port));

struct SharedContainer {
    _container: Container<'static, Postgres>,
    port: u16,
}

impl SharedContainer {
    fn new() -> Self {
        let container = DOCKER.run(Postgres::default());
        let port = container.get_host_port_ipv4(5432);

        println!("Started shared PostgreSQL container on port {}", port);

        Self {
            _container: container,
            port,
        }
    }
}

/// A migrated database for one test
pub struct TestDatabase {
    pub pool: Arc<DbPool>,
    _db: PooledDatabase,
}

pub async fn test_database() -> TestDatabase {
    let pooled = DB_POOL
        .get_database()
        .await
        .expect("Failed to get database from pool");

    TestDatabase {
        pool: Arc::new(pooled.pool.clone()),
        _db: pooled,
    }
}

pub fn new_record(text: &str, translated: Option<&str>, voice: Voice, tone: Tone) -> NewRecord {
    NewRecord {
        original_text: text.to_string(),
        translated_text: translated.map(str::to_string),
        language_flag: translated.is_some(),
        voice,
        tone,
        audio_data: format!("mp3:{}", text).into_bytes(),
        source_url: Some("https://example.com/article".to_string()),
    }
}

pub fn new_translation(text: &str, translated: &str) -> NewTranslation {
    NewTranslation {
        original_text: text.to_string(),
        translated_text: translated.to_string(),
        source_url: None,
    }
}
