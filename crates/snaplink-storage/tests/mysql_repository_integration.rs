use std::sync::Arc;
use std::time::Duration;

use jiff::Timestamp;
use snaplink_core::{Access, NewShortLink, ShortCode};
use snaplink_storage::{MySqlRepository, ReadRepository, Repository, StorageError};
use snaplink_test_infra::mysql::{MySqlServer, MysqlConfig};
use sqlx::mysql::MySqlPoolOptions;

struct Fixture {
    _mysql: MySqlServer,
    repo: MySqlRepository,
}

impl Fixture {
    async fn start() -> Self {
        let mysql = MySqlServer::start(MysqlConfig::builder().build())
            .await
            .expect("start mysql");
        let pool = connect_with_retry(&mysql.database_url()).await;

        let repo = MySqlRepository::new(pool);
        repo.migrate().await.expect("create schema");

        Self {
            _mysql: mysql,
            repo,
        }
    }
}

async fn connect_with_retry(url: &str) -> sqlx::MySqlPool {
    let mut last_error = None;

    for _ in 0..60 {
        match MySqlPoolOptions::new()
            .max_connections(8)
            .connect(url)
            .await
        {
            Ok(pool) => return pool,
            Err(err) => {
                last_error = Some(err);
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
        }
    }

    panic!("failed to connect mysql: {last_error:?}");
}

fn code(value: &str) -> ShortCode {
    ShortCode::new_unchecked(value)
}

fn access_ms(millis: u64) -> Access {
    Access::new(Duration::from_millis(millis), Timestamp::now())
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn insert_and_get_roundtrips_all_columns() {
    let fixture = Fixture::start().await;
    let short_code = code("abc123");

    let created = fixture
        .repo
        .insert(&short_code, NewShortLink::new("https://example.com"))
        .await
        .unwrap();

    assert!(created.id > 0);
    assert_eq!(created.metrics.clicks, 0);
    assert_eq!(created.metrics.last_accessed_at, None);

    let got = fixture.repo.get(&short_code).await.unwrap().unwrap();
    assert_eq!(got, created);
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn insert_conflicts_when_code_already_exists() {
    let fixture = Fixture::start().await;
    let short_code = code("abc123");

    fixture
        .repo
        .insert(&short_code, NewShortLink::new("https://one.example"))
        .await
        .unwrap();

    let err = fixture
        .repo
        .insert(&short_code, NewShortLink::new("https://two.example"))
        .await
        .unwrap_err();

    assert!(matches!(err, StorageError::Conflict(_)));
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn codes_differing_in_case_are_distinct() {
    let fixture = Fixture::start().await;

    fixture
        .repo
        .insert(&code("abcDEF"), NewShortLink::new("https://lower.example"))
        .await
        .unwrap();
    fixture
        .repo
        .insert(&code("ABCdef"), NewShortLink::new("https://upper.example"))
        .await
        .unwrap();

    let got = fixture.repo.get(&code("ABCdef")).await.unwrap().unwrap();
    assert_eq!(got.original_url, "https://upper.example");
    assert!(!fixture.repo.exists(&code("abcdef")).await.unwrap());
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn record_access_applies_running_mean() {
    let fixture = Fixture::start().await;
    let short_code = code("metrics");

    fixture
        .repo
        .insert(&short_code, NewShortLink::new("https://example.com"))
        .await
        .unwrap();

    fixture
        .repo
        .record_access(&short_code, access_ms(100))
        .await
        .unwrap();
    let updated = fixture
        .repo
        .record_access(&short_code, access_ms(300))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.metrics.clicks, 2);
    assert!((updated.metrics.avg_response_time_secs - 0.2).abs() < 1e-9);

    let stored = fixture.repo.get(&short_code).await.unwrap().unwrap();
    assert_eq!(stored.metrics.clicks, 2);
    assert!(stored.metrics.last_accessed_at.is_some());
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn record_access_for_missing_code_returns_none() {
    let fixture = Fixture::start().await;

    let result = fixture
        .repo
        .record_access(&code("missing"), access_ms(10))
        .await
        .unwrap();

    assert!(result.is_none());
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn concurrent_record_access_is_serialized() {
    let fixture = Fixture::start().await;
    let short_code = code("hot");
    let repo = Arc::new(fixture.repo.clone());

    repo.insert(&short_code, NewShortLink::new("https://example.com"))
        .await
        .unwrap();

    let mut handles = vec![];
    for _ in 0..40 {
        let repo = Arc::clone(&repo);
        let short_code = short_code.clone();
        handles.push(tokio::spawn(async move {
            repo.record_access(&short_code, access_ms(20)).await.unwrap();
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }

    let stored = repo.get(&short_code).await.unwrap().unwrap();
    assert_eq!(stored.metrics.clicks, 40);
}
