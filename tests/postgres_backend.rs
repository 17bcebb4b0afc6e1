//! Runs against a live database only when `RESTGUARDIAN_TEST_DATABASE_URL` is set.

use restguardian::{AppError, PgBackend, PgBackendOptions, RecordKey, RecordService, RecordValue};
use serde_json::json;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;

const TEST_DATABASE_URL: &str = "RESTGUARDIAN_TEST_DATABASE_URL";

#[tokio::test]
async fn records_round_trip_through_postgres() {
    let Ok(url) = std::env::var(TEST_DATABASE_URL) else {
        eprintln!("{} not set; skipping", TEST_DATABASE_URL);
        return;
    };
    let pool = PgPoolOptions::new().max_connections(2).connect(&url).await.unwrap();
    let schema = format!("rg_{}", uuid::Uuid::new_v4().simple());
    sqlx::query(&format!("CREATE SCHEMA \"{}\"", schema))
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query(&format!(
        "CREATE TABLE \"{}\".\"users\" (id int4 PRIMARY KEY, name text NOT NULL, balance numeric)",
        schema
    ))
    .execute(&pool)
    .await
    .unwrap();

    let backend = PgBackend::new(pool.clone(), PgBackendOptions::default());
    let service = RecordService::new(Arc::new(backend), Duration::from_secs(5));

    let dbs = service.list_databases().await.unwrap();
    assert!(dbs.iter().any(|d| d.as_str() == schema));
    assert_eq!(service.list_tables(&schema).await.unwrap(), vec!["users".to_string()]);

    let hostile = "Robert'); DROP TABLE users;--";
    let value: RecordValue = [
        ("id".to_string(), json!(7)),
        ("name".to_string(), json!(hostile)),
        ("balance".to_string(), json!("12.50")),
    ]
    .into_iter()
    .collect();
    let key = service.create_record(&schema, "users", &value).await.unwrap();
    assert_eq!(key, RecordKey::new(vec![json!(7)]));

    let fetched = service.get_record(&schema, "users", &key).await.unwrap();
    assert_eq!(fetched["id"], json!(7));
    assert_eq!(fetched["name"], json!(hostile));
    assert_eq!(fetched["balance"], json!("12.50"));

    let err = service.create_record(&schema, "users", &value).await.unwrap_err();
    assert!(matches!(err, AppError::AlreadyExists(_)));

    let mut moved = value.clone();
    moved.insert("id".to_string(), json!(8));
    let new_key = service.update_record(&schema, "users", &key, &moved).await.unwrap();
    assert_eq!(new_key, RecordKey::new(vec![json!(8)]));
    assert!(service.get_record(&schema, "users", &key).await.unwrap_err().is_not_found());

    service.delete_record(&schema, "users", &new_key).await.unwrap();
    assert!(service.list_record_keys(&schema, "users").await.unwrap().is_empty());

    sqlx::query(&format!("DROP SCHEMA \"{}\" CASCADE", schema))
        .execute(&pool)
        .await
        .unwrap();
}
