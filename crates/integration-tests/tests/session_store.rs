//! Session-store migrations against a real database.

#![allow(clippy::unwrap_used)]

use sqlx::PgPool;
use tower_sessions_sqlx_store::PostgresStore;

#[tokio::test]
#[ignore = "Requires PostgreSQL at DATABASE_URL"]
async fn test_session_tables_migrate_twice() {
    let url = std::env::var("DATABASE_URL").unwrap();
    let pool = PgPool::connect(&url).await.unwrap();

    for _ in 0..2 {
        PostgresStore::new(pool.clone()).migrate().await.unwrap();
        pawpal_admin::middleware::session_store(&pool)
            .migrate()
            .await
            .unwrap();
    }

    let tables: Vec<(String,)> = sqlx::query_as(
        "SELECT table_schema FROM information_schema.tables \
         WHERE table_name = 'session' ORDER BY table_schema",
    )
    .fetch_all(&pool)
    .await
    .unwrap();
    let schemas: Vec<&str> = tables.iter().map(|(s,)| s.as_str()).collect();
    assert!(schemas.contains(&"admin"));
    assert!(schemas.contains(&"tower_sessions"));
}
