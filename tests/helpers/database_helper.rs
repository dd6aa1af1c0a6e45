//! Test database helper utilities
//!
//! PostgreSQL tests run only when `TEST_DATABASE_URL` points at a database
//! they may freely truncate.

use sqlx::PgPool;
use Rendezvous::database::DatabaseService;

pub struct TestDatabase {
    pub pool: PgPool,
    pub service: DatabaseService,
}

impl TestDatabase {
    /// Connect and migrate, or `None` when no test database is configured
    pub async fn connect() -> Option<Self> {
        let url = std::env::var("TEST_DATABASE_URL").ok()?;
        let pool = PgPool::connect(&url).await.expect("Failed to connect to test database");
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        let database = Self {
            service: DatabaseService::new(pool.clone()),
            pool,
        };
        database.cleanup().await.expect("Failed to clean test database");
        Some(database)
    }

    pub async fn cleanup(&self) -> Result<(), sqlx::Error> {
        sqlx::query("TRUNCATE participation_requests, events, categories, users RESTART IDENTITY CASCADE")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn insert_user(&self, name: &str) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("INSERT INTO users (name, email) VALUES ($1, $2) RETURNING id")
            .bind(name)
            .bind(format!("{}@rendezvous.test", name.to_lowercase()))
            .fetch_one(&self.pool)
            .await
    }

    pub async fn insert_category(&self, name: &str) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("INSERT INTO categories (name) VALUES ($1) RETURNING id")
            .bind(name)
            .fetch_one(&self.pool)
            .await
    }
}
