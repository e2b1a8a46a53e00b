use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};

use super::{PageSlice, PostStore, StoreResult, StoreTx};
use crate::config::DatabaseConfig;
use crate::models::{NewPost, Post, PostChanges};

const POST_COLUMNS: &str = "id, title, description, created_at, updated_at";

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PgPostStore {
    pool: PgPool,
}

impl PgPostStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &DatabaseConfig) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await?;

        tracing::info!(
            max_connections = config.max_connections,
            "PostgreSQL connection pool established"
        );

        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> anyhow::Result<()> {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("Database migrations completed");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl PostStore for PgPostStore {
    type Tx = PgPostTx;

    async fn begin(&self) -> StoreResult<PgPostTx> {
        let tx = self.pool.begin().await?;
        Ok(PgPostTx { tx })
    }

    async fn find(&self, id: i64) -> StoreResult<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    async fn paginate(&self, offset: u64, limit: u64) -> StoreResult<PageSlice> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts")
            .fetch_one(&self.pool)
            .await?;

        let items = sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM posts ORDER BY id ASC LIMIT $1 OFFSET $2"
        ))
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .bind(i64::try_from(offset).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        Ok(PageSlice {
            items,
            total: u64::try_from(total).unwrap_or_default(),
        })
    }
}

/// Open PostgreSQL transaction.
///
/// `sqlx` rolls the transaction back when it is dropped uncommitted.
pub struct PgPostTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTx for PgPostTx {
    async fn insert(&mut self, post: NewPost) -> StoreResult<Post> {
        let post = sqlx::query_as::<_, Post>(&format!(
            "INSERT INTO posts (title, description) VALUES ($1, $2) RETURNING {POST_COLUMNS}"
        ))
        .bind(&post.title)
        .bind(&post.description)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(post)
    }

    async fn find_for_update(&mut self, id: i64) -> StoreResult<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(post)
    }

    async fn update(&mut self, id: i64, changes: PostChanges) -> StoreResult<Post> {
        let post = sqlx::query_as::<_, Post>(&format!(
            r#"
            UPDATE posts
            SET title = $1, description = $2, updated_at = NOW()
            WHERE id = $3
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(&changes.title)
        .bind(&changes.description)
        .bind(id)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(post)
    }

    async fn delete(&mut self, id: i64) -> StoreResult<()> {
        sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn commit(self) -> StoreResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> StoreResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
