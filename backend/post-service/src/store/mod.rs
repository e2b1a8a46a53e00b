//! Persistence layer for posts
//!
//! `PostStore` serves the read paths directly and hands out `StoreTx`
//! handles for the write paths. A `StoreTx` only persists its changes when
//! `commit` is called; dropping it without committing rolls everything back.

mod memory;
mod postgres;

pub use memory::{FaultPoint, MemoryPostStore, MemoryPostTx};
pub use postgres::{PgPostStore, PgPostTx};

use async_trait::async_trait;

use crate::models::{NewPost, Post, PostChanges};

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Failure raised by the storage collaborator.
///
/// Display is the raw message text; it is what callers see under `error`.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Fault(String),
}

/// One page worth of rows plus the total row count
#[derive(Debug, Clone)]
pub struct PageSlice {
    pub items: Vec<Post>,
    pub total: u64,
}

#[async_trait]
pub trait PostStore: Clone + Send + Sync + 'static {
    type Tx: StoreTx;

    /// Open a transaction for a write path
    async fn begin(&self) -> StoreResult<Self::Tx>;

    async fn find(&self, id: i64) -> StoreResult<Option<Post>>;

    /// Rows ordered by ascending id, `offset` rows skipped
    async fn paginate(&self, offset: u64, limit: u64) -> StoreResult<PageSlice>;
}

#[async_trait]
pub trait StoreTx: Send + Sized {
    async fn insert(&mut self, post: NewPost) -> StoreResult<Post>;

    /// Look up a row and lock it for the rest of the transaction
    async fn find_for_update(&mut self, id: i64) -> StoreResult<Option<Post>>;

    async fn update(&mut self, id: i64, changes: PostChanges) -> StoreResult<Post>;

    async fn delete(&mut self, id: i64) -> StoreResult<()>;

    async fn commit(self) -> StoreResult<()>;

    async fn rollback(self) -> StoreResult<()>;
}
