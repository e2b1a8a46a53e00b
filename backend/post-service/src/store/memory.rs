use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use super::{PageSlice, PostStore, StoreError, StoreResult, StoreTx};
use crate::models::{NewPost, Post, PostChanges};

/// Points at which a fault can be armed on a `MemoryPostStore`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultPoint {
    Begin,
    Read,
    Insert,
    Update,
    Delete,
    Commit,
}

impl fmt::Display for FaultPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FaultPoint::Begin => "begin",
            FaultPoint::Read => "read",
            FaultPoint::Insert => "insert",
            FaultPoint::Update => "update",
            FaultPoint::Delete => "delete",
            FaultPoint::Commit => "commit",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default)]
struct Table {
    rows: BTreeMap<i64, Post>,
}

#[derive(Default)]
struct Inner {
    table: RwLock<Table>,
    /// Outside the table so rolled-back inserts still consume their id
    last_id: AtomicI64,
    writer: Arc<Mutex<()>>,
    faults: StdMutex<HashSet<FaultPoint>>,
}

/// In-process store with the same transactional contract as PostgreSQL.
///
/// Writers are serialized; each transaction works on a private copy of the
/// table that replaces the shared one on commit. Readers only ever see
/// committed state.
#[derive(Clone, Default)]
pub struct MemoryPostStore {
    inner: Arc<Inner>,
}

impl MemoryPostStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation at `point` fail until `clear_faults` is called
    pub fn fail_on(&self, point: FaultPoint) {
        self.faults().insert(point);
    }

    pub fn clear_faults(&self) {
        self.faults().clear();
    }

    /// Committed rows in id order
    pub async fn snapshot(&self) -> Vec<Post> {
        self.inner.table.read().await.rows.values().cloned().collect()
    }

    fn faults(&self) -> std::sync::MutexGuard<'_, HashSet<FaultPoint>> {
        // A poisoned set of test switches is still a usable set.
        self.inner
            .faults
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check(&self, point: FaultPoint) -> StoreResult<()> {
        if self.faults().contains(&point) {
            return Err(StoreError::Fault(format!("injected fault at {point}")));
        }
        Ok(())
    }
}

#[async_trait]
impl PostStore for MemoryPostStore {
    type Tx = MemoryPostTx;

    async fn begin(&self) -> StoreResult<MemoryPostTx> {
        self.check(FaultPoint::Begin)?;

        let writer = self.inner.writer.clone().lock_owned().await;
        let working = self.inner.table.read().await.clone();

        Ok(MemoryPostTx {
            store: self.clone(),
            working,
            _writer: writer,
        })
    }

    async fn find(&self, id: i64) -> StoreResult<Option<Post>> {
        self.check(FaultPoint::Read)?;
        Ok(self.inner.table.read().await.rows.get(&id).cloned())
    }

    async fn paginate(&self, offset: u64, limit: u64) -> StoreResult<PageSlice> {
        self.check(FaultPoint::Read)?;

        let table = self.inner.table.read().await;
        let skip = usize::try_from(offset).unwrap_or(usize::MAX);
        let take = usize::try_from(limit).unwrap_or(usize::MAX);

        Ok(PageSlice {
            items: table.rows.values().skip(skip).take(take).cloned().collect(),
            total: table.rows.len() as u64,
        })
    }
}

/// Open memory transaction; holds the writer lock until committed or dropped
pub struct MemoryPostTx {
    store: MemoryPostStore,
    working: Table,
    _writer: OwnedMutexGuard<()>,
}

#[async_trait]
impl StoreTx for MemoryPostTx {
    async fn insert(&mut self, post: NewPost) -> StoreResult<Post> {
        self.store.check(FaultPoint::Insert)?;

        let id = self.store.inner.last_id.fetch_add(1, Ordering::SeqCst) + 1;
        let now = Utc::now();
        let row = Post {
            id,
            title: post.title,
            description: post.description,
            created_at: now,
            updated_at: now,
        };
        self.working.rows.insert(row.id, row.clone());

        Ok(row)
    }

    async fn find_for_update(&mut self, id: i64) -> StoreResult<Option<Post>> {
        self.store.check(FaultPoint::Read)?;
        Ok(self.working.rows.get(&id).cloned())
    }

    async fn update(&mut self, id: i64, changes: PostChanges) -> StoreResult<Post> {
        self.store.check(FaultPoint::Update)?;

        let row = self
            .working
            .rows
            .get_mut(&id)
            .ok_or_else(|| StoreError::Fault(format!("no post with id {id}")))?;
        row.apply(changes, Utc::now());

        Ok(row.clone())
    }

    async fn delete(&mut self, id: i64) -> StoreResult<()> {
        self.store.check(FaultPoint::Delete)?;
        self.working.rows.remove(&id);
        Ok(())
    }

    async fn commit(self) -> StoreResult<()> {
        self.store.check(FaultPoint::Commit)?;
        *self.store.inner.table.write().await = self.working;
        Ok(())
    }

    async fn rollback(self) -> StoreResult<()> {
        Ok(())
    }
}
