//! Request pipeline shared by every post operation.
//!
//! 1. check the input against the operation's `RuleSet`
//! 2. run the data action, inside a transaction for write paths
//! 3. map the outcome onto an `Envelope`
//!
//! `respond` is the only place where errors turn into responses.

use std::future::Future;

use axum::http::StatusCode;
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::config::{ApiConfig, NotFoundPolicy};
use crate::envelope::Envelope;
use crate::error::{AppError, Result};
use crate::store::{PostStore, StoreTx};
use crate::validation::{Input, RuleSet, Violation};

/// Whether an operation reads or writes; decides how not-found is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

#[derive(Clone)]
pub struct Pipeline<S> {
    store: S,
    not_found_policy: NotFoundPolicy,
    map_http_status: bool,
}

impl<S: PostStore> Pipeline<S> {
    pub fn new(store: S, api: &ApiConfig) -> Self {
        Self {
            store,
            not_found_policy: api.not_found_policy,
            map_http_status: api.map_http_status,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Validate, then run `action` inside a transaction
    pub async fn mutate<D, T, F>(&self, rules: &RuleSet, input: &Input, action: F) -> Envelope
    where
        D: DeserializeOwned + Send + 'static,
        T: Serialize + Send + 'static,
        F: for<'t> FnOnce(D, &'t mut S::Tx) -> BoxFuture<'t, Result<T>> + Send,
    {
        let result = match validated::<D>(rules, input) {
            Ok(attrs) => self.transact(move |tx| action(attrs, tx)).await,
            Err(err) => Err(err),
        };
        self.respond(Access::Write, result)
    }

    /// Validate, then run a read-only `action` outside any transaction
    pub async fn query<D, T, F, Fut>(&self, rules: &RuleSet, input: &Input, action: F) -> Envelope
    where
        D: DeserializeOwned,
        T: Serialize,
        F: FnOnce(D) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let result = match validated::<D>(rules, input) {
            Ok(attrs) => action(attrs).await,
            Err(err) => Err(err),
        };
        self.respond(Access::Read, result)
    }

    /// Run `action` in a transaction that commits only if it succeeds.
    ///
    /// Any error rolls back; if the explicit rollback itself fails the
    /// transaction is still discarded when dropped.
    pub async fn transact<T, F>(&self, action: F) -> Result<T>
    where
        T: Send + 'static,
        F: for<'t> FnOnce(&'t mut S::Tx) -> BoxFuture<'t, Result<T>> + Send,
    {
        let mut tx = self.store.begin().await?;
        tracing::debug!("transaction started");

        match action(&mut tx).await {
            Ok(value) => {
                tx.commit().await?;
                tracing::debug!("transaction committed");
                Ok(value)
            }
            Err(err) => {
                match tx.rollback().await {
                    Ok(()) => tracing::debug!("transaction rolled back"),
                    Err(rollback_err) => {
                        tracing::warn!(error = %rollback_err, "transaction rollback failed")
                    }
                }
                Err(err)
            }
        }
    }

    /// Turn the outcome of an operation into its envelope
    pub fn respond<T: Serialize>(&self, access: Access, result: Result<T>) -> Envelope {
        let result = result.and_then(|value| Ok(serde_json::to_value(value)?));

        match result {
            Ok(data) => Envelope::success(data),
            Err(err) => self.reject(access, err),
        }
    }

    fn reject(&self, access: Access, err: AppError) -> Envelope {
        let message = err.to_string();

        let (envelope, http_status) = match &err {
            AppError::Validation(_) => {
                tracing::warn!(%message, "validation failed");
                (Envelope::fail(message), StatusCode::UNPROCESSABLE_ENTITY)
            }
            AppError::NotFound => {
                tracing::warn!(?access, "post not found");
                let envelope = match (self.not_found_policy, access) {
                    (NotFoundPolicy::Legacy, Access::Write) => Envelope::error(message),
                    _ => Envelope::fail(message),
                };
                (envelope, StatusCode::NOT_FOUND)
            }
            AppError::Store(e) => {
                tracing::error!(error = ?e, "storage error");
                (Envelope::error(message), StatusCode::INTERNAL_SERVER_ERROR)
            }
            AppError::Internal(_) => {
                tracing::error!(%message, "internal error");
                (Envelope::error(message), StatusCode::INTERNAL_SERVER_ERROR)
            }
        };

        if self.map_http_status {
            envelope.with_http_status(http_status)
        } else {
            envelope
        }
    }
}

fn validated<D: DeserializeOwned>(rules: &RuleSet, input: &Input) -> Result<D> {
    let attrs = rules.apply(input).map_err(|violations| {
        AppError::Validation(violations.iter().map(Violation::message).collect())
    })?;
    Ok(serde_json::from_value(Value::Object(attrs))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::Status;
    use crate::models::NewPost;
    use crate::store::{FaultPoint, MemoryPostStore, StoreError};
    use crate::validation::FieldRule;
    use serde_json::json;

    const RULES: RuleSet = RuleSet::new(&[FieldRule::required("title").string().min(3)]);

    fn pipeline(api: ApiConfig) -> Pipeline<MemoryPostStore> {
        Pipeline::new(MemoryPostStore::new(), &api)
    }

    fn input(value: Value) -> Input {
        value.as_object().cloned().unwrap_or_default()
    }

    #[tokio::test]
    async fn mutate_commits_on_success() {
        let pipeline = pipeline(ApiConfig::default());

        let envelope = pipeline
            .mutate(&RULES, &input(json!({ "title": "hello" })), |post: NewPost, tx| {
                Box::pin(async move { Ok::<_, AppError>(tx.insert(post).await?) })
            })
            .await;

        assert_eq!(envelope.status, Status::Success);
        assert_eq!(envelope.data["title"], "hello");
        assert_eq!(pipeline.store().snapshot().await.len(), 1);
    }

    #[tokio::test]
    async fn mutate_skips_action_when_validation_fails() {
        let pipeline = pipeline(ApiConfig::default());
        pipeline.store().fail_on(FaultPoint::Begin);

        let envelope = pipeline
            .mutate(&RULES, &input(json!({ "title": "hi" })), |post: NewPost, tx| {
                Box::pin(async move { Ok::<_, AppError>(tx.insert(post).await?) })
            })
            .await;

        // A transaction was never opened, otherwise this would be an error.
        assert_eq!(envelope.status, Status::Fail);
        assert_eq!(envelope.message(), Some("The title must be at least 3 characters."));
    }

    #[tokio::test]
    async fn transact_rolls_back_on_error() {
        let pipeline = pipeline(ApiConfig::default());

        let result: Result<()> = pipeline
            .transact(|tx| {
                Box::pin(async move {
                    tx.insert(NewPost {
                        title: "doomed".to_string(),
                        description: None,
                    })
                    .await?;
                    Err(AppError::Store(StoreError::Fault("late failure".to_string())))
                })
            })
            .await;

        assert_eq!(result.unwrap_err().to_string(), "late failure");
        assert!(pipeline.store().snapshot().await.is_empty());
    }

    #[test]
    fn legacy_policy_splits_not_found_by_access() {
        let pipeline = pipeline(ApiConfig::default());

        let read = pipeline.respond::<()>(Access::Read, Err(AppError::NotFound));
        let write = pipeline.respond::<()>(Access::Write, Err(AppError::NotFound));

        assert_eq!(read.status, Status::Fail);
        assert_eq!(write.status, Status::Error);
        assert_eq!(write.message(), Some("Data tidak ditemukan"));
        assert_eq!(write.http_status(), StatusCode::OK);
    }

    #[test]
    fn uniform_policy_always_fails() {
        let pipeline = pipeline(ApiConfig {
            not_found_policy: NotFoundPolicy::Uniform,
            ..ApiConfig::default()
        });

        let write = pipeline.respond::<()>(Access::Write, Err(AppError::NotFound));
        assert_eq!(write.status, Status::Fail);
    }

    #[test]
    fn http_status_mapping_is_opt_in() {
        let pipeline = pipeline(ApiConfig {
            map_http_status: true,
            ..ApiConfig::default()
        });

        let fault = pipeline.respond::<()>(
            Access::Write,
            Err(StoreError::Fault("boom".to_string()).into()),
        );
        let invalid =
            pipeline.respond::<()>(Access::Write, Err(AppError::Validation(vec!["x".into()])));

        assert_eq!(fault.http_status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(invalid.http_status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
