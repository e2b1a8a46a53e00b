//! The five post operations, each an instance of the request pipeline

use serde_json::{json, Value};
use tracing::instrument;

use crate::config::ApiConfig;
use crate::envelope::Envelope;
use crate::error::AppError;
use crate::models::{NewPost, PostChanges};
use crate::pagination::{Page, PageRequest};
use crate::pipeline::{Access, Pipeline};
use crate::store::{PostStore, StoreTx};
use crate::validation::{as_integer, FieldRule, Input, RuleSet};

pub const DELETED_MESSAGE: &str = "Data dihapus";

pub const CREATE_RULES: RuleSet = RuleSet::new(&[
    FieldRule::required("title").string().min(3).max(191),
    FieldRule::nullable("description").string().max(191),
]);

/// Update checks the same fields it writes
pub const UPDATE_RULES: RuleSet = CREATE_RULES;

pub const LIST_RULES: RuleSet = RuleSet::new(&[FieldRule::required("size").numeric()]);

pub struct PostController<S> {
    pipeline: Pipeline<S>,
    default_page_size: u64,
}

impl<S: PostStore> PostController<S> {
    pub fn new(store: S, api: &ApiConfig) -> Self {
        Self {
            pipeline: Pipeline::new(store, api),
            default_page_size: api.default_page_size.max(1),
        }
    }

    pub fn store(&self) -> &S {
        self.pipeline.store()
    }

    /// Answer a request whose input could not be read at all
    pub fn reject_input(&self, message: impl Into<String>) -> Envelope {
        self.pipeline
            .respond::<()>(Access::Write, Err(AppError::Validation(vec![message.into()])))
    }

    #[instrument(skip_all)]
    pub async fn create(&self, input: &Input) -> Envelope {
        self.pipeline
            .mutate(&CREATE_RULES, input, |post: NewPost, tx| {
                Box::pin(async move {
                    let post = tx.insert(post).await?;
                    tracing::info!(post_id = post.id, "post created");
                    Ok::<_, AppError>(post)
                })
            })
            .await
    }

    #[instrument(skip(self, input))]
    pub async fn update(&self, id: &str, input: &Input) -> Envelope {
        let id = parse_id(id);

        self.pipeline
            .mutate(&UPDATE_RULES, input, move |changes: PostChanges, tx| {
                Box::pin(async move {
                    let id = id.ok_or(AppError::NotFound)?;
                    tx.find_for_update(id).await?.ok_or(AppError::NotFound)?;

                    let post = tx.update(id, changes).await?;
                    tracing::info!(post_id = post.id, "post updated");
                    Ok::<_, AppError>(post)
                })
            })
            .await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Envelope {
        let id = parse_id(id);

        let result = self
            .pipeline
            .transact(move |tx| {
                Box::pin(async move {
                    let id = id.ok_or(AppError::NotFound)?;
                    tx.find_for_update(id).await?.ok_or(AppError::NotFound)?;

                    tx.delete(id).await?;
                    tracing::info!(post_id = id, "post deleted");
                    Ok::<_, AppError>(json!({ "message": DELETED_MESSAGE }))
                })
            })
            .await;

        self.pipeline.respond(Access::Write, result)
    }

    /// Paginated list; `path` is echoed into the page URLs
    #[instrument(skip(self, input))]
    pub async fn list(&self, input: &Input, path: &str) -> Envelope {
        self.pipeline
            .query(&LIST_RULES, input, move |validated: Input| async move {
                let size = validated.get("size").cloned().unwrap_or(Value::Null);

                let per_page = as_integer(&size)
                    .and_then(|n| u64::try_from(n).ok())
                    .filter(|n| *n >= 1)
                    .unwrap_or(self.default_page_size);
                let page = input
                    .get("page")
                    .and_then(as_integer)
                    .and_then(|n| u64::try_from(n).ok())
                    .filter(|n| *n >= 1)
                    .unwrap_or(1);

                let request = PageRequest {
                    page,
                    per_page,
                    path: path.to_string(),
                    appends: vec![("size".to_string(), query_value(&size))],
                };

                let slice = self
                    .pipeline
                    .store()
                    .paginate(request.offset(), per_page)
                    .await?;
                let page = Page::build(&request, slice);

                if page.is_empty() {
                    return Err(AppError::NotFound);
                }
                Ok(page)
            })
            .await
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: &str) -> Envelope {
        let result = match parse_id(id) {
            Some(id) => self
                .pipeline
                .store()
                .find(id)
                .await
                .map_err(AppError::from)
                .and_then(|post| post.ok_or(AppError::NotFound)),
            None => Err(AppError::NotFound),
        };

        self.pipeline.respond(Access::Read, result)
    }
}

/// Identifiers that are not integers cannot match any row
fn parse_id(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}

fn query_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::Status;
    use crate::store::MemoryPostStore;
    use axum::http::StatusCode;

    #[test]
    fn parse_id_accepts_integers_only() {
        assert_eq!(parse_id("42"), Some(42));
        assert_eq!(parse_id(" 7 "), Some(7));
        assert_eq!(parse_id("abc"), None);
        assert_eq!(parse_id("1.5"), None);
    }

    #[test]
    fn query_value_keeps_strings_verbatim() {
        assert_eq!(query_value(&json!("2")), "2");
        assert_eq!(query_value(&json!(2)), "2");
    }

    #[test]
    fn reject_input_follows_status_mapping() {
        let controller = PostController::new(
            MemoryPostStore::new(),
            &ApiConfig {
                map_http_status: true,
                ..ApiConfig::default()
            },
        );

        let envelope = controller.reject_input("unreadable body");

        assert_eq!(envelope.status, Status::Fail);
        assert_eq!(envelope.message(), Some("unreadable body"));
        assert_eq!(envelope.http_status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
