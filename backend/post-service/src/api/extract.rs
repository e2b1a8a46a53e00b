use std::sync::Arc;

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Query, Request},
};
use serde_json::Value;

use crate::controller::PostController;
use crate::envelope::Envelope;
use crate::store::PostStore;
use crate::validation::Input;

pub const BODY_NOT_OBJECT_MESSAGE: &str = "The request body must be a JSON object.";

/// Query-string parameters merged with the JSON object body.
///
/// Body keys win over query keys. An empty body is allowed. Rejections are
/// answered by the controller like any other validation failure.
#[derive(Debug, Default)]
pub struct RequestInput(pub Input);

#[async_trait]
impl<S: PostStore> FromRequest<Arc<PostController<S>>> for RequestInput {
    type Rejection = Envelope;

    async fn from_request(
        req: Request,
        state: &Arc<PostController<S>>,
    ) -> Result<Self, Self::Rejection> {
        let mut input = Input::new();

        let Query(params) = Query::<Vec<(String, String)>>::try_from_uri(req.uri())
            .map_err(|rejection| state.reject_input(rejection.body_text()))?;
        for (key, value) in params {
            input.insert(key, Value::String(value));
        }

        let body = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| state.reject_input(rejection.body_text()))?;

        if !body.iter().all(u8::is_ascii_whitespace) {
            match serde_json::from_slice::<Value>(&body) {
                Ok(Value::Object(fields)) => input.extend(fields),
                Ok(_) | Err(_) => {
                    tracing::debug!("rejected request body that is not a JSON object");
                    return Err(state.reject_input(BODY_NOT_OBJECT_MESSAGE));
                }
            }
        }

        Ok(RequestInput(input))
    }
}
