use std::sync::Arc;

use axum::{
    extract::{OriginalUri, Path, State},
    routing::get,
    Router,
};

use super::RequestInput;
use crate::controller::PostController;
use crate::envelope::Envelope;
use crate::store::PostStore;

type Controller<S> = State<Arc<PostController<S>>>;

pub fn routes<S: PostStore>() -> Router<Arc<PostController<S>>> {
    Router::new()
        .route("/posts", get(list_posts::<S>).post(create_post::<S>))
        .route(
            "/posts/:id",
            get(get_post::<S>)
                .put(update_post::<S>)
                .patch(update_post::<S>)
                .delete(delete_post::<S>),
        )
}

async fn create_post<S: PostStore>(
    State(controller): Controller<S>,
    RequestInput(input): RequestInput,
) -> Envelope {
    controller.create(&input).await
}

async fn update_post<S: PostStore>(
    State(controller): Controller<S>,
    Path(id): Path<String>,
    RequestInput(input): RequestInput,
) -> Envelope {
    controller.update(&id, &input).await
}

async fn delete_post<S: PostStore>(
    State(controller): Controller<S>,
    Path(id): Path<String>,
) -> Envelope {
    controller.delete(&id).await
}

async fn list_posts<S: PostStore>(
    State(controller): Controller<S>,
    OriginalUri(uri): OriginalUri,
    RequestInput(input): RequestInput,
) -> Envelope {
    controller.list(&input, uri.path()).await
}

async fn get_post<S: PostStore>(
    State(controller): Controller<S>,
    Path(id): Path<String>,
) -> Envelope {
    controller.get(&id).await
}
