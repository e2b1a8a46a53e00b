//! Data models for post-service
//!
//! - `Post`: the persisted row
//! - `NewPost` / `PostChanges`: validated write payloads handed to the store

mod post;

pub use post::{NewPost, Post, PostChanges};
