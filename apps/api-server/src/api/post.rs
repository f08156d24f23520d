//! The `post` procedure group.
//!
//! The whole application surface lives in this one namespace: a greeting
//! probe, post creation, the caller's latest post, the unscoped list, and
//! a sign-in check.

use serde::{Deserialize, Serialize};
use validator::Validate;

use folio_core::domain::{Post, SessionUser};
use folio_rpc::{NoInput, RequestContext, Router, RpcError};

/// Input for `post.hello`.
#[derive(Debug, Deserialize, Validate)]
pub struct HelloInput {
    pub text: String,
}

/// Output of `post.hello`.
#[derive(Debug, Serialize, Deserialize)]
pub struct Greeting {
    pub greeting: String,
}

/// Input for `post.create`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePostInput {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: String,
}

/// The `post` namespace.
pub fn router() -> Router {
    Router::new("post")
        .public_query("hello", hello)
        .protected_mutation("create", create)
        .protected_query("getLatest", get_latest)
        .public_query("getAll", get_all)
        .protected_query("getSecretMessage", get_secret_message)
}

async fn hello(_ctx: RequestContext, input: HelloInput) -> Result<Greeting, RpcError> {
    Ok(Greeting {
        greeting: format!("Hello {}", input.text),
    })
}

async fn create(
    ctx: RequestContext,
    user: SessionUser,
    input: CreatePostInput,
) -> Result<Post, RpcError> {
    let post = ctx.posts.insert(Post::new(input.name, user.id)).await?;
    Ok(post)
}

async fn get_latest(
    ctx: RequestContext,
    user: SessionUser,
    _input: NoInput,
) -> Result<Option<Post>, RpcError> {
    Ok(ctx.posts.find_latest_by_owner(user.id).await?)
}

// Deliberately unscoped while `getLatest` is per-caller.
async fn get_all(ctx: RequestContext, _input: NoInput) -> Result<Vec<Post>, RpcError> {
    Ok(ctx.posts.find_all().await?)
}

async fn get_secret_message(
    _ctx: RequestContext,
    _user: SessionUser,
    _input: NoInput,
) -> Result<String, RpcError> {
    Ok("you can now see this secret message!".to_string())
}
