use axum::{
    extract::State,
    response::Response,
    routing::post,
    Router,
};
use gardenbook_core::{
    entity::prelude::Target,
    ids::{CommentId, LikeId, PostId},
    service::likes::LikesServiceError,
};
use tracing::debug;

use super::IdPath;
use crate::{
    error::AppError,
    session::{see_other, CurrentUser, Flash},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/posts/{id}/likes", post(like_post))
        .route("/comments/{id}/likes", post(like_comment))
        .route("/likes/{id}/delete", post(destroy))
}

async fn like_post(
    State(state): State<AppState>,
    IdPath(post_id): IdPath<PostId>,
    current: CurrentUser,
) -> Result<Response, AppError> {
    like(state, current, Target::Post(post_id)).await
}

async fn like_comment(
    State(state): State<AppState>,
    IdPath(comment_id): IdPath<CommentId>,
    current: CurrentUser,
) -> Result<Response, AppError> {
    like(state, current, Target::Comment(comment_id)).await
}

async fn like(state: AppState, current: CurrentUser, target: Target) -> Result<Response, AppError> {
    match state.services.likes.like(current.user.id, target).await {
        Ok(_) => Ok(see_other("/posts", Some(Flash::Liked))),
        Err(LikesServiceError::Invalid(errors)) => {
            debug!(%target, %errors, "like refused");
            Ok(see_other("/posts", Some(Flash::LikeFailed)))
        }
        Err(error) => Err(error.into()),
    }
}

async fn destroy(
    State(state): State<AppState>,
    IdPath(like_id): IdPath<LikeId>,
    current: CurrentUser,
) -> Result<Response, AppError> {
    state.services.likes.unlike(current.user.id, like_id).await?;
    Ok(see_other("/posts", Some(Flash::LikeRemoved)))
}

#[cfg(test)]
mod tests {
    use crate::test_support::{call, location, set_cookies, TestApp};
    use axum::http::StatusCode;
    use gardenbook_core::{
        entity::prelude::*,
        ids::CommentId,
        test_utils::{create_comment, create_like, create_post, create_user},
    };

    fn flash_of(response: &axum::response::Response) -> Option<String> {
        set_cookies(response)
            .into_iter()
            .find_map(|c| c.strip_prefix("gardenbook_flash=").map(|v| v.split(';').next().unwrap_or("").to_string()))
    }

    #[tokio::test]
    async fn test_like_post_once() {
        let app = TestApp::new().await;
        let (alice, token) = app.sign_in_as("Alice").await;
        let post = create_post(&app.db, alice.id, "roses").await;
        let uri = format!("/posts/{}/likes", post.id);

        let response = call(&app.router, "POST", &uri, Some(&token), "").await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/posts");
        assert_eq!(flash_of(&response).as_deref(), Some("liked"));

        let response = call(&app.router, "POST", &uri, Some(&token), "").await;
        assert_eq!(location(&response), "/posts");
        assert_eq!(flash_of(&response).as_deref(), Some("like_failed"));

        assert_eq!(Like::find().count(&app.db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_like_post_and_comment() {
        let app = TestApp::new().await;
        let (alice, token) = app.sign_in_as("Alice").await;
        let post = create_post(&app.db, alice.id, "roses").await;
        let comment = create_comment(&app.db, alice.id, Target::Post(post.id), "hi").await;

        call(&app.router, "POST", &format!("/posts/{}/likes", post.id), Some(&token), "").await;
        let response = call(&app.router, "POST", &format!("/comments/{}/likes", comment.id), Some(&token), "").await;
        assert_eq!(flash_of(&response).as_deref(), Some("liked"));
        assert_eq!(Like::find().count(&app.db).await.unwrap(), 2);

        let response = call(&app.router, "POST", &format!("/comments/{}/likes", CommentId::new()), Some(&token), "").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unlike_own_only() {
        let app = TestApp::new().await;
        let (alice, alice_token) = app.sign_in_as("Alice").await;
        let bob = create_user(&app.db, "Bob").await;
        let post = create_post(&app.db, alice.id, "roses").await;
        let bobs_like = create_like(&app.db, bob.id, Target::Post(post.id)).await;
        let own_like = create_like(&app.db, alice.id, Target::Post(post.id)).await;

        let response = call(&app.router, "POST", &format!("/likes/{}/delete", bobs_like.id), Some(&alice_token), "").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = call(&app.router, "POST", &format!("/likes/{}/delete", own_like.id), Some(&alice_token), "").await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(flash_of(&response).as_deref(), Some("like_removed"));
        assert_eq!(Like::find().count(&app.db).await.unwrap(), 1);
    }
}
