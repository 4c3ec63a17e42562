use axum::{
    extract::State,
    http::StatusCode,
    response::Response,
    routing::post,
    Form, Router,
};
use gardenbook_core::{
    entity::prelude::Target,
    ids::{CommentId, PostId},
    service::comments::CommentsServiceError,
};
use serde::Deserialize;

use super::IdPath;
use crate::{
    error::AppError,
    pages,
    session::{page, see_other, CurrentUser, Flash, IncomingFlash},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/posts/{id}/comments", post(create_on_post))
        .route("/comments/{id}/comments", post(create_on_comment))
        .route("/comments/{id}", post(update))
        .route("/comments/{id}/delete", post(destroy))
}

#[derive(Debug, Deserialize)]
struct CommentForm {
    #[serde(default)]
    content: String,
}

fn back_to_post(post_id: PostId, flash: Option<Flash>) -> Response {
    see_other(&format!("/posts/{post_id}"), flash)
}

async fn create_on_post(
    State(state): State<AppState>,
    IdPath(post_id): IdPath<PostId>,
    current: CurrentUser,
    Form(form): Form<CommentForm>,
) -> Result<Response, AppError> {
    create(state, current, Target::Post(post_id), form).await
}

async fn create_on_comment(
    State(state): State<AppState>,
    IdPath(comment_id): IdPath<CommentId>,
    current: CurrentUser,
    Form(form): Form<CommentForm>,
) -> Result<Response, AppError> {
    create(state, current, Target::Comment(comment_id), form).await
}

async fn create(
    state: AppState,
    current: CurrentUser,
    target: Target,
    form: CommentForm,
) -> Result<Response, AppError> {
    match state
        .services
        .comments
        .create(current.user.id, target, form.content.clone())
        .await
    {
        Ok((_, post_id)) => Ok(back_to_post(post_id, Some(Flash::CommentPosted))),
        Err(CommentsServiceError::Invalid(errors)) => {
            let action = match target {
                Target::Post(id) => format!("/posts/{id}/comments"),
                Target::Comment(id) => format!("/comments/{id}/comments"),
            };
            Ok(page(
                StatusCode::UNPROCESSABLE_ENTITY,
                IncomingFlash::default(),
                pages::comment_page(&current.user, &action, &form.content, &errors),
            ))
        }
        Err(error) => Err(error.into()),
    }
}

async fn update(
    State(state): State<AppState>,
    IdPath(comment_id): IdPath<CommentId>,
    current: CurrentUser,
    Form(form): Form<CommentForm>,
) -> Result<Response, AppError> {
    match state
        .services
        .comments
        .update(current.user.id, comment_id, form.content.clone())
        .await
    {
        Ok((_, post_id)) => Ok(back_to_post(post_id, None)),
        Err(CommentsServiceError::Invalid(errors)) => Ok(page(
            StatusCode::UNPROCESSABLE_ENTITY,
            IncomingFlash::default(),
            pages::comment_page(
                &current.user,
                &format!("/comments/{comment_id}"),
                &form.content,
                &errors,
            ),
        )),
        Err(error) => Err(error.into()),
    }
}

async fn destroy(
    State(state): State<AppState>,
    IdPath(comment_id): IdPath<CommentId>,
    current: CurrentUser,
) -> Result<Response, AppError> {
    let post_id = state
        .services
        .comments
        .delete(current.user.id, comment_id)
        .await?;
    Ok(back_to_post(post_id, Some(Flash::CommentRemoved)))
}
