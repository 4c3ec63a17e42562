use axum::{
    extract::State,
    http::StatusCode,
    response::Response,
    routing::{get, post},
    Form, Router,
};
use gardenbook_core::{
    entity::prelude::FriendRequestStatus,
    ids::{FriendRequestId, UserId},
    service::friend_requests::FriendRequestsServiceError,
};
use serde::Deserialize;
use tracing::debug;

use super::IdPath;
use crate::{
    error::AppError,
    pages,
    session::{page, see_other, CurrentUser, Flash, IncomingFlash},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/friend_requests", get(index).post(create))
        .route("/friend_requests/{id}", post(update))
        .route("/friend_requests/{id}/delete", post(destroy))
}

async fn index(
    State(state): State<AppState>,
    current: CurrentUser,
    flash: IncomingFlash,
) -> Result<Response, AppError> {
    let pending = state
        .services
        .friend_requests
        .list_pending_for(current.user.id)
        .await?;
    Ok(page(
        StatusCode::OK,
        flash,
        pages::friend_requests(&current.user, flash, &pending),
    ))
}

#[derive(Debug, Deserialize)]
struct SendForm {
    #[serde(default)]
    receiver_id: String,
}

async fn create(
    State(state): State<AppState>,
    current: CurrentUser,
    Form(form): Form<SendForm>,
) -> Result<Response, AppError> {
    let Ok(receiver) = UserId::parse_str(form.receiver_id.trim()) else {
        return Ok(see_other("/users", Some(Flash::FriendRequestFailed)));
    };

    match state
        .services
        .friend_requests
        .send(current.user.id, receiver)
        .await
    {
        Ok(_) => Ok(see_other("/users", Some(Flash::FriendRequestSent))),
        Err(FriendRequestsServiceError::Invalid(errors)) => {
            debug!(%receiver, %errors, "friend request refused");
            Ok(see_other("/users", Some(Flash::FriendRequestFailed)))
        }
        Err(error) => Err(error.into()),
    }
}

#[derive(Debug, Deserialize)]
struct RespondForm {
    #[serde(default)]
    status: String,
}

async fn update(
    State(state): State<AppState>,
    IdPath(request_id): IdPath<FriendRequestId>,
    current: CurrentUser,
    Form(form): Form<RespondForm>,
) -> Result<Response, AppError> {
    let request = state
        .services
        .friend_requests
        .respond(current.user.id, request_id, &form.status)
        .await?;

    let flash = match request.status {
        FriendRequestStatus::Accepted => Flash::FriendRequestAccepted,
        _ => Flash::FriendRequestRejected,
    };
    Ok(see_other("/friend_requests", Some(flash)))
}

async fn destroy(
    State(state): State<AppState>,
    IdPath(request_id): IdPath<FriendRequestId>,
    current: CurrentUser,
) -> Result<Response, AppError> {
    state
        .services
        .friend_requests
        .cancel(current.user.id, request_id)
        .await?;
    Ok(see_other("/friend_requests", Some(Flash::FriendRequestCanceled)))
}
