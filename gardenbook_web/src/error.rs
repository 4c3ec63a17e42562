use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use gardenbook_core::{
    error::{ResourceError, ValidationErrors},
    service::{
        comments::CommentsServiceError, friend_requests::FriendRequestsServiceError,
        likes::LikesServiceError, posts::PostsServiceError, users::UsersServiceError,
    },
};
use thiserror::Error;
use tracing::error;

use crate::{pages, session::see_other};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("not found")]
    NotFound,

    #[error("sign in required")]
    SignInRequired,

    #[error("validation failed: {0}")]
    Invalid(ValidationErrors),

    #[error("internal error: {0}")]
    Internal(Box<dyn std::error::Error + Send + Sync>),
}

impl From<ResourceError> for AppError {
    fn from(error: ResourceError) -> Self {
        match error {
            ResourceError::Invalid(errors) => AppError::Invalid(errors),
            ResourceError::NotFound => AppError::NotFound,
            ResourceError::Infra(source) => AppError::Internal(source),
        }
    }
}

macro_rules! from_service_error {
    ($($error:ty),* $(,)?) => {
        $(
            impl From<$error> for AppError {
                fn from(error: $error) -> Self {
                    ResourceError::from(error).into()
                }
            }
        )*
    };
}

from_service_error!(
    UsersServiceError,
    FriendRequestsServiceError,
    PostsServiceError,
    CommentsServiceError,
    LikesServiceError,
);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound => {
                (StatusCode::NOT_FOUND, Html(pages::not_found())).into_response()
            }
            AppError::SignInRequired => see_other("/users/sign_in", None),
            AppError::Invalid(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Html(pages::invalid(&errors)),
            )
                .into_response(),
            AppError::Internal(source) => {
                error!(error = %source, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}
