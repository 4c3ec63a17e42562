use axum::{
    extract::{FromRequestParts, Multipart, Path},
    http::request::Parts,
    routing::get,
    Router,
};
use gardenbook_core::{error::ValidationErrors, upload::Upload};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use tracing::debug;

use crate::{error::AppError, session::see_other, state::AppState};

pub mod comments;
pub mod friend_requests;
pub mod likes;
pub mod posts;
pub mod users;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { see_other("/posts", None) }))
        .merge(users::router())
        .merge(posts::router())
        .merge(comments::router())
        .merge(likes::router())
        .merge(friend_requests::router())
}

/// A row id taken from the path. An id that does not parse names no row,
/// so it answers 404 like any other missing record.
#[derive(Debug, Clone, Copy)]
pub struct IdPath<T>(pub T);

impl<T, S> FromRequestParts<S> for IdPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(id)) => Ok(IdPath(id)),
            Err(rejection) => {
                debug!(path = %parts.uri.path(), %rejection, "unparseable id in path");
                Err(AppError::NotFound)
            }
        }
    }
}

/// A `multipart/form-data` body split into text fields and file uploads.
/// File inputs left empty by the browser are dropped.
#[derive(Debug, Default)]
pub struct MultipartForm {
    pub fields: HashMap<String, String>,
    pub files: HashMap<String, Upload>,
}

impl MultipartForm {
    pub async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = MultipartForm::default();

        while let Some(field) = multipart.next_field().await.map_err(unreadable)? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if field.file_name().is_some() {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await.map_err(unreadable)?;
                if !bytes.is_empty() {
                    form.files.insert(name, Upload::new(bytes, content_type));
                }
            } else {
                let text = field.text().await.map_err(unreadable)?;
                form.fields.insert(name, text);
            }
        }

        Ok(form)
    }

    pub fn text(&self, name: &str) -> String {
        self.fields.get(name).cloned().unwrap_or_default()
    }

    pub fn take_file(&mut self, name: &str) -> Option<Upload> {
        self.files.remove(name)
    }
}

fn unreadable(error: axum::extract::multipart::MultipartError) -> AppError {
    AppError::Invalid(ValidationErrors::single("base", error.body_text()))
}

#[cfg(test)]
mod tests {
    use crate::test_support::{call, TestApp};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_malformed_ids_are_not_found() {
        let app = TestApp::new().await;
        let (_, token) = app.sign_in_as("Alice").await;

        let requests = [
            ("GET", "/posts/abc"),
            ("GET", "/posts/abc/edit"),
            ("GET", "/posts/1234/image"),
            ("POST", "/posts/abc/delete"),
            ("POST", "/posts/abc/likes"),
            ("POST", "/posts/abc/comments"),
            ("POST", "/comments/abc/delete"),
            ("POST", "/comments/abc/likes"),
            ("POST", "/likes/abc/delete"),
            ("POST", "/friend_requests/abc"),
            ("POST", "/friend_requests/abc/delete"),
            ("GET", "/users/abc"),
            ("GET", "/users/abc/edit"),
            ("GET", "/users/abc/avatar"),
        ];
        for (method, uri) in requests {
            let response = call(&app.router, method, uri, Some(&token), "").await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{method} {uri}");
        }
    }
}
