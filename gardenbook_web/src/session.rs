//! Cookie handling: the signed-in user and one-shot flash messages.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
};
use gardenbook_core::{entity::prelude::UserModel, error::ResourceError};
use std::convert::Infallible;

use crate::{error::AppError, state::AppState};

pub const SESSION_COOKIE: &str = "gardenbook_session";
pub const FLASH_COOKIE: &str = "gardenbook_flash";

/// Value of cookie `name` from the request's `Cookie` headers.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

fn set_cookie(name: &str, value: &str) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!("{name}={value}; Path=/; HttpOnly; SameSite=Lax")).ok()
}

fn clear_cookie(name: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("{name}=; Path=/; Max-Age=0"))
        .unwrap_or_else(|_| HeaderValue::from_static("invalid=; Max-Age=0"))
}

pub fn session_cookie(token: &str) -> Option<HeaderValue> {
    set_cookie(SESSION_COOKIE, token)
}

pub fn clear_session_cookie() -> HeaderValue {
    clear_cookie(SESSION_COOKIE)
}

/// Fixed set of flash messages. Only the code travels in the cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flash {
    SignedUp,
    SignedIn,
    SignedOut,
    PostCreated,
    PostDeleted,
    CommentPosted,
    CommentRemoved,
    Liked,
    LikeFailed,
    LikeRemoved,
    FriendRequestSent,
    FriendRequestFailed,
    FriendRequestAccepted,
    FriendRequestRejected,
    FriendRequestCanceled,
    ProfileUpdated,
    OwnProfileOnly,
    AccountDeleted,
}

impl Flash {
    const ALL: [Flash; 18] = [
        Flash::SignedUp,
        Flash::SignedIn,
        Flash::SignedOut,
        Flash::PostCreated,
        Flash::PostDeleted,
        Flash::CommentPosted,
        Flash::CommentRemoved,
        Flash::Liked,
        Flash::LikeFailed,
        Flash::LikeRemoved,
        Flash::FriendRequestSent,
        Flash::FriendRequestFailed,
        Flash::FriendRequestAccepted,
        Flash::FriendRequestRejected,
        Flash::FriendRequestCanceled,
        Flash::ProfileUpdated,
        Flash::OwnProfileOnly,
        Flash::AccountDeleted,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Flash::SignedUp => "signed_up",
            Flash::SignedIn => "signed_in",
            Flash::SignedOut => "signed_out",
            Flash::PostCreated => "post_created",
            Flash::PostDeleted => "post_deleted",
            Flash::CommentPosted => "comment_posted",
            Flash::CommentRemoved => "comment_removed",
            Flash::Liked => "liked",
            Flash::LikeFailed => "like_failed",
            Flash::LikeRemoved => "like_removed",
            Flash::FriendRequestSent => "friend_request_sent",
            Flash::FriendRequestFailed => "friend_request_failed",
            Flash::FriendRequestAccepted => "friend_request_accepted",
            Flash::FriendRequestRejected => "friend_request_rejected",
            Flash::FriendRequestCanceled => "friend_request_canceled",
            Flash::ProfileUpdated => "profile_updated",
            Flash::OwnProfileOnly => "own_profile_only",
            Flash::AccountDeleted => "account_deleted",
        }
    }

    pub fn from_code(code: &str) -> Option<Flash> {
        Flash::ALL.into_iter().find(|flash| flash.code() == code)
    }

    pub fn text(&self) -> &'static str {
        match self {
            Flash::SignedUp => "Welcome! You have signed up successfully.",
            Flash::SignedIn => "Signed in successfully.",
            Flash::SignedOut => "Signed out successfully.",
            Flash::PostCreated => "New post created",
            Flash::PostDeleted => "Post deleted",
            Flash::CommentPosted => "Comment posted.",
            Flash::CommentRemoved => "Comment removed.",
            Flash::Liked => "Successfully liked!",
            Flash::LikeFailed => "Couldn't add like.",
            Flash::LikeRemoved => "Like removed.",
            Flash::FriendRequestSent => "Friend request sent!",
            Flash::FriendRequestFailed => "Couldn't send friend request.",
            Flash::FriendRequestAccepted => "Friend request accepted!",
            Flash::FriendRequestRejected => "Friend request rejected.",
            Flash::FriendRequestCanceled => "Friend request canceled.",
            Flash::ProfileUpdated => "Profile updated successfully!",
            Flash::OwnProfileOnly => "You can only edit your own profile.",
            Flash::AccountDeleted => "Your account has been deleted.",
        }
    }

    /// Alerts render in red, notices in green.
    pub fn is_alert(&self) -> bool {
        matches!(
            self,
            Flash::LikeFailed | Flash::FriendRequestFailed | Flash::OwnProfileOnly
        )
    }
}

/// The flash left by the previous redirect, if any.
#[derive(Debug, Clone, Copy, Default)]
pub struct IncomingFlash(pub Option<Flash>);

impl<S: Send + Sync> FromRequestParts<S> for IncomingFlash {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let flash = read_cookie(&parts.headers, FLASH_COOKIE).and_then(|code| Flash::from_code(&code));
        Ok(IncomingFlash(flash))
    }
}

/// 303 See Other to `location`, optionally carrying a flash.
pub fn see_other(location: &str, flash: Option<Flash>) -> Response {
    let mut response = StatusCode::SEE_OTHER.into_response();
    if let Ok(value) = HeaderValue::from_str(location) {
        response.headers_mut().insert(header::LOCATION, value);
    }
    if let Some(cookie) = flash.and_then(|flash| set_cookie(FLASH_COOKIE, flash.code())) {
        response.headers_mut().append(header::SET_COOKIE, cookie);
    }
    response
}

/// Render an HTML page, consuming the incoming flash.
pub fn page(status: StatusCode, flash: IncomingFlash, html: String) -> Response {
    let mut response = (status, Html(html)).into_response();
    if flash.0.is_some() {
        response
            .headers_mut()
            .append(header::SET_COOKIE, clear_cookie(FLASH_COOKIE));
    }
    response
}

/// The signed-in user. Requests without a live session are sent to the
/// sign-in page.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: UserModel,
    pub token: String,
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = read_cookie(&parts.headers, SESSION_COOKIE).ok_or(AppError::SignInRequired)?;

        let user = state
            .services
            .users
            .user_for_session(&token)
            .await
            .map_err(ResourceError::from)?
            .ok_or(AppError::SignInRequired)?;

        Ok(CurrentUser { user, token })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; gardenbook_session=abc123; other=1"),
        );
        assert_eq!(read_cookie(&headers, SESSION_COOKIE).as_deref(), Some("abc123"));
        assert_eq!(read_cookie(&headers, FLASH_COOKIE), None);
    }

    #[test]
    fn test_flash_codes_round_trip() {
        for flash in Flash::ALL {
            assert_eq!(Flash::from_code(flash.code()), Some(flash));
        }
        assert_eq!(Flash::from_code("nope"), None);
    }

    #[test]
    fn test_see_other_sets_location_and_flash() {
        let response = see_other("/posts", Some(Flash::PostDeleted));
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/posts");
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("gardenbook_flash=post_deleted;"));
    }
}
