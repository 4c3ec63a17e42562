use axum::{
    extract::{Multipart, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Router,
};
use gardenbook_core::{
    avatar::{gravatar_url, DEFAULT_AVATAR_SIZE},
    ids::UserId,
    service::{
        friend_requests::Relationship,
        users::{SignUp, UsersServiceError},
    },
    upload::Upload,
};
use serde::Deserialize;
use tracing::info;

use super::{IdPath, MultipartForm};
use crate::{
    error::AppError,
    pages,
    session::{clear_session_cookie, page, see_other, session_cookie, CurrentUser, Flash, IncomingFlash},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(index).post(create))
        .route("/users/sign_up", get(sign_up_form))
        .route("/users/sign_in", get(sign_in_form).post(sign_in))
        .route("/users/sign_out", post(sign_out))
        .route("/users/{id}", get(show).post(update))
        .route("/users/{id}/edit", get(edit))
        .route("/users/{id}/avatar", get(avatar).post(upload_avatar))
        .route("/users/{id}/delete", post(destroy))
}

/// Redirect carrying a fresh session cookie.
fn signed_in(location: &str, flash: Flash, token: &str) -> Response {
    let mut response = see_other(location, Some(flash));
    if let Some(cookie) = session_cookie(token) {
        response.headers_mut().append(header::SET_COOKIE, cookie);
    }
    response
}

async fn sign_up_form() -> Response {
    page(StatusCode::OK, IncomingFlash::default(), pages::sign_up("", "", None))
}

#[derive(Debug, Deserialize)]
struct SignUpForm {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
    password_confirmation: Option<String>,
}

async fn create(
    State(state): State<AppState>,
    Form(form): Form<SignUpForm>,
) -> Result<Response, AppError> {
    let signup = SignUp {
        name: form.name.clone(),
        email: form.email.clone(),
        password: form.password,
        password_confirmation: form.password_confirmation,
    };

    match state.services.users.sign_up(signup).await {
        Ok((_, session)) => Ok(signed_in("/posts", Flash::SignedUp, &session.token)),
        Err(UsersServiceError::Invalid(errors)) => Ok(page(
            StatusCode::UNPROCESSABLE_ENTITY,
            IncomingFlash::default(),
            pages::sign_up(&form.name, &form.email, Some(&errors)),
        )),
        Err(error) => Err(error.into()),
    }
}

async fn sign_in_form(flash: IncomingFlash) -> Response {
    page(StatusCode::OK, flash, pages::sign_in("", flash, None))
}

#[derive(Debug, Deserialize)]
struct SignInForm {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

async fn sign_in(
    State(state): State<AppState>,
    Form(form): Form<SignInForm>,
) -> Result<Response, AppError> {
    match state.services.users.sign_in(&form.email, &form.password).await {
        Ok((_, session)) => Ok(signed_in("/posts", Flash::SignedIn, &session.token)),
        Err(UsersServiceError::Invalid(errors)) => Ok(page(
            StatusCode::UNPROCESSABLE_ENTITY,
            IncomingFlash::default(),
            pages::sign_in(&form.email, IncomingFlash::default(), Some(&errors)),
        )),
        Err(error) => Err(error.into()),
    }
}

async fn sign_out(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Response, AppError> {
    state.services.users.sign_out(&current.token).await?;

    let mut response = see_other("/users/sign_in", Some(Flash::SignedOut));
    response
        .headers_mut()
        .append(header::SET_COOKIE, clear_session_cookie());
    Ok(response)
}

async fn index(
    State(state): State<AppState>,
    current: CurrentUser,
    flash: IncomingFlash,
) -> Result<Response, AppError> {
    let services = &state.services;
    let others = services.users.list_others(current.user.id).await?;

    let relationships = services
        .friend_requests
        .relationships(current.user.id)
        .await?;

    let rows: Vec<_> = others
        .into_iter()
        .map(|other| {
            let relationship = relationships
                .get(&other.id)
                .copied()
                .unwrap_or(Relationship::None);
            (other, relationship)
        })
        .collect();

    Ok(page(StatusCode::OK, flash, pages::users_index(&current.user, flash, &rows)))
}

async fn show(
    State(state): State<AppState>,
    IdPath(user_id): IdPath<UserId>,
    current: CurrentUser,
    flash: IncomingFlash,
) -> Result<Response, AppError> {
    let services = &state.services;
    let profile = services.users.get(user_id).await?;
    let relationship = services
        .friend_requests
        .relationship(current.user.id, profile.id)
        .await?;
    let posts = services.posts.list_by_user(profile.id).await?;

    let html = pages::user_show(&current.user, flash, &profile, relationship, &posts);
    Ok(page(StatusCode::OK, flash, html))
}

async fn edit(IdPath(user_id): IdPath<UserId>, current: CurrentUser) -> Response {
    if user_id != current.user.id {
        return see_other("/posts", Some(Flash::OwnProfileOnly));
    }
    page(
        StatusCode::OK,
        IncomingFlash::default(),
        pages::user_edit(&current.user, &current.user.name, None),
    )
}

#[derive(Debug, Deserialize)]
struct ProfileForm {
    #[serde(default)]
    name: String,
}

async fn update(
    State(state): State<AppState>,
    IdPath(user_id): IdPath<UserId>,
    current: CurrentUser,
    Form(form): Form<ProfileForm>,
) -> Result<Response, AppError> {
    if user_id != current.user.id {
        return Ok(see_other("/posts", Some(Flash::OwnProfileOnly)));
    }

    match state
        .services
        .users
        .update_profile(current.user.id, user_id, form.name.clone(), None)
        .await
    {
        Ok(user) => Ok(see_other(&format!("/users/{}", user.id), Some(Flash::ProfileUpdated))),
        Err(UsersServiceError::Invalid(errors)) => Ok(page(
            StatusCode::UNPROCESSABLE_ENTITY,
            IncomingFlash::default(),
            pages::user_edit(&current.user, &form.name, Some(&errors)),
        )),
        Err(error) => Err(error.into()),
    }
}

async fn upload_avatar(
    State(state): State<AppState>,
    IdPath(user_id): IdPath<UserId>,
    current: CurrentUser,
    multipart: Multipart,
) -> Result<Response, AppError> {
    if user_id != current.user.id {
        return Ok(see_other("/posts", Some(Flash::OwnProfileOnly)));
    }

    let mut form = MultipartForm::read(multipart).await?;
    let upload = form
        .take_file("avatar")
        .unwrap_or_else(|| Upload::new(Vec::new(), ""));

    match state
        .services
        .users
        .set_avatar(current.user.id, user_id, upload)
        .await
    {
        Ok(user) => Ok(see_other(&format!("/users/{}", user.id), Some(Flash::ProfileUpdated))),
        Err(UsersServiceError::Invalid(errors)) => Ok(page(
            StatusCode::UNPROCESSABLE_ENTITY,
            IncomingFlash::default(),
            pages::user_edit(&current.user, &current.user.name, Some(&errors)),
        )),
        Err(error) => Err(error.into()),
    }
}

#[derive(Debug, Deserialize)]
struct AvatarQuery {
    size: Option<u32>,
}

async fn avatar(
    State(state): State<AppState>,
    IdPath(user_id): IdPath<UserId>,
    Query(query): Query<AvatarQuery>,
) -> Result<Response, AppError> {
    let users = &state.services.users;

    match users.avatar(user_id).await? {
        Some((bytes, content_type)) => {
            Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response())
        }
        None => {
            let user = users.get(user_id).await?;
            let size = query.size.unwrap_or(DEFAULT_AVATAR_SIZE);
            Ok(see_other(&gravatar_url(&user.email, size), None))
        }
    }
}

async fn destroy(
    State(state): State<AppState>,
    IdPath(user_id): IdPath<UserId>,
    current: CurrentUser,
) -> Result<Response, AppError> {
    if user_id != current.user.id {
        return Ok(see_other("/posts", Some(Flash::OwnProfileOnly)));
    }

    state.services.users.delete_account(current.user.id).await?;
    info!(user = %user_id, "account deleted");

    let mut response = see_other("/users/sign_up", Some(Flash::AccountDeleted));
    response
        .headers_mut()
        .append(header::SET_COOKIE, clear_session_cookie());
    Ok(response)
}
