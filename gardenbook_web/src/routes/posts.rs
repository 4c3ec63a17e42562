use axum::{
    extract::{Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use gardenbook_core::{ids::PostId, service::posts::PostsServiceError};

use super::{IdPath, MultipartForm};
use crate::{
    error::AppError,
    pages,
    session::{page, see_other, CurrentUser, Flash, IncomingFlash},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/posts", get(index).post(create))
        .route("/posts/new", get(new))
        .route("/posts/{id}", get(show).post(update))
        .route("/posts/{id}/edit", get(edit))
        .route("/posts/{id}/delete", post(destroy))
        .route("/posts/{id}/image", get(image))
}

async fn index(
    State(state): State<AppState>,
    current: CurrentUser,
    flash: IncomingFlash,
) -> Result<Response, AppError> {
    let entries = state.services.posts.feed(current.user.id).await?;
    Ok(page(StatusCode::OK, flash, pages::feed(&current.user, flash, &entries)))
}

async fn new(current: CurrentUser) -> Response {
    page(
        StatusCode::OK,
        IncomingFlash::default(),
        pages::post_form(&current.user, "/posts", "New post", "", None),
    )
}

async fn create(
    State(state): State<AppState>,
    current: CurrentUser,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let mut form = MultipartForm::read(multipart).await?;
    let content = form.text("content");
    let image = form.take_file("image");

    match state
        .services
        .posts
        .create(current.user.id, content.clone(), image)
        .await
    {
        Ok(post) => Ok(see_other(&format!("/posts/{}", post.id), Some(Flash::PostCreated))),
        Err(PostsServiceError::Invalid(errors)) => Ok(page(
            StatusCode::UNPROCESSABLE_ENTITY,
            IncomingFlash::default(),
            pages::post_form(&current.user, "/posts", "New post", &content, Some(&errors)),
        )),
        Err(error) => Err(error.into()),
    }
}

async fn show(
    State(state): State<AppState>,
    IdPath(post_id): IdPath<PostId>,
    current: CurrentUser,
    flash: IncomingFlash,
) -> Result<Response, AppError> {
    let post_page = state
        .services
        .posts
        .post_with_thread(current.user.id, post_id)
        .await?;
    Ok(page(StatusCode::OK, flash, pages::post_show(&current.user, flash, &post_page)))
}

async fn edit(
    State(state): State<AppState>,
    IdPath(post_id): IdPath<PostId>,
    current: CurrentUser,
) -> Result<Response, AppError> {
    let post = state.services.posts.find_owned(current.user.id, post_id).await?;
    Ok(page(
        StatusCode::OK,
        IncomingFlash::default(),
        pages::post_form(
            &current.user,
            &format!("/posts/{}", post.id),
            "Edit post",
            &post.content,
            None,
        ),
    ))
}

async fn update(
    State(state): State<AppState>,
    IdPath(post_id): IdPath<PostId>,
    current: CurrentUser,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let mut form = MultipartForm::read(multipart).await?;
    let content = form.text("content");
    let image = form.take_file("image");

    match state
        .services
        .posts
        .update(current.user.id, post_id, content.clone(), image)
        .await
    {
        Ok(_) => Ok(see_other("/posts", None)),
        Err(PostsServiceError::Invalid(errors)) => Ok(page(
            StatusCode::UNPROCESSABLE_ENTITY,
            IncomingFlash::default(),
            pages::post_form(
                &current.user,
                &format!("/posts/{post_id}"),
                "Edit post",
                &content,
                Some(&errors),
            ),
        )),
        Err(error) => Err(error.into()),
    }
}

async fn destroy(
    State(state): State<AppState>,
    IdPath(post_id): IdPath<PostId>,
    current: CurrentUser,
) -> Result<Response, AppError> {
    state.services.posts.delete(current.user.id, post_id).await?;
    Ok(see_other("/posts", Some(Flash::PostDeleted)))
}

async fn image(
    State(state): State<AppState>,
    IdPath(post_id): IdPath<PostId>,
    current: CurrentUser,
) -> Result<Response, AppError> {
    let (bytes, content_type) = state
        .services
        .posts
        .image(current.user.id, post_id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response())
}

#[cfg(test)]
mod tests {
    use crate::test_support::{body_text, call, location, multipart_body, set_cookies, TestApp};
    use axum::http::StatusCode;
    use gardenbook_core::{
        entity::prelude::*,
        ids::PostId,
        test_utils::{create_comment, create_like, create_post, create_user, make_friends},
    };

    #[tokio::test]
    async fn test_feed_shows_own_and_friends_posts() {
        let app = TestApp::new().await;
        let (alice, token) = app.sign_in_as("Alice").await;
        let bob = create_user(&app.db, "Bob").await;
        let stranger = create_user(&app.db, "Stranger").await;
        make_friends(&app.db, alice.id, bob.id).await;

        create_post(&app.db, alice.id, "roses").await;
        create_post(&app.db, bob.id, "lilies").await;
        create_post(&app.db, stranger.id, "weeds").await;

        let response = call(&app.router, "GET", "/posts", Some(&token), "").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains("roses"));
        assert!(body.contains("lilies"));
        assert!(!body.contains("weeds"));
        assert!(body.contains("0 likes"));
        assert!(body.contains("0 comments"));
    }

    #[tokio::test]
    async fn test_feed_renders_counts_and_flash() {
        let app = TestApp::new().await;
        let (alice, token) = app.sign_in_as("Alice").await;
        let bob = create_user(&app.db, "Bob").await;
        let post = create_post(&app.db, alice.id, "roses").await;
        create_like(&app.db, bob.id, Target::Post(post.id)).await;
        create_comment(&app.db, bob.id, Target::Post(post.id), "lovely").await;

        let mut request_cookie = token.clone();
        request_cookie.push_str("; gardenbook_flash=post_created");
        let response = call(&app.router, "GET", "/posts", Some(&request_cookie), "").await;

        let cookies = set_cookies(&response);
        assert!(cookies.iter().any(|c| c.starts_with("gardenbook_flash=;")));
        let body = body_text(response).await;
        assert!(body.contains("1 like<"));
        assert!(body.contains("1 comment<"));
        assert!(body.contains("New post created"));
    }

    #[tokio::test]
    async fn test_create_post_redirects_to_post() {
        let app = TestApp::new().await;
        let (alice, token) = app.sign_in_as("Alice").await;

        let (content_type, body) = multipart_body(&[("content", None, "Tomatoes are in!")]);
        let response = app.send_multipart("/posts", &token, &content_type, body).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let post = Post::find().one(&app.db).await.unwrap().unwrap();
        assert_eq!(post.user_id, alice.id);
        assert_eq!(post.content, "Tomatoes are in!");
        assert_eq!(location(&response), format!("/posts/{}", post.id));
    }

    #[tokio::test]
    async fn test_create_post_with_image() {
        let app = TestApp::new().await;
        let (_, token) = app.sign_in_as("Alice").await;

        let (content_type, body) = multipart_body(&[
            ("content", None, "Look at this"),
            ("image", Some(("bed.png", "image/png")), "PNGDATA"),
        ]);
        let response = app.send_multipart("/posts", &token, &content_type, body).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let post = Post::find().one(&app.db).await.unwrap().unwrap();
        assert!(post.has_image());

        let uri = format!("/posts/{}/image", post.id);
        let response = call(&app.router, "GET", &uri, Some(&token), "").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "image/png");
        assert_eq!(body_text(response).await, "PNGDATA");
    }

    #[tokio::test]
    async fn test_create_post_without_content_is_unprocessable() {
        let app = TestApp::new().await;
        let (_, token) = app.sign_in_as("Alice").await;

        let (content_type, body) = multipart_body(&[("content", None, "  ")]);
        let response = app.send_multipart("/posts", &token, &content_type, body).await;

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_text(response).await;
        assert!(body.contains("error_explanation"));
        assert!(body.contains("Content can&#39;t be blank"));
        assert_eq!(Post::find().count(&app.db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_show_post_admits_owner_and_friends_only() {
        let app = TestApp::new().await;
        let (alice, _) = app.sign_in_as("Alice").await;
        let (bob, bob_token) = app.sign_in_as("Bob").await;
        let (_, stranger_token) = app.sign_in_as("Stranger").await;
        make_friends(&app.db, alice.id, bob.id).await;

        let post = create_post(&app.db, alice.id, "roses").await;
        let comment = create_comment(&app.db, bob.id, Target::Post(post.id), "lovely").await;
        create_comment(&app.db, alice.id, Target::Comment(comment.id), "thanks!").await;

        let uri = format!("/posts/{}", post.id);
        let response = call(&app.router, "GET", &uri, Some(&bob_token), "").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains("2 comments"));
        assert!(body.find("lovely").unwrap() < body.find("thanks!").unwrap());
        assert!(body.contains("depth-1"));

        let response = call(&app.router, "GET", &uri, Some(&stranger_token), "").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let missing = format!("/posts/{}", PostId::new());
        let response = call(&app.router, "GET", &missing, Some(&bob_token), "").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_post() {
        let app = TestApp::new().await;
        let (alice, token) = app.sign_in_as("Alice").await;
        let post = create_post(&app.db, alice.id, "roses").await;
        let uri = format!("/posts/{}", post.id);

        let (content_type, body) = multipart_body(&[("content", None, "red roses")]);
        let response = app.send_multipart(&uri, &token, &content_type, body).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/posts");

        let (content_type, body) = multipart_body(&[("content", None, "")]);
        let response = app.send_multipart(&uri, &token, &content_type, body).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let post = Post::find_by_id(post.id).one(&app.db).await.unwrap().unwrap();
        assert_eq!(post.content, "red roses");
    }

    #[tokio::test]
    async fn test_other_users_cannot_edit_or_delete() {
        let app = TestApp::new().await;
        let (alice, _) = app.sign_in_as("Alice").await;
        let (bob, bob_token) = app.sign_in_as("Bob").await;
        make_friends(&app.db, alice.id, bob.id).await;
        let post = create_post(&app.db, alice.id, "roses").await;

        let response = call(&app.router, "GET", &format!("/posts/{}/edit", post.id), Some(&bob_token), "").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let (content_type, body) = multipart_body(&[("content", None, "hijacked")]);
        let response = app
            .send_multipart(&format!("/posts/{}", post.id), &bob_token, &content_type, body)
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = call(&app.router, "POST", &format!("/posts/{}/delete", post.id), Some(&bob_token), "").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let post = Post::find_by_id(post.id).one(&app.db).await.unwrap().unwrap();
        assert_eq!(post.content, "roses");
    }

    #[tokio::test]
    async fn test_delete_post_removes_thread() {
        let app = TestApp::new().await;
        let (alice, token) = app.sign_in_as("Alice").await;
        let bob = create_user(&app.db, "Bob").await;
        let post = create_post(&app.db, alice.id, "roses").await;
        let comment = create_comment(&app.db, bob.id, Target::Post(post.id), "lovely").await;
        let reply = create_comment(&app.db, alice.id, Target::Comment(comment.id), "thanks").await;
        create_like(&app.db, bob.id, Target::Post(post.id)).await;
        create_like(&app.db, bob.id, Target::Comment(reply.id)).await;

        let response = call(&app.router, "POST", &format!("/posts/{}/delete", post.id), Some(&token), "").await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/posts");

        assert_eq!(Post::find().count(&app.db).await.unwrap(), 0);
        assert_eq!(Comment::find().count(&app.db).await.unwrap(), 0);
        assert_eq!(Like::find().count(&app.db).await.unwrap(), 0);
    }
}
