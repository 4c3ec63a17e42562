//! Router-level test harness: a fresh database per test and helpers that
//! drive the app with `oneshot`.

use axum::{
    body::{to_bytes, Body, Bytes},
    http::{header, Request},
    response::Response,
    Router,
};
use gardenbook_core::{
    entity::prelude::{DatabaseConnection, UserModel},
    mailer::{MailQueue, MailReceiver, MailSettings},
    service::Services,
    test_utils::{create_session, create_user, setup_test_db},
};
use tower::ServiceExt;

use crate::{app, session::SESSION_COOKIE, state::AppState};

const BOUNDARY: &str = "gardenbook-test-boundary";

pub struct TestApp {
    pub router: Router,
    pub db: DatabaseConnection,
    /// Mail the app has queued; nothing delivers it.
    pub mail: MailReceiver,
}

impl TestApp {
    pub async fn new() -> Self {
        let db = setup_test_db().await;
        let (queue, mail) = MailQueue::new(MailSettings::default());
        let services = Services::new(db.clone(), queue);
        Self {
            router: app(AppState::new(services)),
            db,
            mail,
        }
    }

    /// Insert a user and open a session for them. Returns the session token.
    pub async fn sign_in_as(&self, name: &str) -> (UserModel, String) {
        let user = create_user(&self.db, name).await;
        let session = create_session(&self.db, user.id).await;
        (user, session.token)
    }

    pub async fn send_multipart(
        &self,
        uri: &str,
        token: &str,
        content_type: &str,
        body: Vec<u8>,
    ) -> Response {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::COOKIE, format!("{SESSION_COOKIE}={token}"))
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body))
            .unwrap();
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// POST a single file field.
    pub async fn upload(
        &self,
        uri: &str,
        token: &str,
        field: &str,
        file_name: &str,
        file_type: &str,
        bytes: &[u8],
    ) -> Response {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: {file_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        let content_type = format!("multipart/form-data; boundary={BOUNDARY}");
        self.send_multipart(uri, token, &content_type, body).await
    }
}

/// Build a multipart body from `(name, Some((file_name, content_type)), value)`
/// parts; `None` marks a plain text field.
pub fn multipart_body(parts: &[(&str, Option<(&str, &str)>, &str)]) -> (String, Vec<u8>) {
    let mut body = String::new();
    for (name, file, value) in parts {
        body.push_str(&format!("--{BOUNDARY}\r\n"));
        match file {
            Some((file_name, content_type)) => body.push_str(&format!(
                "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )),
            None => body.push_str(&format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n")),
        }
        body.push_str(value);
        body.push_str("\r\n");
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));
    (
        format!("multipart/form-data; boundary={BOUNDARY}"),
        body.into_bytes(),
    )
}

/// Send one request. `token` becomes the session cookie; `body` is sent as
/// an urlencoded form.
pub async fn call(
    router: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: &str,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::COOKIE, format!("{SESSION_COOKIE}={token}"));
    }
    if method != "GET" {
        builder = builder.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    }
    let request = builder.body(Body::from(body.to_string())).unwrap();
    router.clone().oneshot(request).await.unwrap()
}

pub async fn body_bytes(response: Response) -> Bytes {
    to_bytes(response.into_body(), usize::MAX).await.unwrap()
}

pub async fn body_text(response: Response) -> String {
    String::from_utf8(body_bytes(response).await.to_vec()).unwrap()
}

pub fn location(response: &Response) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

pub fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::to_string)
        .collect()
}
