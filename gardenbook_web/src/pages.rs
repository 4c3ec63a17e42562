//! Server-rendered HTML. Every piece of user data goes through `escape`.

use gardenbook_core::{
    avatar::{avatar_url, DEFAULT_AVATAR_SIZE},
    entity::prelude::{AttachmentTarget, PostModel, Target, UserModel},
    error::ValidationErrors,
    html::escape,
    service::{
        friend_requests::{PendingRequests, Relationship},
        posts::{FeedEntry, PostPage},
    },
};
use std::fmt::Write;

use crate::session::{Flash, IncomingFlash};

const DATE_FORMAT: &str = "%B %-d, %Y %H:%M";

/// `1 like`, `2 likes`, `0 comments`
pub fn pluralize(count: u64, singular: &str) -> String {
    if count == 1 {
        format!("1 {singular}")
    } else {
        format!("{count} {singular}s")
    }
}

fn nav(user: Option<&UserModel>) -> String {
    match user {
        Some(user) => format!(
            r#"<nav>
<a href="/posts">Feed</a> <a href="/posts/new">New post</a> <a href="/users">Gardeners</a> <a href="/friend_requests">Friend requests</a>
<a href="/users/{id}"><img class="avatar" src="{avatar}" width="24" height="24" alt=""> {name}</a>
<form method="post" action="/users/sign_out" class="inline"><button type="submit">Sign out</button></form>
</nav>"#,
            id = user.id,
            avatar = escape(&avatar_url(user, 24)),
            name = escape(&user.name),
        ),
        None => r#"<nav><a href="/users/sign_in">Sign in</a> <a href="/users/sign_up">Sign up</a></nav>"#
            .to_string(),
    }
}

fn flash_block(flash: Option<Flash>) -> String {
    match flash {
        Some(flash) if flash.is_alert() => {
            format!(r#"<p class="alert">{}</p>"#, escape(flash.text()))
        }
        Some(flash) => format!(r#"<p class="notice">{}</p>"#, escape(flash.text())),
        None => String::new(),
    }
}

pub fn layout(title: &str, user: Option<&UserModel>, flash: IncomingFlash, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>{title} | GardenBook</title></head>
<body>
{nav}
{flash}
<main>
{body}
</main>
</body>
</html>
"#,
        title = escape(title),
        nav = nav(user),
        flash = flash_block(flash.0),
    )
}

/// The `error_explanation` block shown above a form that failed validation.
pub fn error_explanation(errors: Option<&ValidationErrors>) -> String {
    let Some(errors) = errors.filter(|e| !e.is_empty()) else {
        return String::new();
    };
    let count = errors.len() as u64;
    let mut out = format!(
        "<div id=\"error_explanation\">\n<h2>{} prohibited this from being saved:</h2>\n<ul>\n",
        pluralize(count, "error")
    );
    for message in errors.full_messages() {
        let _ = writeln!(out, "<li>{}</li>", escape(&message));
    }
    out.push_str("</ul>\n</div>");
    out
}

pub fn not_found() -> String {
    layout(
        "Not found",
        None,
        IncomingFlash::default(),
        "<h1>Not found</h1>\n<p>The page you were looking for doesn't exist.</p>",
    )
}

pub fn invalid(errors: &ValidationErrors) -> String {
    layout(
        "Unprocessable",
        None,
        IncomingFlash::default(),
        &error_explanation(Some(errors)),
    )
}

pub fn sign_up(name: &str, email: &str, errors: Option<&ValidationErrors>) -> String {
    let body = format!(
        r#"<h1>Sign up</h1>
{errors}
<form method="post" action="/users">
<label>Name <input type="text" name="name" value="{name}"></label>
<label>Email <input type="email" name="email" value="{email}"></label>
<label>Password <input type="password" name="password"></label>
<label>Password confirmation <input type="password" name="password_confirmation"></label>
<button type="submit">Sign up</button>
</form>
<p><a href="/users/sign_in">Sign in</a></p>"#,
        errors = error_explanation(errors),
        name = escape(name),
        email = escape(email),
    );
    layout("Sign up", None, IncomingFlash::default(), &body)
}

pub fn sign_in(email: &str, flash: IncomingFlash, errors: Option<&ValidationErrors>) -> String {
    let body = format!(
        r#"<h1>Sign in</h1>
{errors}
<form method="post" action="/users/sign_in">
<label>Email <input type="email" name="email" value="{email}"></label>
<label>Password <input type="password" name="password"></label>
<button type="submit">Sign in</button>
</form>
<p><a href="/users/sign_up">Sign up</a></p>"#,
        errors = error_explanation(errors),
        email = escape(email),
    );
    layout("Sign in", None, flash, &body)
}

fn author_line(author: &UserModel) -> String {
    format!(
        r#"<a href="/users/{id}"><img class="avatar" src="{avatar}" width="40" height="40" alt=""> {name}</a>"#,
        id = author.id,
        avatar = escape(&avatar_url(author, 40)),
        name = escape(&author.name),
    )
}

fn post_image(post: &PostModel) -> String {
    if post.has_image() {
        format!(r#"<img class="post-image" src="/posts/{}/image" alt="">"#, post.id)
    } else {
        String::new()
    }
}

fn like_button(target: Target, like: Option<String>) -> String {
    match like {
        Some(like_id) => format!(
            r#"<form method="post" action="/likes/{like_id}/delete" class="inline"><button type="submit">Unlike</button></form>"#
        ),
        None => {
            let action = match target {
                Target::Post(id) => format!("/posts/{id}/likes"),
                Target::Comment(id) => format!("/comments/{id}/likes"),
            };
            format!(
                r#"<form method="post" action="{action}" class="inline"><button type="submit">Like</button></form>"#
            )
        }
    }
}

fn owner_controls(post: &PostModel) -> String {
    format!(
        r#"<a href="/posts/{id}/edit">Edit</a>
<form method="post" action="/posts/{id}/delete" class="inline"><button type="submit">Delete</button></form>"#,
        id = post.id
    )
}

pub fn feed(user: &UserModel, flash: IncomingFlash, entries: &[FeedEntry]) -> String {
    let mut body = String::from("<h1>Feed</h1>\n<p><a href=\"/posts/new\">New post</a></p>\n");
    if entries.is_empty() {
        body.push_str("<p>No posts yet. Add some friends or share something from your garden.</p>\n");
    }
    for entry in entries {
        let controls = if entry.post.user_id == user.id {
            owner_controls(&entry.post)
        } else {
            String::new()
        };
        let _ = writeln!(
            body,
            r#"<article class="post" id="post_{id}">
<header>{author} <time>{date}</time></header>
<p>{content}</p>
{image}
<footer>
<span class="likes">{likes}</span> <a href="/posts/{id}">{comments}</a>
{like}
{controls}
</footer>
</article>"#,
            id = entry.post.id,
            author = author_line(&entry.author),
            date = entry.post.created_at.format(DATE_FORMAT),
            content = escape(&entry.post.content),
            image = post_image(&entry.post),
            likes = pluralize(entry.like_count, "like"),
            comments = pluralize(entry.comment_count, "comment"),
            like = like_button(entry.post.target(), entry.viewer_like.map(|id| id.to_string())),
        );
    }
    layout("Feed", Some(user), flash, &body)
}

pub fn post_form(
    user: &UserModel,
    action: &str,
    title: &str,
    content: &str,
    errors: Option<&ValidationErrors>,
) -> String {
    let body = format!(
        r#"<h1>{title}</h1>
{errors}
<form method="post" action="{action}" enctype="multipart/form-data">
<label>Content <textarea name="content">{content}</textarea></label>
<label>Image <input type="file" name="image" accept="image/*"></label>
<button type="submit">Save</button>
</form>
<p><a href="/posts">Back</a></p>"#,
        title = escape(title),
        errors = error_explanation(errors),
        action = escape(action),
        content = escape(content),
    );
    layout(title, Some(user), IncomingFlash::default(), &body)
}

fn comment_form(action: &str, button: &str, content: &str) -> String {
    format!(
        r#"<form method="post" action="{action}" class="comment-form">
<textarea name="content">{content}</textarea>
<button type="submit">{button}</button>
</form>"#,
        action = escape(action),
        content = escape(content),
        button = escape(button),
    )
}

pub fn post_show(user: &UserModel, flash: IncomingFlash, page: &PostPage) -> String {
    let post_target = page.post.target();
    let controls = if page.post.user_id == user.id {
        owner_controls(&page.post)
    } else {
        String::new()
    };

    let mut body = format!(
        r#"<article class="post" id="post_{id}">
<header>{author} <time>{date}</time></header>
<p>{content}</p>
{image}
<footer>
<span class="likes">{likes}</span>
{like}
{controls}
</footer>
</article>
<section class="comments">
<h2>{count}</h2>
"#,
        id = page.post.id,
        author = author_line(&page.author),
        date = page.post.created_at.format(DATE_FORMAT),
        content = escape(&page.post.content),
        image = post_image(&page.post),
        likes = pluralize(page.like_count, "like"),
        like = like_button(post_target, page.viewer_likes.get(&post_target).map(|id| id.to_string())),
        count = pluralize(page.thread.len() as u64, "comment"),
    );

    for (depth, node) in page.thread.walk() {
        let target = node.comment.target();
        let own = if node.comment.user_id == user.id {
            format!(
                r#"<details><summary>Edit</summary>{edit}</details>
<form method="post" action="/comments/{id}/delete" class="inline"><button type="submit">Delete</button></form>"#,
                id = node.comment.id,
                edit = comment_form(
                    &format!("/comments/{}", node.comment.id),
                    "Update comment",
                    &node.comment.content
                ),
            )
        } else {
            String::new()
        };
        let _ = writeln!(
            body,
            r#"<div class="comment depth-{depth}" id="comment_{id}">
<header>{author} <time>{date}</time></header>
<p>{content}</p>
<span class="likes">{likes}</span>
{like}
{own}
<details><summary>Reply</summary>{reply}</details>
</div>"#,
            id = node.comment.id,
            author = author_line(&node.author),
            date = node.comment.created_at.format(DATE_FORMAT),
            content = escape(&node.comment.content),
            likes = pluralize(node.like_count, "like"),
            like = like_button(target, page.viewer_likes.get(&target).map(|id| id.to_string())),
            reply = comment_form(
                &format!("/comments/{}/comments", node.comment.id),
                "Reply",
                ""
            ),
        );
    }

    body.push_str(&comment_form(
        &format!("/posts/{}/comments", page.post.id),
        "Add comment",
        "",
    ));
    body.push_str("\n</section>");

    layout("Post", Some(user), flash, &body)
}

/// A comment form redisplayed after a failed submission.
pub fn comment_page(
    user: &UserModel,
    action: &str,
    content: &str,
    errors: &ValidationErrors,
) -> String {
    let body = format!(
        "<h1>Comment</h1>\n{errors}\n{form}",
        errors = error_explanation(Some(errors)),
        form = comment_form(action, "Save comment", content),
    );
    layout("Comment", Some(user), IncomingFlash::default(), &body)
}

fn relationship_badge(other: &UserModel, relationship: Relationship) -> String {
    match relationship {
        Relationship::Myself => String::new(),
        Relationship::Friends => r#"<span class="badge">Friends</span>"#.to_string(),
        Relationship::Pending => r#"<span class="badge">Request pending</span>"#.to_string(),
        Relationship::None => format!(
            r#"<form method="post" action="/friend_requests" class="inline">
<input type="hidden" name="receiver_id" value="{id}">
<button type="submit">Add friend</button>
</form>"#,
            id = other.id
        ),
    }
}

pub fn users_index(
    user: &UserModel,
    flash: IncomingFlash,
    others: &[(UserModel, Relationship)],
) -> String {
    let mut body = String::from("<h1>Gardeners</h1>\n<ul class=\"users\">\n");
    for (other, relationship) in others {
        let _ = writeln!(
            body,
            "<li>{author} {badge}</li>",
            author = author_line(other),
            badge = relationship_badge(other, *relationship),
        );
    }
    body.push_str("</ul>");
    layout("Gardeners", Some(user), flash, &body)
}

pub fn user_show(
    viewer: &UserModel,
    flash: IncomingFlash,
    profile: &UserModel,
    relationship: Relationship,
    posts: &[PostModel],
) -> String {
    let controls = match relationship {
        Relationship::Myself => format!(
            r#"<p><a href="/users/{id}/edit">Edit profile</a></p>"#,
            id = profile.id
        ),
        other => relationship_badge(profile, other),
    };
    let mut body = format!(
        r#"<h1><img class="avatar" src="{avatar}" width="{size}" height="{size}" alt=""> {name}</h1>
{controls}
<h2>{count}</h2>
"#,
        avatar = escape(&avatar_url(profile, DEFAULT_AVATAR_SIZE)),
        size = DEFAULT_AVATAR_SIZE,
        name = escape(&profile.name),
        count = pluralize(posts.len() as u64, "post"),
    );
    for post in posts {
        let _ = writeln!(
            body,
            r#"<article class="post" id="post_{id}">
<time>{date}</time>
<p>{content}</p>
{image}
</article>"#,
            id = post.id,
            date = post.created_at.format(DATE_FORMAT),
            content = escape(&post.content),
            image = post_image(post),
        );
    }
    layout(&profile.name, Some(viewer), flash, &body)
}

pub fn user_edit(user: &UserModel, name: &str, errors: Option<&ValidationErrors>) -> String {
    let body = format!(
        r#"<h1>Edit profile</h1>
{errors}
<form method="post" action="/users/{id}">
<label>Name <input type="text" name="name" value="{name}"></label>
<button type="submit">Update profile</button>
</form>
<h2>Avatar</h2>
<img class="avatar" src="{avatar}" width="{size}" height="{size}" alt="">
<form method="post" action="/users/{id}/avatar" enctype="multipart/form-data">
<input type="file" name="avatar" accept="image/*">
<button type="submit">Upload avatar</button>
</form>
<h2>Delete account</h2>
<form method="post" action="/users/{id}/delete">
<button type="submit">Delete my account</button>
</form>"#,
        errors = error_explanation(errors),
        id = user.id,
        name = escape(name),
        avatar = escape(&avatar_url(user, DEFAULT_AVATAR_SIZE)),
        size = DEFAULT_AVATAR_SIZE,
    );
    layout("Edit profile", Some(user), IncomingFlash::default(), &body)
}

pub fn friend_requests(user: &UserModel, flash: IncomingFlash, pending: &PendingRequests) -> String {
    let mut body = String::from("<h1>Friend requests</h1>\n<h2>Received</h2>\n<ul>\n");
    if pending.received.is_empty() {
        body.push_str("<li>No pending requests.</li>\n");
    }
    for (request, sender) in &pending.received {
        let _ = writeln!(
            body,
            r#"<li>{author}
<form method="post" action="/friend_requests/{id}" class="inline"><input type="hidden" name="status" value="accepted"><button type="submit">Accept</button></form>
<form method="post" action="/friend_requests/{id}" class="inline"><input type="hidden" name="status" value="rejected"><button type="submit">Reject</button></form>
</li>"#,
            author = author_line(sender),
            id = request.id,
        );
    }
    body.push_str("</ul>\n<h2>Sent</h2>\n<ul>\n");
    if pending.sent.is_empty() {
        body.push_str("<li>No pending requests.</li>\n");
    }
    for (request, receiver) in &pending.sent {
        let _ = writeln!(
            body,
            r#"<li>{author}
<form method="post" action="/friend_requests/{id}/delete" class="inline"><button type="submit">Cancel</button></form>
</li>"#,
            author = author_line(receiver),
            id = request.id,
        );
    }
    body.push_str("</ul>");
    layout("Friend requests", Some(user), flash, &body)
}
