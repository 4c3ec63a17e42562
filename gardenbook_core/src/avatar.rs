use md5::{Digest, Md5};

use crate::entity::user;

pub const DEFAULT_AVATAR_SIZE: u32 = 80;

/// `https://www.gravatar.com/avatar/<md5>?s=<size>&d=identicon`, keyed on the
/// trimmed, lowercased address.
pub fn gravatar_url(email: &str, size: u32) -> String {
    let normalized = email.trim().to_lowercase();
    let digest = Md5::digest(normalized.as_bytes());
    format!(
        "https://www.gravatar.com/avatar/{}?s={size}&d=identicon",
        hex::encode(digest)
    )
}

/// Where to load `user`'s picture from: the uploaded avatar when one is
/// stored, Gravatar otherwise.
pub fn avatar_url(user: &user::Model, size: u32) -> String {
    if user.has_avatar() {
        format!("/users/{}/avatar?size={size}", user.id)
    } else {
        gravatar_url(&user.email, size)
    }
}
