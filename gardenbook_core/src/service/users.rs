use chrono::Utc;
use rand::RngCore;
use sea_orm::{DatabaseConnection, DatabaseTransaction};
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    entity::prelude::*,
    error::{is_unique_violation, ResourceError, ValidationErrors},
    ids::{SessionId, UserId},
    mailer::MailQueue,
    password::{hash_password, verify_password},
    service::comments::purge_thread,
    upload::Upload,
    validation::{self, MIN_PASSWORD_LENGTH, TAKEN},
};

const BAD_CREDENTIALS: &str = "Invalid email or password.";
const CONFIRMATION_MISMATCH: &str = "doesn't match Password";

#[derive(Debug, Error)]
pub enum UsersServiceError {
    #[error("fatal database error")]
    DbError(#[from] DbErr),

    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    #[error("user not found")]
    UserNotFound,

    #[error("invalid user: {0}")]
    Invalid(ValidationErrors),
}

impl From<UsersServiceError> for ResourceError {
    fn from(error: UsersServiceError) -> Self {
        match error {
            UsersServiceError::DbError(_) | UsersServiceError::PasswordHash(_) => {
                ResourceError::infra(error)
            }
            UsersServiceError::UserNotFound => ResourceError::NotFound,
            UsersServiceError::Invalid(errors) => ResourceError::Invalid(errors),
        }
    }
}

/// Fields submitted by the sign-up form.
#[derive(Debug, Clone, Default)]
pub struct SignUp {
    pub name: String,
    pub email: String,
    pub password: String,
    /// Checked only when the form sent one.
    pub password_confirmation: Option<String>,
}

fn new_session_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

async fn open_session(
    txn: &DatabaseTransaction,
    user_id: UserId,
) -> Result<SessionModel, DbErr> {
    let session = SessionActiveModel {
        id: Set(SessionId::new()),
        token: Set(new_session_token()),
        user_id: Set(user_id),
        created_at: Set(Utc::now()),
    };
    Session::insert(session).exec_with_returning(txn).await
}

#[derive(Clone)]
pub struct UsersService {
    db: DatabaseConnection,
    mailer: MailQueue,
}

impl UsersService {
    pub fn new(db: DatabaseConnection, mailer: MailQueue) -> Self {
        Self { db, mailer }
    }

    /// Register a new account, sign it in and queue the welcome email
    pub async fn sign_up(&self, form: SignUp) -> Result<(UserModel, SessionModel), UsersServiceError> {
        let email = validation::normalize_email(&form.email);
        let name = form.name.trim().to_string();

        let mut errors = ValidationErrors::new();
        validation::presence(&mut errors, "name", &name);
        validation::email(&mut errors, "email", &email);
        if !email.is_empty() {
            let taken = User::find()
                .filter(UserColumn::Email.eq(email.as_str()))
                .one(&self.db)
                .await?
                .is_some();
            if taken {
                errors.add("email", TAKEN);
            }
        }
        if validation::presence(&mut errors, "password", &form.password) {
            validation::min_length(&mut errors, "password", &form.password, MIN_PASSWORD_LENGTH);
        }
        if let Some(confirmation) = &form.password_confirmation {
            if confirmation != &form.password {
                errors.add("password_confirmation", CONFIRMATION_MISMATCH);
            }
        }
        errors.into_result().map_err(UsersServiceError::Invalid)?;

        let password_hash =
            hash_password(&form.password).map_err(|e| UsersServiceError::PasswordHash(e.to_string()))?;

        let txn = self.db.begin().await?;

        let user = UserActiveModel {
            id: Set(UserId::new()),
            name: Set(name),
            email: Set(email),
            password_hash: Set(password_hash),
            avatar: Set(None),
            avatar_content_type: Set(None),
            created_at: Set(Utc::now()),
        };
        let user = User::insert(user).exec_with_returning(&txn).await.map_err(|err| {
            if is_unique_violation(&err) {
                UsersServiceError::Invalid(ValidationErrors::single("email", TAKEN))
            } else {
                err.into()
            }
        })?;
        let session = open_session(&txn, user.id).await?;

        txn.commit().await?;

        info!(user = %user.id, "user signed up");
        self.mailer.enqueue_welcome(&user);
        Ok((user, session))
    }

    /// Check credentials and open a new session
    pub async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(UserModel, SessionModel), UsersServiceError> {
        let bad_credentials =
            || UsersServiceError::Invalid(ValidationErrors::single("base", BAD_CREDENTIALS));

        let user = User::find()
            .filter(UserColumn::Email.eq(validation::normalize_email(email)))
            .one(&self.db)
            .await?
            .ok_or_else(bad_credentials)?;

        if !verify_password(password, &user.password_hash) {
            warn!(user = %user.id, "failed sign in");
            return Err(bad_credentials());
        }

        let txn = self.db.begin().await?;
        let session = open_session(&txn, user.id).await?;
        txn.commit().await?;

        Ok((user, session))
    }

    pub async fn sign_out(&self, token: &str) -> Result<(), UsersServiceError> {
        Session::delete_many()
            .filter(SessionColumn::Token.eq(token))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    /// The user a session token belongs to, if the session is still open
    pub async fn user_for_session(&self, token: &str) -> Result<Option<UserModel>, UsersServiceError> {
        let found = Session::find()
            .filter(SessionColumn::Token.eq(token))
            .find_also_related(User)
            .one(&self.db)
            .await?;
        Ok(found.and_then(|(_, user)| user))
    }

    pub async fn get(&self, user_id: UserId) -> Result<UserModel, UsersServiceError> {
        User::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or(UsersServiceError::UserNotFound)
    }

    /// Everyone except `user_id`, ordered by name
    pub async fn list_others(&self, user_id: UserId) -> Result<Vec<UserModel>, UsersServiceError> {
        let users = User::find()
            .filter(UserColumn::Id.ne(user_id))
            .order_by_asc(UserColumn::Name)
            .order_by_asc(UserColumn::Id)
            .all(&self.db)
            .await?;
        Ok(users)
    }

    /// Rename and optionally replace the avatar. Only the owner may do this.
    pub async fn update_profile(
        &self,
        acting: UserId,
        user_id: UserId,
        name: String,
        avatar: Option<Upload>,
    ) -> Result<UserModel, UsersServiceError> {
        let user = self.owned(acting, user_id).await?;
        let name = name.trim().to_string();

        let mut errors = ValidationErrors::new();
        validation::presence(&mut errors, "name", &name);
        if let Some(upload) = &avatar {
            upload.validate_image(&mut errors, "avatar");
        }
        errors.into_result().map_err(UsersServiceError::Invalid)?;

        let mut active: UserActiveModel = user.into();
        active.name = Set(name);
        if let Some(upload) = avatar {
            active.avatar = Set(Some(upload.bytes.to_vec()));
            active.avatar_content_type = Set(Some(upload.content_type));
        }

        Ok(active.update(&self.db).await?)
    }

    /// Replace only the avatar.
    pub async fn set_avatar(
        &self,
        acting: UserId,
        user_id: UserId,
        upload: Upload,
    ) -> Result<UserModel, UsersServiceError> {
        let user = self.owned(acting, user_id).await?;

        let mut errors = ValidationErrors::new();
        upload.validate_image(&mut errors, "avatar");
        errors.into_result().map_err(UsersServiceError::Invalid)?;

        let mut active: UserActiveModel = user.into();
        active.avatar = Set(Some(upload.bytes.to_vec()));
        active.avatar_content_type = Set(Some(upload.content_type));
        Ok(active.update(&self.db).await?)
    }

    /// Stored avatar bytes and content type, if any
    pub async fn avatar(&self, user_id: UserId) -> Result<Option<(Vec<u8>, String)>, UsersServiceError> {
        let user = self.get(user_id).await?;
        Ok(match (user.avatar, user.avatar_content_type) {
            (Some(bytes), Some(content_type)) => Some((bytes, content_type)),
            (Some(bytes), None) => Some((bytes, "application/octet-stream".to_string())),
            _ => None,
        })
    }

    /// Remove the account. Threads under the user's posts and comments are
    /// purged here; the foreign keys take care of the rest.
    pub async fn delete_account(&self, acting: UserId) -> Result<(), UsersServiceError> {
        let txn = self.db.begin().await?;

        let posts = Post::find()
            .filter(PostColumn::UserId.eq(acting))
            .all(&txn)
            .await?;
        for post in &posts {
            purge_thread(&txn, post.target()).await?;
        }

        let comments = Comment::find()
            .filter(CommentColumn::UserId.eq(acting))
            .all(&txn)
            .await?;
        for comment in &comments {
            purge_thread(&txn, comment.target()).await?;
        }

        let result = User::delete_by_id(acting).exec(&txn).await?;
        if result.rows_affected == 0 {
            return Err(UsersServiceError::UserNotFound);
        }
        txn.commit().await?;

        info!(user = %acting, posts = posts.len(), "account deleted");
        Ok(())
    }

    async fn owned(&self, acting: UserId, user_id: UserId) -> Result<UserModel, UsersServiceError> {
        if acting != user_id {
            return Err(UsersServiceError::UserNotFound);
        }
        self.get(user_id).await
    }
}
