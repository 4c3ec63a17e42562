use std::collections::HashMap;

use chrono::Utc;
use sea_orm::DatabaseConnection;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::{
    entity::prelude::*,
    error::{ResourceError, ValidationErrors},
    ids::{LikeId, PostId, UserId},
    service::{
        comments::{self, purge_thread, CommentThread, CommentsService, CommentsServiceError},
        friend_requests::friend_ids,
        likes,
    },
    upload::Upload,
    validation,
};

#[derive(Debug, Error)]
pub enum PostsServiceError {
    #[error("fatal database error")]
    DbError(#[from] DbErr),

    #[error("post not found")]
    PostNotFound,

    #[error("invalid post: {0}")]
    Invalid(ValidationErrors),
}

impl From<PostsServiceError> for ResourceError {
    fn from(error: PostsServiceError) -> Self {
        match error {
            PostsServiceError::DbError(error) => ResourceError::infra(error),
            PostsServiceError::PostNotFound => ResourceError::NotFound,
            PostsServiceError::Invalid(errors) => ResourceError::Invalid(errors),
        }
    }
}

impl From<CommentsServiceError> for PostsServiceError {
    fn from(error: CommentsServiceError) -> Self {
        match error {
            CommentsServiceError::DbError(error) => PostsServiceError::DbError(error),
            CommentsServiceError::Invalid(errors) => PostsServiceError::Invalid(errors),
            CommentsServiceError::TargetNotFound | CommentsServiceError::CommentNotFound => {
                PostsServiceError::PostNotFound
            }
        }
    }
}

fn validate(content: &str, image: Option<&Upload>) -> Result<(), PostsServiceError> {
    let mut errors = ValidationErrors::new();
    validation::presence(&mut errors, "content", content);
    if let Some(upload) = image {
        upload.validate_image(&mut errors, "image");
    }
    errors.into_result().map_err(PostsServiceError::Invalid)
}

/// One row of the feed.
#[derive(Debug, Clone)]
pub struct FeedEntry {
    pub post: PostModel,
    pub author: UserModel,
    pub like_count: u64,
    /// Direct comments only; replies are not counted.
    pub comment_count: u64,
    /// The viewer's like on this post, if any.
    pub viewer_like: Option<LikeId>,
}

/// Everything the post page shows.
#[derive(Debug, Clone)]
pub struct PostPage {
    pub post: PostModel,
    pub author: UserModel,
    pub like_count: u64,
    pub thread: CommentThread,
    /// The viewer's likes on the post and on any comment in the thread.
    pub viewer_likes: HashMap<Target, LikeId>,
}

#[derive(Clone)]
pub struct PostsService {
    db: DatabaseConnection,
    comments: CommentsService,
}

impl PostsService {
    pub fn new(db: DatabaseConnection) -> Self {
        let comments = CommentsService::new(db.clone());
        Self { db, comments }
    }

    /// Posts by `user` and by everyone `user` is friends with, newest first
    pub async fn feed(&self, user: UserId) -> Result<Vec<FeedEntry>, PostsServiceError> {
        let mut owners = friend_ids(&self.db, user).await?;
        owners.push(user);

        let rows = Post::find()
            .filter(PostColumn::UserId.is_in(owners))
            .order_by_desc(PostColumn::CreatedAt)
            .order_by_desc(PostColumn::Id)
            .find_also_related(User)
            .all(&self.db)
            .await?;

        let posts: Vec<(PostModel, UserModel)> = rows
            .into_iter()
            .filter_map(|(post, author)| author.map(|author| (post, author)))
            .collect();

        let raw_ids: Vec<Uuid> = posts.iter().map(|(p, _)| p.id.into_uuid()).collect();
        let targets: Vec<Target> = posts.iter().map(|(p, _)| p.target()).collect();
        let like_counts = likes::count_by_target(&self.db, TargetKind::Post, raw_ids.clone()).await?;
        let comment_counts = comments::count_by_parent(&self.db, TargetKind::Post, raw_ids).await?;
        let mine = likes::viewer_likes(&self.db, user, &targets).await?;

        Ok(posts
            .into_iter()
            .map(|(post, author)| {
                let key = post.id.into_uuid();
                FeedEntry {
                    like_count: like_counts.get(&key).copied().unwrap_or(0),
                    comment_count: comment_counts.get(&key).copied().unwrap_or(0),
                    viewer_like: mine.get(&post.target()).copied(),
                    post,
                    author,
                }
            })
            .collect())
    }

    /// Create a new post owned by `owner`
    pub async fn create(
        &self,
        owner: UserId,
        content: String,
        image: Option<Upload>,
    ) -> Result<PostModel, PostsServiceError> {
        validate(&content, image.as_ref())?;

        let now = Utc::now();
        let (image, image_content_type) = match image {
            Some(upload) => (Some(upload.bytes.to_vec()), Some(upload.content_type)),
            None => (None, None),
        };
        let post = PostActiveModel {
            id: Set(PostId::new()),
            user_id: Set(owner),
            content: Set(content),
            image: Set(image),
            image_content_type: Set(image_content_type),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = Post::insert(post).exec_with_returning(&self.db).await?;
        info!(post = %created.id, %owner, "post created");
        Ok(created)
    }

    /// Owner-only lookup; anyone else's post is "not found"
    pub async fn find_owned(
        &self,
        owner: UserId,
        post_id: PostId,
    ) -> Result<PostModel, PostsServiceError> {
        Post::find_by_id(post_id)
            .filter(PostColumn::UserId.eq(owner))
            .one(&self.db)
            .await?
            .ok_or(PostsServiceError::PostNotFound)
    }

    /// Lookup for reading: the owner and their accepted friends may see it
    pub async fn find_visible(
        &self,
        viewer: UserId,
        post_id: PostId,
    ) -> Result<PostModel, PostsServiceError> {
        let post = Post::find_by_id(post_id)
            .one(&self.db)
            .await?
            .ok_or(PostsServiceError::PostNotFound)?;

        if post.user_id == viewer {
            return Ok(post);
        }

        let friends = friend_ids(&self.db, viewer).await?;
        if friends.contains(&post.user_id) {
            Ok(post)
        } else {
            Err(PostsServiceError::PostNotFound)
        }
    }

    /// Replace the content and, when given, the image
    pub async fn update(
        &self,
        owner: UserId,
        post_id: PostId,
        content: String,
        image: Option<Upload>,
    ) -> Result<PostModel, PostsServiceError> {
        let post = self.find_owned(owner, post_id).await?;
        validate(&content, image.as_ref())?;

        let mut active: PostActiveModel = post.into();
        active.content = Set(content);
        if let Some(upload) = image {
            active.image = Set(Some(upload.bytes.to_vec()));
            active.image_content_type = Set(Some(upload.content_type));
        }
        active.updated_at = Set(Utc::now());

        Ok(active.update(&self.db).await?)
    }

    /// Delete a post with its whole comment tree and every like in it
    pub async fn delete(&self, owner: UserId, post_id: PostId) -> Result<(), PostsServiceError> {
        let post = self.find_owned(owner, post_id).await?;

        let txn = self.db.begin().await?;
        purge_thread(&txn, post.target()).await?;
        Post::delete_by_id(post.id).exec(&txn).await?;
        txn.commit().await?;

        info!(post = %post_id, "post deleted");
        Ok(())
    }

    /// Posts by one user for their profile page, newest first
    pub async fn list_by_user(&self, user_id: UserId) -> Result<Vec<PostModel>, PostsServiceError> {
        let posts = Post::find()
            .filter(PostColumn::UserId.eq(user_id))
            .order_by_desc(PostColumn::CreatedAt)
            .order_by_desc(PostColumn::Id)
            .all(&self.db)
            .await?;
        Ok(posts)
    }

    /// Post, author, like count and comment forest as seen by `viewer`.
    /// Strangers get `PostNotFound`, same as `find_visible`.
    pub async fn post_with_thread(
        &self,
        viewer: UserId,
        post_id: PostId,
    ) -> Result<PostPage, PostsServiceError> {
        let post = self.find_visible(viewer, post_id).await?;
        let author = post
            .find_related(User)
            .one(&self.db)
            .await?
            .ok_or(PostsServiceError::PostNotFound)?;

        let thread = self.comments.thread(post_id).await?;
        let like_count = likes::count_by_target(&self.db, TargetKind::Post, vec![post_id.into_uuid()])
            .await?
            .get(post_id.as_uuid())
            .copied()
            .unwrap_or(0);

        let mut targets = vec![post.target()];
        targets.extend(thread.ids().map(Target::Comment));
        let viewer_likes = likes::viewer_likes(&self.db, viewer, &targets).await?;

        Ok(PostPage {
            post,
            author,
            like_count,
            thread,
            viewer_likes,
        })
    }

    /// Stored image bytes and content type of a post `viewer` may see
    pub async fn image(
        &self,
        viewer: UserId,
        post_id: PostId,
    ) -> Result<Option<(Vec<u8>, String)>, PostsServiceError> {
        let post = self.find_visible(viewer, post_id).await?;
        Ok(post.image.map(|bytes| {
            let content_type = post
                .image_content_type
                .unwrap_or_else(|| "application/octet-stream".to_string());
            (bytes, content_type)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{
        create_comment, create_friend_request, create_like, create_post, create_user,
        insert_post_at, make_friends, setup_test_db,
    };
    use chrono::Duration;

    async fn setup_test_service() -> (PostsService, DatabaseConnection) {
        let db = setup_test_db().await;
        (PostsService::new(db.clone()), db)
    }

    fn contents(feed: &[FeedEntry]) -> Vec<&str> {
        feed.iter().map(|e| e.post.content.as_str()).collect()
    }

    #[tokio::test]
    async fn test_create_post() {
        let (service, db) = setup_test_service().await;
        let alice = create_user(&db, "Alice").await;

        let post = service
            .create(alice.id, "Planted garlic".to_string(), None)
            .await
            .expect("Failed to create post");

        assert_eq!(post.user_id, alice.id);
        assert_eq!(post.content, "Planted garlic");
        assert!(!post.has_image());
    }

    #[tokio::test]
    async fn test_create_post_requires_content() {
        let (service, db) = setup_test_service().await;
        let alice = create_user(&db, "Alice").await;

        let err = service.create(alice.id, "".to_string(), None).await.unwrap_err();
        match err {
            PostsServiceError::Invalid(errors) => {
                assert_eq!(errors.full_messages(), vec!["Content can't be blank"]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_post_with_image() {
        let (service, db) = setup_test_service().await;
        let alice = create_user(&db, "Alice").await;
        let image = Upload::new(vec![0xFF, 0xD8, 0xFF], "image/jpeg");

        let post = service
            .create(alice.id, "Harvest".to_string(), Some(image))
            .await
            .unwrap();

        let (bytes, content_type) = service.image(alice.id, post.id).await.unwrap().unwrap();
        assert_eq!(bytes, vec![0xFF, 0xD8, 0xFF]);
        assert_eq!(content_type, "image/jpeg");
    }

    #[tokio::test]
    async fn test_feed_shows_own_and_friends_posts_only() {
        let (service, db) = setup_test_service().await;
        let me = create_user(&db, "Me").await;
        let friend = create_user(&db, "Friend").await;
        let stranger = create_user(&db, "Stranger").await;
        let pending = create_user(&db, "Pending").await;
        let rejected = create_user(&db, "Rejected").await;

        make_friends(&db, friend.id, me.id).await;
        create_friend_request(&db, me.id, pending.id, FriendRequestStatus::Pending).await;
        create_friend_request(&db, rejected.id, me.id, FriendRequestStatus::Rejected).await;

        create_post(&db, me.id, "mine").await;
        create_post(&db, friend.id, "friend's").await;
        create_post(&db, stranger.id, "stranger's").await;
        create_post(&db, pending.id, "pending's").await;
        create_post(&db, rejected.id, "rejected's").await;

        let feed = service.feed(me.id).await.unwrap();
        let mut seen = contents(&feed);
        seen.sort();
        assert_eq!(seen, vec!["friend's", "mine"]);
    }

    #[tokio::test]
    async fn test_feed_ordered_newest_first() {
        let (service, db) = setup_test_service().await;
        let me = create_user(&db, "Me").await;
        let now = Utc::now();

        insert_post_at(&db, me.id, "two days ago", now - Duration::days(2)).await;
        insert_post_at(&db, me.id, "an hour ago", now - Duration::hours(1)).await;
        insert_post_at(&db, me.id, "yesterday", now - Duration::days(1)).await;

        let feed = service.feed(me.id).await.unwrap();
        assert_eq!(contents(&feed), vec!["an hour ago", "yesterday", "two days ago"]);
    }

    #[tokio::test]
    async fn test_friends_see_each_others_posts() {
        let (service, db) = setup_test_service().await;
        let alice = create_user(&db, "Alice").await;
        let bob = create_user(&db, "Bob").await;
        make_friends(&db, alice.id, bob.id).await;

        create_post(&db, alice.id, "roses").await;
        create_post(&db, bob.id, "lilies").await;

        for user in [alice.id, bob.id] {
            let feed = service.feed(user).await.unwrap();
            let seen = contents(&feed);
            assert!(seen.contains(&"roses"));
            assert!(seen.contains(&"lilies"));
        }
    }

    #[tokio::test]
    async fn test_feed_counts() {
        let (service, db) = setup_test_service().await;
        let alice = create_user(&db, "Alice").await;
        let bob = create_user(&db, "Bob").await;
        make_friends(&db, alice.id, bob.id).await;
        let post = create_post(&db, alice.id, "Beans").await;

        let comment = create_comment(&db, bob.id, post.target(), "Yum").await;
        create_comment(&db, alice.id, post.target(), "Thanks").await;
        create_comment(&db, alice.id, comment.target(), "Reply").await;
        let like = create_like(&db, bob.id, post.target()).await;

        let feed = service.feed(bob.id).await.unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].author.id, alice.id);
        assert_eq!(feed[0].like_count, 1);
        assert_eq!(feed[0].comment_count, 2);
        assert_eq!(feed[0].viewer_like, Some(like.id));

        let alices_view = service.feed(alice.id).await.unwrap();
        assert_eq!(alices_view[0].viewer_like, None);
    }

    #[tokio::test]
    async fn test_owner_only_edit_and_delete() {
        let (service, db) = setup_test_service().await;
        let alice = create_user(&db, "Alice").await;
        let bob = create_user(&db, "Bob").await;
        make_friends(&db, alice.id, bob.id).await;
        let post = create_post(&db, alice.id, "Original").await;

        assert!(matches!(
            service.update(bob.id, post.id, "Hacked".to_string(), None).await,
            Err(PostsServiceError::PostNotFound)
        ));
        assert!(matches!(
            service.delete(bob.id, post.id).await,
            Err(PostsServiceError::PostNotFound)
        ));
        assert!(matches!(
            service.find_owned(bob.id, post.id).await,
            Err(PostsServiceError::PostNotFound)
        ));

        let updated = service
            .update(alice.id, post.id, "Edited".to_string(), None)
            .await
            .unwrap();
        assert_eq!(updated.content, "Edited");
        assert!(updated.updated_at >= post.updated_at);
    }

    #[tokio::test]
    async fn test_update_rejects_blank_content() {
        let (service, db) = setup_test_service().await;
        let alice = create_user(&db, "Alice").await;
        let post = create_post(&db, alice.id, "Original").await;

        assert!(matches!(
            service.update(alice.id, post.id, "  ".to_string(), None).await,
            Err(PostsServiceError::Invalid(_))
        ));
        assert_eq!(service.find_owned(alice.id, post.id).await.unwrap().content, "Original");
    }

    #[tokio::test]
    async fn test_find_visible_owner_and_friends() {
        let (service, db) = setup_test_service().await;
        let alice = create_user(&db, "Alice").await;
        let bob = create_user(&db, "Bob").await;
        let eve = create_user(&db, "Eve").await;
        make_friends(&db, bob.id, alice.id).await;
        let post = create_post(&db, alice.id, "Peas").await;

        assert!(service.find_visible(alice.id, post.id).await.is_ok());
        assert!(service.find_visible(bob.id, post.id).await.is_ok());
        assert!(matches!(
            service.find_visible(eve.id, post.id).await,
            Err(PostsServiceError::PostNotFound)
        ));
    }

    #[tokio::test]
    async fn test_delete_cascades_through_thread() {
        let (service, db) = setup_test_service().await;
        let alice = create_user(&db, "Alice").await;
        let bob = create_user(&db, "Bob").await;
        let doomed = create_post(&db, alice.id, "Delete me").await;
        let survivor = create_post(&db, alice.id, "Keep me").await;

        let comment = create_comment(&db, bob.id, doomed.target(), "Comment").await;
        let reply = create_comment(&db, alice.id, comment.target(), "Reply").await;
        create_like(&db, bob.id, doomed.target()).await;
        create_like(&db, alice.id, comment.target()).await;
        create_like(&db, bob.id, reply.target()).await;

        let kept_comment = create_comment(&db, bob.id, survivor.target(), "Stay").await;
        create_like(&db, alice.id, kept_comment.target()).await;

        let comments_before = Comment::find().count(&db).await.unwrap();
        let likes_before = Like::find().count(&db).await.unwrap();

        service.delete(alice.id, doomed.id).await.unwrap();

        assert_eq!(Comment::find().count(&db).await.unwrap(), comments_before - 2);
        assert_eq!(Like::find().count(&db).await.unwrap(), likes_before - 3);
        assert!(Post::find_by_id(doomed.id).one(&db).await.unwrap().is_none());
        assert!(Post::find_by_id(survivor.id).one(&db).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_list_by_user_newest_first() {
        let (service, db) = setup_test_service().await;
        let alice = create_user(&db, "Alice").await;
        let bob = create_user(&db, "Bob").await;
        let now = Utc::now();
        insert_post_at(&db, alice.id, "older", now - Duration::days(3)).await;
        insert_post_at(&db, alice.id, "newer", now).await;
        create_post(&db, bob.id, "bob's").await;

        let posts: Vec<String> = service
            .list_by_user(alice.id)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.content)
            .collect();
        assert_eq!(posts, vec!["newer", "older"]);
    }

    #[tokio::test]
    async fn test_post_with_thread() {
        let (service, db) = setup_test_service().await;
        let alice = create_user(&db, "Alice").await;
        let bob = create_user(&db, "Bob").await;
        make_friends(&db, alice.id, bob.id).await;
        let post = create_post(&db, alice.id, "Carrots").await;
        let comment = create_comment(&db, bob.id, post.target(), "Orange!").await;
        create_comment(&db, alice.id, comment.target(), "Purple too").await;
        create_like(&db, bob.id, post.target()).await;
        let liked_comment = create_like(&db, bob.id, comment.target()).await;

        let page = service.post_with_thread(bob.id, post.id).await.unwrap();

        assert_eq!(page.author.id, alice.id);
        assert_eq!(page.like_count, 1);
        assert_eq!(page.thread.len(), 2);
        assert_eq!(page.viewer_likes.len(), 2);
        assert_eq!(
            page.viewer_likes.get(&Target::Comment(comment.id)),
            Some(&liked_comment.id)
        );
    }

    #[tokio::test]
    async fn test_post_with_thread_hidden_from_strangers() {
        let (service, db) = setup_test_service().await;
        let alice = create_user(&db, "Alice").await;
        let eve = create_user(&db, "Eve").await;
        let carol = create_user(&db, "Carol").await;
        create_friend_request(&db, eve.id, alice.id, FriendRequestStatus::Pending).await;
        let post = create_post(&db, alice.id, "Secret garden").await;
        create_comment(&db, alice.id, post.target(), "Mine").await;

        assert!(service.post_with_thread(alice.id, post.id).await.is_ok());
        for viewer in [eve.id, carol.id] {
            assert!(matches!(
                service.post_with_thread(viewer, post.id).await,
                Err(PostsServiceError::PostNotFound)
            ));
        }
    }
}
