use sea_orm::DatabaseConnection;

use crate::mailer::MailQueue;

pub mod comments;
pub mod friend_requests;
pub mod likes;
pub mod posts;
pub mod users;

use comments::CommentsService;
use friend_requests::FriendRequestsService;
use likes::LikesService;
use posts::PostsService;
use users::UsersService;

/// Every service over one shared connection, cheap to clone.
#[derive(Clone)]
pub struct Services {
    pub users: UsersService,
    pub friend_requests: FriendRequestsService,
    pub posts: PostsService,
    pub comments: CommentsService,
    pub likes: LikesService,
}

impl Services {
    pub fn new(db: DatabaseConnection, mailer: MailQueue) -> Self {
        Self {
            users: UsersService::new(db.clone(), mailer),
            friend_requests: FriendRequestsService::new(db.clone()),
            posts: PostsService::new(db.clone()),
            comments: CommentsService::new(db.clone()),
            likes: LikesService::new(db),
        }
    }
}
