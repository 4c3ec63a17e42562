// SeaORM entities
// One module per table; the polymorphic comment/like columns are typed
// through `crate::attachment::TargetKind`.

pub mod comment;
pub mod friend_request;
pub mod like;
pub mod post;
pub mod session;
pub mod user;


pub mod prelude {
    // Re-export all entities for convenience
    pub use super::comment::{
        ActiveModel as CommentActiveModel, Column as CommentColumn, Entity as Comment,
        Model as CommentModel,
    };
    pub use super::friend_request::{
        ActiveModel as FriendRequestActiveModel, Column as FriendRequestColumn,
        Entity as FriendRequest, FriendRequestStatus, Model as FriendRequestModel,
        ReceiverLink, SenderLink,
    };
    pub use super::like::{
        ActiveModel as LikeActiveModel, Column as LikeColumn, Entity as Like,
        Model as LikeModel,
    };
    pub use super::post::{
        ActiveModel as PostActiveModel, Column as PostColumn, Entity as Post,
        Model as PostModel,
    };
    pub use super::session::{
        ActiveModel as SessionActiveModel, Column as SessionColumn, Entity as Session,
        Model as SessionModel,
    };
    pub use super::user::{
        ActiveModel as UserActiveModel, Column as UserColumn, Entity as User,
        Model as UserModel,
    };

    pub use crate::attachment::{AttachmentTarget, Target, TargetKind};

    // Re-export commonly used SeaORM types and traits
    pub use sea_orm::{
        ActiveModelTrait,
        ActiveValue,

        ColumnTrait,
        Condition,
        ConnectionTrait,

        // Database and connection types
        Database,
        DatabaseConnection,
        DatabaseTransaction,
        DbConn,
        // Common result types
        DbErr,

        // Core traits
        EntityTrait,
        Linked,

        ModelTrait,
        NotSet,
        PaginatorTrait,
        QueryFilter,
        QueryOrder,
        QuerySelect,
        Related,
        RelationTrait,
        // Active model helpers
        Set,
        TransactionTrait,
    };
}
