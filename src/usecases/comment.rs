usecase! {
    list : {
        pub post_id: entities::PostId,
        pub viewer: entities::UserId,
    } => {
        pub comments: Vec<CommentView>,
    }
}

usecase! {
    create : {
        pub text: String,
        pub post_id: entities::PostId,
        pub reply_to: Option<entities::CommentId>,
        pub author: entities::UserId,
    } => {
        pub comment: CommentRecord,
    }
}

usecase! {
    update : {
        pub comment_id: entities::CommentId,
        pub text: String,
    } => {
        pub comment: CommentRecord,
    }
}

usecase! {
    delete : {
        pub comment_id: entities::CommentId,
    } => {
        /// the comment itself first, then its replies.
        pub deleted: Vec<entities::CommentId>,
    }
}

usecase! {
    like : {
        pub comment_id: entities::CommentId,
        pub user_id: entities::UserId,
    } => {
        pub comment_id: entities::CommentId,
        pub liked: bool,
    }
}
