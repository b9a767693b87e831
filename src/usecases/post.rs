use crate::storage::Upload;

usecase! {
    feed : {
        pub viewer: entities::UserId,
        pub page: u32,
        pub limit: u32,
    } => {
        pub items: Vec<FeedPost>,
        pub meta: PageMeta,
    }
}

usecase! {
    get : {
        pub post_id: entities::PostId,
    } => {
        pub post: PostDetail,
    }
}

usecase! {
    likes : {
        pub post_id: entities::PostId,
        pub viewer: entities::UserId,
    } => {
        pub likers: Vec<LikerView>,
    }
}

usecase! {
    tags : {
        pub query: String,
    } => {
        pub tags: Vec<entities::Tag>,
    }
}

usecase! {
    create : {
        pub file: super::Upload,
        pub description: String,
        /// json array of tag names. parsed best-effort.
        pub tags: Option<String>,
        pub author: entities::UserId,
    } => {
        pub post: entities::Post,
        pub tagging: Tagging,
    }
}

usecase! {
    update : {
        pub post_id: entities::PostId,
        pub description: Option<String>,
        pub tags: Option<String>,
    } => {
        pub post: entities::Post,
        pub tagging: Tagging,
    }
}

usecase! {
    delete : {
        pub post_id: entities::PostId,
    } => {
        pub post: entities::Post,
        pub deleted_comments: u64,
        pub deleted_tags: u64,
    }
}

usecase! {
    report : {
        pub post_id: entities::PostId,
        pub reason: entities::ReportReason,
        pub reporter: entities::UserId,
    } => {
        pub report: entities::Report,
        /// reports filed against the post so far, this one included.
        pub times_reported: u64,
    }
}

usecase! {
    share : {
        pub post_id: entities::PostId,
        pub user_id: entities::UserId,
    } => {
        pub shared: entities::NotTracked,
    }
}

usecase! {
    like : {
        pub post_id: entities::PostId,
        pub user_id: entities::UserId,
    } => {
        pub post_id: entities::PostId,
        pub liked: bool,
    }
}
