macro_rules! usecase {
    ($n:ident : { $( $i:tt )* } => { $( $o:tt )* }) => {
        pub mod $n {
            #[allow(unused_imports)]
            use crate::entities;
            #[allow(unused_imports)]
            use super::super::*;

            #[::async_trait::async_trait]
            pub trait Usecase {
                async fn handle(&self, data: Input) -> ::anyhow::Result<()>;
            }

            #[::async_trait::async_trait]
            pub trait Presenter {
                async fn complete(&self, data: Output) -> ::anyhow::Result<()>;
            }

            #[derive(Debug)]
            pub struct Input { $( $i )* }

            #[derive(Debug, ::serde::Serialize)]
            pub struct Output { $( $o )* }
        }
    };
}

pub mod comment;
pub mod post;
pub mod user;

use std::collections::HashSet;

use serde::Serialize;
use smallvec::SmallVec;

use crate::entities::{
    Comment, CommentId, Date, NotTracked, Post, PostId, User, UserId,
};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const TAG_SEARCH_LIMIT: u32 = 20;
pub const FEED_COMMENTS: u32 = 2;

pub const UPLOAD_QUALITY: u8 = 95;
pub const UPLOAD_MAX_MB: u32 = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    pub total_items: u64,
    pub item_count: u32,
    pub items_per_page: u32,
    pub total_pages: u32,
    pub current_page: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedPost {
    pub post: Post,
    pub author: Option<User>,
    pub comments: SmallVec<[Comment; 2]>,
    pub tags: Vec<String>,
    pub file_url: Option<String>,
    pub is_viewer_liked: bool,
    pub is_viewer_saved: NotTracked,
    pub is_viewer_in_photo: NotTracked,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    pub post: Post,
    pub author: User,
    pub tags: Vec<String>,
    pub likes: Vec<User>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    pub id: CommentId,
    pub text: String,
    pub parent: Option<CommentId>,
    pub author: Option<User>,
    pub created: Date,
    pub is_viewer_liked: bool,
}

/// comment as returned from writes. carries no post/parent back-references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentRecord {
    pub id: CommentId,
    pub text: String,
    pub author: UserId,
    pub post_id: PostId,
    pub created: Date,
}

impl From<Comment> for CommentRecord {
    fn from(
        Comment {
            id,
            text,
            post,
            author,
            created,
            ..
        }: Comment,
    ) -> Self {
        Self {
            id,
            text,
            author,
            post_id: post,
            created,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LikerView {
    pub user: User,
    pub is_viewer_followed: bool,
}

/// outcome of the best-effort tag step of post writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Tagging {
    Attached { names: Vec<String> },
    Skipped { reason: String },
    Untouched,
}

/// user record plus the sets derived from like rows.
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub user: User,
    pub liked_posts: HashSet<PostId>,
    pub liked_comments: HashSet<CommentId>,
}
