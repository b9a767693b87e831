use std::collections::HashSet;
use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize, Serializer};

pub type Date = ::chrono::DateTime<::chrono::Utc>;

macro_rules! id_type {
    ($( $n:ident ),* $(,)?) => {$(
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $n(pub u32);

        impl Display for $n {
            fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult { write!(f, "{}", self.0) }
        }
    )*};
}

id_type!(UserId, PostId, CommentId, TagId, ReportId, ReportReason);

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub followers: HashSet<UserId>,
    pub created: Date,
}

#[derive(Debug, Clone, Serialize)]
pub struct Post {
    pub id: PostId,
    pub description: String,
    pub author: UserId,
    pub file: Option<PostFile>,
    pub created: Date,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostFile {
    pub key: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Comment {
    pub id: CommentId,
    pub text: String,
    pub post: PostId,
    pub author: UserId,
    pub parent: Option<CommentId>,
    pub created: Date,
}

/// plain name attached to one post. never shared between posts.
#[derive(Debug, Clone, Serialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    pub post: PostId,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub id: ReportId,
    pub reporter: UserId,
    pub reported: PostId,
    pub reason: ReportReason,
}

/// membership row: `user` likes `target`. at most one per pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Like {
    pub user: UserId,
    pub target: LikeTarget,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LikeTarget {
    Post(PostId),
    Comment(CommentId),
}

impl LikeTarget {
    pub fn kind(&self) -> &'static str {
        match self {
            LikeTarget::Post(_) => "post",
            LikeTarget::Comment(_) => "comment",
        }
    }

    pub fn raw_id(&self) -> u32 {
        match self {
            LikeTarget::Post(PostId(n)) | LikeTarget::Comment(CommentId(n)) => *n,
        }
    }
}

/// personalization with no backing data (saved posts, photo tagging, sharing).
///
/// reads and serializes as `false` until the feature exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotTracked;

impl NotTracked {
    pub const fn get(self) -> bool { false }
}

impl Serialize for NotTracked {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bool(self.get())
    }
}
