use std::collections::HashSet;

use async_trait::async_trait;
use regex::Regex;

use crate::entities::{
    Comment, CommentId, LikeTarget, Post, PostId, Report, ReportId, Tag, User, UserId,
};

pub mod mock;
pub mod mongo;

type StdResult<T, E> = ::std::result::Result<T, E>;
type Result<T> = ::std::result::Result<T, RepositoryError>;

#[async_trait]
pub trait UserRepository {
    async fn insert(&self, item: User) -> Result<bool>;
    async fn is_exists(&self, id: UserId) -> Result<bool>;

    async fn find(&self, id: UserId) -> Result<User>;
    async fn finds(&self, query: UserQuery) -> Result<Vec<User>>;

    async fn is_follower(&self, id: UserId, follower: UserId) -> Result<bool>;
    async fn insert_follower(&self, id: UserId, follower: UserId) -> Result<bool>;
    async fn delete_follower(&self, id: UserId, follower: UserId) -> Result<bool>;
}

#[async_trait]
pub trait PostRepository {
    async fn issue_id(&self) -> Result<PostId>;
    async fn insert(&self, item: Post) -> Result<bool>;
    async fn is_exists(&self, id: PostId) -> Result<bool>;

    async fn find(&self, id: PostId) -> Result<Post>;
    /// newest first. also returns the number of all posts.
    async fn page(&self, paging: Paging) -> Result<(Vec<Post>, u64)>;

    async fn update(&self, id: PostId, mutation: PostMutation) -> Result<Post>;

    async fn delete(&self, id: PostId) -> Result<Post>;
}

#[async_trait]
pub trait CommentRepository {
    async fn issue_id(&self) -> Result<CommentId>;
    async fn insert(&self, item: Comment) -> Result<bool>;

    async fn find(&self, id: CommentId) -> Result<Comment>;
    /// newest first.
    async fn finds(&self, query: CommentQuery) -> Result<Vec<Comment>>;

    async fn update(&self, id: CommentId, mutation: CommentMutation) -> Result<Comment>;

    async fn delete(&self, id: CommentId) -> Result<Comment>;
}

#[async_trait]
pub trait TagRepository {
    /// drops every tag of `post`, then stores one tag per name.
    async fn replace(&self, post: PostId, names: Vec<String>) -> Result<Vec<Tag>>;

    /// ordered by id.
    async fn finds(&self, query: TagQuery) -> Result<Vec<Tag>>;

    async fn delete_by_post(&self, post: PostId) -> Result<u64>;
}

#[async_trait]
pub trait ReportRepository {
    async fn issue_id(&self) -> Result<ReportId>;
    async fn insert(&self, item: Report) -> Result<bool>;

    async fn finds_by_reported(&self, post: PostId) -> Result<Vec<Report>>;
}

#[async_trait]
pub trait LikeRepository {
    /// flips the membership of (`user`, `target`) in one step.
    /// returns `true` when the pair is liked afterwards.
    async fn toggle(&self, user: UserId, target: LikeTarget) -> Result<bool>;

    async fn liked_posts(&self, user: UserId) -> Result<HashSet<PostId>>;
    async fn liked_comments(&self, user: UserId) -> Result<HashSet<CommentId>>;
    async fn likers(&self, target: LikeTarget) -> Result<Vec<UserId>>;

    async fn delete_target(&self, target: LikeTarget) -> Result<u64>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    page: u32,
    limit: u32,
}

impl Paging {
    pub fn new(page: u32, limit: u32) -> ::anyhow::Result<Self> {
        if page == 0 {
            ::anyhow::bail!("page must be 1 or more. (got: {})", page);
        }
        if limit == 0 {
            ::anyhow::bail!("limit must be 1 or more. (got: {})", limit);
        }

        Ok(Self { page, limit })
    }

    pub fn page(&self) -> u32 { self.page }

    pub fn limit(&self) -> u32 { self.limit }

    pub fn offset(&self) -> u64 { u64::from(self.page - 1) * u64::from(self.limit) }
}

#[derive(Debug, Clone, Default)]
pub struct UserQuery {
    pub ids: Option<HashSet<UserId>>,
}

#[derive(Debug, Clone, Default)]
pub struct PostMutation {
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CommentQuery {
    pub post: Option<PostId>,
    pub parent: Option<CommentId>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct CommentMutation {
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TagQuery {
    pub post: Option<PostId>,
    pub name: Option<Regex>,
    pub limit: Option<u32>,
}

impl TagQuery {
    /// case-insensitive substring match on the name.
    pub fn containing(fragment: &str) -> StdResult<Regex, regex::Error> {
        Regex::new(&format!("(?i){}", regex::escape(fragment)))
    }
}

#[derive(Debug)]
pub enum RepositoryError {
    NotFound,
    NoUnique { matched: u32 },
    Internal(anyhow::Error),
}

impl ::std::fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
        match self {
            RepositoryError::NotFound => write!(f, "cannot find object."),
            RepositoryError::NoUnique { matched } => write!(
                f,
                "expected unique object, found non-unique objects (matched: {})",
                matched
            ),
            RepositoryError::Internal(e) => write!(f, "internal error: {}", e),
        }
    }
}

impl ::std::error::Error for RepositoryError {}
