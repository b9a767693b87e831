use std::collections::HashSet;
use std::convert::TryFrom;

use async_trait::async_trait;
use mongodb::bson::{doc, Document};
use mongodb::error::Result as MongoResult;
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument};
use mongodb::{Client, Collection, Database};
use tracing::Instrument;

use super::{
    CommentMutation, CommentQuery, CommentRepository, LikeRepository, Paging, PostMutation,
    PostRepository, ReportRepository, RepositoryError, Result, TagQuery, TagRepository,
    UserQuery, UserRepository,
};
use crate::entities::{
    Comment, CommentId, Like, LikeTarget, Post, PostId, Report, ReportId, Tag, TagId, User,
    UserId,
};
use crate::utils::LetChain;

mod converters;
mod helpers;
mod models;
mod type_convert;

use converters::{convert_404_or, convert_repo_err, try_unique_check};
use helpers::{
    find_many, get_one, initialize_coll, is_contains, is_exists, is_transient, issue_seq,
    make_session, modify_set, process_transaction, ModifyOpTy,
};
use models::{
    MongoCommentModel, MongoLikeModel, MongoPostModel, MongoReportModel, MongoTagModel,
    MongoUserModel,
};
use type_convert::{bson_id, like_filter, target_filter};

const COUNTER: &str = "counter";

fn newest_first() -> Document { doc! { "created_at": -1, "id": -1 } }

fn updated_one() -> FindOneAndUpdateOptions {
    FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build()
}

pub struct MongoUserRepository {
    coll: Collection<MongoUserModel>,
}

impl MongoUserRepository {
    pub async fn new_with(db: Database) -> ::anyhow::Result<Self> {
        initialize_coll("user", doc! { "id": 1 }, &db).await?;

        Ok(Self {
            coll: db.collection("user"),
        })
    }
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    async fn insert(&self, item: User) -> Result<bool> {
        let model: MongoUserModel = item.into();

        self.coll
            .insert_one(model, None)
            .instrument(tracing::trace_span!("insert_one"))
            .await
            .let_(try_unique_check)
    }

    async fn is_exists(&self, id: UserId) -> Result<bool> {
        is_exists(&self.coll, doc! { "id": bson_id(id.0) }).await
    }

    async fn find(&self, id: UserId) -> Result<User> {
        get_one(&self.coll, bson_id(id.0)).await?.let_(User::try_from)
    }

    async fn finds(&self, query: UserQuery) -> Result<Vec<User>> {
        let query_doc: Document = query.into();

        find_many(&self.coll, query_doc, None).await
    }

    async fn is_follower(&self, id: UserId, follower: UserId) -> Result<bool> {
        is_contains("followers", &self.coll, bson_id(id.0), bson_id(follower.0)).await
    }

    async fn insert_follower(&self, id: UserId, follower: UserId) -> Result<bool> {
        modify_set(
            "followers",
            &self.coll,
            bson_id(id.0),
            bson_id(follower.0),
            ModifyOpTy::Push,
        )
        .await
    }

    async fn delete_follower(&self, id: UserId, follower: UserId) -> Result<bool> {
        modify_set(
            "followers",
            &self.coll,
            bson_id(id.0),
            bson_id(follower.0),
            ModifyOpTy::Pull,
        )
        .await
    }
}

pub struct MongoPostRepository {
    coll: Collection<MongoPostModel>,
    counter: Collection<Document>,
}

impl MongoPostRepository {
    pub async fn new_with(db: Database) -> ::anyhow::Result<Self> {
        initialize_coll("post", doc! { "id": 1 }, &db).await?;

        Ok(Self {
            coll: db.collection("post"),
            counter: db.collection(COUNTER),
        })
    }
}

#[async_trait]
impl PostRepository for MongoPostRepository {
    async fn issue_id(&self) -> Result<PostId> { issue_seq(&self.counter, "post").await.map(PostId) }

    async fn insert(&self, item: Post) -> Result<bool> {
        let model: MongoPostModel = item.into();

        self.coll
            .insert_one(model, None)
            .instrument(tracing::trace_span!("insert_one"))
            .await
            .let_(try_unique_check)
    }

    async fn is_exists(&self, id: PostId) -> Result<bool> {
        is_exists(&self.coll, doc! { "id": bson_id(id.0) }).await
    }

    async fn find(&self, id: PostId) -> Result<Post> {
        get_one(&self.coll, bson_id(id.0)).await?.let_(Post::try_from)
    }

    async fn page(&self, paging: Paging) -> Result<(Vec<Post>, u64)> {
        let total = self
            .coll
            .count_documents(doc! {}, None)
            .instrument(tracing::trace_span!("count_documents"))
            .await
            .let_(convert_repo_err)?;

        let opts = FindOptions::builder()
            .sort(newest_first())
            .skip(paging.offset())
            .limit(i64::from(paging.limit()))
            .build();
        let items = find_many(&self.coll, doc! {}, opts).await?;

        Ok((items, total))
    }

    async fn update(&self, id: PostId, mutation: PostMutation) -> Result<Post> {
        let mutation_doc: Document = mutation.into();
        if mutation_doc.is_empty() {
            return self.find(id).await;
        }

        self.coll
            .find_one_and_update(
                doc! { "id": bson_id(id.0) },
                doc! { "$set": mutation_doc },
                updated_one(),
            )
            .instrument(tracing::trace_span!("find_one_and_update"))
            .await
            .let_(convert_repo_err)?
            .let_(convert_404_or)?
            .let_(Post::try_from)
    }

    async fn delete(&self, id: PostId) -> Result<Post> {
        self.coll
            .find_one_and_delete(doc! { "id": bson_id(id.0) }, None)
            .instrument(tracing::trace_span!("find_one_and_delete"))
            .await
            .let_(convert_repo_err)?
            .let_(convert_404_or)?
            .let_(Post::try_from)
    }
}

pub struct MongoCommentRepository {
    coll: Collection<MongoCommentModel>,
    counter: Collection<Document>,
}

impl MongoCommentRepository {
    pub async fn new_with(db: Database) -> ::anyhow::Result<Self> {
        initialize_coll("comment", doc! { "id": 1 }, &db).await?;

        Ok(Self {
            coll: db.collection("comment"),
            counter: db.collection(COUNTER),
        })
    }
}

#[async_trait]
impl CommentRepository for MongoCommentRepository {
    async fn issue_id(&self) -> Result<CommentId> {
        issue_seq(&self.counter, "comment").await.map(CommentId)
    }

    async fn insert(&self, item: Comment) -> Result<bool> {
        let model: MongoCommentModel = item.into();

        self.coll
            .insert_one(model, None)
            .instrument(tracing::trace_span!("insert_one"))
            .await
            .let_(try_unique_check)
    }

    async fn find(&self, id: CommentId) -> Result<Comment> {
        get_one(&self.coll, bson_id(id.0)).await?.let_(Comment::try_from)
    }

    async fn finds(&self, query: CommentQuery) -> Result<Vec<Comment>> {
        let limit = query.limit.map(i64::from);
        let query_doc: Document = query.into();

        let opts = FindOptions::builder()
            .sort(newest_first())
            .limit(limit)
            .build();

        find_many(&self.coll, query_doc, opts).await
    }

    async fn update(&self, id: CommentId, mutation: CommentMutation) -> Result<Comment> {
        let mutation_doc: Document = mutation.into();
        if mutation_doc.is_empty() {
            return self.find(id).await;
        }

        self.coll
            .find_one_and_update(
                doc! { "id": bson_id(id.0) },
                doc! { "$set": mutation_doc },
                updated_one(),
            )
            .instrument(tracing::trace_span!("find_one_and_update"))
            .await
            .let_(convert_repo_err)?
            .let_(convert_404_or)?
            .let_(Comment::try_from)
    }

    async fn delete(&self, id: CommentId) -> Result<Comment> {
        self.coll
            .find_one_and_delete(doc! { "id": bson_id(id.0) }, None)
            .instrument(tracing::trace_span!("find_one_and_delete"))
            .await
            .let_(convert_repo_err)?
            .let_(convert_404_or)?
            .let_(Comment::try_from)
    }
}

pub struct MongoTagRepository {
    client: Client,
    coll: Collection<MongoTagModel>,
    counter: Collection<Document>,
}

impl MongoTagRepository {
    pub async fn new_with(client: Client, db: Database) -> ::anyhow::Result<Self> {
        initialize_coll("tag", doc! { "id": 1 }, &db).await?;

        Ok(Self {
            client,
            coll: db.collection("tag"),
            counter: db.collection(COUNTER),
        })
    }
}

async fn replace_tags(
    client: &Client,
    coll: &Collection<MongoTagModel>,
    post: i64,
    models: &[MongoTagModel],
) -> MongoResult<()> {
    let mut session = make_session(client).await?;

    coll.delete_many_with_session(doc! { "post": post }, None, &mut session)
        .instrument(tracing::trace_span!("delete_many_with_session"))
        .await?;

    if !models.is_empty() {
        coll.insert_many_with_session(models.iter(), None, &mut session)
            .instrument(tracing::trace_span!("insert_many_with_session"))
            .await?;
    }

    process_transaction(&mut session).await
}

#[async_trait]
impl TagRepository for MongoTagRepository {
    async fn replace(&self, post: PostId, names: Vec<String>) -> Result<Vec<Tag>> {
        let mut tags = Vec::with_capacity(names.len());
        for name in names {
            let id = issue_seq(&self.counter, "tag").await?;
            tags.push(Tag {
                id: TagId(id),
                name,
                post,
            });
        }

        let models = tags
            .iter()
            .cloned()
            .map(MongoTagModel::from)
            .collect::<Vec<_>>();

        let res = loop {
            let r = replace_tags(&self.client, &self.coll, bson_id(post.0), &models).await;
            if is_transient(&r) {
                continue;
            }

            break r;
        };
        res.let_(convert_repo_err)?;

        Ok(tags)
    }

    async fn finds(&self, query: TagQuery) -> Result<Vec<Tag>> {
        let limit = query.limit.map(i64::from);
        let query_doc: Document = query.into();

        let opts = FindOptions::builder()
            .sort(doc! { "id": 1 })
            .limit(limit)
            .build();

        find_many(&self.coll, query_doc, opts).await
    }

    async fn delete_by_post(&self, post: PostId) -> Result<u64> {
        self.coll
            .delete_many(doc! { "post": bson_id(post.0) }, None)
            .instrument(tracing::trace_span!("delete_many"))
            .await
            .let_(convert_repo_err)
            .map(|r| r.deleted_count)
    }
}

pub struct MongoReportRepository {
    coll: Collection<MongoReportModel>,
    counter: Collection<Document>,
}

impl MongoReportRepository {
    pub async fn new_with(db: Database) -> ::anyhow::Result<Self> {
        initialize_coll("report", doc! { "id": 1 }, &db).await?;

        Ok(Self {
            coll: db.collection("report"),
            counter: db.collection(COUNTER),
        })
    }
}

#[async_trait]
impl ReportRepository for MongoReportRepository {
    async fn issue_id(&self) -> Result<ReportId> {
        issue_seq(&self.counter, "report").await.map(ReportId)
    }

    async fn insert(&self, item: Report) -> Result<bool> {
        let model: MongoReportModel = item.into();

        self.coll
            .insert_one(model, None)
            .instrument(tracing::trace_span!("insert_one"))
            .await
            .let_(try_unique_check)
    }

    async fn finds_by_reported(&self, post: PostId) -> Result<Vec<Report>> {
        let opts = FindOptions::builder().sort(doc! { "id": 1 }).build();

        find_many(&self.coll, doc! { "reported": bson_id(post.0) }, opts).await
    }
}

/// one document per (user, target). the compound unique index turns
/// toggling into delete-or-insert without a read-modify-write.
pub struct MongoLikeRepository {
    coll: Collection<MongoLikeModel>,
}

impl MongoLikeRepository {
    pub async fn new_with(db: Database) -> ::anyhow::Result<Self> {
        initialize_coll("like", doc! { "user": 1, "kind": 1, "target": 1 }, &db).await?;

        Ok(Self {
            coll: db.collection("like"),
        })
    }

    async fn liked(&self, user: UserId, kind: &str) -> Result<Vec<Like>> {
        find_many(
            &self.coll,
            doc! { "user": bson_id(user.0), "kind": kind },
            None,
        )
        .await
    }
}

#[async_trait]
impl LikeRepository for MongoLikeRepository {
    async fn toggle(&self, user: UserId, target: LikeTarget) -> Result<bool> {
        let deleted = self
            .coll
            .delete_one(like_filter(user, target), None)
            .instrument(tracing::trace_span!("delete_one"))
            .await
            .let_(convert_repo_err)?
            .deleted_count;

        if deleted > 0 {
            return Ok(false);
        }

        // a concurrent like of the same pair wins the index; liked either way
        self.coll
            .insert_one(MongoLikeModel::from(Like { user, target }), None)
            .instrument(tracing::trace_span!("insert_one"))
            .await
            .let_(try_unique_check)?;

        Ok(true)
    }

    async fn liked_posts(&self, user: UserId) -> Result<HashSet<PostId>> {
        Ok(self
            .liked(user, "post")
            .await?
            .into_iter()
            .filter_map(|l| match l.target {
                LikeTarget::Post(id) => Some(id),
                LikeTarget::Comment(_) => None,
            })
            .collect())
    }

    async fn liked_comments(&self, user: UserId) -> Result<HashSet<CommentId>> {
        Ok(self
            .liked(user, "comment")
            .await?
            .into_iter()
            .filter_map(|l| match l.target {
                LikeTarget::Comment(id) => Some(id),
                LikeTarget::Post(_) => None,
            })
            .collect())
    }

    async fn likers(&self, target: LikeTarget) -> Result<Vec<UserId>> {
        Ok(find_many::<_, Like>(&self.coll, target_filter(target), None)
            .await?
            .into_iter()
            .map(|l| l.user)
            .collect())
    }

    async fn delete_target(&self, target: LikeTarget) -> Result<u64> {
        self.coll
            .delete_many(target_filter(target), None)
            .instrument(tracing::trace_span!("delete_many"))
            .await
            .let_(convert_repo_err)
            .map(|r| r.deleted_count)
    }
}
