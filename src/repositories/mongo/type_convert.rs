use std::convert::TryFrom;

use mongodb::bson::{doc, Document};

use super::converters::{id_from, parse_date, render_date};
use super::models::{
    MongoCommentModel, MongoLikeModel, MongoPostFileModel, MongoPostModel, MongoReportModel,
    MongoTagModel, MongoUserModel,
};
use super::{CommentMutation, CommentQuery, PostMutation, RepositoryError, TagQuery, UserQuery};
use crate::entities::{
    Comment, CommentId, Like, LikeTarget, Post, PostFile, PostId, Report, ReportId, ReportReason,
    Tag, TagId, User, UserId,
};

pub fn bson_id(raw: u32) -> i64 { i64::from(raw) }

impl From<User> for MongoUserModel {
    fn from(
        User {
            id,
            name,
            followers,
            created,
        }: User,
    ) -> Self {
        Self {
            id: bson_id(id.0),
            name,
            followers: followers.into_iter().map(|u| bson_id(u.0)).collect(),
            created: render_date(&created),
        }
    }
}
impl TryFrom<MongoUserModel> for User {
    type Error = RepositoryError;

    fn try_from(
        MongoUserModel {
            id,
            name,
            followers,
            created,
        }: MongoUserModel,
    ) -> Result<Self, Self::Error> {
        Ok(Self {
            id: UserId(id_from(id)?),
            name,
            followers: followers
                .into_iter()
                .map(|u| id_from(u).map(UserId))
                .collect::<Result<_, _>>()?,
            created: parse_date(&created)?,
        })
    }
}

impl From<Post> for MongoPostModel {
    fn from(
        Post {
            id,
            description,
            author,
            file,
            created,
        }: Post,
    ) -> Self {
        Self {
            id: bson_id(id.0),
            description,
            author: bson_id(author.0),
            file: file.map(|PostFile { key, url }| MongoPostFileModel { key, url }),
            created: render_date(&created),
            created_at: created.timestamp_micros(),
        }
    }
}
impl TryFrom<MongoPostModel> for Post {
    type Error = RepositoryError;

    fn try_from(
        MongoPostModel {
            id,
            description,
            author,
            file,
            created,
            ..
        }: MongoPostModel,
    ) -> Result<Self, Self::Error> {
        Ok(Self {
            id: PostId(id_from(id)?),
            description,
            author: UserId(id_from(author)?),
            file: file.map(|MongoPostFileModel { key, url }| PostFile { key, url }),
            created: parse_date(&created)?,
        })
    }
}

impl From<Comment> for MongoCommentModel {
    fn from(
        Comment {
            id,
            text,
            post,
            author,
            parent,
            created,
        }: Comment,
    ) -> Self {
        Self {
            id: bson_id(id.0),
            text,
            post: bson_id(post.0),
            author: bson_id(author.0),
            parent: parent.map(|p| bson_id(p.0)),
            created: render_date(&created),
            created_at: created.timestamp_micros(),
        }
    }
}
impl TryFrom<MongoCommentModel> for Comment {
    type Error = RepositoryError;

    fn try_from(
        MongoCommentModel {
            id,
            text,
            post,
            author,
            parent,
            created,
            ..
        }: MongoCommentModel,
    ) -> Result<Self, Self::Error> {
        Ok(Self {
            id: CommentId(id_from(id)?),
            text,
            post: PostId(id_from(post)?),
            author: UserId(id_from(author)?),
            parent: parent.map(id_from).transpose()?.map(CommentId),
            created: parse_date(&created)?,
        })
    }
}

impl From<Tag> for MongoTagModel {
    fn from(Tag { id, name, post }: Tag) -> Self {
        Self {
            id: bson_id(id.0),
            name,
            post: bson_id(post.0),
        }
    }
}
impl TryFrom<MongoTagModel> for Tag {
    type Error = RepositoryError;

    fn try_from(MongoTagModel { id, name, post }: MongoTagModel) -> Result<Self, Self::Error> {
        Ok(Self {
            id: TagId(id_from(id)?),
            name,
            post: PostId(id_from(post)?),
        })
    }
}

impl From<Report> for MongoReportModel {
    fn from(
        Report {
            id,
            reporter,
            reported,
            reason,
        }: Report,
    ) -> Self {
        Self {
            id: bson_id(id.0),
            reporter: bson_id(reporter.0),
            reported: bson_id(reported.0),
            reason: bson_id(reason.0),
        }
    }
}
impl TryFrom<MongoReportModel> for Report {
    type Error = RepositoryError;

    fn try_from(
        MongoReportModel {
            id,
            reporter,
            reported,
            reason,
        }: MongoReportModel,
    ) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ReportId(id_from(id)?),
            reporter: UserId(id_from(reporter)?),
            reported: PostId(id_from(reported)?),
            reason: ReportReason(id_from(reason)?),
        })
    }
}

impl From<Like> for MongoLikeModel {
    fn from(Like { user, target }: Like) -> Self {
        Self {
            user: bson_id(user.0),
            kind: target.kind().to_string(),
            target: bson_id(target.raw_id()),
        }
    }
}
impl TryFrom<MongoLikeModel> for Like {
    type Error = RepositoryError;

    fn try_from(
        MongoLikeModel { user, kind, target }: MongoLikeModel,
    ) -> Result<Self, Self::Error> {
        let raw = id_from(target)?;
        let target = match kind.as_str() {
            "post" => LikeTarget::Post(PostId(raw)),
            "comment" => LikeTarget::Comment(CommentId(raw)),
            k => {
                return Err(RepositoryError::Internal(::anyhow::anyhow!(
                    "unknown like kind: {}",
                    k
                )))
            },
        };

        Ok(Self {
            user: UserId(id_from(user)?),
            target,
        })
    }
}

pub fn like_filter(user: UserId, target: LikeTarget) -> Document {
    doc! {
        "user": bson_id(user.0),
        "kind": target.kind(),
        "target": bson_id(target.raw_id()),
    }
}

pub fn target_filter(target: LikeTarget) -> Document {
    doc! {
        "kind": target.kind(),
        "target": bson_id(target.raw_id()),
    }
}

impl From<UserQuery> for Document {
    fn from(UserQuery { ids }: UserQuery) -> Self {
        let mut query = doc! {};

        if let Some(set) = ids {
            let set = set.into_iter().map(|u| bson_id(u.0)).collect::<Vec<_>>();
            query.insert("id", doc! { "$in": set });
        }

        query
    }
}

impl From<PostMutation> for Document {
    fn from(PostMutation { description }: PostMutation) -> Self {
        let mut mutation = doc! {};

        if let Some(s) = description {
            mutation.insert("description", s);
        }

        mutation
    }
}

impl From<CommentQuery> for Document {
    fn from(CommentQuery { post, parent, .. }: CommentQuery) -> Self {
        let mut query = doc! {};

        if let Some(p) = post {
            query.insert("post", bson_id(p.0));
        }
        if let Some(p) = parent {
            query.insert("parent", bson_id(p.0));
        }

        query
    }
}

impl From<CommentMutation> for Document {
    fn from(CommentMutation { text }: CommentMutation) -> Self {
        let mut mutation = doc! {};

        if let Some(s) = text {
            mutation.insert("text", s);
        }

        mutation
    }
}

impl From<TagQuery> for Document {
    fn from(TagQuery { post, name, .. }: TagQuery) -> Self {
        let mut query = doc! {};

        if let Some(p) = post {
            query.insert("post", bson_id(p.0));
        }
        // `(?i)` is understood by mongo's PCRE as well
        if let Some(r) = name {
            query.insert("name", doc! { "$regex": r.as_str() });
        }

        query
    }
}
