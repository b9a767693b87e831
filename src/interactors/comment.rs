use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{bail, Result};
use async_recursion::async_recursion;
use async_trait::async_trait;

use super::*;
use crate::entities::{Comment, CommentId, LikeTarget};
use crate::repositories::{
    CommentMutation, CommentQuery, CommentRepository, LikeRepository, PostRepository, UserQuery,
    UserRepository,
};
use crate::usecases::comment::{create, delete, like, list, update};
use crate::usecases::{CommentRecord, CommentView};
use crate::utils::{AlsoChain, LetChain};

pub struct CommentListInteractor {
    pub user_repository: Arc<dyn UserRepository + Sync + Send>,
    pub post_repository: Arc<dyn PostRepository + Sync + Send>,
    pub comment_repository: Arc<dyn CommentRepository + Sync + Send>,
    pub like_repository: Arc<dyn LikeRepository + Sync + Send>,
    pub pres: Arc<dyn list::Presenter + Sync + Send>,
}
#[async_trait]
impl list::Usecase for CommentListInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: list::Input) -> Result<()> {
        tracing::trace!("input - {:?}", data);

        let list::Input { post_id, viewer } = data;

        if !self
            .post_repository
            .is_exists(post_id)
            .await
            .map_err(repo_err_fmt)?
        {
            return Err(post_err_fmt(RepositoryError::NotFound));
        }
        self.user_repository
            .find(viewer)
            .await
            .map_err(user_err_fmt)?;

        let liked = self
            .like_repository
            .liked_comments(viewer)
            .await
            .map_err(repo_err_fmt)?;

        // flat list. replies keep their `parent` id only.
        let comments = self
            .comment_repository
            .finds(CommentQuery {
                post: Some(post_id),
                ..Default::default()
            })
            .await
            .map_err(repo_err_fmt)?;

        let authors = match self
            .user_repository
            .finds(UserQuery {
                ids: Some(comments.iter().map(|c| c.author).collect()),
            })
            .await
        {
            Ok(v) => v.into_iter().map(|u| (u.id, u)).collect(),
            Err(e) => {
                tracing::warn!("cannot load comment authors of post {}: {}", post_id, e);
                HashMap::new()
            },
        };

        comments
            .into_iter()
            .map(
                |Comment {
                     id,
                     text,
                     author,
                     parent,
                     created,
                     ..
                 }| CommentView {
                    is_viewer_liked: liked.contains(&id),
                    author: authors.get(&author).cloned(),
                    id,
                    text,
                    parent,
                    created,
                },
            )
            .collect::<Vec<_>>()
            .let_(|comments| list::Output { comments })
            .also_(|o| tracing::trace!("output - {:?}", o))
            .let_(|r| self.pres.complete(r))
            .await?;

        Ok(())
    }
}

pub struct CommentCreateInteractor {
    pub user_repository: Arc<dyn UserRepository + Sync + Send>,
    pub post_repository: Arc<dyn PostRepository + Sync + Send>,
    pub comment_repository: Arc<dyn CommentRepository + Sync + Send>,
    pub pres: Arc<dyn create::Presenter + Sync + Send>,
}
#[async_trait]
impl create::Usecase for CommentCreateInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: create::Input) -> Result<()> {
        tracing::trace!("input - {:?}", data);

        let create::Input {
            text,
            post_id,
            reply_to,
            author,
        } = data;

        self.post_repository
            .find(post_id)
            .await
            .map_err(post_err_fmt)?;
        self.user_repository
            .find(author)
            .await
            .map_err(user_err_fmt)?;

        if let Some(parent_id) = reply_to {
            let parent = self
                .comment_repository
                .find(parent_id)
                .await
                .map_err(comment_err_fmt)?;

            if parent.post != post_id {
                bail!(
                    "comment {} belongs to post {}, not post {}.",
                    parent_id,
                    parent.post,
                    post_id
                );
            }
        }

        let new_comment = Comment {
            id: self
                .comment_repository
                .issue_id()
                .await
                .map_err(repo_err_fmt)?,
            text,
            post: post_id,
            author,
            parent: reply_to,
            created: ::chrono::Utc::now(),
        };

        let can_insert = self
            .comment_repository
            .insert(new_comment.clone())
            .await
            .map_err(repo_err_fmt)?;

        if !can_insert {
            bail!("comment id duplicated. ({})", new_comment.id);
        }

        create::Output {
            comment: new_comment.into(),
        }
        .also_(|o| tracing::trace!("output - {:?}", o))
        .let_(|r| self.pres.complete(r))
        .await?;

        Ok(())
    }
}

pub struct CommentUpdateInteractor {
    pub comment_repository: Arc<dyn CommentRepository + Sync + Send>,
    pub pres: Arc<dyn update::Presenter + Sync + Send>,
}
#[async_trait]
impl update::Usecase for CommentUpdateInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: update::Input) -> Result<()> {
        tracing::trace!("input - {:?}", data);

        let update::Input { comment_id, text } = data;

        self.comment_repository
            .update(comment_id, CommentMutation { text: Some(text) })
            .await
            .map_err(comment_err_fmt)?
            .let_(CommentRecord::from)
            .let_(|comment| update::Output { comment })
            .also_(|o| tracing::trace!("output - {:?}", o))
            .let_(|r| self.pres.complete(r))
            .await?;

        Ok(())
    }
}

pub struct CommentDeleteInteractor {
    pub comment_repository: Arc<dyn CommentRepository + Sync + Send>,
    pub like_repository: Arc<dyn LikeRepository + Sync + Send>,
    pub pres: Arc<dyn delete::Presenter + Sync + Send>,
}
impl CommentDeleteInteractor {
    /// removes `id` and every reply below it, children first.
    #[async_recursion]
    async fn delete_subtree(&self, id: CommentId, deleted: &mut Vec<CommentId>) -> Result<()> {
        let replies = self
            .comment_repository
            .finds(CommentQuery {
                parent: Some(id),
                ..Default::default()
            })
            .await
            .map_err(repo_err_fmt)?;

        for reply in replies {
            self.delete_subtree(reply.id, deleted).await?;
        }

        self.like_repository
            .delete_target(LikeTarget::Comment(id))
            .await
            .map_err(repo_err_fmt)?;
        self.comment_repository
            .delete(id)
            .await
            .map_err(comment_err_fmt)?;
        deleted.push(id);

        Ok(())
    }
}
#[async_trait]
impl delete::Usecase for CommentDeleteInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: delete::Input) -> Result<()> {
        tracing::trace!("input - {:?}", data);

        let delete::Input { comment_id } = data;

        self.comment_repository
            .find(comment_id)
            .await
            .map_err(comment_err_fmt)?;

        let mut deleted = vec![];
        self.delete_subtree(comment_id, &mut deleted).await?;
        deleted.reverse();

        delete::Output { deleted }
            .also_(|o| tracing::trace!("output - {:?}", o))
            .let_(|r| self.pres.complete(r))
            .await?;

        Ok(())
    }
}

pub struct CommentLikeInteractor {
    pub user_repository: Arc<dyn UserRepository + Sync + Send>,
    pub comment_repository: Arc<dyn CommentRepository + Sync + Send>,
    pub like_repository: Arc<dyn LikeRepository + Sync + Send>,
    pub pres: Arc<dyn like::Presenter + Sync + Send>,
}
#[async_trait]
impl like::Usecase for CommentLikeInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: like::Input) -> Result<()> {
        tracing::trace!("input - {:?}", data);

        let like::Input {
            comment_id,
            user_id,
        } = data;

        if !self
            .user_repository
            .is_exists(user_id)
            .await
            .map_err(repo_err_fmt)?
        {
            return Err(user_err_fmt(RepositoryError::NotFound));
        }
        self.comment_repository
            .find(comment_id)
            .await
            .map_err(comment_err_fmt)?;

        self.like_repository
            .toggle(user_id, LikeTarget::Comment(comment_id))
            .await
            .map_err(repo_err_fmt)?
            .let_(|liked| like::Output { comment_id, liked })
            .also_(|o| tracing::trace!("output - {:?}", o))
            .let_(|r| self.pres.complete(r))
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constructors::{in_memory, App};
    use crate::entities::{PostId, UserId};
    use crate::storage::Upload;
    use crate::usecases::post;
    use crate::usecases::user::register;

    async fn setup() -> (App, UserId, PostId) {
        let app = in_memory();

        app.user
            .register(register::Input {
                user_id: UserId(1),
                name: "alice".to_string(),
                created: ::chrono::Utc::now(),
            })
            .await
            .unwrap();

        let post_id = app
            .post
            .create(post::create::Input {
                file: Upload {
                    name: "a.jpg".to_string(),
                    content_type: "image/jpeg".to_string(),
                    bytes: vec![0xff, 0xd8],
                },
                description: "post".to_string(),
                tags: None,
                author: UserId(1),
            })
            .await
            .unwrap()
            .post
            .id;

        (app, UserId(1), post_id)
    }

    async fn comment(app: &App, post_id: PostId, reply_to: Option<CommentId>) -> CommentId {
        app.comment
            .create(create::Input {
                text: "hi".to_string(),
                post_id,
                reply_to,
                author: UserId(1),
            })
            .await
            .unwrap()
            .comment
            .id
    }

    #[tokio::test]
    async fn create_returns_record_with_post_id() {
        let (app, alice, post_id) = setup().await;

        let out = app
            .comment
            .create(create::Input {
                text: "first".to_string(),
                post_id,
                reply_to: None,
                author: alice,
            })
            .await
            .unwrap();

        assert_eq!(out.comment.post_id, post_id);
        assert_eq!(out.comment.text, "first");
        assert_eq!(out.comment.author, alice);
    }

    #[tokio::test]
    async fn reply_to_missing_parent_creates_nothing() {
        let (app, alice, post_id) = setup().await;

        let e = app
            .comment
            .create(create::Input {
                text: "orphan".to_string(),
                post_id,
                reply_to: Some(CommentId(999)),
                author: alice,
            })
            .await
            .unwrap_err();
        assert!(is_not_found(&e));

        let listed = app
            .comment
            .list(list::Input {
                post_id,
                viewer: alice,
            })
            .await
            .unwrap();
        assert!(listed.comments.is_empty());
    }

    #[tokio::test]
    async fn reply_across_posts_is_rejected() {
        let (app, alice, post_id) = setup().await;
        let root = comment(&app, post_id, None).await;

        let other = app
            .post
            .create(post::create::Input {
                file: Upload {
                    name: "b.png".to_string(),
                    content_type: "image/png".to_string(),
                    bytes: vec![1],
                },
                description: "other".to_string(),
                tags: None,
                author: alice,
            })
            .await
            .unwrap()
            .post
            .id;

        let e = app
            .comment
            .create(create::Input {
                text: "lost".to_string(),
                post_id: other,
                reply_to: Some(root),
                author: alice,
            })
            .await
            .unwrap_err();
        assert!(!is_not_found(&e));
    }

    #[tokio::test]
    async fn list_is_flat_newest_first_with_like_flags() {
        let (app, alice, post_id) = setup().await;
        let root = comment(&app, post_id, None).await;
        let reply = comment(&app, post_id, Some(root)).await;

        app.comment
            .like(like::Input {
                comment_id: root,
                user_id: alice,
            })
            .await
            .unwrap();

        let comments = app
            .comment
            .list(list::Input {
                post_id,
                viewer: alice,
            })
            .await
            .unwrap()
            .comments;

        assert_eq!(
            comments.iter().map(|c| c.id).collect::<Vec<_>>(),
            vec![reply, root]
        );
        assert_eq!(comments[0].parent, Some(root));
        assert!(!comments[0].is_viewer_liked);
        assert!(comments[1].is_viewer_liked);
        assert_eq!(comments[1].author.as_ref().unwrap().id, alice);
    }

    #[tokio::test]
    async fn update_strips_back_references() {
        let (app, _, post_id) = setup().await;
        let id = comment(&app, post_id, None).await;

        let out = app
            .comment
            .update(update::Input {
                comment_id: id,
                text: "edited".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(out.comment.text, "edited");
        assert_eq!(out.comment.post_id, post_id);

        let e = app
            .comment
            .update(update::Input {
                comment_id: CommentId(999),
                text: "x".to_string(),
            })
            .await
            .unwrap_err();
        assert!(is_not_found(&e));
    }

    #[tokio::test]
    async fn delete_cascades_reply_subtree() {
        let (app, alice, post_id) = setup().await;
        let root = comment(&app, post_id, None).await;
        let child = comment(&app, post_id, Some(root)).await;
        let grandchild = comment(&app, post_id, Some(child)).await;
        let sibling = comment(&app, post_id, None).await;

        let out = app
            .comment
            .delete(delete::Input { comment_id: root })
            .await
            .unwrap();
        assert_eq!(out.deleted, vec![root, child, grandchild]);

        let left = app
            .comment
            .list(list::Input {
                post_id,
                viewer: alice,
            })
            .await
            .unwrap()
            .comments;
        assert_eq!(left.iter().map(|c| c.id).collect::<Vec<_>>(), vec![sibling]);

        let e = app
            .comment
            .delete(delete::Input { comment_id: root })
            .await
            .unwrap_err();
        assert!(is_not_found(&e));
    }

    #[tokio::test]
    async fn like_toggles_back() {
        let (app, alice, post_id) = setup().await;
        let id = comment(&app, post_id, None).await;
        let input = || like::Input {
            comment_id: id,
            user_id: alice,
        };

        assert!(app.comment.like(input()).await.unwrap().liked);
        assert!(!app.comment.like(input()).await.unwrap().liked);

        let e = app
            .comment
            .like(like::Input {
                comment_id: CommentId(999),
                user_id: alice,
            })
            .await
            .unwrap_err();
        assert!(is_not_found(&e));
    }
}
