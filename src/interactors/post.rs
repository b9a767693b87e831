use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;

use super::*;
use crate::entities::{LikeTarget, NotTracked, Post, Report, User, UserId};
use crate::repositories::{
    CommentQuery, CommentRepository, LikeRepository, Paging, PostMutation, PostRepository,
    ReportRepository, TagQuery, TagRepository, UserQuery, UserRepository,
};
use crate::storage::{FileKind, FileStorage, UploadRequest};
use crate::usecases::post::{create, delete, feed, get, like, likes, report, share, tags, update};
use crate::usecases::{
    FeedPost, LikerView, PostDetail, FEED_COMMENTS, TAG_SEARCH_LIMIT, UPLOAD_MAX_MB,
    UPLOAD_QUALITY,
};
use crate::utils::{AlsoChain, LetChain};

/// feed enrichment never fails the page. a broken part is logged and left empty.
fn or_warn<T: Default>(
    res: ::std::result::Result<T, RepositoryError>,
    what: &str,
    post: &Post,
) -> T {
    match res {
        Ok(o) => o,
        Err(e) => {
            tracing::warn!("cannot load {} of post {}: {}", what, post.id, e);
            T::default()
        },
    }
}

async fn users_by_id(
    user_repository: &(dyn UserRepository + Sync + Send),
    ids: HashSet<UserId>,
) -> ::std::result::Result<HashMap<UserId, User>, RepositoryError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    Ok(user_repository
        .finds(UserQuery { ids: Some(ids) })
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect())
}

pub struct PostFeedInteractor {
    pub user_repository: Arc<dyn UserRepository + Sync + Send>,
    pub post_repository: Arc<dyn PostRepository + Sync + Send>,
    pub comment_repository: Arc<dyn CommentRepository + Sync + Send>,
    pub tag_repository: Arc<dyn TagRepository + Sync + Send>,
    pub like_repository: Arc<dyn LikeRepository + Sync + Send>,
    pub pres: Arc<dyn feed::Presenter + Sync + Send>,
}
#[async_trait]
impl feed::Usecase for PostFeedInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: feed::Input) -> Result<()> {
        tracing::trace!("input - {:?}", data);

        let feed::Input {
            viewer,
            page,
            limit,
        } = data;

        let paging = Paging::new(page, limit)?;

        self.user_repository
            .find(viewer)
            .await
            .map_err(user_err_fmt)?;
        let liked = self
            .like_repository
            .liked_posts(viewer)
            .await
            .map_err(repo_err_fmt)?;

        let (posts, total) = self
            .post_repository
            .page(paging)
            .await
            .map_err(repo_err_fmt)?;

        let authors = match users_by_id(
            &*self.user_repository,
            posts.iter().map(|p| p.author).collect(),
        )
        .await
        {
            Ok(o) => o,
            Err(e) => {
                tracing::warn!("cannot load authors of feed: {}", e);
                HashMap::new()
            },
        };

        let mut items = Vec::with_capacity(posts.len());
        for post in posts {
            let comments = self
                .comment_repository
                .finds(CommentQuery {
                    post: Some(post.id),
                    parent: None,
                    limit: Some(FEED_COMMENTS),
                })
                .await
                .let_(|r| or_warn(r, "comments", &post));

            let tags = self
                .tag_repository
                .finds(TagQuery {
                    post: Some(post.id),
                    ..Default::default()
                })
                .await
                .let_(|r| or_warn(r, "tags", &post));

            items.push(FeedPost {
                author: authors.get(&post.author).cloned(),
                comments: comments.into_iter().collect(),
                tags: tags.into_iter().map(|t| t.name).collect(),
                file_url: post.file.as_ref().map(|f| f.url.clone()),
                is_viewer_liked: liked.contains(&post.id),
                is_viewer_saved: NotTracked,
                is_viewer_in_photo: NotTracked,
                post,
            });
        }

        let meta = page_meta(total, items.len(), paging.page(), paging.limit());

        feed::Output { items, meta }
            .also_(|o| tracing::trace!("output - {:?}", o))
            .let_(|r| self.pres.complete(r))
            .await?;

        Ok(())
    }
}

pub struct PostGetInteractor {
    pub user_repository: Arc<dyn UserRepository + Sync + Send>,
    pub post_repository: Arc<dyn PostRepository + Sync + Send>,
    pub tag_repository: Arc<dyn TagRepository + Sync + Send>,
    pub like_repository: Arc<dyn LikeRepository + Sync + Send>,
    pub pres: Arc<dyn get::Presenter + Sync + Send>,
}
#[async_trait]
impl get::Usecase for PostGetInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: get::Input) -> Result<()> {
        tracing::trace!("input - {:?}", data);

        let get::Input { post_id } = data;

        let post = self
            .post_repository
            .find(post_id)
            .await
            .map_err(post_err_fmt)?;
        let author = self
            .user_repository
            .find(post.author)
            .await
            .map_err(user_err_fmt)?;

        let tags = self
            .tag_repository
            .finds(TagQuery {
                post: Some(post_id),
                ..Default::default()
            })
            .await
            .map_err(repo_err_fmt)?
            .into_iter()
            .map(|t| t.name)
            .collect();

        let liker_ids = self
            .like_repository
            .likers(LikeTarget::Post(post_id))
            .await
            .map_err(repo_err_fmt)?;
        let mut users = users_by_id(&*self.user_repository, liker_ids.iter().copied().collect())
            .await
            .map_err(repo_err_fmt)?;
        let likes = liker_ids
            .into_iter()
            .filter_map(|id| users.remove(&id))
            .collect();

        PostDetail {
            post,
            author,
            tags,
            likes,
        }
        .let_(|post| get::Output { post })
        .also_(|o| tracing::trace!("output - {:?}", o))
        .let_(|r| self.pres.complete(r))
        .await?;

        Ok(())
    }
}

pub struct PostLikesInteractor {
    pub user_repository: Arc<dyn UserRepository + Sync + Send>,
    pub post_repository: Arc<dyn PostRepository + Sync + Send>,
    pub like_repository: Arc<dyn LikeRepository + Sync + Send>,
    pub pres: Arc<dyn likes::Presenter + Sync + Send>,
}
#[async_trait]
impl likes::Usecase for PostLikesInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: likes::Input) -> Result<()> {
        tracing::trace!("input - {:?}", data);

        let likes::Input { post_id, viewer } = data;

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

        let liker_ids = self
            .like_repository
            .likers(LikeTarget::Post(post_id))
            .await
            .map_err(repo_err_fmt)?;
        let mut users = users_by_id(&*self.user_repository, liker_ids.iter().copied().collect())
            .await
            .map_err(repo_err_fmt)?;

        // "is the viewer one of this liker's followers"
        liker_ids
            .into_iter()
            .filter_map(|id| users.remove(&id))
            .map(|user| LikerView {
                is_viewer_followed: user.followers.contains(&viewer),
                user,
            })
            .collect::<Vec<_>>()
            .let_(|likers| likes::Output { likers })
            .also_(|o| tracing::trace!("output - {:?}", o))
            .let_(|r| self.pres.complete(r))
            .await?;

        Ok(())
    }
}

pub struct PostTagsInteractor {
    pub tag_repository: Arc<dyn TagRepository + Sync + Send>,
    pub pres: Arc<dyn tags::Presenter + Sync + Send>,
}
#[async_trait]
impl tags::Usecase for PostTagsInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: tags::Input) -> Result<()> {
        tracing::trace!("input - {:?}", data);

        let tags::Input { query } = data;

        let name = match query.is_empty() {
            true => None,
            false => TagQuery::containing(&query)
                .context("malformed tag query.")?
                .let_(Some),
        };

        self.tag_repository
            .finds(TagQuery {
                post: None,
                name,
                limit: Some(TAG_SEARCH_LIMIT),
            })
            .await
            .map_err(repo_err_fmt)?
            .let_(|tags| tags::Output { tags })
            .also_(|o| tracing::trace!("output - {:?}", o))
            .let_(|r| self.pres.complete(r))
            .await?;

        Ok(())
    }
}

pub struct PostCreateInteractor {
    pub user_repository: Arc<dyn UserRepository + Sync + Send>,
    pub post_repository: Arc<dyn PostRepository + Sync + Send>,
    pub tag_repository: Arc<dyn TagRepository + Sync + Send>,
    pub file_storage: Arc<dyn FileStorage + Sync + Send>,
    pub pres: Arc<dyn create::Presenter + Sync + Send>,
}
#[async_trait]
impl create::Usecase for PostCreateInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: create::Input) -> Result<()> {
        tracing::trace!("input - {:?}", data);

        let create::Input {
            file,
            description,
            tags,
            author,
        } = data;

        self.user_repository
            .find(author)
            .await
            .map_err(user_err_fmt)?;

        let file = self
            .file_storage
            .upload_public_file(UploadRequest {
                file,
                quality: UPLOAD_QUALITY,
                image_max_size_mb: UPLOAD_MAX_MB,
                kind: FileKind::Image,
            })
            .await
            .map_err(|e| anyhow!("cannot upload file: {}", e))?;

        let new_post = Post {
            id: self
                .post_repository
                .issue_id()
                .await
                .map_err(repo_err_fmt)?,
            description,
            author,
            file: Some(file),
            created: ::chrono::Utc::now(),
        };

        let can_insert = self
            .post_repository
            .insert(new_post.clone())
            .await
            .map_err(repo_err_fmt)?;

        if !can_insert {
            bail!("post id duplicated. ({})", new_post.id);
        }

        // separate write: a failure here leaves the post without tags.
        let tagging = apply_tags(&*self.tag_repository, new_post.id, tags).await?;

        create::Output {
            post: new_post,
            tagging,
        }
        .also_(|o| tracing::trace!("output - {:?}", o))
        .let_(|r| self.pres.complete(r))
        .await?;

        Ok(())
    }
}

pub struct PostUpdateInteractor {
    pub post_repository: Arc<dyn PostRepository + Sync + Send>,
    pub tag_repository: Arc<dyn TagRepository + Sync + Send>,
    pub pres: Arc<dyn update::Presenter + Sync + Send>,
}
#[async_trait]
impl update::Usecase for PostUpdateInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: update::Input) -> Result<()> {
        tracing::trace!("input - {:?}", data);

        let update::Input {
            post_id,
            description,
            tags,
        } = data;

        let post = self
            .post_repository
            .update(post_id, PostMutation { description })
            .await
            .map_err(post_err_fmt)?;

        let tagging = apply_tags(&*self.tag_repository, post_id, tags).await?;

        update::Output { post, tagging }
            .also_(|o| tracing::trace!("output - {:?}", o))
            .let_(|r| self.pres.complete(r))
            .await?;

        Ok(())
    }
}

pub struct PostDeleteInteractor {
    pub post_repository: Arc<dyn PostRepository + Sync + Send>,
    pub comment_repository: Arc<dyn CommentRepository + Sync + Send>,
    pub tag_repository: Arc<dyn TagRepository + Sync + Send>,
    pub like_repository: Arc<dyn LikeRepository + Sync + Send>,
    pub pres: Arc<dyn delete::Presenter + Sync + Send>,
}
#[async_trait]
impl delete::Usecase for PostDeleteInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: delete::Input) -> Result<()> {
        tracing::trace!("input - {:?}", data);

        let delete::Input { post_id } = data;

        self.post_repository
            .find(post_id)
            .await
            .map_err(post_err_fmt)?;

        // the post row goes last, so a failed cascade can be retried.
        // reports stay: they are an append-only record.
        let comments = self
            .comment_repository
            .finds(CommentQuery {
                post: Some(post_id),
                ..Default::default()
            })
            .await
            .map_err(repo_err_fmt)?;

        let mut deleted_comments = 0;
        for c in comments {
            self.like_repository
                .delete_target(LikeTarget::Comment(c.id))
                .await
                .map_err(repo_err_fmt)?;
            self.comment_repository
                .delete(c.id)
                .await
                .map_err(repo_err_fmt)?;
            deleted_comments += 1;
        }

        let deleted_tags = self
            .tag_repository
            .delete_by_post(post_id)
            .await
            .map_err(repo_err_fmt)?;
        self.like_repository
            .delete_target(LikeTarget::Post(post_id))
            .await
            .map_err(repo_err_fmt)?;

        let post = self
            .post_repository
            .delete(post_id)
            .await
            .map_err(post_err_fmt)?;

        delete::Output {
            post,
            deleted_comments,
            deleted_tags,
        }
        .also_(|o| tracing::trace!("output - {:?}", o))
        .let_(|r| self.pres.complete(r))
        .await?;

        Ok(())
    }
}

pub struct PostReportInteractor {
    pub user_repository: Arc<dyn UserRepository + Sync + Send>,
    pub post_repository: Arc<dyn PostRepository + Sync + Send>,
    pub report_repository: Arc<dyn ReportRepository + Sync + Send>,
    pub pres: Arc<dyn report::Presenter + Sync + Send>,
}
#[async_trait]
impl report::Usecase for PostReportInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: report::Input) -> Result<()> {
        tracing::trace!("input - {:?}", data);

        let report::Input {
            post_id,
            reason,
            reporter,
        } = data;

        self.post_repository
            .find(post_id)
            .await
            .map_err(post_err_fmt)?;
        self.user_repository
            .find(reporter)
            .await
            .map_err(user_err_fmt)?;

        let new_report = Report {
            id: self
                .report_repository
                .issue_id()
                .await
                .map_err(repo_err_fmt)?,
            reporter,
            reported: post_id,
            reason,
        };

        let can_insert = self
            .report_repository
            .insert(new_report.clone())
            .await
            .map_err(repo_err_fmt)?;

        if !can_insert {
            bail!("report id duplicated. ({})", new_report.id);
        }

        let times_reported = self
            .report_repository
            .finds_by_reported(post_id)
            .await
            .map_err(repo_err_fmt)?
            .len() as u64;

        report::Output {
            report: new_report,
            times_reported,
        }
        .also_(|o| tracing::trace!("output - {:?}", o))
        .let_(|r| self.pres.complete(r))
        .await?;

        Ok(())
    }
}

/// sharing is not implemented. nothing is recorded.
pub struct PostShareInteractor {
    pub pres: Arc<dyn share::Presenter + Sync + Send>,
}
#[async_trait]
impl share::Usecase for PostShareInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: share::Input) -> Result<()> {
        let share::Input { post_id, user_id } = data;

        tracing::info!("share requested: post {} by user {}", post_id, user_id);

        self.pres
            .complete(share::Output { shared: NotTracked })
            .await?;

        Ok(())
    }
}

pub struct PostLikeInteractor {
    pub user_repository: Arc<dyn UserRepository + Sync + Send>,
    pub post_repository: Arc<dyn PostRepository + Sync + Send>,
    pub like_repository: Arc<dyn LikeRepository + Sync + Send>,
    pub pres: Arc<dyn like::Presenter + Sync + Send>,
}
#[async_trait]
impl like::Usecase for PostLikeInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: like::Input) -> Result<()> {
        tracing::trace!("input - {:?}", data);

        let like::Input { post_id, user_id } = data;

        if !self
            .user_repository
            .is_exists(user_id)
            .await
            .map_err(repo_err_fmt)?
        {
            return Err(user_err_fmt(RepositoryError::NotFound));
        }
        if !self
            .post_repository
            .is_exists(post_id)
            .await
            .map_err(repo_err_fmt)?
        {
            return Err(post_err_fmt(RepositoryError::NotFound));
        }

        self.like_repository
            .toggle(user_id, LikeTarget::Post(post_id))
            .await
            .map_err(repo_err_fmt)?
            .let_(|liked| like::Output { post_id, liked })
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
    use tokio::sync::mpsc;

    use crate::entities::{Comment, CommentId, Like, PostId, ReportReason, Tag};
    use crate::presenters::ReturnPresenter;
    use crate::repositories::mock::InMemoryRepository;
    use crate::repositories::{CommentMutation, RepositoryError};
    use crate::storage::Upload;
    use crate::usecases::comment;
    use crate::usecases::user::{follow, register};
    use crate::usecases::Tagging;

    type RepoResult<T> = ::std::result::Result<T, RepositoryError>;

    fn image() -> Upload {
        Upload {
            name: "cat.png".to_string(),
            content_type: "image/png".to_string(),
            bytes: vec![0x89, 0x50, 0x4e, 0x47],
        }
    }

    async fn register_user(app: &App, id: u32) -> UserId {
        app.user
            .register(register::Input {
                user_id: UserId(id),
                name: format!("user{}", id),
                created: ::chrono::Utc::now(),
            })
            .await
            .unwrap();

        UserId(id)
    }

    async fn create_post(app: &App, author: UserId, desc: &str, tags: Option<&str>) -> create::Output {
        app.post
            .create(create::Input {
                file: image(),
                description: desc.to_string(),
                tags: tags.map(str::to_string),
                author,
            })
            .await
            .unwrap()
    }

    async fn feed_of(app: &App, viewer: UserId, page: u32, limit: u32) -> feed::Output {
        app.post
            .feed(feed::Input {
                viewer,
                page,
                limit,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn feed_is_newest_first_with_meta() {
        let app = in_memory();
        let alice = register_user(&app, 1).await;

        let mut ids = vec![];
        for i in 0..5 {
            ids.push(create_post(&app, alice, &format!("p{}", i), None).await.post.id);
        }

        let first = feed_of(&app, alice, 1, 2).await;
        assert_eq!(
            first.items.iter().map(|p| p.post.id).collect::<Vec<_>>(),
            vec![ids[4], ids[3]]
        );
        assert_eq!(first.meta.total_items, 5);
        assert_eq!(first.meta.total_pages, 3);
        assert_eq!(first.meta.item_count, 2);
        assert_eq!(first.meta.current_page, 1);

        let last = feed_of(&app, alice, 3, 2).await;
        assert_eq!(last.items.len(), 1);
        assert_eq!(last.items[0].post.id, ids[0]);

        let beyond = feed_of(&app, alice, 4, 2).await;
        assert!(beyond.items.is_empty());
        assert_eq!(beyond.meta.total_items, 5);

        for w in first.items.windows(2) {
            assert!(w[0].post.created >= w[1].post.created);
        }
    }

    #[tokio::test]
    async fn feed_rejects_zero_paging_and_unknown_viewer() {
        let app = in_memory();
        let alice = register_user(&app, 1).await;

        assert!(app
            .post
            .feed(feed::Input {
                viewer: alice,
                page: 0,
                limit: 10
            })
            .await
            .is_err());

        let e = app
            .post
            .feed(feed::Input {
                viewer: UserId(99),
                page: 1,
                limit: 10,
            })
            .await
            .unwrap_err();
        assert!(is_not_found(&e));
    }

    /// a backend that is down for every call.
    struct Unreachable;

    fn unreachable_err() -> RepositoryError {
        RepositoryError::Internal(::anyhow::anyhow!("connection refused"))
    }

    #[async_trait]
    impl TagRepository for Unreachable {
        async fn replace(&self, _: PostId, _: Vec<String>) -> RepoResult<Vec<Tag>> {
            Err(unreachable_err())
        }

        async fn finds(&self, _: TagQuery) -> RepoResult<Vec<Tag>> { Err(unreachable_err()) }

        async fn delete_by_post(&self, _: PostId) -> RepoResult<u64> { Err(unreachable_err()) }
    }

    #[async_trait]
    impl CommentRepository for Unreachable {
        async fn issue_id(&self) -> RepoResult<CommentId> { Err(unreachable_err()) }

        async fn insert(&self, _: Comment) -> RepoResult<bool> { Err(unreachable_err()) }

        async fn find(&self, _: CommentId) -> RepoResult<Comment> { Err(unreachable_err()) }

        async fn finds(&self, _: CommentQuery) -> RepoResult<Vec<Comment>> {
            Err(unreachable_err())
        }

        async fn update(&self, _: CommentId, _: CommentMutation) -> RepoResult<Comment> {
            Err(unreachable_err())
        }

        async fn delete(&self, _: CommentId) -> RepoResult<Comment> { Err(unreachable_err()) }
    }

    #[tokio::test]
    async fn feed_survives_broken_enrichment() {
        let user_repository = Arc::new(InMemoryRepository::<User>::new());
        let post_repository = Arc::new(InMemoryRepository::<Post>::new());

        let now = ::chrono::Utc::now();
        user_repository
            .insert(User {
                id: UserId(1),
                name: "alice".to_string(),
                followers: HashSet::new(),
                created: now,
            })
            .await
            .unwrap();
        for n in 1..=3 {
            post_repository
                .insert(Post {
                    id: PostId(n),
                    description: format!("p{}", n),
                    author: UserId(1),
                    file: None,
                    created: now + ::chrono::Duration::seconds(i64::from(n)),
                })
                .await
                .unwrap();
        }

        let (tx, mut rx) = mpsc::channel::<feed::Output>(1);
        let interactor = PostFeedInteractor {
            user_repository,
            post_repository,
            comment_repository: Arc::new(Unreachable),
            tag_repository: Arc::new(Unreachable),
            like_repository: Arc::new(InMemoryRepository::<Like>::new()),
            pres: Arc::new(ReturnPresenter { ret: tx }),
        };

        feed::Usecase::handle(&interactor, feed::Input {
            viewer: UserId(1),
            page: 1,
            limit: 2,
        })
        .await
        .unwrap();
        let out = rx.recv().await.unwrap();

        assert_eq!(
            out.items.iter().map(|p| p.post.id).collect::<Vec<_>>(),
            vec![PostId(3), PostId(2)]
        );
        assert_eq!(out.meta.total_items, 3);
        assert_eq!(out.meta.total_pages, 2);
        assert_eq!(out.meta.item_count, 2);
        assert!(out.items.iter().all(|p| p.tags.is_empty() && p.comments.is_empty()));
        assert!(out.items.iter().all(|p| p.author.is_some()));
    }

    #[tokio::test]
    async fn failed_delete_cascade_keeps_the_post() {
        let post_repository = Arc::new(InMemoryRepository::<Post>::new());
        post_repository
            .insert(Post {
                id: PostId(1),
                description: "p1".to_string(),
                author: UserId(1),
                file: None,
                created: ::chrono::Utc::now(),
            })
            .await
            .unwrap();

        let (tx, _rx) = mpsc::channel::<delete::Output>(1);
        let interactor = PostDeleteInteractor {
            post_repository: post_repository.clone(),
            comment_repository: Arc::new(InMemoryRepository::<Comment>::new()),
            tag_repository: Arc::new(Unreachable),
            like_repository: Arc::new(InMemoryRepository::<Like>::new()),
            pres: Arc::new(ReturnPresenter { ret: tx }),
        };

        let res = delete::Usecase::handle(&interactor, delete::Input {
            post_id: PostId(1),
        })
        .await;
        assert!(res.is_err());
        assert!(post_repository.is_exists(PostId(1)).await.unwrap());
    }

    #[tokio::test]
    async fn feed_marks_viewer_likes_and_caps_comments() {
        let app = in_memory();
        let alice = register_user(&app, 1).await;
        let bob = register_user(&app, 2).await;

        let liked = create_post(&app, alice, "liked", None).await.post.id;
        let other = create_post(&app, alice, "other", Some("[\"x\"]")).await.post.id;

        app.post
            .like(like::Input {
                post_id: liked,
                user_id: bob,
            })
            .await
            .unwrap();

        let mut comment_ids = vec![];
        for i in 0..4 {
            comment_ids.push(
                app.comment
                    .create(comment::create::Input {
                        text: format!("c{}", i),
                        post_id: other,
                        reply_to: None,
                        author: bob,
                    })
                    .await
                    .unwrap()
                    .comment
                    .id,
            );
        }

        let page = feed_of(&app, bob, 1, 10).await;
        let by_id = |id: PostId| page.items.iter().find(|p| p.post.id == id).unwrap();

        assert!(by_id(liked).is_viewer_liked);
        assert!(!by_id(other).is_viewer_liked);
        assert!(!by_id(liked).is_viewer_saved.get());
        assert!(!by_id(liked).is_viewer_in_photo.get());

        let comments = &by_id(other).comments;
        assert_eq!(
            comments.iter().map(|c| c.id).collect::<Vec<_>>(),
            vec![comment_ids[3], comment_ids[2]]
        );
        assert_eq!(by_id(other).tags, vec!["x".to_string()]);
        assert!(by_id(other).file_url.as_deref().unwrap().starts_with("memory://"));
        assert_eq!(by_id(other).author.as_ref().unwrap().id, alice);

        let alice_view = feed_of(&app, alice, 1, 10).await;
        assert!(alice_view.items.iter().all(|p| !p.is_viewer_liked));
    }

    #[tokio::test]
    async fn malformed_tags_still_create_post() {
        let app = in_memory();
        let alice = register_user(&app, 1).await;

        let created = create_post(&app, alice, "hello", Some("not json")).await;
        assert!(matches!(created.tagging, Tagging::Skipped { .. }));

        let detail = app
            .post
            .get(get::Input {
                post_id: created.post.id,
            })
            .await
            .unwrap();
        assert!(detail.post.tags.is_empty());
        assert_eq!(detail.post.post.description, "hello");
    }

    #[tokio::test]
    async fn upload_failure_creates_no_post() {
        let app = in_memory();
        let alice = register_user(&app, 1).await;

        let res = app
            .post
            .create(create::Input {
                file: Upload {
                    name: "notes.txt".to_string(),
                    content_type: "text/plain".to_string(),
                    bytes: b"hi".to_vec(),
                },
                description: "nope".to_string(),
                tags: None,
                author: alice,
            })
            .await;
        assert!(res.is_err());

        assert_eq!(feed_of(&app, alice, 1, 10).await.meta.total_items, 0);
    }

    #[tokio::test]
    async fn create_requires_author() {
        let app = in_memory();

        let e = app
            .post
            .create(create::Input {
                file: image(),
                description: "ghost".to_string(),
                tags: None,
                author: UserId(7),
            })
            .await
            .unwrap_err();
        assert!(is_not_found(&e));
    }

    #[tokio::test]
    async fn update_replaces_tags_and_reports_outcome() {
        let app = in_memory();
        let alice = register_user(&app, 1).await;
        let id = create_post(&app, alice, "a", Some("[\"old\"]")).await.post.id;

        let out = app
            .post
            .update(update::Input {
                post_id: id,
                description: Some("b".to_string()),
                tags: Some("[\"new\",\"newer\"]".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(out.post.description, "b");
        assert_eq!(
            out.tagging,
            Tagging::Attached {
                names: vec!["new".to_string(), "newer".to_string()]
            }
        );

        let out = app
            .post
            .update(update::Input {
                post_id: id,
                description: None,
                tags: Some("{".to_string()),
            })
            .await
            .unwrap();
        assert!(matches!(out.tagging, Tagging::Skipped { .. }));
        assert_eq!(out.post.description, "b");

        let detail = app.post.get(get::Input { post_id: id }).await.unwrap();
        assert_eq!(detail.post.tags, vec!["new".to_string(), "newer".to_string()]);

        let e = app
            .post
            .update(update::Input {
                post_id: PostId(404),
                description: None,
                tags: None,
            })
            .await
            .unwrap_err();
        assert!(is_not_found(&e));
    }

    #[tokio::test]
    async fn like_toggle_is_idempotent_over_two_calls() {
        let app = in_memory();
        let alice = register_user(&app, 1).await;
        let id = create_post(&app, alice, "a", None).await.post.id;

        let toggle = || {
            app.post.like(like::Input {
                post_id: id,
                user_id: alice,
            })
        };

        assert!(toggle().await.unwrap().liked);
        assert!(feed_of(&app, alice, 1, 10).await.items[0].is_viewer_liked);
        assert!(!toggle().await.unwrap().liked);
        assert!(!feed_of(&app, alice, 1, 10).await.items[0].is_viewer_liked);

        let e = app
            .post
            .like(like::Input {
                post_id: PostId(404),
                user_id: alice,
            })
            .await
            .unwrap_err();
        assert!(is_not_found(&e));
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        let app = in_memory();
        let alice = register_user(&app, 1).await;
        let id = create_post(&app, alice, "a", Some("[\"t\"]")).await.post.id;

        app.comment
            .create(comment::create::Input {
                text: "c".to_string(),
                post_id: id,
                reply_to: None,
                author: alice,
            })
            .await
            .unwrap();

        let out = app.post.delete(delete::Input { post_id: id }).await.unwrap();
        assert_eq!(out.deleted_comments, 1);
        assert_eq!(out.deleted_tags, 1);

        let e = app.post.get(get::Input { post_id: id }).await.unwrap_err();
        assert!(is_not_found(&e));

        let e = app.post.delete(delete::Input { post_id: id }).await.unwrap_err();
        assert!(is_not_found(&e));

        let tags = app
            .post
            .tags(tags::Input {
                query: String::new(),
            })
            .await
            .unwrap();
        assert!(tags.tags.is_empty());
    }

    #[tokio::test]
    async fn tag_search_is_case_insensitive_and_capped() {
        let app = in_memory();
        let alice = register_user(&app, 1).await;
        create_post(&app, alice, "a", Some("[\"Cats\",\"Category\",\"Dog\"]")).await;

        let found = app
            .post
            .tags(tags::Input {
                query: "cat".to_string(),
            })
            .await
            .unwrap()
            .tags
            .into_iter()
            .map(|t| t.name)
            .collect::<Vec<_>>();
        assert_eq!(found, vec!["Cats".to_string(), "Category".to_string()]);

        let many = (0..30).map(|i| format!("\"t{}\"", i)).collect::<Vec<_>>().join(",");
        create_post(&app, alice, "b", Some(format!("[{}]", many).as_str())).await;

        let all = app
            .post
            .tags(tags::Input {
                query: String::new(),
            })
            .await
            .unwrap()
            .tags;
        assert_eq!(all.len(), 20);
        assert_eq!(all[0].name, "Cats");
    }

    #[tokio::test]
    async fn likers_carry_follow_flag() {
        let app = in_memory();
        let alice = register_user(&app, 1).await;
        let bob = register_user(&app, 2).await;
        let carol = register_user(&app, 3).await;
        let id = create_post(&app, alice, "a", None).await.post.id;

        for u in [bob, carol] {
            app.post
                .like(like::Input {
                    post_id: id,
                    user_id: u,
                })
                .await
                .unwrap();
        }
        // alice follows bob
        app.user
            .follow(follow::Input {
                user_id: bob,
                follower: alice,
            })
            .await
            .unwrap();

        let likers = app
            .post
            .likes(likes::Input {
                post_id: id,
                viewer: alice,
            })
            .await
            .unwrap()
            .likers;

        assert_eq!(likers.len(), 2);
        assert!(likers.iter().find(|l| l.user.id == bob).unwrap().is_viewer_followed);
        assert!(!likers.iter().find(|l| l.user.id == carol).unwrap().is_viewer_followed);
    }

    #[tokio::test]
    async fn reports_always_append() {
        let app = in_memory();
        let alice = register_user(&app, 1).await;
        let id = create_post(&app, alice, "a", None).await.post.id;

        let input = || report::Input {
            post_id: id,
            reason: ReportReason(2),
            reporter: alice,
        };
        let first = app.post.report(input()).await.unwrap();
        let second = app.post.report(input()).await.unwrap();
        assert_ne!(first.report.id, second.report.id);
        assert_eq!(first.times_reported, 1);
        assert_eq!(second.times_reported, 2);

        let e = app
            .post
            .report(report::Input {
                post_id: PostId(404),
                reason: ReportReason(2),
                reporter: alice,
            })
            .await
            .unwrap_err();
        assert!(is_not_found(&e));
    }

    #[tokio::test]
    async fn share_records_nothing() {
        let app = in_memory();

        let out = app
            .post
            .share(share::Input {
                post_id: PostId(1),
                user_id: UserId(1),
            })
            .await
            .unwrap();
        assert!(!out.shared.get());
    }
}
