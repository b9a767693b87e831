use std::sync::Arc;

use tokio::sync::mpsc;

use crate::controllers::comment::ReturnCommentController;
use crate::controllers::post::ReturnPostController;
use crate::controllers::user::ReturnUserController;
use crate::controllers::Endpoint;
use crate::entities::{Comment, Like, Post, Report, Tag, User};
use crate::interactors::comment::{
    CommentCreateInteractor, CommentDeleteInteractor, CommentLikeInteractor,
    CommentListInteractor, CommentUpdateInteractor,
};
use crate::interactors::post::{
    PostCreateInteractor, PostDeleteInteractor, PostFeedInteractor, PostGetInteractor,
    PostLikeInteractor, PostLikesInteractor, PostReportInteractor, PostShareInteractor,
    PostTagsInteractor, PostUpdateInteractor,
};
use crate::interactors::user::{
    UserFollowInteractor, UserGetInteractor, UserRegisterInteractor, UserUnfollowInteractor,
};
use crate::presenters::ReturnPresenter;
use crate::repositories::mock::InMemoryRepository;
use crate::repositories::mongo::{
    MongoCommentRepository, MongoLikeRepository, MongoPostRepository, MongoReportRepository,
    MongoTagRepository, MongoUserRepository,
};
use crate::repositories::{
    CommentRepository, LikeRepository, PostRepository, ReportRepository, TagRepository,
    UserRepository,
};
use crate::storage::mock::InMemoryFileStorage;
use crate::storage::FileStorage;
use crate::usecases::{comment, post, user};

/// every controller of the application, sharing one set of collaborators.
pub struct App {
    pub post: ReturnPostController,
    pub comment: ReturnCommentController,
    pub user: ReturnUserController,
}

struct Collaborators {
    user_repository: Arc<dyn UserRepository + Sync + Send>,
    post_repository: Arc<dyn PostRepository + Sync + Send>,
    comment_repository: Arc<dyn CommentRepository + Sync + Send>,
    tag_repository: Arc<dyn TagRepository + Sync + Send>,
    report_repository: Arc<dyn ReportRepository + Sync + Send>,
    like_repository: Arc<dyn LikeRepository + Sync + Send>,
    file_storage: Arc<dyn FileStorage + Sync + Send>,
}

macro_rules! endpoint {
    ($c:ident; $g:ident :: $m:ident => $i:ident { $( $f:ident ),* $(,)? }) => {{
        let (tx, rx) = mpsc::channel::<$g::$m::Output>(1);

        let usecase: Arc<dyn $g::$m::Usecase + Sync + Send> = Arc::new($i {
            $( $f: $c.$f.clone(), )*
            pres: Arc::new(ReturnPresenter { ret: tx }),
        });

        Endpoint::new(usecase, rx)
    }};
}

fn wire(c: Collaborators) -> App {
    let post = ReturnPostController::new(
        endpoint!(c; post::feed => PostFeedInteractor {
            user_repository, post_repository, comment_repository, tag_repository, like_repository,
        }),
        endpoint!(c; post::get => PostGetInteractor {
            user_repository, post_repository, tag_repository, like_repository,
        }),
        endpoint!(c; post::likes => PostLikesInteractor {
            user_repository, post_repository, like_repository,
        }),
        endpoint!(c; post::tags => PostTagsInteractor { tag_repository }),
        endpoint!(c; post::create => PostCreateInteractor {
            user_repository, post_repository, tag_repository, file_storage,
        }),
        endpoint!(c; post::update => PostUpdateInteractor { post_repository, tag_repository }),
        endpoint!(c; post::delete => PostDeleteInteractor {
            post_repository, comment_repository, tag_repository, like_repository,
        }),
        endpoint!(c; post::report => PostReportInteractor {
            user_repository, post_repository, report_repository,
        }),
        endpoint!(c; post::share => PostShareInteractor {}),
        endpoint!(c; post::like => PostLikeInteractor {
            user_repository, post_repository, like_repository,
        }),
    );

    let comment = ReturnCommentController::new(
        endpoint!(c; comment::list => CommentListInteractor {
            user_repository, post_repository, comment_repository, like_repository,
        }),
        endpoint!(c; comment::create => CommentCreateInteractor {
            user_repository, post_repository, comment_repository,
        }),
        endpoint!(c; comment::update => CommentUpdateInteractor { comment_repository }),
        endpoint!(c; comment::delete => CommentDeleteInteractor {
            comment_repository, like_repository,
        }),
        endpoint!(c; comment::like => CommentLikeInteractor {
            user_repository, comment_repository, like_repository,
        }),
    );

    let user = ReturnUserController::new(
        endpoint!(c; user::register => UserRegisterInteractor { user_repository }),
        endpoint!(c; user::get => UserGetInteractor { user_repository, like_repository }),
        endpoint!(c; user::follow => UserFollowInteractor { user_repository }),
        endpoint!(c; user::unfollow => UserUnfollowInteractor { user_repository }),
    );

    App {
        post,
        comment,
        user,
    }
}

pub fn in_memory() -> App {
    in_memory_with(Arc::new(InMemoryFileStorage::new()))
}

pub fn in_memory_with(file_storage: Arc<dyn FileStorage + Sync + Send>) -> App {
    wire(Collaborators {
        user_repository: Arc::new(InMemoryRepository::<User>::new()),
        post_repository: Arc::new(InMemoryRepository::<Post>::new()),
        comment_repository: Arc::new(InMemoryRepository::<Comment>::new()),
        tag_repository: Arc::new(InMemoryRepository::<Tag>::new()),
        report_repository: Arc::new(InMemoryRepository::<Report>::new()),
        like_repository: Arc::new(InMemoryRepository::<Like>::new()),
        file_storage,
    })
}

pub async fn mongo(
    uri_str: impl AsRef<str>,
    db_name: impl AsRef<str>,
    file_storage: Arc<dyn FileStorage + Sync + Send>,
) -> ::anyhow::Result<App> {
    let c = ::mongodb::Client::with_uri_str(uri_str).await?;
    let db = c.database(db_name.as_ref());

    let app = wire(Collaborators {
        user_repository: Arc::new(MongoUserRepository::new_with(db.clone()).await?),
        post_repository: Arc::new(MongoPostRepository::new_with(db.clone()).await?),
        comment_repository: Arc::new(MongoCommentRepository::new_with(db.clone()).await?),
        tag_repository: Arc::new(MongoTagRepository::new_with(c, db.clone()).await?),
        report_repository: Arc::new(MongoReportRepository::new_with(db.clone()).await?),
        like_repository: Arc::new(MongoLikeRepository::new_with(db).await?),
        file_storage,
    });

    Ok(app)
}
