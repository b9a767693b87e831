use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;

use super::*;
use crate::entities::User;
use crate::repositories::{LikeRepository, UserRepository};
use crate::usecases::user::{follow, get, register, unfollow};
use crate::usecases::Profile;
use crate::utils::{AlsoChain, LetChain};

pub struct UserRegisterInteractor {
    pub user_repository: Arc<dyn UserRepository + Sync + Send>,
    pub pres: Arc<dyn register::Presenter + Sync + Send>,
}
#[async_trait]
impl register::Usecase for UserRegisterInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: register::Input) -> Result<()> {
        tracing::trace!("input - {:?}", data);

        let register::Input {
            user_id,
            name,
            created,
        } = data;

        let new_user = User {
            id: user_id,
            name,
            followers: HashSet::new(),
            created,
        };

        let can_insert = self
            .user_repository
            .insert(new_user.clone())
            .await
            .map_err(repo_err_fmt)?;

        if !can_insert {
            bail!("already registered.");
        }

        register::Output { user: new_user }
            .also_(|o| tracing::trace!("output - {:?}", o))
            .let_(|r| self.pres.complete(r))
            .await?;

        Ok(())
    }
}

pub struct UserGetInteractor {
    pub user_repository: Arc<dyn UserRepository + Sync + Send>,
    pub like_repository: Arc<dyn LikeRepository + Sync + Send>,
    pub pres: Arc<dyn get::Presenter + Sync + Send>,
}
#[async_trait]
impl get::Usecase for UserGetInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: get::Input) -> Result<()> {
        tracing::trace!("input - {:?}", data);

        let get::Input { user_id } = data;

        let user = self
            .user_repository
            .find(user_id)
            .await
            .map_err(user_err_fmt)?;
        let liked_posts = self
            .like_repository
            .liked_posts(user_id)
            .await
            .map_err(repo_err_fmt)?;
        let liked_comments = self
            .like_repository
            .liked_comments(user_id)
            .await
            .map_err(repo_err_fmt)?;

        Profile {
            user,
            liked_posts,
            liked_comments,
        }
        .let_(|profile| get::Output { profile })
        .also_(|o| tracing::trace!("output - {:?}", o))
        .let_(|r| self.pres.complete(r))
        .await?;

        Ok(())
    }
}

pub struct UserFollowInteractor {
    pub user_repository: Arc<dyn UserRepository + Sync + Send>,
    pub pres: Arc<dyn follow::Presenter + Sync + Send>,
}
#[async_trait]
impl follow::Usecase for UserFollowInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: follow::Input) -> Result<()> {
        tracing::trace!("input - {:?}", data);

        let follow::Input { user_id, follower } = data;

        if user_id == follower {
            bail!("cannot follow yourself.");
        }
        if !self
            .user_repository
            .is_exists(follower)
            .await
            .map_err(repo_err_fmt)?
        {
            return Err(user_err_fmt(RepositoryError::NotFound));
        }

        if self
            .user_repository
            .is_follower(user_id, follower)
            .await
            .map_err(user_err_fmt)?
        {
            bail!("already following.");
        }

        let inserted = self
            .user_repository
            .insert_follower(user_id, follower)
            .await
            .map_err(user_err_fmt)?;

        if !inserted {
            bail!("already following.");
        }

        self.user_repository
            .find(user_id)
            .await
            .map_err(user_err_fmt)?
            .let_(|user| follow::Output { user })
            .also_(|o| tracing::trace!("output - {:?}", o))
            .let_(|r| self.pres.complete(r))
            .await?;

        Ok(())
    }
}

pub struct UserUnfollowInteractor {
    pub user_repository: Arc<dyn UserRepository + Sync + Send>,
    pub pres: Arc<dyn unfollow::Presenter + Sync + Send>,
}
#[async_trait]
impl unfollow::Usecase for UserUnfollowInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: unfollow::Input) -> Result<()> {
        tracing::trace!("input - {:?}", data);

        let unfollow::Input { user_id, follower } = data;

        if !self
            .user_repository
            .is_follower(user_id, follower)
            .await
            .map_err(user_err_fmt)?
        {
            bail!("not following.");
        }

        let deleted = self
            .user_repository
            .delete_follower(user_id, follower)
            .await
            .map_err(user_err_fmt)?;

        if !deleted {
            bail!("not following.");
        }

        self.user_repository
            .find(user_id)
            .await
            .map_err(user_err_fmt)?
            .let_(|user| unfollow::Output { user })
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
    use crate::entities::UserId;

    async fn register_user(app: &App, id: u32) -> Result<register::Output> {
        app.user
            .register(register::Input {
                user_id: UserId(id),
                name: format!("user{}", id),
                created: ::chrono::Utc::now(),
            })
            .await
    }

    #[tokio::test]
    async fn register_rejects_duplicates() {
        let app = in_memory();

        let out = register_user(&app, 1).await.unwrap();
        assert_eq!(out.user.name, "user1");
        assert!(out.user.followers.is_empty());

        assert!(register_user(&app, 1).await.is_err());
    }

    #[tokio::test]
    async fn get_missing_user_is_not_found() {
        let app = in_memory();

        let e = app
            .user
            .get(get::Input {
                user_id: UserId(5),
            })
            .await
            .unwrap_err();
        assert!(is_not_found(&e));
    }

    #[tokio::test]
    async fn follow_and_unfollow() {
        let app = in_memory();
        register_user(&app, 1).await.unwrap();
        register_user(&app, 2).await.unwrap();

        let follow_as = |user_id, follower| {
            app.user.follow(follow::Input {
                user_id: UserId(user_id),
                follower: UserId(follower),
            })
        };

        let out = follow_as(1, 2).await.unwrap();
        assert!(out.user.followers.contains(&UserId(2)));
        assert!(follow_as(1, 2).await.is_err());
        assert!(follow_as(1, 1).await.is_err());
        assert!(is_not_found(&follow_as(1, 3).await.unwrap_err()));

        let out = app
            .user
            .unfollow(unfollow::Input {
                user_id: UserId(1),
                follower: UserId(2),
            })
            .await
            .unwrap();
        assert!(out.user.followers.is_empty());

        assert!(app
            .user
            .unfollow(unfollow::Input {
                user_id: UserId(1),
                follower: UserId(2),
            })
            .await
            .is_err());
    }
}
