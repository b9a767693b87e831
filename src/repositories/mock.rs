use std::cmp::Reverse;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{
    CommentMutation, CommentQuery, CommentRepository, LikeRepository, Paging, PostMutation,
    PostRepository, ReportRepository, RepositoryError, Result, TagQuery, TagRepository,
    UserQuery, UserRepository,
};
use crate::entities::{
    Comment, CommentId, Like, LikeTarget, Post, PostId, Report, ReportId, Tag, TagId, User,
    UserId,
};

mod helpers;

use helpers::{find_mut, find_ref, remove_one, truncate_to};

/// every operation holds the lock until it returns, so each call is atomic.
pub struct InMemoryRepository<T> {
    items: Mutex<Vec<T>>,
    seq: AtomicU32,
}

impl<T> InMemoryRepository<T> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(vec![]),
            seq: AtomicU32::new(1),
        }
    }

    fn next_seq(&self) -> u32 { self.seq.fetch_add(1, Ordering::SeqCst) }
}
impl<T> Default for InMemoryRepository<T> {
    fn default() -> Self { Self::new() }
}

#[async_trait]
impl UserRepository for InMemoryRepository<User> {
    async fn insert(&self, item: User) -> Result<bool> {
        let mut guard = self.items.lock().await;

        match find_ref(&guard, |v| v.id == item.id) {
            Ok(_) => return Ok(false),
            Err(RepositoryError::NotFound) => (),
            Err(e) => return Err(e),
        }

        guard.push(item);
        Ok(true)
    }

    async fn is_exists(&self, id: UserId) -> Result<bool> {
        let guard = self.items.lock().await;

        match find_ref(&guard, |v| v.id == id) {
            Ok(_) => Ok(true),
            Err(RepositoryError::NotFound) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn find(&self, id: UserId) -> Result<User> {
        let guard = self.items.lock().await;

        Ok(find_ref(&guard, |v| v.id == id)?.clone())
    }

    async fn finds(&self, UserQuery { ids }: UserQuery) -> Result<Vec<User>> {
        Ok(self
            .items
            .lock()
            .await
            .iter()
            .filter(|u| ids.as_ref().map(|s| s.contains(&u.id)).unwrap_or(true))
            .cloned()
            .collect())
    }

    async fn is_follower(&self, id: UserId, follower: UserId) -> Result<bool> {
        let guard = self.items.lock().await;
        let item = find_ref(&guard, |u| u.id == id)?;

        Ok(item.followers.contains(&follower))
    }

    async fn insert_follower(&self, id: UserId, follower: UserId) -> Result<bool> {
        let mut guard = self.items.lock().await;
        let item = find_mut(&mut guard, |u| u.id == id)?;

        Ok(item.followers.insert(follower))
    }

    async fn delete_follower(&self, id: UserId, follower: UserId) -> Result<bool> {
        let mut guard = self.items.lock().await;
        let item = find_mut(&mut guard, |u| u.id == id)?;

        Ok(item.followers.remove(&follower))
    }
}

#[async_trait]
impl PostRepository for InMemoryRepository<Post> {
    async fn issue_id(&self) -> Result<PostId> { Ok(PostId(self.next_seq())) }

    async fn insert(&self, item: Post) -> Result<bool> {
        let mut guard = self.items.lock().await;

        if guard.iter().any(|v| v.id == item.id) {
            return Ok(false);
        }

        guard.push(item);
        Ok(true)
    }

    async fn is_exists(&self, id: PostId) -> Result<bool> {
        Ok(self.items.lock().await.iter().any(|v| v.id == id))
    }

    async fn find(&self, id: PostId) -> Result<Post> {
        let guard = self.items.lock().await;

        Ok(find_ref(&guard, |v| v.id == id)?.clone())
    }

    async fn page(&self, paging: Paging) -> Result<(Vec<Post>, u64)> {
        let guard = self.items.lock().await;

        let mut all = guard.iter().collect::<Vec<_>>();
        all.sort_by_key(|p| Reverse((p.created, p.id)));

        let total = all.len() as u64;
        let items = all
            .drain(..)
            .skip(paging.offset() as usize)
            .take(paging.limit() as usize)
            .cloned()
            .collect();

        Ok((items, total))
    }

    async fn update(
        &self,
        id: PostId,
        PostMutation { description }: PostMutation,
    ) -> Result<Post> {
        let mut guard = self.items.lock().await;
        let item = find_mut(&mut guard, |v| v.id == id)?;

        if let Some(val) = description {
            item.description = val;
        }

        Ok(item.clone())
    }

    async fn delete(&self, id: PostId) -> Result<Post> {
        let mut guard = self.items.lock().await;

        remove_one(&mut guard, |v| v.id == id)
    }
}

#[async_trait]
impl CommentRepository for InMemoryRepository<Comment> {
    async fn issue_id(&self) -> Result<CommentId> { Ok(CommentId(self.next_seq())) }

    async fn insert(&self, item: Comment) -> Result<bool> {
        let mut guard = self.items.lock().await;

        if guard.iter().any(|v| v.id == item.id) {
            return Ok(false);
        }

        guard.push(item);
        Ok(true)
    }

    async fn find(&self, id: CommentId) -> Result<Comment> {
        let guard = self.items.lock().await;

        Ok(find_ref(&guard, |v| v.id == id)?.clone())
    }

    async fn finds(
        &self,
        CommentQuery {
            post,
            parent,
            limit,
        }: CommentQuery,
    ) -> Result<Vec<Comment>> {
        let mut res = self
            .items
            .lock()
            .await
            .iter()
            .filter(|c| post.map(|p| c.post == p).unwrap_or(true))
            .filter(|c| parent.map(|p| c.parent == Some(p)).unwrap_or(true))
            .cloned()
            .collect::<Vec<_>>();
        res.sort_by_key(|c| Reverse((c.created, c.id)));

        Ok(truncate_to(res, limit))
    }

    async fn update(
        &self,
        id: CommentId,
        CommentMutation { text }: CommentMutation,
    ) -> Result<Comment> {
        let mut guard = self.items.lock().await;
        let item = find_mut(&mut guard, |v| v.id == id)?;

        if let Some(val) = text {
            item.text = val;
        }

        Ok(item.clone())
    }

    async fn delete(&self, id: CommentId) -> Result<Comment> {
        let mut guard = self.items.lock().await;

        remove_one(&mut guard, |v| v.id == id)
    }
}

#[async_trait]
impl TagRepository for InMemoryRepository<Tag> {
    async fn replace(&self, post: PostId, names: Vec<String>) -> Result<Vec<Tag>> {
        let mut guard = self.items.lock().await;
        guard.retain(|t| t.post != post);

        let tags = names
            .into_iter()
            .map(|name| Tag {
                id: TagId(self.next_seq()),
                name,
                post,
            })
            .collect::<Vec<_>>();
        guard.extend(tags.iter().cloned());

        Ok(tags)
    }

    async fn finds(&self, TagQuery { post, name, limit }: TagQuery) -> Result<Vec<Tag>> {
        let mut res = self
            .items
            .lock()
            .await
            .iter()
            .filter(|t| post.map(|p| t.post == p).unwrap_or(true))
            .filter(|t| name.as_ref().map(|r| r.is_match(&t.name)).unwrap_or(true))
            .cloned()
            .collect::<Vec<_>>();
        res.sort_by_key(|t| t.id);

        Ok(truncate_to(res, limit))
    }

    async fn delete_by_post(&self, post: PostId) -> Result<u64> {
        let mut guard = self.items.lock().await;
        let before = guard.len();
        guard.retain(|t| t.post != post);

        Ok((before - guard.len()) as u64)
    }
}

#[async_trait]
impl ReportRepository for InMemoryRepository<Report> {
    async fn issue_id(&self) -> Result<ReportId> { Ok(ReportId(self.next_seq())) }

    async fn insert(&self, item: Report) -> Result<bool> {
        let mut guard = self.items.lock().await;

        if guard.iter().any(|v| v.id == item.id) {
            return Ok(false);
        }

        guard.push(item);
        Ok(true)
    }

    async fn finds_by_reported(&self, post: PostId) -> Result<Vec<Report>> {
        Ok(self
            .items
            .lock()
            .await
            .iter()
            .filter(|r| r.reported == post)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl LikeRepository for InMemoryRepository<Like> {
    async fn toggle(&self, user: UserId, target: LikeTarget) -> Result<bool> {
        let row = Like { user, target };
        let mut guard = self.items.lock().await;

        match remove_one(&mut guard, |l| *l == row) {
            Ok(_) => Ok(false),
            Err(RepositoryError::NotFound) => {
                guard.push(row);
                Ok(true)
            },
            Err(e) => Err(e),
        }
    }

    async fn liked_posts(&self, user: UserId) -> Result<HashSet<PostId>> {
        Ok(self
            .items
            .lock()
            .await
            .iter()
            .filter(|l| l.user == user)
            .filter_map(|l| match l.target {
                LikeTarget::Post(id) => Some(id),
                LikeTarget::Comment(_) => None,
            })
            .collect())
    }

    async fn liked_comments(&self, user: UserId) -> Result<HashSet<CommentId>> {
        Ok(self
            .items
            .lock()
            .await
            .iter()
            .filter(|l| l.user == user)
            .filter_map(|l| match l.target {
                LikeTarget::Comment(id) => Some(id),
                LikeTarget::Post(_) => None,
            })
            .collect())
    }

    async fn likers(&self, target: LikeTarget) -> Result<Vec<UserId>> {
        Ok(self
            .items
            .lock()
            .await
            .iter()
            .filter(|l| l.target == target)
            .map(|l| l.user)
            .collect())
    }

    async fn delete_target(&self, target: LikeTarget) -> Result<u64> {
        let mut guard = self.items.lock().await;
        let before = guard.len();
        guard.retain(|l| l.target != target);

        Ok((before - guard.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn toggle_flips_membership() {
        let repo = InMemoryRepository::<Like>::new();
        let target = LikeTarget::Post(PostId(7));

        assert!(repo.toggle(UserId(1), target).await.unwrap());
        assert!(repo.liked_posts(UserId(1)).await.unwrap().contains(&PostId(7)));
        assert!(!repo.toggle(UserId(1), target).await.unwrap());
        assert!(repo.liked_posts(UserId(1)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn concurrent_toggles_do_not_lose_updates() {
        let repo = ::std::sync::Arc::new(InMemoryRepository::<Like>::new());

        let handles = (1..=16)
            .map(|n| {
                let repo = repo.clone();
                tokio::spawn(async move {
                    repo.toggle(UserId(1), LikeTarget::Post(PostId(n))).await
                })
            })
            .collect::<Vec<_>>();
        for h in handles {
            assert!(h.await.unwrap().unwrap());
        }

        assert_eq!(repo.liked_posts(UserId(1)).await.unwrap().len(), 16);
    }

    #[tokio::test]
    async fn tag_replace_is_wholesale() {
        let repo = InMemoryRepository::<Tag>::new();

        repo.replace(PostId(1), vec!["a".into(), "b".into()])
            .await
            .unwrap();
        repo.replace(PostId(2), vec!["a".into()]).await.unwrap();
        repo.replace(PostId(1), vec!["c".into()]).await.unwrap();

        let tags = repo
            .finds(TagQuery {
                post: Some(PostId(1)),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(
            tags.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(),
            vec!["c"]
        );
        assert_eq!(repo.finds(TagQuery::default()).await.unwrap().len(), 2);
    }
}
