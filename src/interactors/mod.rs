pub mod comment;
pub mod post;
pub mod user;

use anyhow::{anyhow, Error};

use crate::entities::PostId;
use crate::repositories::{RepositoryError, TagRepository};
use crate::usecases::{PageMeta, Tagging};
use crate::utils::count_pages;

/// `NotFound` stays downcastable behind the message, so callers can tell it apart.
fn not_found(what: &'static str) -> Error {
    Error::new(RepositoryError::NotFound).context(format!("cannot find {}.", what))
}

fn user_err_fmt(e: RepositoryError) -> Error {
    match e {
        RepositoryError::NotFound => not_found("user. not registered?"),
        e => anyhow!("repository error: {}", e),
    }
}

fn post_err_fmt(e: RepositoryError) -> Error {
    match e {
        RepositoryError::NotFound => not_found("post"),
        e => anyhow!("repository error: {}", e),
    }
}

fn comment_err_fmt(e: RepositoryError) -> Error {
    match e {
        RepositoryError::NotFound => not_found("comment"),
        e => anyhow!("repository error: {}", e),
    }
}

fn repo_err_fmt(e: RepositoryError) -> Error { anyhow!("repository error: {}", e) }

pub fn is_not_found(e: &Error) -> bool {
    matches!(
        e.downcast_ref::<RepositoryError>(),
        Some(RepositoryError::NotFound)
    )
}

fn page_meta(total_items: u64, item_count: usize, page: u32, limit: u32) -> PageMeta {
    PageMeta {
        total_items,
        item_count: item_count as u32,
        items_per_page: limit,
        total_pages: count_pages(total_items, limit),
        current_page: page,
    }
}

fn parse_tags(raw: &str) -> Result<Vec<String>, serde_json::Error> {
    serde_json::from_str::<Vec<String>>(raw)
}

/// best-effort tag step of post writes.
///
/// a malformed payload is reported as [`Tagging::Skipped`] and never fails
/// the write. storage errors are propagated.
async fn apply_tags(
    tag_repository: &(dyn TagRepository + Sync + Send),
    post: PostId,
    raw: Option<String>,
) -> ::anyhow::Result<Tagging> {
    let raw = match raw {
        Some(s) => s,
        None => return Ok(Tagging::Untouched),
    };

    let names = match parse_tags(&raw) {
        Ok(o) => o,
        Err(e) => {
            tracing::warn!("skipping tags of post {}: {}", post, e);
            return Ok(Tagging::Skipped {
                reason: e.to_string(),
            });
        },
    };

    let names = tag_repository
        .replace(post, names)
        .await
        .map_err(repo_err_fmt)?
        .into_iter()
        .map(|t| t.name)
        .collect();

    Ok(Tagging::Attached { names })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::mock::InMemoryRepository;
    use crate::entities::Tag;

    #[test]
    fn not_found_survives_context() {
        let e = post_err_fmt(RepositoryError::NotFound);
        assert!(is_not_found(&e));
        assert_eq!(e.to_string(), "cannot find post.");

        let e = post_err_fmt(RepositoryError::NoUnique { matched: 2 });
        assert!(!is_not_found(&e));
    }

    #[test]
    fn meta_counts_pages() {
        let meta = page_meta(25, 5, 3, 10);
        assert_eq!(meta.total_pages, 3);
        assert_eq!(meta.item_count, 5);
        assert_eq!(meta.current_page, 3);
        assert_eq!(meta.items_per_page, 10);
    }

    #[tokio::test]
    async fn tags_are_best_effort() {
        let repo = InMemoryRepository::<Tag>::new();

        assert_eq!(
            apply_tags(&repo, PostId(1), None).await.unwrap(),
            Tagging::Untouched
        );
        assert!(matches!(
            apply_tags(&repo, PostId(1), Some("[\"a\",".to_string()))
                .await
                .unwrap(),
            Tagging::Skipped { .. }
        ));
        assert_eq!(
            apply_tags(&repo, PostId(1), Some("[\"a\",\"b\"]".to_string()))
                .await
                .unwrap(),
            Tagging::Attached {
                names: vec!["a".to_string(), "b".to_string()]
            }
        );
    }
}
