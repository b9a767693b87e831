use anyhow::anyhow;
use mongodb::error::{ErrorKind, Result as MongoResult, WriteFailure};

use super::{RepositoryError, Result as RepoResult};
use crate::entities::Date;
use crate::utils::LetChain;

const DUPLICATE_KEY: i32 = 11000;

pub fn convert_repo_err<T, E>(result: Result<T, E>) -> RepoResult<T>
where E: Sync + Send + ::std::error::Error + 'static {
    result.map_err(|e| RepositoryError::Internal(anyhow!(e)))
}

/// `Ok(false)` when the write was rejected by a unique index.
pub fn try_unique_check<T>(result: MongoResult<T>) -> RepoResult<bool> {
    let e = match result {
        Ok(_) => return Ok(true),
        Err(e) => e,
    };

    let duplicated = matches!(
        *e.kind,
        ErrorKind::Write(WriteFailure::WriteError(ref we)) if we.code == DUPLICATE_KEY
    );

    match duplicated {
        true => Ok(false),
        false => Err(RepositoryError::Internal(anyhow!(e))),
    }
}

pub fn convert_404_or<T>(option: Option<T>) -> RepoResult<T> {
    match option {
        Some(t) => Ok(t),
        None => Err(RepositoryError::NotFound),
    }
}

pub fn to_bool<N>(number: N) -> bool
where N: ::core::convert::TryInto<i8> + ::core::fmt::Debug + Clone {
    match match ::core::convert::TryInto::<i8>::try_into(number.clone()) {
        Ok(n) => n,
        Err(_) => unreachable!("expected 0 or 1, found: {:?}", number),
    } {
        0 => false,
        1 => true,
        n => unreachable!("expected 0 or 1, found: {}", n),
    }
}

pub fn id_from(raw: i64) -> RepoResult<u32> {
    u32::try_from(raw)
        .map_err(|_| RepositoryError::Internal(anyhow!("stored id out of range: {}", raw)))
}

pub fn render_date(date: &Date) -> String {
    date.to_rfc3339_opts(::chrono::SecondsFormat::Micros, true)
}

pub fn parse_date(raw: &str) -> RepoResult<Date> {
    ::chrono::DateTime::parse_from_rfc3339(raw)
        .map(|d| d.with_timezone(&::chrono::Utc))
        .let_(convert_repo_err)
}
