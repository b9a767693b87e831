use mongodb::bson::{doc, Bson, Document};
use mongodb::error::Result as MongoResult;
use futures::TryStreamExt;
use mongodb::options::{
    Acknowledgment, FindOneAndUpdateOptions, FindOptions, ReadConcern, ReturnDocument,
    TransactionOptions, WriteConcern,
};
use mongodb::{Client, ClientSession, Collection, Database};
use tracing::Instrument;

use super::converters::{convert_404_or, convert_repo_err, id_from, to_bool};
use super::{RepositoryError, Result as RepoResult};
use crate::utils::LetChain;

pub async fn initialize_coll(name: &str, keys: Document, db: &Database) -> MongoResult<()> {
    db.run_command(
        doc! {
            "createIndexes": name,
            "indexes": [{
                "name": "unique_key",
                "key": keys,
                "unique": true
            }],
        },
        None,
    )
    .instrument(tracing::trace_span!("run_command"))
    .await?;

    Ok(())
}

pub async fn make_session(c: &Client) -> MongoResult<ClientSession> {
    let mut s = c
        .start_session(None)
        .instrument(tracing::trace_span!("start_session"))
        .await?;

    let ta_opt = TransactionOptions::builder()
        .read_concern(ReadConcern::snapshot())
        .write_concern(WriteConcern::builder().w(Acknowledgment::Majority).build())
        .build();
    s.start_transaction(ta_opt)
        .instrument(tracing::trace_span!("start_transaction"))
        .await?;

    Ok(s)
}

pub async fn process_transaction(s: &mut ClientSession) -> MongoResult<()> {
    loop {
        let r = s
            .commit_transaction()
            .instrument(tracing::trace_span!("commit_transaction"))
            .await;
        if let Err(ref e) = r {
            if e.contains_label(::mongodb::error::UNKNOWN_TRANSACTION_COMMIT_RESULT) {
                continue;
            }
        }

        break r;
    }
}

pub fn is_transient<T>(r: &MongoResult<T>) -> bool {
    match r {
        Err(e) => e.contains_label(::mongodb::error::TRANSIENT_TRANSACTION_ERROR),
        Ok(_) => false,
    }
}

/// next value of the named sequence, starting from 1.
pub async fn issue_seq(counter: &Collection<Document>, name: &str) -> RepoResult<u32> {
    let opts = FindOneAndUpdateOptions::builder()
        .upsert(true)
        .return_document(ReturnDocument::After)
        .build();

    let res = counter
        .find_one_and_update(doc! { "_id": name }, doc! { "$inc": { "seq": 1_i64 } }, opts)
        .instrument(tracing::trace_span!("find_one_and_update"))
        .await
        .let_(convert_repo_err)?
        .let_(convert_404_or)?;

    res.get_i64("seq").let_(convert_repo_err)?.let_(id_from)
}

pub async fn get_one<T>(coll: &Collection<T>, id: impl Into<Bson>) -> RepoResult<T>
where T: Sync + Send + Unpin + ::serde::de::DeserializeOwned {
    coll.find_one(doc! { "id": id.into() }, None)
        .instrument(tracing::trace_span!("find_one"))
        .await
        .let_(convert_repo_err)?
        .let_(convert_404_or)
}

pub async fn find_many<M, E>(
    coll: &Collection<M>,
    filter: Document,
    options: impl Into<Option<FindOptions>>,
) -> RepoResult<Vec<E>>
where
    M: Sync + Send + Unpin + ::serde::de::DeserializeOwned,
    E: TryFrom<M, Error = RepositoryError>,
{
    coll.find(filter, options)
        .instrument(tracing::trace_span!("find"))
        .await
        .let_(convert_repo_err)?
        .try_collect::<Vec<_>>()
        .await
        .let_(convert_repo_err)?
        .into_iter()
        .map(E::try_from)
        .collect()
}

pub async fn is_exists<T>(coll: &Collection<T>, filter: Document) -> RepoResult<bool> {
    coll.count_documents(filter, None)
        .instrument(tracing::trace_span!("count_documents"))
        .await
        .let_(convert_repo_err)?
        .let_(|n| n > 0)
        .let_(Ok)
}

pub async fn is_contains<T>(
    name: &str,
    coll: &Collection<T>,
    id: impl Into<Bson>,
    target: impl Into<Bson>,
) -> RepoResult<bool> {
    let id = id.into();

    if !is_exists(coll, doc! { "id": id.clone() }).await? {
        return Err(RepositoryError::NotFound);
    }

    is_exists(coll, doc! { "id": id, name: { "$in": [target.into()] } }).await
}

#[derive(Clone, Copy)]
pub enum ModifyOpTy {
    Push,
    Pull,
}

/// `$addToSet` / `$pull` on one array field. `Ok(false)` when nothing changed.
pub async fn modify_set<T>(
    name: &str,
    coll: &Collection<T>,
    id: impl Into<Bson>,
    target: impl Into<Bson>,
    ty: ModifyOpTy,
) -> RepoResult<bool> {
    let operation = match ty {
        ModifyOpTy::Push => "$addToSet",
        ModifyOpTy::Pull => "$pull",
    };

    let res = coll
        .update_one(
            doc! { "id": id.into() },
            doc! { operation: { name: target.into() } },
            None,
        )
        .instrument(tracing::trace_span!("update_one"))
        .await
        .let_(convert_repo_err)?;

    if !res.matched_count.let_(to_bool) {
        return Err(RepositoryError::NotFound);
    }

    Ok(res.modified_count.let_(to_bool))
}
