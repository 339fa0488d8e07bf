use mongodb::{
    bson::doc,
    error::Error as DbError,
    options::{FindOneAndUpdateOptions, ReturnDocument, UpdateOptions},
};
use rocket::http::Status;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::collection::Coll;

/// Counter backing question IDs.
pub const QUESTION_COUNTER_ID: &str = "question_id";
/// Counter backing choice IDs.
pub const CHOICE_COUNTER_ID: &str = "choice_id";

/// A counter object used to implement auto-increment fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Counter {
    #[serde(rename = "_id")]
    pub id: String,
    pub next: u32,
}

impl Counter {
    /// Atomically retrieve the next value of the counter with the given ID.
    pub async fn next(counters: &Coll<Counter>, id: &str) -> Result<u32> {
        let update = doc! {
            "$inc": { "next": 1 }
        };
        let options: FindOneAndUpdateOptions = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::Before)
            .build();
        let counter = counters
            .find_one_and_update(doc! { "_id": id }, update, options)
            .await?
            .ok_or_else(|| {
                Error::Status(
                    Status::InternalServerError,
                    format!("Failed to find counter with ID {id}"),
                )
            })?;
        Ok(counter.next)
    }
}

/// Ensure the ID counters exist, starting at 1. Existing counters are untouched.
pub async fn ensure_counters_exist(counters: &Coll<Counter>) -> std::result::Result<(), DbError> {
    let upsert = UpdateOptions::builder().upsert(true).build();
    for id in [QUESTION_COUNTER_ID, CHOICE_COUNTER_ID] {
        counters
            .update_one(
                doc! { "_id": id },
                doc! { "$setOnInsert": { "next": 1 } },
                upsert.clone(),
            )
            .await?;
    }
    Ok(())
}
