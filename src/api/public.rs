use rocket::{serde::json::Json, Route};
use serde::Serialize;

use crate::api::guards::Now;
use crate::error::Result;
use crate::model::{Question, QuestionId};
use crate::poll::query::{self, QuestionDetail, QuestionResults, RECENT_LIMIT};
use crate::store::Store;

pub fn routes() -> Vec<Route> {
    routes![index, detail, results, about]
}

/// The most recently published polls, newest first.
#[get("/polls")]
pub async fn index(now: Now, store: Store) -> Result<Json<Vec<Question>>> {
    let questions = query::list_recent(&*store, now.0, RECENT_LIMIT).await?;
    Ok(Json(questions))
}

#[get("/polls/<question_id>")]
pub async fn detail(question_id: QuestionId, now: Now, store: Store) -> Result<Json<QuestionDetail>> {
    let detail = query::get_detail(&*store, question_id, now.0).await?;
    Ok(Json(detail))
}

#[get("/polls/<question_id>/results")]
pub async fn results(question_id: QuestionId, now: Now, store: Store) -> Result<Json<QuestionResults>> {
    let results = query::get_results(&*store, question_id, now.0).await?;
    Ok(Json(results))
}

#[derive(Debug, Serialize)]
pub struct About {
    name: &'static str,
    version: &'static str,
    description: &'static str,
}

#[get("/about")]
pub fn about() -> Json<About> {
    Json(About {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        description: env!("CARGO_PKG_DESCRIPTION"),
    })
}
