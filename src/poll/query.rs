use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::Error;
use crate::model::{Choice, Question, QuestionId};
use crate::store::PollStore;

use super::visibility;

/// How many questions the public listing shows.
pub const RECENT_LIMIT: usize = 5;

#[derive(Debug, Error)]
pub enum QueryError {
    /// The question does not exist or is not yet published. The two cases are
    /// indistinguishable.
    #[error("Question not found")]
    NotFound,
    #[error(transparent)]
    Store(#[from] Error),
}

impl From<QueryError> for Error {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::NotFound => Error::not_found("Question"),
            QueryError::Store(err) => err,
        }
    }
}

/// A question with its choices, for the voting form.
///
/// When the question is not a proper poll, `ready` is false and no choices are
/// listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDetail {
    pub question: Question,
    pub choices: Vec<Choice>,
    pub ready: bool,
}

/// The current tally for a question.
///
/// Not-ready polls report no choices and zero votes rather than a partial tally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionResults {
    pub question: Question,
    pub choices: Vec<Choice>,
    pub total_votes: u64,
    pub ready: bool,
}

/// The most recently published proper polls, newest first. Never more than
/// [`RECENT_LIMIT`], whatever `limit` asks for.
pub async fn list_recent(store: &dyn PollStore, now: DateTime<Utc>, limit: usize) -> Result<Vec<Question>, Error> {
    store.published_polls(now, limit.min(RECENT_LIMIT)).await
}

pub async fn get_detail(
    store: &dyn PollStore,
    question_id: QuestionId,
    now: DateTime<Utc>,
) -> Result<QuestionDetail, QueryError> {
    let question = published_question(store, question_id, now).await?;
    Ok(detail_for(store, question).await?)
}

pub async fn get_results(
    store: &dyn PollStore,
    question_id: QuestionId,
    now: DateTime<Utc>,
) -> Result<QuestionResults, QueryError> {
    let question = published_question(store, question_id, now).await?;
    let QuestionDetail {
        question,
        choices,
        ready,
    } = detail_for(store, question).await?;
    let total_votes = choices.iter().map(|choice| choice.votes).sum();
    Ok(QuestionResults {
        question,
        choices,
        total_votes,
        ready,
    })
}

/// Build the detail projection for a question already known to the caller,
/// without any publication check.
pub async fn detail_for(store: &dyn PollStore, question: Question) -> Result<QuestionDetail, Error> {
    if !visibility::is_proper_poll(&question) {
        return Ok(QuestionDetail {
            question,
            choices: Vec::new(),
            ready: false,
        });
    }
    let choices = store.choices(question.id).await?;
    Ok(QuestionDetail {
        question,
        choices,
        ready: true,
    })
}

async fn published_question(
    store: &dyn PollStore,
    question_id: QuestionId,
    now: DateTime<Utc>,
) -> Result<Question, QueryError> {
    store
        .question(question_id)
        .await?
        .filter(|question| visibility::is_published(question, now))
        .ok_or(QueryError::NotFound)
}
