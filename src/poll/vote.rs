use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::Error;
use crate::model::{ChoiceId, Question, QuestionId};
use crate::store::PollStore;

/// Shown when a vote names no valid choice.
pub const NO_CHOICE_MESSAGE: &str = "You did not select a choice";

#[derive(Debug, Error)]
pub enum VoteError {
    /// The submission named no choice, or one that does not belong to the
    /// question. Carries the question so the form can be shown again.
    #[error("{}", NO_CHOICE_MESSAGE)]
    ChoiceNotFound(Box<Question>),
    #[error("Question not found")]
    QuestionNotFound,
    #[error(transparent)]
    Store(#[from] Error),
}

/// Proof of a recorded vote; identifies the results to show next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteReceipt {
    pub question_id: QuestionId,
}

/// Record one vote for `choice` on the given question.
///
/// `choice` is the raw submitted value, absent when the voter selected nothing.
/// Publication is not re-checked here, only existence.
pub async fn cast_vote(
    store: &dyn PollStore,
    question_id: QuestionId,
    choice: Option<&str>,
) -> Result<VoteReceipt, VoteError> {
    let question = store
        .question(question_id)
        .await?
        .ok_or(VoteError::QuestionNotFound)?;

    let choice_id = match choice.and_then(|raw| raw.trim().parse::<ChoiceId>().ok()) {
        Some(id) => id,
        None => return Err(VoteError::ChoiceNotFound(Box::new(question))),
    };

    if !store.increment_votes(question_id, choice_id).await? {
        return Err(VoteError::ChoiceNotFound(Box::new(question)));
    }

    info!("Recorded vote for choice {choice_id} on question {question_id}");
    Ok(VoteReceipt { question_id })
}
