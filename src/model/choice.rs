use serde::{Deserialize, Serialize};

use super::{ChoiceId, QuestionId};

/// One selectable answer to a question, with its running tally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub id: ChoiceId,
    /// Back-reference to the owning question.
    pub question_id: QuestionId,
    pub text: String,
    pub votes: u64,
}

/// A choice ready for insertion. Votes always start at zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewChoice {
    pub text: String,
}

impl NewChoice {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}
