use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::{Choice, ChoiceId, Question, QuestionId};

/// A question as stored in MongoDB.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionDoc {
    #[serde(rename = "_id")]
    pub id: QuestionId,
    pub text: String,
    /// Stored as a BSON date so range queries compare chronologically.
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub pub_date: DateTime<Utc>,
    pub choice_count: u64,
}

impl From<QuestionDoc> for Question {
    fn from(doc: QuestionDoc) -> Self {
        Self {
            id: doc.id,
            text: doc.text,
            pub_date: doc.pub_date,
            choice_count: doc.choice_count,
        }
    }
}

/// A choice as stored in MongoDB.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoiceDoc {
    #[serde(rename = "_id")]
    pub id: ChoiceId,
    pub question_id: QuestionId,
    pub text: String,
    pub votes: u64,
}

impl From<ChoiceDoc> for Choice {
    fn from(doc: ChoiceDoc) -> Self {
        Self {
            id: doc.id,
            question_id: doc.question_id,
            text: doc.text,
            votes: doc.votes,
        }
    }
}
