use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::QuestionId;

/// A poll prompt, as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub text: String,
    /// The question becomes visible to voters once this moment has passed.
    pub pub_date: DateTime<Utc>,
    /// Number of choices belonging to this question, maintained by the store
    /// whenever a choice is added.
    pub choice_count: u64,
}

/// A question ready for insertion. The store allocates the ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewQuestion {
    pub text: String,
    pub pub_date: DateTime<Utc>,
}

/// An edit to an existing question. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionUpdate {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub pub_date: Option<DateTime<Utc>>,
}

impl QuestionUpdate {
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.pub_date.is_none()
    }

    /// Apply this edit in place.
    pub fn apply(self, question: &mut Question) {
        if let Some(text) = self.text {
            question.text = text;
        }
        if let Some(pub_date) = self.pub_date {
            question.pub_date = pub_date;
        }
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    use chrono::Duration;

    impl NewQuestion {
        /// A question published `days` days relative to `now`; negative is past.
        pub fn example(text: &str, now: DateTime<Utc>, days: i64) -> Self {
            Self {
                text: text.to_string(),
                pub_date: now + Duration::days(days),
            }
        }
    }
}
