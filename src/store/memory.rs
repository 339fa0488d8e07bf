use std::sync::atomic::{AtomicU32, Ordering};

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::error::{Error, Result};
use crate::model::{Choice, ChoiceId, NewChoice, NewQuestion, Question, QuestionId, QuestionUpdate};
use crate::poll::visibility;

use super::{PollStore, QuestionFilter};

/// An in-process store backed by concurrent hash maps.
///
/// Each map entry is guarded by its shard lock, so a vote increment performed
/// through [`DashMap::get_mut`] is atomic with respect to every other access to
/// the same choice.
#[derive(Debug, Default)]
pub struct MemoryStore {
    questions: DashMap<QuestionId, Question>,
    choices: DashMap<ChoiceId, Choice>,
    /// Foreign-key index: the choices owned by each question.
    choice_index: DashMap<QuestionId, Vec<ChoiceId>>,
    question_counter: AtomicU32,
    choice_counter: AtomicU32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn choices_of(&self, question_id: QuestionId) -> Vec<Choice> {
        let ids = self
            .choice_index
            .get(&question_id)
            .map(|ids| ids.clone())
            .unwrap_or_default();
        let mut choices: Vec<Choice> = ids
            .into_iter()
            .filter_map(|id| self.choices.get(&id).map(|choice| choice.clone()))
            .collect();
        choices.sort_by_key(|choice| choice.id);
        choices
    }
}

/// Allocate the next ID from a counter. IDs start at 1.
fn next_id(counter: &AtomicU32) -> u32 {
    counter.fetch_add(1, Ordering::Relaxed) + 1
}

fn newest_first(questions: &mut [Question]) {
    questions.sort_by(|a, b| b.pub_date.cmp(&a.pub_date).then(b.id.cmp(&a.id)));
}

#[rocket::async_trait]
impl PollStore for MemoryStore {
    async fn insert_question(&self, question: NewQuestion) -> Result<Question> {
        let id = QuestionId::new(next_id(&self.question_counter));
        let question = Question {
            id,
            text: question.text,
            pub_date: question.pub_date,
            choice_count: 0,
        };
        self.questions.insert(id, question.clone());
        Ok(question)
    }

    async fn insert_choice(&self, question_id: QuestionId, choice: NewChoice) -> Result<Choice> {
        let mut question = self
            .questions
            .get_mut(&question_id)
            .ok_or_else(|| Error::not_found(format!("Question with ID '{question_id}'")))?;

        let choice = Choice {
            id: ChoiceId::new(next_id(&self.choice_counter)),
            question_id,
            text: choice.text,
            votes: 0,
        };
        self.choices.insert(choice.id, choice.clone());
        self.choice_index
            .entry(question_id)
            .or_default()
            .push(choice.id);
        question.choice_count += 1;
        Ok(choice)
    }

    async fn update_question(&self, question_id: QuestionId, update: QuestionUpdate) -> Result<Question> {
        let mut question = self
            .questions
            .get_mut(&question_id)
            .ok_or_else(|| Error::not_found(format!("Question with ID '{question_id}'")))?;
        update.apply(question.value_mut());
        Ok(question.clone())
    }

    async fn question(&self, question_id: QuestionId) -> Result<Option<Question>> {
        Ok(self.questions.get(&question_id).map(|q| q.clone()))
    }

    async fn choices(&self, question_id: QuestionId) -> Result<Vec<Choice>> {
        Ok(self.choices_of(question_id))
    }

    async fn published_polls(&self, now: DateTime<Utc>, limit: usize) -> Result<Vec<Question>> {
        let mut polls: Vec<Question> = self
            .questions
            .iter()
            .filter(|q| visibility::is_votable(q.value(), now))
            .map(|q| q.value().clone())
            .collect();
        newest_first(&mut polls);
        polls.truncate(limit);
        Ok(polls)
    }

    async fn increment_votes(&self, question_id: QuestionId, choice_id: ChoiceId) -> Result<bool> {
        match self.choices.get_mut(&choice_id) {
            Some(mut choice) if choice.question_id == question_id => {
                choice.votes += 1;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn search_questions(&self, filter: &QuestionFilter) -> Result<Vec<Question>> {
        // Snapshot first so no question lock is held while reading choices.
        let candidates: Vec<Question> = self
            .questions
            .iter()
            .filter(|q| filter.matches_date(q.pub_date))
            .map(|q| q.value().clone())
            .collect();

        let needle = filter.text_contains.as_ref().map(|text| text.to_lowercase());
        let mut found: Vec<Question> = candidates
            .into_iter()
            .filter(|question| match &needle {
                None => true,
                Some(needle) => {
                    question.text.to_lowercase().contains(needle.as_str())
                        || self
                            .choices_of(question.id)
                            .iter()
                            .any(|choice| choice.text.to_lowercase().contains(needle.as_str()))
                }
            })
            .collect();
        newest_first(&mut found);
        Ok(found)
    }
}
