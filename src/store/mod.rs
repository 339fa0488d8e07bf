use std::{ops::Deref, sync::Arc};

use chrono::{DateTime, Utc};
use rocket::{
    request::{self, FromRequest, Request},
    State,
};

use crate::error::Result;
use crate::model::{Choice, ChoiceId, NewChoice, NewQuestion, Question, QuestionId, QuestionUpdate};

mod memory;
mod mongo;

pub use self::memory::MemoryStore;
pub use self::mongo::MongoStore;

/// Durable keyed storage for questions and their choices.
///
/// Implementations must apply [`PollStore::increment_votes`] as a relative
/// delta resolved when the write commits, so that concurrent votes on the same
/// choice are never lost.
#[rocket::async_trait]
pub trait PollStore: Send + Sync {
    async fn insert_question(&self, question: NewQuestion) -> Result<Question>;

    /// Add a choice to an existing question, bumping its `choice_count`.
    /// Fails with `404` if the question does not exist.
    async fn insert_choice(&self, question_id: QuestionId, choice: NewChoice) -> Result<Choice>;

    /// Fails with `404` if the question does not exist.
    async fn update_question(&self, question_id: QuestionId, update: QuestionUpdate) -> Result<Question>;

    async fn question(&self, question_id: QuestionId) -> Result<Option<Question>>;

    /// All choices of the question, ordered by ID.
    async fn choices(&self, question_id: QuestionId) -> Result<Vec<Choice>>;

    /// Questions published at or before `now` with at least
    /// [`MIN_CHOICES`](crate::poll::visibility::MIN_CHOICES) choices, newest first.
    async fn published_polls(&self, now: DateTime<Utc>, limit: usize) -> Result<Vec<Question>>;

    /// Atomically add one vote to the choice, provided it belongs to the
    /// question. Returns whether a matching choice was found.
    async fn increment_votes(&self, question_id: QuestionId, choice_id: ChoiceId) -> Result<bool>;

    /// Questions matching the filter, newest first.
    async fn search_questions(&self, filter: &QuestionFilter) -> Result<Vec<Question>>;
}

/// Criteria for the administrative question listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionFilter {
    /// Case-insensitive substring of the question text or of any choice text.
    pub text_contains: Option<String>,
    /// Inclusive lower bound on `pub_date`.
    pub published_from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `pub_date`.
    pub published_until: Option<DateTime<Utc>>,
}

impl QuestionFilter {
    pub fn matches_date(&self, pub_date: DateTime<Utc>) -> bool {
        self.published_from.map_or(true, |from| pub_date >= from)
            && self.published_until.map_or(true, |until| pub_date < until)
    }
}

/// A shared handle to the configured store.
///
/// Placed into managed state at ignition, and available to any endpoint as a
/// request guard.
#[derive(Clone)]
pub struct Store(Arc<dyn PollStore>);

impl Store {
    pub fn new(store: impl PollStore + 'static) -> Self {
        Self(Arc::new(store))
    }
}

impl Deref for Store {
    type Target = dyn PollStore;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Store {
    type Error = ();

    /// Get the store from the managed state.
    ///
    /// Panics iff no [`Store`] is managed by [`rocket::Rocket`].
    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let store = req.guard::<&State<Store>>().await.unwrap();
        request::Outcome::Success(store.inner().clone())
    }
}
