use chrono::{DateTime, Utc};
use log::info;
use mongodb::{
    bson::{doc, Bson, DateTime as BsonDateTime, Document, Regex},
    error::Error as DbError,
    options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument},
    Database,
};
use rocket::futures::TryStreamExt;

use crate::error::{Error, Result};
use crate::model::{Choice, ChoiceId, NewChoice, NewQuestion, Question, QuestionId, QuestionUpdate};
use crate::poll::visibility::MIN_CHOICES;

use super::{PollStore, QuestionFilter};

mod collection;
mod counter;
mod documents;

use collection::{ensure_indexes_exist, Coll};
use counter::{ensure_counters_exist, Counter, CHOICE_COUNTER_ID, QUESTION_COUNTER_ID};
use documents::{ChoiceDoc, QuestionDoc};

/// A store backed by MongoDB collections.
///
/// Vote increments are issued as `$inc` updates, so they are resolved by the
/// server against the committed value.
#[derive(Clone)]
pub struct MongoStore {
    questions: Coll<QuestionDoc>,
    choices: Coll<ChoiceDoc>,
    counters: Coll<Counter>,
}

impl MongoStore {
    /// Wrap the given database, creating indexes and ID counters if needed.
    pub async fn connect(db: &Database) -> std::result::Result<Self, DbError> {
        ensure_indexes_exist(db).await?;
        let counters = Coll::from_db(db);
        ensure_counters_exist(&counters).await?;
        info!("Using MongoDB database {}", db.name());
        Ok(Self {
            questions: Coll::from_db(db),
            choices: Coll::from_db(db),
            counters,
        })
    }

    async fn find_question(&self, question_id: QuestionId) -> Result<Option<QuestionDoc>> {
        Ok(self.questions.find_one(question_id.as_doc(), None).await?)
    }
}

fn newest_first() -> Document {
    doc! { "pub_date": -1, "_id": -1 }
}

fn question_not_found(question_id: QuestionId) -> Error {
    Error::not_found(format!("Question with ID '{question_id}'"))
}

#[rocket::async_trait]
impl PollStore for MongoStore {
    async fn insert_question(&self, question: NewQuestion) -> Result<Question> {
        let id = QuestionId::new(Counter::next(&self.counters, QUESTION_COUNTER_ID).await?);
        let doc = QuestionDoc {
            id,
            text: question.text,
            pub_date: question.pub_date,
            choice_count: 0,
        };
        self.questions.insert_one(&doc, None).await?;
        Ok(doc.into())
    }

    async fn insert_choice(&self, question_id: QuestionId, choice: NewChoice) -> Result<Choice> {
        if self.find_question(question_id).await?.is_none() {
            return Err(question_not_found(question_id));
        }

        let id = ChoiceId::new(Counter::next(&self.counters, CHOICE_COUNTER_ID).await?);
        let doc = ChoiceDoc {
            id,
            question_id,
            text: choice.text,
            votes: 0,
        };
        self.choices.insert_one(&doc, None).await?;

        // Counted only after the choice exists, so an interrupted insert can
        // undercount (hiding the poll) but never overcount.
        self.questions
            .update_one(
                question_id.as_doc(),
                doc! { "$inc": { "choice_count": 1 } },
                None,
            )
            .await?;
        Ok(doc.into())
    }

    async fn update_question(&self, question_id: QuestionId, update: QuestionUpdate) -> Result<Question> {
        let mut set = Document::new();
        if let Some(text) = update.text {
            set.insert("text", text);
        }
        if let Some(pub_date) = update.pub_date {
            set.insert("pub_date", BsonDateTime::from_chrono(pub_date));
        }

        let updated = if set.is_empty() {
            self.find_question(question_id).await?
        } else {
            let options = FindOneAndUpdateOptions::builder()
                .return_document(ReturnDocument::After)
                .build();
            self.questions
                .find_one_and_update(question_id.as_doc(), doc! { "$set": set }, options)
                .await?
        };
        updated
            .map(Into::into)
            .ok_or_else(|| question_not_found(question_id))
    }

    async fn question(&self, question_id: QuestionId) -> Result<Option<Question>> {
        Ok(self.find_question(question_id).await?.map(Into::into))
    }

    async fn choices(&self, question_id: QuestionId) -> Result<Vec<Choice>> {
        let options = FindOptions::builder().sort(doc! { "_id": 1 }).build();
        let choices = self
            .choices
            .find(doc! { "question_id": question_id }, options)
            .await?
            .map_ok(Choice::from)
            .try_collect::<Vec<_>>()
            .await?;
        Ok(choices)
    }

    async fn published_polls(&self, now: DateTime<Utc>, limit: usize) -> Result<Vec<Question>> {
        // MongoDB reads a limit of zero as no limit at all.
        if limit == 0 {
            return Ok(Vec::new());
        }
        let filter = doc! {
            "pub_date": { "$lte": BsonDateTime::from_chrono(now) },
            "choice_count": { "$gte": MIN_CHOICES as i64 },
        };
        let options = FindOptions::builder()
            .sort(newest_first())
            .limit(i64::try_from(limit).unwrap_or(i64::MAX))
            .build();
        let polls = self
            .questions
            .find(filter, options)
            .await?
            .map_ok(Question::from)
            .try_collect::<Vec<_>>()
            .await?;
        Ok(polls)
    }

    async fn increment_votes(&self, question_id: QuestionId, choice_id: ChoiceId) -> Result<bool> {
        let filter = doc! {
            "_id": choice_id,
            "question_id": question_id,
        };
        let update = doc! {
            "$inc": { "votes": 1 }
        };
        let result = self.choices.update_one(filter, update, None).await?;
        Ok(result.matched_count == 1)
    }

    async fn search_questions(&self, filter: &QuestionFilter) -> Result<Vec<Question>> {
        let mut query = Document::new();

        let mut pub_date = Document::new();
        if let Some(from) = filter.published_from {
            pub_date.insert("$gte", BsonDateTime::from_chrono(from));
        }
        if let Some(until) = filter.published_until {
            pub_date.insert("$lt", BsonDateTime::from_chrono(until));
        }
        if !pub_date.is_empty() {
            query.insert("pub_date", pub_date);
        }

        if let Some(text) = &filter.text_contains {
            let pattern = Regex {
                pattern: regex::escape(text),
                options: "i".to_string(),
            };
            let by_choice: Vec<Bson> = self
                .choices
                .distinct("question_id", doc! { "text": pattern.clone() }, None)
                .await?;
            query.insert(
                "$or",
                vec![
                    doc! { "text": pattern },
                    doc! { "_id": { "$in": by_choice } },
                ],
            );
        }

        let options = FindOptions::builder().sort(newest_first()).build();
        let questions = self
            .questions
            .find(query, options)
            .await?
            .map_ok(Question::from)
            .try_collect::<Vec<_>>()
            .await?;
        Ok(questions)
    }
}

/// These run against a live server at `ROCKET_DB_URI`, in a throwaway database.
#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Duration;
    use mongodb::Client;

    async fn test_db() -> Database {
        let uri = std::env::var("ROCKET_DB_URI").unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
        let client = Client::with_uri_str(&uri).await.unwrap();
        let random: u32 = rand::random();
        client.database(&format!("polls_test{random}"))
    }

    async fn seed(store: &MongoStore, text: &str, pub_date: DateTime<Utc>, choices: &[&str]) -> (Question, Vec<Choice>) {
        let question = store
            .insert_question(NewQuestion {
                text: text.to_string(),
                pub_date,
            })
            .await
            .unwrap();
        let mut inserted = Vec::new();
        for choice in choices {
            inserted.push(store.insert_choice(question.id, NewChoice::new(*choice)).await.unwrap());
        }
        (store.question(question.id).await.unwrap().unwrap(), inserted)
    }

    #[rocket::async_test]
    #[ignore = "requires a MongoDB server"]
    async fn votes_and_listing_round_trip_through_mongodb() {
        let db = test_db().await;
        let store = MongoStore::connect(&db).await.unwrap();
        let now = Utc::now();

        let (past, choices) = seed(&store, "Past Question", now - Duration::days(30), &["Choice 1", "Choice 2"]).await;
        seed(&store, "Future Question", now + Duration::days(30), &["Choice 1", "Choice 2"]).await;
        seed(&store, "One choice", now - Duration::days(1), &["Choice 1"]).await;
        assert_eq!(past.choice_count, 2);

        let polls = store.published_polls(now, 5).await.unwrap();
        assert_eq!(polls.len(), 1);
        assert!(store.published_polls(now, 0).await.unwrap().is_empty());
        assert_eq!(polls[0].id, past.id);

        assert!(store.increment_votes(past.id, choices[1].id).await.unwrap());
        assert!(!store.increment_votes(QuestionId::new(past.id.get() + 100), choices[1].id).await.unwrap());
        let votes: Vec<u64> = store.choices(past.id).await.unwrap().iter().map(|c| c.votes).collect();
        assert_eq!(votes, [0, 1]);

        let found = store
            .search_questions(&QuestionFilter {
                text_contains: Some("one".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].text, "One choice");

        db.drop(None).await.unwrap();
    }
}
