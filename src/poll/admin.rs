//! Administrative management of questions and choices. Voters never reach
//! these operations.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{Choice, NewChoice, NewQuestion, Question, QuestionId, QuestionUpdate};
use crate::store::{PollStore, QuestionFilter};

use super::visibility;

pub const MAX_QUESTION_TEXT: usize = 200;
pub const MAX_CHOICE_TEXT: usize = 200;
pub const MAX_SEARCH_TEXT: usize = 10;

/// A question to create, optionally with its initial choices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionSpec {
    pub text: String,
    pub pub_date: DateTime<Utc>,
    #[serde(default)]
    pub choices: Vec<String>,
}

/// Everything an administrator sees about one question, regardless of
/// publication state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminQuestion {
    pub question: Question,
    pub choices: Vec<Choice>,
    pub was_published_recently: bool,
}

/// One row of the administrative listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionSummary {
    #[serde(flatten)]
    pub question: Question,
    pub was_published_recently: bool,
}

/// Publication-date windows for narrowing the listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, FromFormField)]
#[serde(rename_all = "snake_case")]
pub enum PublishedWithin {
    #[field(value = "today")]
    Today,
    #[field(value = "past_7_days")]
    #[serde(rename = "past_7_days")]
    Past7Days,
    #[field(value = "this_month")]
    ThisMonth,
    #[field(value = "this_year")]
    ThisYear,
}

impl PublishedWithin {
    /// The half-open `[from, until)` window this covers, as seen at `now`.
    /// A bound is `None` only if it falls outside the representable calendar.
    pub fn window(self, now: DateTime<Utc>) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        let today = now.date_naive();
        let (from, until) = match self {
            Self::Today => (Some(today), today.succ_opt()),
            Self::Past7Days => (today.checked_sub_signed(Duration::days(7)), today.succ_opt()),
            Self::ThisMonth => {
                let next = if today.month() == 12 {
                    NaiveDate::from_ymd_opt(today.year() + 1, 1, 1)
                } else {
                    NaiveDate::from_ymd_opt(today.year(), today.month() + 1, 1)
                };
                (today.with_day(1), next)
            }
            Self::ThisYear => (
                NaiveDate::from_ymd_opt(today.year(), 1, 1),
                NaiveDate::from_ymd_opt(today.year() + 1, 1, 1),
            ),
        };
        (from.and_then(midnight), until.and_then(midnight))
    }
}

fn midnight(date: NaiveDate) -> Option<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0)
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Parameters of the administrative listing.
#[derive(Debug, Clone, Default)]
pub struct AdminQuery {
    pub search: Option<String>,
    pub published: Option<PublishedWithin>,
}

/// Validate a free-text field, returning it trimmed.
fn check_text(field: &str, text: &str, max: usize) -> Result<String> {
    let text = text.trim();
    if text.is_empty() {
        return Err(Error::bad_request(format!("{field} must not be empty")));
    }
    if text.chars().count() > max {
        return Err(Error::bad_request(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(text.to_string())
}

pub async fn create_question(store: &dyn PollStore, spec: QuestionSpec, now: DateTime<Utc>) -> Result<AdminQuestion> {
    let text = check_text("Question text", &spec.text, MAX_QUESTION_TEXT)?;
    let choices = spec
        .choices
        .iter()
        .map(|choice| check_text("Choice text", choice, MAX_CHOICE_TEXT))
        .collect::<Result<Vec<_>>>()?;

    let question = store
        .insert_question(NewQuestion {
            text,
            pub_date: spec.pub_date,
        })
        .await?;
    for choice in choices {
        store
            .insert_choice(question.id, NewChoice::new(choice))
            .await?;
    }
    info!("Created question {} ({:?})", question.id, question.text);

    get_question(store, question.id, now).await
}

pub async fn add_choice(store: &dyn PollStore, question_id: QuestionId, choice: NewChoice) -> Result<Choice> {
    let text = check_text("Choice text", &choice.text, MAX_CHOICE_TEXT)?;
    let choice = store
        .insert_choice(question_id, NewChoice::new(text))
        .await?;
    info!("Added choice {} to question {question_id}", choice.id);
    Ok(choice)
}

pub async fn update_question(
    store: &dyn PollStore,
    question_id: QuestionId,
    mut update: QuestionUpdate,
    now: DateTime<Utc>,
) -> Result<AdminQuestion> {
    if let Some(text) = &update.text {
        update.text = Some(check_text("Question text", text, MAX_QUESTION_TEXT)?);
    }
    if !update.is_empty() {
        store.update_question(question_id, update).await?;
        info!("Updated question {question_id}");
    }
    get_question(store, question_id, now).await
}

pub async fn get_question(store: &dyn PollStore, question_id: QuestionId, now: DateTime<Utc>) -> Result<AdminQuestion> {
    let question = store
        .question(question_id)
        .await?
        .ok_or_else(|| Error::not_found(format!("Question with ID '{question_id}'")))?;
    let choices = store.choices(question_id).await?;
    Ok(AdminQuestion {
        was_published_recently: visibility::was_published_recently(&question, now),
        question,
        choices,
    })
}

pub async fn list_questions(store: &dyn PollStore, now: DateTime<Utc>, query: AdminQuery) -> Result<Vec<QuestionSummary>> {
    let text_contains = match query.search.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(search) if search.chars().count() > MAX_SEARCH_TEXT => {
            return Err(Error::bad_request(format!(
                "Search text must be at most {MAX_SEARCH_TEXT} characters"
            )));
        }
        Some(search) => Some(search.to_string()),
    };
    let (published_from, published_until) = query
        .published
        .map(|window| window.window(now))
        .unwrap_or((None, None));

    let filter = QuestionFilter {
        text_contains,
        published_from,
        published_until,
    };
    let questions = store.search_questions(&filter).await?;
    Ok(questions
        .into_iter()
        .map(|question| QuestionSummary {
            was_published_recently: visibility::was_published_recently(&question, now),
            question,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    use rocket::http::Status;

    use crate::poll::fixtures::{seed_poll, seed_two_choice_poll};
    use crate::store::MemoryStore;

    fn spec(text: &str, pub_date: DateTime<Utc>, choices: &[&str]) -> QuestionSpec {
        QuestionSpec {
            text: text.to_string(),
            pub_date,
            choices: choices.iter().map(|c| c.to_string()).collect(),
        }
    }

    #[rocket::async_test]
    async fn create_with_inline_choices() {
        let store = MemoryStore::new();
        let now = Utc::now();

        let created = create_question(&store, spec("  What's up?  ", now, &["Not much", "The sky"]), now)
            .await
            .unwrap();
        assert_eq!(created.question.text, "What's up?");
        assert_eq!(created.question.choice_count, 2);
        assert!(created.was_published_recently);
        let texts: Vec<_> = created.choices.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, ["Not much", "The sky"]);
    }

    #[rocket::async_test]
    async fn invalid_text_creates_nothing() {
        let store = MemoryStore::new();
        let now = Utc::now();

        let err = create_question(&store, spec("   ", now, &[]), now).await.unwrap_err();
        assert_eq!(err.status(), Status::BadRequest);

        let long_choice = "x".repeat(MAX_CHOICE_TEXT + 1);
        let err = create_question(&store, spec("Fine", now, &["ok", &long_choice]), now)
            .await
            .unwrap_err();
        assert_eq!(err.status(), Status::BadRequest);

        assert!(list_questions(&store, now, AdminQuery::default()).await.unwrap().is_empty());
    }

    #[rocket::async_test]
    async fn add_choice_to_missing_question_is_not_found() {
        let store = MemoryStore::new();
        let err = add_choice(&store, QuestionId::new(3), NewChoice::new("Hello"))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Status::NotFound);
    }

    #[rocket::async_test]
    async fn update_edits_text_and_date() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let (question, _) = seed_two_choice_poll(&store, "Draft", now, 10).await;

        let update = QuestionUpdate {
            text: Some("Final".to_string()),
            pub_date: Some(now - Duration::hours(2)),
        };
        let updated = update_question(&store, question.id, update, now).await.unwrap();
        assert_eq!(updated.question.text, "Final");
        assert!(updated.was_published_recently);
        assert_eq!(updated.choices.len(), 2);
        assert!(visibility::is_votable(&updated.question, now));
    }

    #[rocket::async_test]
    async fn listing_searches_and_flags_recent() {
        let store = MemoryStore::new();
        let now = Utc::now();
        seed_poll(&store, "Best tea?", now, -3, &["Earl Grey", "Assam"]).await;
        seed_poll(&store, "Best coffee?", now, 0, &["Espresso", "Latte"]).await;

        let all = list_questions(&store, now, AdminQuery::default()).await.unwrap();
        let flags: Vec<_> = all
            .iter()
            .map(|row| (row.question.text.as_str(), row.was_published_recently))
            .collect();
        assert_eq!(flags, [("Best coffee?", true), ("Best tea?", false)]);

        let query = AdminQuery {
            search: Some("grey".to_string()),
            published: None,
        };
        let found = list_questions(&store, now, query).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].question.text, "Best tea?");
    }

    #[rocket::async_test]
    async fn overlong_search_is_rejected() {
        let store = MemoryStore::new();
        let query = AdminQuery {
            search: Some("much too long".to_string()),
            published: None,
        };
        let err = list_questions(&store, Utc::now(), query).await.unwrap_err();
        assert_eq!(err.status(), Status::BadRequest);
    }

    #[rocket::async_test]
    async fn listing_filters_by_window() {
        let store = MemoryStore::new();
        let now = Utc.with_ymd_and_hms(2023, 6, 15, 12, 0, 0).unwrap();
        seed_poll(&store, "Today", now, 0, &[]).await;
        seed_poll(&store, "Last week", now, -5, &[]).await;
        seed_poll(&store, "Last month", now, -20, &[]).await;
        seed_poll(&store, "Last year", now, -200, &[]).await;

        let texts = |rows: Vec<QuestionSummary>| -> Vec<String> { rows.into_iter().map(|r| r.question.text).collect() };
        let query = |published| AdminQuery {
            search: None,
            published: Some(published),
        };

        let today = list_questions(&store, now, query(PublishedWithin::Today)).await.unwrap();
        assert_eq!(texts(today), ["Today"]);
        let week = list_questions(&store, now, query(PublishedWithin::Past7Days)).await.unwrap();
        assert_eq!(texts(week), ["Today", "Last week"]);
        let month = list_questions(&store, now, query(PublishedWithin::ThisMonth)).await.unwrap();
        assert_eq!(texts(month), ["Today", "Last week"]);
        let year = list_questions(&store, now, query(PublishedWithin::ThisYear)).await.unwrap();
        assert_eq!(texts(year), ["Today", "Last week", "Last month"]);
    }

    #[test]
    fn month_window_rolls_over_year_end() {
        let now = Utc.with_ymd_and_hms(2023, 12, 31, 23, 0, 0).unwrap();
        let (from, until) = PublishedWithin::ThisMonth.window(now);
        assert_eq!(from, Some(Utc.with_ymd_and_hms(2023, 12, 1, 0, 0, 0).unwrap()));
        assert_eq!(until, Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));
    }
}
