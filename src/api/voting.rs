use log::warn;
use rocket::{
    form::Form,
    response::Redirect,
    serde::json::Json,
    Route,
};
use serde::Serialize;

use crate::api::guards::Now;
use crate::error::{Error, Result};
use crate::logging::RequestId;
use crate::model::QuestionId;
use crate::poll::{
    query::{self, QuestionDetail},
    visibility,
    vote::{self, VoteError, NO_CHOICE_MESSAGE},
};
use crate::store::Store;

pub fn routes() -> Vec<Route> {
    routes![cast_vote]
}

/// The submitted voting form. `choice` is absent when nothing was selected.
#[derive(Debug, FromForm)]
pub struct VoteForm {
    pub choice: Option<String>,
}

/// The voting form again, with the reason the vote was refused.
#[derive(Debug, Serialize)]
pub struct VoteRejection {
    #[serde(flatten)]
    detail: QuestionDetail,
    error_message: &'static str,
}

#[derive(Debug, Responder)]
pub enum VoteResponse {
    /// Sends the voter on to the results.
    Recorded(Redirect),
    #[response(status = 422)]
    Rejected(Json<VoteRejection>),
}

#[post("/polls/<question_id>/vote", data = "<form>")]
pub async fn cast_vote(
    question_id: QuestionId,
    form: Form<VoteForm>,
    now: Now,
    store: Store,
    request_id: &RequestId,
) -> Result<VoteResponse> {
    match vote::cast_vote(&*store, question_id, form.choice.as_deref()).await {
        Ok(receipt) => {
            let results = uri!(crate::api::public::results(receipt.question_id));
            Ok(VoteResponse::Recorded(Redirect::to(results)))
        }
        // An unpublished question must look exactly like a missing one.
        Err(VoteError::ChoiceNotFound(question)) if !visibility::is_published(&question, now.0) => {
            Err(question_not_found(question_id))
        }
        Err(VoteError::ChoiceNotFound(question)) => {
            warn!("req{request_id} named no valid choice for question {question_id}");
            let detail = query::detail_for(&*store, *question).await?;
            Ok(VoteResponse::Rejected(Json(VoteRejection {
                detail,
                error_message: NO_CHOICE_MESSAGE,
            })))
        }
        Err(VoteError::QuestionNotFound) => Err(question_not_found(question_id)),
        Err(VoteError::Store(err)) => Err(err),
    }
}

fn question_not_found(question_id: QuestionId) -> Error {
    Error::not_found(format!("Question with ID '{question_id}'"))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rocket::{
        http::{ContentType, Status},
        local::asynchronous::{Client, LocalResponse},
        serde::json::Value,
    };

    use crate::api::public;
    use crate::poll::fixtures::{seed_poll, seed_two_choice_poll};
    use crate::poll::query::QuestionResults;

    use super::*;

    async fn post_vote<'c>(client: &'c Client, question_id: QuestionId, body: &str) -> LocalResponse<'c> {
        client
            .post(uri!(cast_vote(question_id)))
            .header(ContentType::Form)
            .body(body.to_string())
            .dispatch()
            .await
    }

    #[backend_test]
    async fn vote_redirects_to_results(client: Client, store: Store) {
        let (question, choices) = seed_two_choice_poll(&*store, "Past question", Utc::now(), -1).await;

        let body = format!("choice={}", choices[1].id);
        let response = post_vote(&client, question.id, &body).await;
        assert_eq!(Status::SeeOther, response.status());
        let expected = uri!(public::results(question.id)).to_string();
        assert_eq!(Some(expected.as_str()), response.headers().get_one("Location"));

        let response = client.get(uri!(public::results(question.id))).dispatch().await;
        let results: QuestionResults = response.into_json().await.unwrap();
        assert_eq!(results.total_votes, 1);
        let votes: Vec<_> = results.choices.iter().map(|c| c.votes).collect();
        assert_eq!(votes, vec![0, 1]);
    }

    #[backend_test]
    async fn missing_choice_is_rejected(client: Client, store: Store) {
        let (question, _) = seed_two_choice_poll(&*store, "Past question", Utc::now(), -1).await;

        let response = post_vote(&client, question.id, "").await;
        assert_eq!(Status::UnprocessableEntity, response.status());
        let body: Value = response.into_json().await.unwrap();
        assert_eq!(body["error_message"], NO_CHOICE_MESSAGE);
        assert_eq!(body["question"]["text"], "Past question");
        assert_eq!(body["choices"].as_array().map(Vec::len), Some(2));
    }

    #[backend_test]
    async fn choice_of_another_question_is_rejected(client: Client, store: Store) {
        let now = Utc::now();
        let (question, _) = seed_two_choice_poll(&*store, "First", now, -1).await;
        let (_, other_choices) = seed_two_choice_poll(&*store, "Second", now, -1).await;

        let body = format!("choice={}", other_choices[0].id);
        let response = post_vote(&client, question.id, &body).await;
        assert_eq!(Status::UnprocessableEntity, response.status());

        let other = store.choices(other_choices[0].question_id).await.unwrap();
        assert!(other.iter().all(|c| c.votes == 0));
    }

    #[backend_test]
    async fn garbage_choice_is_rejected(client: Client, store: Store) {
        let (question, _) = seed_two_choice_poll(&*store, "Past question", Utc::now(), -1).await;

        let response = post_vote(&client, question.id, "choice=banana").await;
        assert_eq!(Status::UnprocessableEntity, response.status());
    }

    #[backend_test]
    async fn rejection_of_unready_poll_lists_no_choices(client: Client, store: Store) {
        let (question, _) = seed_poll(&*store, "Lonely", Utc::now(), -1, &["Only"]).await;

        let response = post_vote(&client, question.id, "choice=999").await;
        assert_eq!(Status::UnprocessableEntity, response.status());
        let body: Value = response.into_json().await.unwrap();
        assert_eq!(body["ready"], false);
        assert_eq!(body["choices"].as_array().map(Vec::len), Some(0));
    }

    #[backend_test]
    async fn refused_vote_on_unpublished_question_reveals_nothing(client: Client, store: Store) {
        let (future, _) = seed_two_choice_poll(&*store, "Secret future", Utc::now(), 30).await;

        let response = post_vote(&client, future.id, "choice=x").await;
        assert_eq!(Status::NotFound, response.status());
        let body = response.into_string().await.unwrap_or_default();
        assert!(!body.contains("Secret future"));
        assert!(!body.contains("Choice 1"));
    }

    #[backend_test]
    async fn vote_on_unknown_question_is_not_found(client: Client) {
        let response = post_vote(&client, QuestionId::new(42), "choice=1").await;
        assert_eq!(Status::NotFound, response.status());
    }
}
