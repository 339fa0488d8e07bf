use rocket::{response::status::Created, serde::json::Json, Route};

use crate::api::guards::{AdminKey, Now};
use crate::error::Result;
use crate::model::{Choice, NewChoice, QuestionId, QuestionUpdate};
use crate::poll::admin::{self, AdminQuery, AdminQuestion, PublishedWithin, QuestionSpec, QuestionSummary};
use crate::store::Store;

pub fn routes() -> Vec<Route> {
    routes![questions, new_question, question, edit_question, new_choice]
}

/// Every question regardless of publication state, optionally narrowed by a
/// search term and a publication window.
#[get("/admin/questions?<search>&<published>")]
async fn questions(
    _key: AdminKey,
    search: Option<String>,
    published: Option<PublishedWithin>,
    now: Now,
    store: Store,
) -> Result<Json<Vec<QuestionSummary>>> {
    let query = AdminQuery { search, published };
    let rows = admin::list_questions(&*store, now.0, query).await?;
    Ok(Json(rows))
}

#[post("/admin/questions", data = "<spec>", format = "json")]
async fn new_question(
    _key: AdminKey,
    spec: Json<QuestionSpec>,
    now: Now,
    store: Store,
) -> Result<Created<Json<AdminQuestion>>> {
    let created = admin::create_question(&*store, spec.into_inner(), now.0).await?;
    let location = uri!(question(created.question.id)).to_string();
    Ok(Created::new(location).body(Json(created)))
}

#[get("/admin/questions/<question_id>")]
async fn question(
    _key: AdminKey,
    question_id: QuestionId,
    now: Now,
    store: Store,
) -> Result<Json<AdminQuestion>> {
    let question = admin::get_question(&*store, question_id, now.0).await?;
    Ok(Json(question))
}

#[put("/admin/questions/<question_id>", data = "<update>", format = "json")]
async fn edit_question(
    _key: AdminKey,
    question_id: QuestionId,
    update: Json<QuestionUpdate>,
    now: Now,
    store: Store,
) -> Result<Json<AdminQuestion>> {
    let updated = admin::update_question(&*store, question_id, update.into_inner(), now.0).await?;
    Ok(Json(updated))
}

#[post("/admin/questions/<question_id>/choices", data = "<choice>", format = "json")]
async fn new_choice(
    _key: AdminKey,
    question_id: QuestionId,
    choice: Json<NewChoice>,
    store: Store,
) -> Result<Created<Json<Choice>>> {
    let choice = admin::add_choice(&*store, question_id, choice.into_inner()).await?;
    let location = uri!(question(question_id)).to_string();
    Ok(Created::new(location).body(Json(choice)))
}
