use rocket::Route;

pub mod admin;
pub mod guards;
pub mod public;
pub mod voting;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(public::routes());
    routes.extend(voting::routes());
    routes.extend(admin::routes());
    routes
}
