use chrono::{DateTime, Utc};
use log::warn;
use rocket::{
    http::Status,
    request::{FromRequest, Outcome, Request},
};

use crate::Config;

/// Header carrying the administrator key.
pub const ADMIN_KEY_HEADER: &str = "X-Admin-Key";

/// The wall-clock time at which the request arrived.
///
/// This is the only place the clock is read; everything below the API
/// receives the time explicitly.
#[derive(Debug, Clone, Copy)]
pub struct Now(pub DateTime<Utc>);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Now {
    type Error = (); // No errors possible, use the `!` type once stabilised.

    async fn from_request(_req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        Outcome::Success(Now(Utc::now()))
    }
}

/// Proof that the request presented the configured administrator key.
#[derive(Debug, Clone, Copy)]
pub struct AdminKey;

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AdminKey {
    type Error = &'static str;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let config = match req.rocket().state::<Config>() {
            Some(config) => config,
            None => return Outcome::Failure((Status::InternalServerError, "config not loaded")),
        };
        match req.headers().get_one(ADMIN_KEY_HEADER) {
            Some(key) if key == config.admin_key() => Outcome::Success(AdminKey),
            Some(_) => {
                warn!("Rejected admin request with a wrong key");
                Outcome::Failure((Status::Unauthorized, "wrong admin key"))
            }
            None => Outcome::Failure((Status::Unauthorized, "missing admin key")),
        }
    }
}
