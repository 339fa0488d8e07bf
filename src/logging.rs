use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use log::{error, info, warn};
use rocket::{
    fairing::{Fairing, Info, Kind},
    http::{Header, StatusClass},
    request::{FromRequest, Outcome},
    Data, Orbit, Request, Response, Rocket,
};

/// Response header echoing the request's [`RequestId`].
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Sequence number of a request, unique for the lifetime of the process.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub struct RequestId(u64);

impl RequestId {
    /// The ID of the given request, allocated on first use.
    pub fn of<'r>(req: &'r Request<'_>) -> &'r RequestId {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        req.local_cache(|| RequestId(NEXT.fetch_add(1, Ordering::Relaxed)))
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for &'r RequestId {
    type Error = (); // Infallible.

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        Outcome::Success(RequestId::of(req))
    }
}

/// When the request reached the logger.
struct Arrival(Instant);

/// Logs one line per request and per response, tagged with the [`RequestId`]
/// and timed from arrival. The ID is also returned to the client.
#[derive(Debug, Copy, Clone)]
pub struct LoggerFairing;

#[rocket::async_trait]
impl Fairing for LoggerFairing {
    fn info(&self) -> Info {
        Info {
            name: "Request logger",
            kind: Kind::Liftoff | Kind::Request | Kind::Response | Kind::Shutdown,
        }
    }

    async fn on_liftoff(&self, rocket: &Rocket<Orbit>) {
        let config = rocket.config();
        let protocol = if config.tls_enabled() { "https" } else { "http" };
        info!(
            "Polls server listening on {protocol}://{}:{} with {} routes",
            config.address,
            config.port,
            rocket.routes().count()
        );
    }

    async fn on_request(&self, req: &mut Request<'_>, _data: &mut Data<'_>) {
        req.local_cache(|| Arrival(Instant::now()));
        let id = RequestId::of(req);
        info!("->req{id} {} {}", req.method(), req.uri());
    }

    async fn on_response<'r>(&self, req: &'r Request<'_>, res: &mut Response<'r>) {
        let id = RequestId::of(req);
        res.set_header(Header::new(REQUEST_ID_HEADER, id.to_string()));

        let elapsed = req.local_cache(|| Arrival(Instant::now())).0.elapsed();
        let status = res.status();
        let route = req
            .route()
            .and_then(|route| route.name.as_deref())
            .unwrap_or("no route");
        let line = format!("<-rsp{id} {status} {route} ({}ms)", elapsed.as_millis());
        match status.class() {
            StatusClass::ServerError => error!("{line}"),
            StatusClass::ClientError => warn!("{line}"),
            _ => info!("{line}"),
        }
    }

    async fn on_shutdown(&self, _rocket: &Rocket<Orbit>) {
        warn!("Shutting down; in-flight votes will finish first");
    }
}
