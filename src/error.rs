use mongodb::error::Error as DbError;
use rocket::{http::Status, response::Responder};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    BsonDecode(#[from] mongodb::bson::de::Error),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Expired: {0}")]
    Expired(String),
}

impl Error {
    /// Convenience constructor for 404s.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Convenience constructor for rejected input.
    pub fn bad_request(why: impl Into<String>) -> Self {
        Self::BadRequest(why.into())
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, _: &'r rocket::Request<'_>) -> rocket::response::Result<'o> {
        Err(match self {
            Self::Db(_) | Self::BsonDecode(_) => Status::InternalServerError,
            Self::BadRequest(_) => Status::BadRequest,
            Self::NotFound(_) => Status::NotFound,
            // An expired code is a recognised-but-stale credential, so it
            // gets a distinct status from a plain miss.
            Self::Expired(_) => Status::Forbidden,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use mongodb::bson::{from_bson, Bson};
    use rocket::local::asynchronous::Client;

    #[get("/missing")]
    fn missing() -> Result<()> {
        Err(Error::not_found("thing"))
    }

    #[get("/stale")]
    fn stale() -> Result<()> {
        Err(Error::Expired("code".to_string()))
    }

    #[get("/rejected")]
    fn rejected() -> Result<()> {
        Err(Error::bad_request("nope"))
    }

    #[get("/corrupt")]
    fn corrupt() -> Result<()> {
        let err = from_bson::<i32>(Bson::String("not a number".to_string())).unwrap_err();
        Err(err.into())
    }

    #[rocket::async_test]
    async fn variants_map_to_distinct_statuses() {
        let rocket = rocket::build().mount("/", routes![missing, stale, rejected, corrupt]);
        let client = Client::untracked(rocket).await.unwrap();

        assert_eq!(
            client.get("/missing").dispatch().await.status(),
            Status::NotFound
        );
        // Stale credentials are distinguishable from plain misses.
        assert_eq!(
            client.get("/stale").dispatch().await.status(),
            Status::Forbidden
        );
        assert_eq!(
            client.get("/rejected").dispatch().await.status(),
            Status::BadRequest
        );
        assert_eq!(
            client.get("/corrupt").dispatch().await.status(),
            Status::InternalServerError
        );
    }
}
