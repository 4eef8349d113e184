//! Extracts the ID of the user making a request from the `x-user-id` header.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{Error, UserID};

/// The name of the header that identifies the requesting user.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The user on whose behalf a request is made.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Requester(pub UserID);

impl<S> FromRequestParts<S> for Requester
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<i64>().ok())
            .map(|id| Requester(UserID::new(id)))
            .ok_or(Error::MissingRequester)
    }
}

#[cfg(test)]
mod tests {
    use axum::{extract::FromRequestParts, http::Request};

    use crate::{Error, UserID};

    use super::{Requester, USER_ID_HEADER};

    async fn extract(header: Option<&str>) -> Result<Requester, Error> {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header(USER_ID_HEADER, value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();

        Requester::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn parses_user_id() {
        assert_eq!(extract(Some("7")).await, Ok(Requester(UserID::new(7))));
    }

    #[tokio::test]
    async fn rejects_missing_header() {
        assert_eq!(extract(None).await, Err(Error::MissingRequester));
    }

    #[tokio::test]
    async fn rejects_malformed_header() {
        assert_eq!(extract(Some("seven")).await, Err(Error::MissingRequester));
    }
}
