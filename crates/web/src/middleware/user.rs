use axum::{
    async_trait,
    extract::{FromRequestParts, OriginalUri},
    http::request::Parts,
};
use model::user::User;
use utility::id::Id;

use crate::common::RouteErrorResponse;

/// Set by the authenticating gateway in front of the service.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated caller. Requests without an identity are rejected with
/// `401 Unauthorized`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser(pub Id<User>);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = RouteErrorResponse;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty());

        match user {
            Some(user) => Ok(CurrentUser(Id::new(user.to_owned()))),
            None => {
                let path = parts
                    .extensions
                    .get::<OriginalUri>()
                    .map(|OriginalUri(uri)| uri.path().to_owned())
                    .unwrap_or_else(|| parts.uri.path().to_owned());
                log::debug!("rejecting {} {} without identity", parts.method, path);
                Err(RouteErrorResponse::unauthorized(&parts.method, path))
            }
        }
    }
}
