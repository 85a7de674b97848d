use std::marker::PhantomData;

use jsonwebtoken::{DecodingKey, TokenData, Validation};
use log::debug;
use rocket::{
    http::Status,
    request::{FromRequest, Outcome},
    Request,
};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::Error;
use crate::model::mongodb::Id;

use super::user::{Access, Authenticated, Role};

pub const AUTHORIZATION_HEADER: &str = "Authorization";
pub const ACCESS_TOKEN_HEADER: &str = "x-access-token";
pub const TOKEN_QUERY_PARAM: &str = "token";

/// The verified identity behind a request, admitted for the access class `A`.
///
/// Tokens are issued elsewhere; this side only verifies them.
pub struct AuthToken<A = Authenticated> {
    pub id: Id,
    pub role: Role,
    phantom: PhantomData<A>,
}

impl<A> AuthToken<A> {
    /// Does this token carry the given role?
    pub fn permits(&self, target: Role) -> bool {
        self.role == target
    }

    /// Decode and verify a raw token string.
    pub fn decode(raw: &str, config: &Config) -> Result<Self, Error> {
        let claims = jsonwebtoken::decode(
            raw,
            &DecodingKey::from_secret(config.jwt_secret()),
            &Validation::default(),
        )
        .map(|data: TokenData<Claims>| data.claims)?;
        let id = claims
            .id
            .parse()
            .map_err(|_| Error::Unauthorized("Invalid token".to_string()))?;
        Ok(Self {
            id,
            role: claims.role,
            phantom: PhantomData,
        })
    }
}

/// Token claims, as issued by the authentication service.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Role,
    pub exp: i64,
}

/// The reason an authentication guard rejected a request, kept so the catcher can report it.
#[derive(Debug, Default)]
pub struct GuardFailure(pub Option<String>);

/// Find the raw token: `Authorization` (with or without a `Bearer ` prefix),
/// then `x-access-token`, then the `token` query parameter.
fn raw_token<'r>(req: &'r Request<'_>) -> Option<&'r str> {
    let headers = req.headers();
    headers
        .get_one(AUTHORIZATION_HEADER)
        .or_else(|| headers.get_one(ACCESS_TOKEN_HEADER))
        .or_else(|| {
            req.query_value::<&str>(TOKEN_QUERY_PARAM)
                .and_then(|value| value.ok())
        })
        .map(|value| value.strip_prefix("Bearer ").unwrap_or(value).trim())
        .filter(|value| !value.is_empty())
}

fn reject<S>(req: &Request<'_>, error: Error) -> Outcome<S, Error> {
    let message = error.public_message();
    req.local_cache(|| GuardFailure(Some(message)));
    Outcome::Failure((error.status(), error))
}

#[rocket::async_trait]
impl<'r, A> FromRequest<'r> for AuthToken<A>
where
    A: Access + Send,
{
    type Error = Error;

    /// Verify the request's token and check it carries the role `A` requires.
    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let config = match req.rocket().state::<Config>() {
            Some(config) => config,
            None => {
                let err = Error::Internal("Application config is not managed".to_string());
                return Outcome::Failure((Status::InternalServerError, err));
            }
        };

        let raw = match raw_token(req) {
            Some(raw) => raw,
            None => return reject(req, Error::Unauthorized("No token provided".to_string())),
        };

        let token = match Self::decode(raw, config) {
            Ok(token) => token,
            Err(err) => {
                debug!("Rejected token: {err}");
                return reject(req, err);
            }
        };

        if let Some(required) = A::REQUIRED {
            if !token.permits(required) {
                return reject(req, Error::Forbidden(format!("Forbidden: {required} only")));
            }
        }

        Outcome::Success(token)
    }
}
