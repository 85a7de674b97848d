use jsonwebtoken::errors::{Error as JwtError, ErrorKind as JwtErrorKind};
use log::error;
use mongodb::{
    bson::{de::Error as BsonDeError, ser::Error as BsonSerError},
    error::Error as DbError,
};
use rocket::{
    http::Status,
    response::{self, status::Custom, Responder},
    serde::json::{json, Json},
    Request,
};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    BsonSer(#[from] BsonSerError),
    #[error(transparent)]
    BsonDe(#[from] BsonDeError),
    #[error(transparent)]
    Jwt(#[from] JwtError),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    InvalidId(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Internal(String),
}

impl Error {
    /// Construct a `NotFound` error for the given thing.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// The HTTP status this error maps to.
    pub fn status(&self) -> Status {
        match self {
            Self::Validation(_) | Self::InvalidId(_) => Status::BadRequest,
            Self::Unauthorized(_) | Self::Jwt(_) => Status::Unauthorized,
            Self::Forbidden(_) => Status::Forbidden,
            Self::NotFound(_) => Status::NotFound,
            Self::Conflict(_) => Status::Conflict,
            Self::Db(_) | Self::BsonSer(_) | Self::BsonDe(_) | Self::Internal(_) => {
                Status::InternalServerError
            }
        }
    }

    /// The message safe to show to the caller. Internal details are never exposed.
    pub fn public_message(&self) -> String {
        match self {
            Self::Db(_) | Self::BsonSer(_) | Self::BsonDe(_) | Self::Internal(_) => {
                "Server error".to_string()
            }
            Self::Jwt(err) => match err.kind() {
                JwtErrorKind::ExpiredSignature => "Token expired".to_string(),
                _ => "Invalid token".to_string(),
            },
            other => other.to_string(),
        }
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'o> {
        let status = self.status();
        if status.code >= 500 {
            error!("{} {}: {self}", req.method(), req.uri());
        }
        Custom(status, Json(json!({ "error": self.public_message() }))).respond_to(req)
    }
}
