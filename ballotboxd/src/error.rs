use ballotbox::Error;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{response, Request};

/// JSON error envelope returned by every endpoint.
///
/// `already_voted` and `not_found` are expected outcomes and carry plain,
/// non-alarming messages; only `unavailable` is marked retryable.
#[derive(Serialize, Debug, Clone)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
    pub retryable: bool,
}

#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: Status,
    pub body: ErrorBody,
}

impl ApiError {
    pub fn not_found(message: &str) -> Self {
        ApiError {
            status: Status::NotFound,
            body: ErrorBody {
                error: "not_found",
                message: message.to_owned(),
                retryable: false,
            },
        }
    }

    pub fn unavailable(message: String) -> Self {
        ApiError {
            status: Status::ServiceUnavailable,
            body: ErrorBody {
                error: "unavailable",
                message,
                retryable: true,
            },
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let (status, code, message) = match &err {
            Error::AlreadyVoted { .. } => (
                Status::Conflict,
                "already_voted",
                "A ballot for this election has already been recorded for this voter.".to_owned(),
            ),
            Error::NotAuthenticated(_) => (Status::Unauthorized, "not_authenticated", err.to_string()),
            Error::NotAuthorized(_) => (Status::Forbidden, "not_authorized", err.to_string()),
            Error::ElectionNotFound(_) => (Status::NotFound, "not_found", err.to_string()),
            Error::ElectionNotActive(_) => (
                Status::UnprocessableEntity,
                "election_not_active",
                err.to_string(),
            ),
            Error::InvalidCandidate { .. } => (
                Status::UnprocessableEntity,
                "invalid_candidate",
                err.to_string(),
            ),
            Error::Validation(_) => (Status::UnprocessableEntity, "validation", err.to_string()),
            Error::Unavailable(_) => (Status::ServiceUnavailable, "unavailable", err.to_string()),
        };
        ApiError {
            status,
            body: ErrorBody {
                error: code,
                message,
                retryable: err.is_retryable(),
            },
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::unavailable(format!("storage error: {}", err))
    }
}

impl<'r> response::Responder<'r, 'static> for ApiError {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status;
        let mut response = Json(self.body).respond_to(request)?;
        response.set_status(status);
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn already_voted_maps_to_conflict_and_is_terminal() {
        let err = ApiError::from(Error::AlreadyVoted {
            voter: Uuid::new_v4(),
            election: Uuid::new_v4(),
        });
        assert_eq!(err.status, Status::Conflict);
        assert_eq!(err.body.error, "already_voted");
        assert!(!err.body.retryable);
        // Expected outcome: the message must read plainly, not like a fault.
        assert!(!err.body.message.to_lowercase().contains("error"));
    }

    #[test]
    fn only_unavailable_is_retryable() {
        let unavailable = ApiError::from(Error::Unavailable("down".into()));
        assert_eq!(unavailable.status, Status::ServiceUnavailable);
        assert!(unavailable.body.retryable);

        let invalid = ApiError::from(Error::ElectionNotActive(Uuid::new_v4()));
        assert_eq!(invalid.status, Status::UnprocessableEntity);
        assert!(!invalid.body.retryable);
    }
}
