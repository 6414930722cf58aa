use actix_web::{
  error::ResponseError,
  http::StatusCode,
  HttpResponse
};
use derive_more::Display;
use log::error;
use serde::Serialize;
use super::validation::ValidationErrors;

// Not sure if it's a good idea to call it "Error"
// but uh... Yeah I don't know.
// Internal and database errors only show a generic
// message, the full error output should only appear
// in logs.
#[derive(Debug, Display)]
pub enum Error {
  #[display(fmt = "Internal Server Error")]
  InternalServerError(String),
  #[display(fmt = "Database Error")]
  DatabaseError(String),
  #[display(fmt = "Invalid token.")]
  InvalidToken,
  #[display(fmt = "You do not have permission to perform this action.")]
  Forbidden,
  #[display(fmt = "{}", _0)]
  NotFound(String),
  #[display(fmt = "{}", _0)]
  BadRequest(String),
  #[display(fmt = "Validation failed")]
  Validation(ValidationErrors)
}

// Most errors are {"detail": "..."}, like the
// clients of the old API expect.
#[derive(Serialize)]
struct ErrorDetail {
  detail: String
}

impl Error {
  pub fn not_found() -> Self {
    Error::NotFound(String::from("Not found."))
  }
}

impl ResponseError for Error {
  fn status_code(&self) -> StatusCode {
    match self {
      Error::InternalServerError(_) | Error::DatabaseError(_) =>
        StatusCode::INTERNAL_SERVER_ERROR,
      Error::InvalidToken => StatusCode::UNAUTHORIZED,
      Error::Forbidden => StatusCode::FORBIDDEN,
      Error::NotFound(_) => StatusCode::NOT_FOUND,
      Error::BadRequest(_) | Error::Validation(_) => StatusCode::BAD_REQUEST
    }
  }

  fn error_response(&self) -> HttpResponse {
    let mut response = HttpResponse::build(self.status_code());
    match self {
      // Validation errors are keyed by field name.
      Error::Validation(errors) => response.json(errors),
      _ => response.json(ErrorDetail { detail: self.to_string() })
    }
  }
}

impl From<ValidationErrors> for Error {
  fn from(errors: ValidationErrors) -> Self {
    Error::Validation(errors)
  }
}

// My database errors use eyre, so uh... Yeah.
// The whole report goes to the logs.
pub fn map_db_error(e: eyre::Report) -> Error {
  error!("Database error: {:?}", e);
  Error::DatabaseError(e.to_string())
}
