use actix_web::{
  dev::Payload,
  http::Method,
  web,
  FromRequest,
  HttpRequest
};
use futures::future::{ready, Ready};
use log::warn;
use crate::db::{self, entities::User};
use super::error::{Error, map_db_error};
use super::helpers;
use super::AppState;

// An actix Guard would just cause the router to not
// match the route and respond with a 404. The API has
// to say 403, so this is an extractor instead: every
// handler takes an AdminOrReadOnly argument and the
// request never reaches the handler body when the
// permission check fails.

fn is_safe_method(method: &Method) -> bool {
  *method == Method::GET || *method == Method::HEAD || *method == Method::OPTIONS
}

// Anybody can read, only staff users can write.
pub fn has_permission(method: &Method, user: Option<&User>) -> bool {
  is_safe_method(method) || user.map(|u| u.is_staff).unwrap_or(false)
}

// Who's making the request. None is anonymous. A token
// that matches nobody is an error though, even for
// reads.
fn requester(req: &HttpRequest) -> Result<Option<User>, Error> {
  let token = match helpers::auth_token(req) {
    Some(token) => token,
    None => return Ok(None)
  };
  let app_state = req.app_data::<web::Data<AppState>>()
    .ok_or_else(|| Error::InternalServerError(
      String::from("Application state is missing")
    ))?;
  match db::user_by_token(&app_state.pool, &token).map_err(map_db_error)? {
    Some(user) => Ok(Some(user)),
    None => {
      warn!("Unknown API token used to reach {} {}", req.method(), req.uri());
      Err(Error::InvalidToken)
    }
  }
}

pub struct AdminOrReadOnly {
  user: Option<User>
}

impl AdminOrReadOnly {
  pub fn user(&self) -> Option<&User> {
    self.user.as_ref()
  }

  fn check(req: &HttpRequest) -> Result<Self, Error> {
    let user = requester(req)?;
    if has_permission(req.method(), user.as_ref()) {
      Ok(Self { user })
    } else {
      warn!(
        "Write attempt without staff rights on {} {}",
        req.method(),
        req.uri()
      );
      Err(Error::Forbidden)
    }
  }
}

impl FromRequest for AdminOrReadOnly {
  type Error = Error;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
    ready(Self::check(req))
  }
}
