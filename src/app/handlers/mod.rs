use actix_web::{web, HttpResponse, Result};
use serde::Serialize;
use super::error::Error;
use super::helpers;
use super::AppState;

// API handler functions, one module per resource.
// Every resource has the same set of operations:
// list, create, retrieve, update, partial_update
// and destroy.
pub mod tags;
pub mod categories;
pub mod avatars;
pub mod articles;

// Entry point listing the resources, handy when
// browsing the API.
#[derive(Serialize)]
struct ApiRoot {
  tags: String,
  categories: String,
  articles: String,
  avatars: String
}

pub async fn index(app_state: web::Data<AppState>) -> HttpResponse {
  let root = &app_state.api_info.root;
  HttpResponse::Ok().json(ApiRoot {
    tags: helpers::list_url(root, helpers::TAGS),
    categories: helpers::list_url(root, helpers::CATEGORIES),
    articles: helpers::list_url(root, helpers::ARTICLES),
    avatars: helpers::list_url(root, helpers::AVATARS)
  })
}

// Default response when no route matched the request:
pub async fn not_found() -> Result<HttpResponse, Error> {
  Err(Error::not_found())
}
