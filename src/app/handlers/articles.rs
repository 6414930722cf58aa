use actix_web::{web, HttpResponse, Result};
use log::info;
use crate::db;
use crate::utils::text_utils;
use crate::app::AppState;
use crate::app::dtos::{ArticleDetailDto, ArticleDto, ArticleForm, ListQuery};
use crate::app::error::{Error, map_db_error};
use crate::app::guards::AdminOrReadOnly;
use crate::app::helpers::{self, Paginator};
use crate::app::validation::{missing_category, validate_article, WriteMode};

// Max amount of search terms to process:
const MAX_SEARCH_TERMS: usize = 10;

// The list uses the short representation (no body),
// everything else responds with the detail one.

pub async fn list(
  app_state: web::Data<AppState>,
  _access: AdminOrReadOnly,
  query: web::Query<ListQuery>
) -> Result<HttpResponse, Error> {
  let paginator = Paginator::new(&app_state.api_info, helpers::ARTICLES, &query)?;
  let terms: Vec<String> = query.search.as_deref()
    .map(|s| text_utils::split_search_terms(s, MAX_SEARCH_TERMS))
    .unwrap_or_default();

  let count = db::article_count(&app_state.pool, &terms)
    .map_err(map_db_error)?;
  paginator.check(count)?;
  let articles: Vec<ArticleDto> = db::articles_page(
    &app_state.pool,
    &terms,
    paginator.limit(),
    paginator.offset()
  )
    .map_err(map_db_error)?
    .into_iter()
    .map(|a| ArticleDto::new(a, &app_state.api_info.root))
    .collect();
  Ok(HttpResponse::Ok().json(paginator.page(count, articles)))
}

// The category can still vanish after validation, the
// foreign key catches it.
fn write_error(e: eyre::Report, category_id: Option<i64>) -> Error {
  match category_id {
    Some(id) if db::is_foreign_key_violation(&e) => missing_category(id).into(),
    _ => map_db_error(e)
  }
}

fn detail(app_state: &AppState, id: i64) -> Result<ArticleDetailDto, Error> {
  let article = db::article_by_id(&app_state.pool, id)
    .map_err(map_db_error)?
    .ok_or_else(Error::not_found)?;
  let comments = db::comments_for_article(&app_state.pool, id)
    .map_err(map_db_error)?;
  Ok(ArticleDetailDto::new(article, comments, &app_state.api_info.root))
}

// The author is whoever is making the request, an
// "author" in the body is ignored.
pub async fn create(
  app_state: web::Data<AppState>,
  access: AdminOrReadOnly,
  form: web::Json<ArticleForm>
) -> Result<HttpResponse, Error> {
  // Writes can't get here anonymously but let's not
  // crash on it anyway.
  let author_id = access.user()
    .map(|u| u.id)
    .ok_or(Error::Forbidden)?;
  let write = validate_article(&form, WriteMode::Create, &app_state.pool)?;
  let (article, new_tags) = write.into_new_article(author_id);
  let id = db::insert_article(&app_state.pool, &article)
    .map_err(|e| write_error(e, article.category_id))?;
  info!("Created article {} by user {}", id, author_id);
  if !new_tags.is_empty() {
    info!("Created tags {:?} for article {}", new_tags, id);
  }
  Ok(HttpResponse::Created().json(detail(&app_state, id)?))
}

pub async fn retrieve(
  app_state: web::Data<AppState>,
  _access: AdminOrReadOnly,
  path: web::Path<(i64,)>
) -> Result<HttpResponse, Error> {
  let id = path.into_inner().0;
  Ok(HttpResponse::Ok().json(detail(&app_state, id)?))
}

// A missing article is a 404 before any validation
// takes place.
fn save(
  app_state: &AppState,
  id: i64,
  form: &ArticleForm,
  mode: WriteMode
) -> Result<HttpResponse, Error> {
  if !db::article_exists(&app_state.pool, id).map_err(map_db_error)? {
    return Err(Error::not_found());
  }
  let write = validate_article(form, mode, &app_state.pool)?;
  let (update, new_tags) = write.into_update(id);
  let updated = db::update_article(&app_state.pool, &update)
    .map_err(|e| write_error(e, update.category_id.flatten()))?;
  if !updated {
    return Err(Error::not_found());
  }
  if !new_tags.is_empty() {
    info!("Created tags {:?} for article {}", new_tags, id);
  }
  Ok(HttpResponse::Ok().json(detail(app_state, id)?))
}

pub async fn update(
  app_state: web::Data<AppState>,
  _access: AdminOrReadOnly,
  path: web::Path<(i64,)>,
  form: web::Json<ArticleForm>
) -> Result<HttpResponse, Error> {
  save(&app_state, path.into_inner().0, &form, WriteMode::Replace)
}

pub async fn partial_update(
  app_state: web::Data<AppState>,
  _access: AdminOrReadOnly,
  path: web::Path<(i64,)>,
  form: web::Json<ArticleForm>
) -> Result<HttpResponse, Error> {
  save(&app_state, path.into_inner().0, &form, WriteMode::Partial)
}

pub async fn destroy(
  app_state: web::Data<AppState>,
  _access: AdminOrReadOnly,
  path: web::Path<(i64,)>
) -> Result<HttpResponse, Error> {
  let id = path.into_inner().0;
  if db::delete_article(&app_state.pool, id).map_err(map_db_error)? {
    info!("Deleted article {}", id);
    Ok(HttpResponse::NoContent().finish())
  } else {
    Err(Error::not_found())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::db::entities::NewArticle;

  #[test]
  fn vanished_category_is_a_validation_error() {
    let pool = db::memory_pool().unwrap();
    db::create_tables(&pool).unwrap();
    let author_id = db::insert_user(&pool, "admin", true, "token").unwrap();
    let article = NewArticle {
      title: String::from("Lost"),
      body: String::from("Text"),
      author_id,
      category_id: Some(9999),
      tags: Vec::new()
    };
    let e = db::insert_article(&pool, &article).unwrap_err();
    match write_error(e, Some(9999)) {
      Error::Validation(errors) => assert_eq!(
        Some(&vec![String::from("Category with id 9999 does not exist.")]),
        errors.messages("category_id")
      ),
      other => panic!("Unexpected error: {:?}", other)
    }
  }

  #[test]
  fn other_write_errors_stay_database_errors() {
    let e = eyre::eyre!("Disk on fire");
    match write_error(e, Some(1)) {
      Error::DatabaseError(_) => (),
      other => panic!("Unexpected error: {:?}", other)
    }
  }
}
