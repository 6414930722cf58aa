use actix_web::{web, HttpResponse, Result};
use log::info;
use crate::db::{self, entities::Tag};
use crate::app::AppState;
use crate::app::dtos::{ListQuery, TagDto, TagForm};
use crate::app::error::{Error, map_db_error};
use crate::app::guards::AdminOrReadOnly;
use crate::app::helpers::{self, Paginator};
use crate::app::validation::{duplicate_tag, validate_tag, WriteMode};

pub async fn list(
  app_state: web::Data<AppState>,
  _access: AdminOrReadOnly,
  query: web::Query<ListQuery>
) -> Result<HttpResponse, Error> {
  let paginator = Paginator::new(&app_state.api_info, helpers::TAGS, &query)?;
  let count = db::tag_count(&app_state.pool).map_err(map_db_error)?;
  paginator.check(count)?;
  let tags: Vec<TagDto> = db::tags_page(
    &app_state.pool,
    paginator.limit(),
    paginator.offset()
  )
    .map_err(map_db_error)?
    .into_iter()
    .map(|t| TagDto::new(t, &app_state.api_info.root))
    .collect();
  Ok(HttpResponse::Ok().json(paginator.page(count, tags)))
}

// The unique index on tags.text decides if the text
// is already taken.
pub async fn create(
  app_state: web::Data<AppState>,
  _access: AdminOrReadOnly,
  form: web::Json<TagForm>
) -> Result<HttpResponse, Error> {
  let text = validate_tag(&form, WriteMode::Create)?.unwrap_or_default();
  match db::insert_tag(&app_state.pool, &text).map_err(map_db_error)? {
    Some(tag) => {
      info!("Created tag {} ({})", tag.text, tag.id);
      Ok(HttpResponse::Created().json(TagDto::new(tag, &app_state.api_info.root)))
    },
    None => Err(duplicate_tag(&text).into())
  }
}

pub async fn retrieve(
  app_state: web::Data<AppState>,
  _access: AdminOrReadOnly,
  path: web::Path<(i64,)>
) -> Result<HttpResponse, Error> {
  let id = path.into_inner().0;
  match db::tag_by_id(&app_state.pool, id).map_err(map_db_error)? {
    Some(tag) => Ok(HttpResponse::Ok().json(TagDto::new(tag, &app_state.api_info.root))),
    None => Err(Error::not_found())
  }
}

fn save(
  app_state: &AppState,
  id: i64,
  form: &TagForm,
  mode: WriteMode
) -> Result<HttpResponse, Error> {
  let tag = db::tag_by_id(&app_state.pool, id)
    .map_err(map_db_error)?
    .ok_or_else(Error::not_found)?;
  let text = match validate_tag(form, mode)? {
    Some(text) => text,
    // Partial update without a text, nothing to do.
    None => return Ok(HttpResponse::Ok().json(TagDto::new(tag, &app_state.api_info.root)))
  };
  if !db::update_tag(&app_state.pool, id, &text).map_err(map_db_error)? {
    return Err(duplicate_tag(&text).into());
  }
  Ok(HttpResponse::Ok().json(TagDto::new(Tag { id, text }, &app_state.api_info.root)))
}

pub async fn update(
  app_state: web::Data<AppState>,
  _access: AdminOrReadOnly,
  path: web::Path<(i64,)>,
  form: web::Json<TagForm>
) -> Result<HttpResponse, Error> {
  save(&app_state, path.into_inner().0, &form, WriteMode::Replace)
}

pub async fn partial_update(
  app_state: web::Data<AppState>,
  _access: AdminOrReadOnly,
  path: web::Path<(i64,)>,
  form: web::Json<TagForm>
) -> Result<HttpResponse, Error> {
  save(&app_state, path.into_inner().0, &form, WriteMode::Partial)
}

pub async fn destroy(
  app_state: web::Data<AppState>,
  _access: AdminOrReadOnly,
  path: web::Path<(i64,)>
) -> Result<HttpResponse, Error> {
  let id = path.into_inner().0;
  if db::delete_tag(&app_state.pool, id).map_err(map_db_error)? {
    info!("Deleted tag {}", id);
    Ok(HttpResponse::NoContent().finish())
  } else {
    Err(Error::not_found())
  }
}
