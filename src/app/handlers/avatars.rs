use actix_web::{web, HttpResponse, Result};
use log::info;
use crate::db;
use crate::app::AppState;
use crate::app::dtos::{AvatarDto, AvatarForm, ListQuery};
use crate::app::error::{Error, map_db_error};
use crate::app::guards::AdminOrReadOnly;
use crate::app::helpers::{self, Paginator};
use crate::app::validation::{validate_avatar, WriteMode};

// Avatars only store a reference to the image, the
// files themselves are served by something else.

pub async fn list(
  app_state: web::Data<AppState>,
  _access: AdminOrReadOnly,
  query: web::Query<ListQuery>
) -> Result<HttpResponse, Error> {
  let paginator = Paginator::new(&app_state.api_info, helpers::AVATARS, &query)?;
  let count = db::avatar_count(&app_state.pool).map_err(map_db_error)?;
  paginator.check(count)?;
  let avatars: Vec<AvatarDto> = db::avatars_page(
    &app_state.pool,
    paginator.limit(),
    paginator.offset()
  )
    .map_err(map_db_error)?
    .into_iter()
    .map(|a| AvatarDto::new(a, &app_state.api_info.root))
    .collect();
  Ok(HttpResponse::Ok().json(paginator.page(count, avatars)))
}

pub async fn create(
  app_state: web::Data<AppState>,
  _access: AdminOrReadOnly,
  form: web::Json<AvatarForm>
) -> Result<HttpResponse, Error> {
  let content = validate_avatar(&form, WriteMode::Create)?.unwrap_or_default();
  let avatar = db::insert_avatar(&app_state.pool, &content)
    .map_err(map_db_error)?;
  info!("Created avatar {}", avatar.id);
  Ok(HttpResponse::Created().json(AvatarDto::new(avatar, &app_state.api_info.root)))
}

pub async fn retrieve(
  app_state: web::Data<AppState>,
  _access: AdminOrReadOnly,
  path: web::Path<(i64,)>
) -> Result<HttpResponse, Error> {
  let id = path.into_inner().0;
  match db::avatar_by_id(&app_state.pool, id).map_err(map_db_error)? {
    Some(avatar) => Ok(
      HttpResponse::Ok().json(AvatarDto::new(avatar, &app_state.api_info.root))
    ),
    None => Err(Error::not_found())
  }
}

fn save(
  app_state: &AppState,
  id: i64,
  form: &AvatarForm,
  mode: WriteMode
) -> Result<HttpResponse, Error> {
  let mut avatar = db::avatar_by_id(&app_state.pool, id)
    .map_err(map_db_error)?
    .ok_or_else(Error::not_found)?;
  if let Some(content) = validate_avatar(form, mode)? {
    if !db::update_avatar(&app_state.pool, id, &content).map_err(map_db_error)? {
      return Err(Error::not_found());
    }
    avatar.content = content;
  }
  Ok(HttpResponse::Ok().json(AvatarDto::new(avatar, &app_state.api_info.root)))
}

pub async fn update(
  app_state: web::Data<AppState>,
  _access: AdminOrReadOnly,
  path: web::Path<(i64,)>,
  form: web::Json<AvatarForm>
) -> Result<HttpResponse, Error> {
  save(&app_state, path.into_inner().0, &form, WriteMode::Replace)
}

pub async fn partial_update(
  app_state: web::Data<AppState>,
  _access: AdminOrReadOnly,
  path: web::Path<(i64,)>,
  form: web::Json<AvatarForm>
) -> Result<HttpResponse, Error> {
  save(&app_state, path.into_inner().0, &form, WriteMode::Partial)
}

pub async fn destroy(
  app_state: web::Data<AppState>,
  _access: AdminOrReadOnly,
  path: web::Path<(i64,)>
) -> Result<HttpResponse, Error> {
  let id = path.into_inner().0;
  if db::delete_avatar(&app_state.pool, id).map_err(map_db_error)? {
    info!("Deleted avatar {}", id);
    Ok(HttpResponse::NoContent().finish())
  } else {
    Err(Error::not_found())
  }
}
