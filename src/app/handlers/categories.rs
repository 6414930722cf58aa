use actix_web::{web, HttpResponse, Result};
use log::info;
use crate::db;
use crate::app::AppState;
use crate::app::dtos::{CategoryDto, CategoryForm, ListQuery};
use crate::app::error::{Error, map_db_error};
use crate::app::guards::AdminOrReadOnly;
use crate::app::helpers::{self, Paginator};
use crate::app::validation::{validate_category, WriteMode};

pub async fn list(
  app_state: web::Data<AppState>,
  _access: AdminOrReadOnly,
  query: web::Query<ListQuery>
) -> Result<HttpResponse, Error> {
  let paginator = Paginator::new(&app_state.api_info, helpers::CATEGORIES, &query)?;
  let count = db::category_count(&app_state.pool).map_err(map_db_error)?;
  paginator.check(count)?;
  let categories: Vec<CategoryDto> = db::categories_page(
    &app_state.pool,
    paginator.limit(),
    paginator.offset()
  )
    .map_err(map_db_error)?
    .into_iter()
    .map(|c| CategoryDto::new(c, &app_state.api_info.root))
    .collect();
  Ok(HttpResponse::Ok().json(paginator.page(count, categories)))
}

// "created" is read-only and set here, whatever the
// request body says.
pub async fn create(
  app_state: web::Data<AppState>,
  _access: AdminOrReadOnly,
  form: web::Json<CategoryForm>
) -> Result<HttpResponse, Error> {
  let name = validate_category(&form, WriteMode::Create)?.unwrap_or_default();
  let category = db::insert_category(&app_state.pool, &name)
    .map_err(map_db_error)?;
  info!("Created category {} ({})", category.name, category.id);
  Ok(HttpResponse::Created().json(CategoryDto::new(category, &app_state.api_info.root)))
}

pub async fn retrieve(
  app_state: web::Data<AppState>,
  _access: AdminOrReadOnly,
  path: web::Path<(i64,)>
) -> Result<HttpResponse, Error> {
  let id = path.into_inner().0;
  match db::category_by_id(&app_state.pool, id).map_err(map_db_error)? {
    Some(category) => Ok(
      HttpResponse::Ok().json(CategoryDto::new(category, &app_state.api_info.root))
    ),
    None => Err(Error::not_found())
  }
}

fn save(
  app_state: &AppState,
  id: i64,
  form: &CategoryForm,
  mode: WriteMode
) -> Result<HttpResponse, Error> {
  let mut category = db::category_by_id(&app_state.pool, id)
    .map_err(map_db_error)?
    .ok_or_else(Error::not_found)?;
  if let Some(name) = validate_category(form, mode)? {
    if !db::update_category(&app_state.pool, id, &name).map_err(map_db_error)? {
      return Err(Error::not_found());
    }
    category.name = name;
  }
  Ok(HttpResponse::Ok().json(CategoryDto::new(category, &app_state.api_info.root)))
}

pub async fn update(
  app_state: web::Data<AppState>,
  _access: AdminOrReadOnly,
  path: web::Path<(i64,)>,
  form: web::Json<CategoryForm>
) -> Result<HttpResponse, Error> {
  save(&app_state, path.into_inner().0, &form, WriteMode::Replace)
}

pub async fn partial_update(
  app_state: web::Data<AppState>,
  _access: AdminOrReadOnly,
  path: web::Path<(i64,)>,
  form: web::Json<CategoryForm>
) -> Result<HttpResponse, Error> {
  save(&app_state, path.into_inner().0, &form, WriteMode::Partial)
}

pub async fn destroy(
  app_state: web::Data<AppState>,
  _access: AdminOrReadOnly,
  path: web::Path<(i64,)>
) -> Result<HttpResponse, Error> {
  let id = path.into_inner().0;
  if db::delete_category(&app_state.pool, id).map_err(map_db_error)? {
    info!("Deleted category {}", id);
    Ok(HttpResponse::NoContent().finish())
  } else {
    Err(Error::not_found())
  }
}
