use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use color_eyre::Result;
use eyre::WrapErr;
use log::{debug, info};
// I think we have to add crate here because
// of the other crate named "config" that we
// use as a dependency.
use crate::config::{ApiInfo, Config};
use crate::db::{self, Pool};
use error::Error;
use handlers::{articles, avatars, categories, tags};
mod handlers;
mod dtos;
mod error;
mod helpers;
mod guards;
mod validation;
#[cfg(test)]
mod tests;

// Declare app state struct:
pub struct AppState {
  pub pool: Pool,
  pub api_info: ApiInfo
}

fn cors(origin: Option<&str>) -> Cors {
  match origin {
    // Cors::default() doesn't allow any origin.
    None => Cors::default(),
    Some(origin) => Cors::default()
      .allowed_origin(origin)
      .allowed_methods(vec!["GET", "HEAD", "OPTIONS", "POST", "PUT", "PATCH", "DELETE"])
      .allow_any_header()
      .max_age(3600)
  }
}

// Function to start the server.
// Has to be async because there should be a .await at the end.
pub async fn run() -> Result<()> {
  let config = Config::from_env()
    .wrap_err("Configuration (environment or .env file) is invalid")?;
  debug!("Current config: {:?}", config);
  let pool = db::open_pool(&config.db_path)?;
  db::create_tables(&pool)?;

  // Got to save these for later because we'll be
  // destroying "config" by moving it into app_state
  // as another struct called ApiInfo.
  let bind_address = config.bind_address.clone();
  let cors_origin = config.cors_origin.clone();

  let app_state = web::Data::new(
    AppState {
      pool,
      api_info: config.into()
    }
  );
  info!("Listening on {}", bind_address);

  HttpServer::new(move|| {
    App::new()
      .app_data(app_state.clone())
      .wrap(cors(cors_origin.as_deref()))
      .wrap(middleware::NormalizePath::new(middleware::TrailingSlash::Always))
      .wrap(middleware::Logger::default())
      .configure(endpoints_config)
      .default_service(web::route().to(handlers::not_found))
  })
  .bind(bind_address)?
  .run()
  .await
  .wrap_err("Start Actix web server")
}

// Route configuration. Also used by the tests, which
// is why the extractor configs are in here and not
// on the App.
// Every resource has the same two routes, one for
// the collection and one for a single item. HEAD goes
// to the same handlers as GET, actix drops the body.
pub fn endpoints_config(cfg: &mut web::ServiceConfig) {
  cfg.app_data(web::PathConfig::default().error_handler(|_, _| {
      // Ids that aren't numbers can't match anything.
      Error::not_found().into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|e, _| {
      Error::BadRequest(format!("Invalid query string arguments - {}", e)).into()
    }))
    .app_data(web::JsonConfig::default().error_handler(|e, _| {
      Error::BadRequest(format!("JSON parse error - {}", e)).into()
    }))
    .service(
      web::resource("/")
        .route(web::get().to(handlers::index))
        .route(web::head().to(handlers::index))
    )
    .service(
      web::resource("/tags/")
        .route(web::get().to(tags::list))
        .route(web::head().to(tags::list))
        .route(web::post().to(tags::create))
    )
    .service(
      web::resource("/tags/{id}/")
        .route(web::get().to(tags::retrieve))
        .route(web::head().to(tags::retrieve))
        .route(web::put().to(tags::update))
        .route(web::patch().to(tags::partial_update))
        .route(web::delete().to(tags::destroy))
    )
    .service(
      web::resource("/categories/")
        .route(web::get().to(categories::list))
        .route(web::head().to(categories::list))
        .route(web::post().to(categories::create))
    )
    .service(
      web::resource("/categories/{id}/")
        .route(web::get().to(categories::retrieve))
        .route(web::head().to(categories::retrieve))
        .route(web::put().to(categories::update))
        .route(web::patch().to(categories::partial_update))
        .route(web::delete().to(categories::destroy))
    )
    .service(
      web::resource("/articles/")
        .route(web::get().to(articles::list))
        .route(web::head().to(articles::list))
        .route(web::post().to(articles::create))
    )
    .service(
      web::resource("/articles/{id}/")
        .route(web::get().to(articles::retrieve))
        .route(web::head().to(articles::retrieve))
        .route(web::put().to(articles::update))
        .route(web::patch().to(articles::partial_update))
        .route(web::delete().to(articles::destroy))
    )
    .service(
      web::resource("/avatars/")
        .route(web::get().to(avatars::list))
        .route(web::head().to(avatars::list))
        .route(web::post().to(avatars::create))
    )
    .service(
      web::resource("/avatars/{id}/")
        .route(web::get().to(avatars::retrieve))
        .route(web::head().to(avatars::retrieve))
        .route(web::put().to(avatars::update))
        .route(web::patch().to(avatars::partial_update))
        .route(web::delete().to(avatars::destroy))
    );
}
