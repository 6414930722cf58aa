// Adding the wrap_err method to errors:
use eyre::WrapErr;
use color_eyre::Result;
use serde::{Deserialize, Serialize};
use std::convert::From;

#[derive(Debug, Deserialize)]
pub struct Config {
  pub db_path: String,
  pub bind_address: String,
  // Used to generate the "url" fields and the
  // pagination links. No trailing slash.
  pub api_root: String,
  pub page_size: usize,
  // Only one origin is allowed for CORS, none
  // at all if absent.
  pub cors_origin: Option<String>
}

// Looks redundant but the handlers only need these
// and there's no reason to move the rest of the
// config around in the app_state.
#[derive(Debug, Clone, Serialize)]
pub struct ApiInfo {
  pub root: String,
  pub page_size: usize
}

// I'm using From so that transforming into
// ApiInfo drops all of the other info since
// a "move" is obligatory here.
impl From<Config> for ApiInfo {
  fn from(config: Config) -> Self {
    Self {
      root: config.api_root.trim_end_matches('/').to_string(),
      // A page size of 0 would make every page
      // "invalid":
      page_size: config.page_size.max(1)
    }
  }
}

impl Config {

  pub fn from_env() -> Result<Config> {
    // RUST_LOG is dealt with in main.rs.
    // Let's set the other default values. You have
    // to use lowercase when compared to what's
    // in the .env file.
    let c = config::Config::builder()
      .set_default("db_path", "./blog.db")?
      .set_default("bind_address", "127.0.0.1:8080")?
      .set_default("api_root", "http://127.0.0.1:8080")?
      .set_default("page_size", 10_i64)?
      .add_source(config::Environment::default().try_parsing(true))
      .build()
      .wrap_err("Loading configuration from env")?;
    c.try_deserialize()
      .wrap_err("Deserializing configuration")
  }

}
