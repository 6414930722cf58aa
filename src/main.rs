mod app;
mod config;
mod db;
mod utils;
use color_eyre::Result;
use dotenv::dotenv;

#[actix_web::main]
async fn main() -> Result<()> {
  // Using dotenv to load the .env file in the current
  // directory, if any. Actual environment variables
  // take precedence.
  dotenv().ok();
  // RUST_LOG still works, "info" is only the default.
  env_logger::Builder::from_env(
    env_logger::Env::default().default_filter_or("info")
  ).init();
  color_eyre::install()?;

  app::run().await
}
