#![allow(dead_code)]
mod config;
mod db;
mod utils;

use std::env;
use color_eyre::Result;
use dotenv::dotenv;
use getopts::Options;
use log::info;
use rand::{distributions::Alphanumeric, Rng};
use crate::config::Config;

// Same length as the tokens of the old API.
const TOKEN_LENGTH: usize = 40;

// Copy pasted this from getopts doc.
fn print_usage(program: &str, opts: Options) {
  let brief = format!("Usage: {} [options]", program);
  print!("{}", opts.usage(&brief));
}

fn generate_token() -> String {
  rand::thread_rng()
    .sample_iter(&Alphanumeric)
    .take(TOKEN_LENGTH)
    .map(char::from)
    .collect()
}

/**
 * Binary meant for the things the API doesn't do:
 * creating the database and its users.
 */
fn main() -> Result<()> {
  dotenv().ok();
  env_logger::Builder::from_env(
    env_logger::Env::default().default_filter_or("info")
  ).init();
  color_eyre::install()?;

  let args: Vec<String> = env::args().collect();
  let program = args[0].clone();
  let mut opts = Options::new();
  opts.optflag("i", "init-db", "Create the database tables if they don't exist");
  opts.optopt("u", "create-user", "Create a user and print its API token", "NAME");
  opts.optflag("s", "staff", "The created user can write (use with --create-user)");
  opts.optflag("h", "help", "Program usage");
  let opt_matches = opts.parse(&args[1..])?;
  if opt_matches.opt_present("h")
    || !(opt_matches.opt_present("i") || opt_matches.opt_present("u")) {
    print_usage(&program, opts);
    return Ok(());
  }

  let config = Config::from_env()?;
  let pool = db::open_pool(&config.db_path)?;

  if opt_matches.opt_present("i") {
    db::create_tables(&pool)?;
    info!("Tables ready in {}", config.db_path);
  }

  if let Some(username) = opt_matches.opt_str("u") {
    // Works on a fresh database too.
    db::create_tables(&pool)?;
    let is_staff = opt_matches.opt_present("s");
    let token = generate_token();
    let id = db::insert_user(&pool, &username, is_staff, &token)?;
    info!("Created user {} ({}), staff: {}", username, id, is_staff);
    println!("{}", token);
  }

  Ok(())
}
