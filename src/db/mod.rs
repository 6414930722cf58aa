use rusqlite::{
  functions::FunctionFlags,
  params,
  params_from_iter,
  Connection,
  OptionalExtension,
  Params,
  Row,
  ToSql
};
use r2d2_sqlite::SqliteConnectionManager;
pub mod entities;
mod mappers;
mod helpers;
mod queries;
use eyre::WrapErr;
use color_eyre::Result;
use entities::*;
use mappers::*;
use helpers::{
  generate_field_equal_qmark,
  generate_in_placeholders,
  generate_like_clauses,
  like_pattern
};
use queries::{select_query_builder, Order, OrderBy};
use crate::utils::time_utils::current_timestamp;

// Type alias to make function signatures much clearer:
pub type Pool = r2d2::Pool<SqliteConnectionManager>;

const SCHEMA: &str = include_str!("schema.sql");

const TAG_FIELDS: [&str; 2] = ["tags.id", "tags.text"];
const CATEGORY_FIELDS: [&str; 3] = [
  "categories.id",
  "categories.name",
  "categories.created"
];
const AVATAR_FIELDS: [&str; 2] = ["avatars.id", "avatars.content"];
const USER_FIELDS: &str = "users.id, users.username, users.is_staff, \
  users.date_joined, users.last_login";
// Has to match mappers::map_article.
const ARTICLE_FIELDS: [&str; 13] = [
  "articles.id",
  "articles.title",
  "articles.body",
  "articles.created",
  "articles.updated",
  "users.id",
  "users.username",
  "users.is_staff",
  "users.date_joined",
  "users.last_login",
  "categories.id",
  "categories.name",
  "categories.created"
];
const ARTICLE_FROM: &str = "articles \
  JOIN users ON users.id = articles.author_id \
  LEFT JOIN categories ON categories.id = articles.category_id";

/**
 * All of the DB stuff is done in a non-async way.
 * Public functions take the pool and get a single
 * connection from it, private ones work on a given
 * connection so that they can be chained inside of
 * a transaction.
 */

// Foreign keys are off by default in SQLite and it's
// a per-connection setting. Same for custom functions.
fn init_connection(conn: &mut Connection) -> rusqlite::Result<()> {
  conn.execute_batch("PRAGMA foreign_keys = ON;")?;
  // SQLite's own lower() and LIKE only fold ASCII.
  conn.create_scalar_function(
    "unicode_lower",
    1,
    FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
    |ctx| {
      let text: Option<String> = ctx.get(0)?;
      Ok(text.map(|t| t.to_lowercase()))
    }
  )
}

fn with_connection_init(manager: SqliteConnectionManager) -> SqliteConnectionManager {
  manager.with_init(init_connection)
}

pub fn open_pool(db_path: &str) -> Result<Pool> {
  let manager = with_connection_init(SqliteConnectionManager::file(db_path));
  Pool::new(manager)
    .wrap_err("Database connection failed")
}

// Every connection to ":memory:" is its own database,
// so the pool has to stick to a single connection.
#[cfg(test)]
pub fn memory_pool() -> Result<Pool> {
  let manager = with_connection_init(SqliteConnectionManager::memory());
  Pool::builder()
    .max_size(1)
    .build(manager)
    .wrap_err("In-memory database failed")
}

pub fn create_tables(pool: &Pool) -> Result<()> {
  let conn = pool.get()?;
  conn.execute_batch(SCHEMA)
    .wrap_err("Creating tables")
}

// Stole most of the signature from the rusqlite doc.
fn select_many<T, P, F>(
  conn: &Connection,
  query: &str,
  params: P,
  mapper: F
) -> Result<Vec<T>>
  where
    P: Params,
    F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
  let mut stmt = conn.prepare(query)?;
  let rows = stmt.query_map(params, mapper)?
    .collect::<rusqlite::Result<Vec<T>>>();
  rows.wrap_err("Generic select_many query")
}

fn select_one<T, P, F>(
  conn: &Connection,
  query: &str,
  params: P,
  mapper: F
) -> Result<Option<T>>
  where
    P: Params,
    F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
{
  conn.query_row(query, params, mapper)
    .optional()
    .wrap_err("Generic select_one query")
}

fn count<P: Params>(
  conn: &Connection,
  query: &str,
  params: P
) -> Result<i64> {
  conn.query_row(query, params, |row| row.get(0))
    .wrap_err("Generic count query")
}

// The row referenced by a foreign key doesn't exist
// (anymore).
pub fn is_foreign_key_violation(e: &eyre::Report) -> bool {
  match e.downcast_ref::<rusqlite::Error>() {
    Some(rusqlite::Error::SqliteFailure(err, _)) =>
      err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
    _ => false
  }
}

// Table names are never user input.
fn delete_by_id(
  pool: &Pool,
  table: &str,
  id: i64
) -> Result<bool> {
  let conn = pool.get()?;
  let deleted = conn.execute(
    &format!("DELETE FROM {} WHERE id = ?", table),
    params![id]
  )?;
  Ok(deleted > 0)
}

/* --- Users --- */

pub fn user_by_token(
  pool: &Pool,
  token: &str
) -> Result<Option<User>> {
  let conn = pool.get()?;
  select_one(
    &conn,
    &format!("SELECT {} FROM users WHERE api_token = ?", USER_FIELDS),
    params![token],
    map_user
  )
}

pub fn insert_user(
  pool: &Pool,
  username: &str,
  is_staff: bool,
  token: &str
) -> Result<i64> {
  let conn = pool.get()?;
  conn.execute(
    "INSERT INTO users (username, is_staff, api_token, date_joined) \
    VALUES (?, ?, ?, ?)",
    params![username, is_staff, token, current_timestamp()]
  ).wrap_err("Inserting user")?;
  Ok(conn.last_insert_rowid())
}

/* --- Tags --- */

pub fn tag_count(pool: &Pool) -> Result<i64> {
  let conn = pool.get()?;
  count(&conn, "SELECT count(*) FROM tags", params![])
}

pub fn tags_page(
  pool: &Pool,
  limit: usize,
  offset: usize
) -> Result<Vec<Tag>> {
  let conn = pool.get()?;
  let query = select_query_builder(
    &TAG_FIELDS,
    &["tags"],
    &[],
    &[OrderBy::new(Order::Asc, "tags.id")],
    Some(limit),
    Some(offset)
  );
  select_many(&conn, &query, params![], map_tag)
}

pub fn tag_by_id(
  pool: &Pool,
  id: i64
) -> Result<Option<Tag>> {
  let conn = pool.get()?;
  select_one(
    &conn,
    "SELECT id, text FROM tags WHERE id = ?",
    params![id],
    map_tag
  )
}

// Returns None when a tag with the same text already
// exists, the unique index does the checking for us.
pub fn insert_tag(
  pool: &Pool,
  text: &str
) -> Result<Option<Tag>> {
  let conn = pool.get()?;
  let inserted = conn.execute(
    "INSERT OR IGNORE INTO tags (text) VALUES (?)",
    params![text]
  )?;
  if inserted == 0 {
    return Ok(None);
  }
  Ok(Some(Tag {
    id: conn.last_insert_rowid(),
    text: text.to_string()
  }))
}

// Returns false if the tag doesn't exist or if another
// tag already uses that text.
pub fn update_tag(
  pool: &Pool,
  id: i64,
  text: &str
) -> Result<bool> {
  let conn = pool.get()?;
  let updated = conn.execute(
    "UPDATE OR IGNORE tags SET text = ? WHERE id = ?",
    params![text, id]
  )?;
  Ok(updated > 0)
}

pub fn delete_tag(pool: &Pool, id: i64) -> Result<bool> {
  delete_by_id(pool, "tags", id)
}

// Which of the given texts are already in the tags table.
pub fn existing_tag_texts(
  pool: &Pool,
  texts: &[String]
) -> Result<Vec<String>> {
  if texts.is_empty() {
    return Ok(Vec::new());
  }
  let conn = pool.get()?;
  let query = format!(
    "SELECT text FROM tags WHERE text IN ({})",
    generate_in_placeholders(texts.len())
  );
  select_many(&conn, &query, params_from_iter(texts.iter()), |row| row.get(0))
}

// Upsert, concurrent requests creating the same tag
// both end up using the same row.
fn create_tags(
  conn: &Connection,
  texts: &[String]
) -> Result<()> {
  for text in texts {
    conn.execute(
      "INSERT OR IGNORE INTO tags (text) VALUES (?)",
      params![text]
    ).wrap_err("Creating article tag")?;
  }
  Ok(())
}

/* --- Categories --- */

pub fn category_count(pool: &Pool) -> Result<i64> {
  let conn = pool.get()?;
  count(&conn, "SELECT count(*) FROM categories", params![])
}

pub fn categories_page(
  pool: &Pool,
  limit: usize,
  offset: usize
) -> Result<Vec<Category>> {
  let conn = pool.get()?;
  let query = select_query_builder(
    &CATEGORY_FIELDS,
    &["categories"],
    &[],
    &[
      OrderBy::new(Order::Desc, "categories.created"),
      OrderBy::new(Order::Desc, "categories.id")
    ],
    Some(limit),
    Some(offset)
  );
  select_many(&conn, &query, params![], map_category)
}

pub fn category_by_id(
  pool: &Pool,
  id: i64
) -> Result<Option<Category>> {
  let conn = pool.get()?;
  select_one(
    &conn,
    "SELECT id, name, created FROM categories WHERE id = ?",
    params![id],
    map_category
  )
}

pub fn category_exists(pool: &Pool, id: i64) -> Result<bool> {
  let conn = pool.get()?;
  let found = count(
    &conn,
    "SELECT count(*) FROM categories WHERE id = ?",
    params![id]
  )?;
  Ok(found > 0)
}

pub fn insert_category(
  pool: &Pool,
  name: &str
) -> Result<Category> {
  let conn = pool.get()?;
  let created = current_timestamp();
  conn.execute(
    "INSERT INTO categories (name, created) VALUES (?, ?)",
    params![name, created]
  ).wrap_err("Inserting category")?;
  Ok(Category {
    id: conn.last_insert_rowid(),
    name: name.to_string(),
    created
  })
}

pub fn update_category(
  pool: &Pool,
  id: i64,
  name: &str
) -> Result<bool> {
  let conn = pool.get()?;
  let updated = conn.execute(
    "UPDATE categories SET name = ? WHERE id = ?",
    params![name, id]
  )?;
  Ok(updated > 0)
}

// Articles in that category become uncategorized
// (ON DELETE SET NULL).
pub fn delete_category(pool: &Pool, id: i64) -> Result<bool> {
  delete_by_id(pool, "categories", id)
}

/* --- Avatars --- */

pub fn avatar_count(pool: &Pool) -> Result<i64> {
  let conn = pool.get()?;
  count(&conn, "SELECT count(*) FROM avatars", params![])
}

pub fn avatars_page(
  pool: &Pool,
  limit: usize,
  offset: usize
) -> Result<Vec<Avatar>> {
  let conn = pool.get()?;
  let query = select_query_builder(
    &AVATAR_FIELDS,
    &["avatars"],
    &[],
    &[OrderBy::new(Order::Asc, "avatars.id")],
    Some(limit),
    Some(offset)
  );
  select_many(&conn, &query, params![], map_avatar)
}

pub fn avatar_by_id(
  pool: &Pool,
  id: i64
) -> Result<Option<Avatar>> {
  let conn = pool.get()?;
  select_one(
    &conn,
    "SELECT id, content FROM avatars WHERE id = ?",
    params![id],
    map_avatar
  )
}

pub fn insert_avatar(
  pool: &Pool,
  content: &str
) -> Result<Avatar> {
  let conn = pool.get()?;
  conn.execute(
    "INSERT INTO avatars (content) VALUES (?)",
    params![content]
  ).wrap_err("Inserting avatar")?;
  Ok(Avatar {
    id: conn.last_insert_rowid(),
    content: content.to_string()
  })
}

pub fn update_avatar(
  pool: &Pool,
  id: i64,
  content: &str
) -> Result<bool> {
  let conn = pool.get()?;
  let updated = conn.execute(
    "UPDATE avatars SET content = ? WHERE id = ?",
    params![content, id]
  )?;
  Ok(updated > 0)
}

pub fn delete_avatar(pool: &Pool, id: i64) -> Result<bool> {
  delete_by_id(pool, "avatars", id)
}

/* --- Comments --- */

pub fn comments_for_article(
  pool: &Pool,
  article_id: i64
) -> Result<Vec<Comment>> {
  let conn = pool.get()?;
  select_many(
    &conn,
    &format!(
      "SELECT comments.id, comments.article_id, comments.content, \
      comments.created, {} FROM comments \
      JOIN users ON users.id = comments.author_id \
      WHERE comments.article_id = ? \
      ORDER BY comments.created ASC, comments.id ASC",
      USER_FIELDS
    ),
    params![article_id],
    map_comment
  )
}

/* --- Articles --- */

fn tags_for_article(
  conn: &Connection,
  article_id: i64
) -> Result<Vec<String>> {
  select_many(
    conn,
    "SELECT tags.text FROM article_tags \
    JOIN tags ON tags.id = article_tags.tag_id \
    WHERE article_tags.article_id = ? \
    ORDER BY tags.id ASC",
    params![article_id],
    |row| row.get(0)
  )
}

// Replaces the whole set of tags of the article. The
// tags have to exist already.
fn set_article_tags(
  conn: &Connection,
  article_id: i64,
  tags: &[String]
) -> Result<()> {
  conn.execute(
    "DELETE FROM article_tags WHERE article_id = ?",
    params![article_id]
  )?;
  for text in tags {
    conn.execute(
      "INSERT OR IGNORE INTO article_tags (article_id, tag_id) \
      SELECT ?, id FROM tags WHERE text = ?",
      params![article_id, text]
    ).wrap_err("Associating tag to article")?;
  }
  Ok(())
}

// Search terms are ANDed, each one has to be found
// somewhere in the title.
pub fn article_count(
  pool: &Pool,
  search_terms: &[String]
) -> Result<i64> {
  let conn = pool.get()?;
  let patterns: Vec<String> = search_terms.iter()
    .map(|t| like_pattern(t))
    .collect();
  let query = select_query_builder(
    &["count(*)"],
    &["articles"],
    &generate_like_clauses("articles.title", patterns.len()),
    &[],
    None,
    None
  );
  count(&conn, &query, params_from_iter(patterns.iter()))
}

pub fn articles_page(
  pool: &Pool,
  search_terms: &[String],
  limit: usize,
  offset: usize
) -> Result<Vec<Article>> {
  let conn = pool.get()?;
  let patterns: Vec<String> = search_terms.iter()
    .map(|t| like_pattern(t))
    .collect();
  let query = select_query_builder(
    &ARTICLE_FIELDS,
    &[ARTICLE_FROM],
    &generate_like_clauses("articles.title", patterns.len()),
    &[
      OrderBy::new(Order::Desc, "articles.created"),
      OrderBy::new(Order::Desc, "articles.id")
    ],
    Some(limit),
    Some(offset)
  );
  let mut articles = select_many(
    &conn,
    &query,
    params_from_iter(patterns.iter()),
    map_article
  )?;
  for article in articles.iter_mut() {
    article.tags = tags_for_article(&conn, article.id)?;
  }
  Ok(articles)
}

pub fn article_by_id(
  pool: &Pool,
  id: i64
) -> Result<Option<Article>> {
  let conn = pool.get()?;
  let query = select_query_builder(
    &ARTICLE_FIELDS,
    &[ARTICLE_FROM],
    &[generate_field_equal_qmark("articles.id")],
    &[],
    None,
    None
  );
  match select_one(&conn, &query, params![id], map_article)? {
    Some(mut article) => {
      article.tags = tags_for_article(&conn, article.id)?;
      Ok(Some(article))
    },
    None => Ok(None)
  }
}

pub fn article_exists(pool: &Pool, id: i64) -> Result<bool> {
  let conn = pool.get()?;
  let found = count(
    &conn,
    "SELECT count(*) FROM articles WHERE id = ?",
    params![id]
  )?;
  Ok(found > 0)
}

// Tags that don't exist are created in the same
// transaction, before the article itself.
pub fn insert_article(
  pool: &Pool,
  article: &NewArticle
) -> Result<i64> {
  let mut conn = pool.get()?;
  let tx = conn.transaction()?;
  create_tags(&tx, &article.tags)?;
  let now = current_timestamp();
  tx.execute(
    "INSERT INTO articles \
    (author_id, category_id, title, body, created, updated) \
    VALUES (?, ?, ?, ?, ?, ?)",
    params![
      article.author_id,
      article.category_id,
      article.title,
      article.body,
      now,
      now
    ]
  ).wrap_err("Inserting article")?;
  let id = tx.last_insert_rowid();
  set_article_tags(&tx, id, &article.tags)?;
  tx.commit()?;
  Ok(id)
}

// Only updates what's in the ArticleUpdate. Returns false
// when the article doesn't exist.
pub fn update_article(
  pool: &Pool,
  update: &ArticleUpdate
) -> Result<bool> {
  let mut conn = pool.get()?;
  let tx = conn.transaction()?;
  if let Some(tags) = &update.tags {
    create_tags(&tx, tags)?;
  }

  let now = current_timestamp();
  let mut fields: Vec<String> = Vec::new();
  let mut values: Vec<&dyn ToSql> = Vec::new();
  if let Some(title) = &update.title {
    fields.push(generate_field_equal_qmark("title"));
    values.push(title);
  }
  if let Some(body) = &update.body {
    fields.push(generate_field_equal_qmark("body"));
    values.push(body);
  }
  if let Some(category_id) = &update.category_id {
    fields.push(generate_field_equal_qmark("category_id"));
    values.push(category_id);
  }
  fields.push(generate_field_equal_qmark("updated"));
  values.push(&now);
  values.push(&update.id);

  let updated = tx.execute(
    &format!("UPDATE articles SET {} WHERE id = ?", fields.join(", ")),
    params_from_iter(values)
  ).wrap_err("Updating article")?;
  if updated == 0 {
    // Dropping the transaction rolls it back.
    return Ok(false);
  }
  if let Some(tags) = &update.tags {
    set_article_tags(&tx, update.id, tags)?;
  }
  tx.commit()?;
  Ok(true)
}

// Comments and tag associations go away with the
// article (ON DELETE CASCADE).
pub fn delete_article(pool: &Pool, id: i64) -> Result<bool> {
  delete_by_id(pool, "articles", id)
}
