use serde::{Deserialize, Serialize};

// Plain datatypes straight out of SQLite. Timestamps
// are Unix seconds. The JSON representations live in
// the DTOs of the app module.

// Users and comments are owned by other parts of the
// blog, I only ever read them here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
  pub id: i64,
  pub username: String,
  pub is_staff: bool,
  pub date_joined: i64,
  pub last_login: Option<i64>
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
  pub id: i64,
  pub article_id: i64,
  pub author: User,
  pub content: String,
  pub created: i64
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
  pub id: i64,
  pub text: String
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
  pub id: i64,
  pub name: String,
  pub created: i64
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Avatar {
  pub id: i64,
  // Image reference, a path or an URL.
  pub content: String
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
  pub id: i64,
  pub title: String,
  pub body: String,
  pub author: User,
  pub category: Option<Category>,
  // Tags are referred to by their text everywhere.
  pub tags: Vec<String>,
  pub created: i64,
  pub updated: i64
}

#[derive(Debug)]
pub struct NewArticle {
  pub title: String,
  pub body: String,
  pub author_id: i64,
  pub category_id: Option<i64>,
  pub tags: Vec<String>
}

// Object I use to fit my "update only what's in
// the request body" agenda.
// category_id is a double Option: None leaves the
// category alone, Some(None) removes it.
#[derive(Debug)]
pub struct ArticleUpdate {
  pub id: i64,
  pub title: Option<String>,
  pub body: Option<String>,
  pub category_id: Option<Option<i64>>,
  pub tags: Option<Vec<String>>
}
