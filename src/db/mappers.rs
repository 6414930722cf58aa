use super::entities::*;
use rusqlite::{Row, Error};

// Column order for the mappers has to match the
// SELECT statements in db/mod.rs.

pub fn map_tag(row: &Row) -> Result<Tag, Error> {
  Ok(Tag {
    id: row.get(0)?,
    text: row.get(1)?
  })
}

pub fn map_category(row: &Row) -> Result<Category, Error> {
  Ok(Category {
    id: row.get(0)?,
    name: row.get(1)?,
    created: row.get(2)?
  })
}

pub fn map_avatar(row: &Row) -> Result<Avatar, Error> {
  Ok(Avatar {
    id: row.get(0)?,
    content: row.get(1)?
  })
}

pub fn map_user(row: &Row) -> Result<User, Error> {
  user_from_columns(row, 0)
}

// Users are mostly joined to something else, so
// the columns may start anywhere in the row.
fn user_from_columns(row: &Row, start: usize) -> Result<User, Error> {
  Ok(User {
    id: row.get(start)?,
    username: row.get(start + 1)?,
    is_staff: row.get(start + 2)?,
    date_joined: row.get(start + 3)?,
    last_login: row.get(start + 4)?
  })
}

pub fn map_comment(row: &Row) -> Result<Comment, Error> {
  Ok(Comment {
    id: row.get(0)?,
    article_id: row.get(1)?,
    content: row.get(2)?,
    created: row.get(3)?,
    author: user_from_columns(row, 4)?
  })
}

// Tags are fetched separately, they're left empty.
pub fn map_article(row: &Row) -> Result<Article, Error> {
  let category_id: Option<i64> = row.get(10)?;
  let category = match category_id {
    Some(id) => Some(Category {
      id,
      name: row.get(11)?,
      created: row.get(12)?
    }),
    None => None
  };
  Ok(Article {
    id: row.get(0)?,
    title: row.get(1)?,
    body: row.get(2)?,
    created: row.get(3)?,
    updated: row.get(4)?,
    author: user_from_columns(row, 5)?,
    category,
    tags: Vec::new()
  })
}
