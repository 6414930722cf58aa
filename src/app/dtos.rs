use serde::{Deserialize, Serialize};
use super::helpers;
use crate::db::entities::*;
use crate::utils::{
  markdown,
  serde_utils,
  time_utils
};

// Entities don't know anything about the API root,
// so the DTOs that carry an "url" are built with
// new(entity, root) instead of From.

/* --- Request body or query objects --- */
// These have to be public.

// page is a String so that garbage gets a proper
// "Invalid page." instead of a query string error.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
  pub page: Option<String>,
  pub search: Option<String>
}

// Read-only fields (id, url, created...) are just
// ignored when present in the body.
#[derive(Debug, Deserialize)]
pub struct TagForm {
  pub text: Option<String>
}

#[derive(Debug, Deserialize)]
pub struct CategoryForm {
  pub name: Option<String>
}

#[derive(Debug, Deserialize)]
pub struct AvatarForm {
  pub content: Option<String>
}

// There's no author field on purpose, the author is
// always the user making the request.
#[derive(Debug, Deserialize)]
pub struct ArticleForm {
  pub title: Option<String>,
  pub body: Option<String>,
  // Absent means "don't touch", null means "no
  // category".
  #[serde(
    default,
    deserialize_with = "serde_utils::deserialize_null_value"
  )]
  pub category_id: Option<Option<i64>>,
  pub tags: Option<Vec<String>>
}
/* --- End request body or query objects --- */

#[derive(Debug, Serialize)]
pub struct Page<T> {
  pub count: usize,
  pub next: Option<String>,
  pub previous: Option<String>,
  pub results: Vec<T>
}

#[derive(Debug, Serialize)]
pub struct UserDescDto {
  pub id: i64,
  pub username: String,
  pub last_login: Option<String>,
  pub date_joined: String
}

impl From<User> for UserDescDto {
  fn from(user: User) -> Self {
    Self {
      id: user.id,
      username: user.username,
      last_login: user.last_login.map(time_utils::timestamp_to_iso_string),
      date_joined: time_utils::timestamp_to_iso_string(user.date_joined)
    }
  }
}

#[derive(Debug, Serialize)]
pub struct CommentDto {
  pub id: i64,
  pub author: UserDescDto,
  pub content: String,
  pub created: String
}

impl From<Comment> for CommentDto {
  fn from(comment: Comment) -> Self {
    Self {
      id: comment.id,
      author: comment.author.into(),
      content: comment.content,
      created: time_utils::timestamp_to_iso_string(comment.created)
    }
  }
}

#[derive(Debug, Serialize)]
pub struct TagDto {
  pub url: String,
  pub id: i64,
  pub text: String
}

impl TagDto {
  pub fn new(tag: Tag, root: &str) -> Self {
    Self {
      url: helpers::resource_url(root, helpers::TAGS, tag.id),
      id: tag.id,
      text: tag.text
    }
  }
}

#[derive(Debug, Serialize)]
pub struct CategoryDto {
  pub url: String,
  pub id: i64,
  pub name: String,
  pub created: String
}

impl CategoryDto {
  pub fn new(category: Category, root: &str) -> Self {
    Self {
      url: helpers::resource_url(root, helpers::CATEGORIES, category.id),
      id: category.id,
      name: category.name,
      created: time_utils::timestamp_to_iso_string(category.created)
    }
  }
}

#[derive(Debug, Serialize)]
pub struct AvatarDto {
  pub url: String,
  pub id: i64,
  pub content: String
}

impl AvatarDto {
  pub fn new(avatar: Avatar, root: &str) -> Self {
    Self {
      url: helpers::resource_url(root, helpers::AVATARS, avatar.id),
      id: avatar.id,
      content: avatar.content
    }
  }
}

// List representation of an article. The body is
// never part of it.
#[derive(Debug, Serialize)]
pub struct ArticleDto {
  pub url: String,
  pub id: i64,
  pub author: UserDescDto,
  pub category: Option<CategoryDto>,
  pub tags: Vec<String>,
  pub title: String,
  pub created: String,
  pub updated: String
}

impl ArticleDto {
  pub fn new(article: Article, root: &str) -> Self {
    Self {
      url: helpers::resource_url(root, helpers::ARTICLES, article.id),
      id: article.id,
      author: article.author.into(),
      category: article.category.map(|c| CategoryDto::new(c, root)),
      tags: article.tags,
      title: article.title,
      created: time_utils::timestamp_to_iso_string(article.created),
      updated: time_utils::timestamp_to_iso_string(article.updated)
    }
  }
}

// Detail representation: everything from the list
// one plus the body, the comments and the rendered
// markdown.
#[derive(Debug, Serialize)]
pub struct ArticleDetailDto {
  #[serde(flatten)]
  pub article: ArticleDto,
  pub body: String,
  pub comments: Vec<CommentDto>,
  pub body_html: String,
  pub toc_html: String
}

impl ArticleDetailDto {
  pub fn new(mut article: Article, comments: Vec<Comment>, root: &str) -> Self {
    let (body_html, toc_html) = markdown::render(&article.body);
    let body = std::mem::take(&mut article.body);
    Self {
      article: ArticleDto::new(article, root),
      body,
      comments: comments.into_iter().map(CommentDto::from).collect(),
      body_html,
      toc_html
    }
  }
}
