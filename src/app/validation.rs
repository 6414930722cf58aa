use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use crate::db::{self, Pool};
use crate::db::entities::{ArticleUpdate, NewArticle};
use super::dtos::{ArticleForm, AvatarForm, CategoryForm, TagForm};
use super::error::{Error, map_db_error};

// Field-level validation of the input forms. Nothing in
// here writes to the database: the article validation
// works out which tags need to be created and leaves it
// to the caller to actually create them.

pub const TITLE_MAX_LENGTH: usize = 100;
pub const CATEGORY_NAME_MAX_LENGTH: usize = 100;
pub const TAG_TEXT_MAX_LENGTH: usize = 30;

const REQUIRED: &str = "This field is required.";
const BLANK: &str = "This field may not be blank.";

// POST, PUT and PATCH respectively. Only partial
// updates are allowed to skip required fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
  Create,
  Replace,
  Partial
}

impl WriteMode {
  fn requires_all(self) -> bool {
    self != WriteMode::Partial
  }
}

// Serialized as {"field": ["message", ...]}
#[derive(Debug, Default, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn single(field: &str, message: String) -> Self {
    let mut errors = Self::new();
    errors.add(field, message);
    errors
  }

  pub fn add(&mut self, field: &str, message: String) {
    self.0.entry(field.to_string())
      .or_insert_with(Vec::new)
      .push(message);
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn messages(&self, field: &str) -> Option<&Vec<String>> {
    self.0.get(field)
  }

  pub fn into_result<T>(self, value: T) -> Result<T, Self> {
    if self.is_empty() { Ok(value) } else { Err(self) }
  }
}

fn max_length_message(max_length: usize) -> String {
  format!("Ensure this field has no more than {} characters.", max_length)
}

// Text fields are trimmed before anything else, like
// the old API did.
fn char_field(
  errors: &mut ValidationErrors,
  field: &str,
  value: &Option<String>,
  max_length: Option<usize>,
  mode: WriteMode
) -> Option<String> {
  match value {
    None => {
      if mode.requires_all() {
        errors.add(field, REQUIRED.to_string());
      }
      None
    },
    Some(v) => {
      let trimmed = v.trim();
      if trimmed.is_empty() {
        errors.add(field, BLANK.to_string());
        return None;
      }
      if let Some(max) = max_length {
        if trimmed.chars().count() > max {
          errors.add(field, max_length_message(max));
          return None;
        }
      }
      Some(trimmed.to_string())
    }
  }
}

pub fn validate_tag(
  form: &TagForm,
  mode: WriteMode
) -> Result<Option<String>, ValidationErrors> {
  let mut errors = ValidationErrors::new();
  let text = char_field(&mut errors, "text", &form.text, Some(TAG_TEXT_MAX_LENGTH), mode);
  errors.into_result(text)
}

pub fn duplicate_tag(text: &str) -> ValidationErrors {
  ValidationErrors::single("text", format!("Tag with text {} exists.", text))
}

fn missing_category_message(id: i64) -> String {
  format!("Category with id {} does not exist.", id)
}

// Also used when the category disappears between
// validation and the write.
pub fn missing_category(id: i64) -> ValidationErrors {
  ValidationErrors::single("category_id", missing_category_message(id))
}

pub fn validate_category(
  form: &CategoryForm,
  mode: WriteMode
) -> Result<Option<String>, ValidationErrors> {
  let mut errors = ValidationErrors::new();
  let name = char_field(
    &mut errors,
    "name",
    &form.name,
    Some(CATEGORY_NAME_MAX_LENGTH),
    mode
  );
  errors.into_result(name)
}

pub fn validate_avatar(
  form: &AvatarForm,
  mode: WriteMode
) -> Result<Option<String>, ValidationErrors> {
  let mut errors = ValidationErrors::new();
  let content = char_field(&mut errors, "content", &form.content, None, mode);
  errors.into_result(content)
}

// What article validation needs to know about the
// database. The Pool implements it, the tests use
// a fake.
pub trait ArticleLookups {
  fn category_exists(&self, id: i64) -> eyre::Result<bool>;
  fn existing_tags(&self, texts: &[String]) -> eyre::Result<Vec<String>>;
}

impl ArticleLookups for Pool {
  fn category_exists(&self, id: i64) -> eyre::Result<bool> {
    db::category_exists(self, id)
  }

  fn existing_tags(&self, texts: &[String]) -> eyre::Result<Vec<String>> {
    db::existing_tag_texts(self, texts)
  }
}

// Result of a successful article validation. Fields
// absent from the request stay None. new_tags are the
// tag texts that have to be created before the write.
#[derive(Debug)]
pub struct ArticleWrite {
  pub title: Option<String>,
  pub body: Option<String>,
  pub category_id: Option<Option<i64>>,
  pub tags: Option<Vec<String>>,
  pub new_tags: Vec<String>
}

impl ArticleWrite {
  // Only makes sense for WriteMode::Create, which
  // guarantees title and body.
  pub fn into_new_article(self, author_id: i64) -> (NewArticle, Vec<String>) {
    (
      NewArticle {
        title: self.title.unwrap_or_default(),
        body: self.body.unwrap_or_default(),
        author_id,
        category_id: self.category_id.flatten(),
        tags: self.tags.unwrap_or_default()
      },
      self.new_tags
    )
  }

  pub fn into_update(self, id: i64) -> (ArticleUpdate, Vec<String>) {
    (
      ArticleUpdate {
        id,
        title: self.title,
        body: self.body,
        category_id: self.category_id,
        tags: self.tags
      },
      self.new_tags
    )
  }
}

// Duplicates are removed, first seen wins.
fn validate_tag_list(
  errors: &mut ValidationErrors,
  tags: &[String]
) -> Vec<String> {
  let mut seen: HashSet<&str> = HashSet::new();
  let mut texts: Vec<String> = Vec::with_capacity(tags.len());
  for text in tags {
    if text.trim().is_empty() {
      errors.add("tags", BLANK.to_string());
    } else if text.chars().count() > TAG_TEXT_MAX_LENGTH {
      errors.add("tags", max_length_message(TAG_TEXT_MAX_LENGTH));
    } else if seen.insert(text.as_str()) {
      texts.push(text.clone());
    }
  }
  texts
}

pub fn validate_article<L: ArticleLookups>(
  form: &ArticleForm,
  mode: WriteMode,
  lookups: &L
) -> Result<ArticleWrite, Error> {
  let mut errors = ValidationErrors::new();
  let title = char_field(&mut errors, "title", &form.title, Some(TITLE_MAX_LENGTH), mode);
  let body = char_field(&mut errors, "body", &form.body, None, mode);

  // Null is always fine, an article doesn't need
  // a category.
  if let Some(Some(category_id)) = form.category_id {
    if !lookups.category_exists(category_id).map_err(map_db_error)? {
      errors.add("category_id", missing_category_message(category_id));
    }
  }

  let tags = form.tags.as_ref()
    .map(|tags| validate_tag_list(&mut errors, tags));

  if !errors.is_empty() {
    return Err(Error::Validation(errors));
  }

  // Unknown tags are never an error, they just have to
  // be created.
  let new_tags = match &tags {
    Some(texts) => {
      let existing: HashSet<String> = lookups.existing_tags(texts)
        .map_err(map_db_error)?
        .into_iter()
        .collect();
      texts.iter()
        .filter(|t| !existing.contains(*t))
        .cloned()
        .collect()
    },
    None => Vec::new()
  };

  Ok(ArticleWrite {
    title,
    body,
    category_id: form.category_id,
    tags,
    new_tags
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  struct FakeLookups {
    categories: Vec<i64>,
    tags: Vec<String>
  }

  impl ArticleLookups for FakeLookups {
    fn category_exists(&self, id: i64) -> eyre::Result<bool> {
      Ok(self.categories.contains(&id))
    }

    fn existing_tags(&self, texts: &[String]) -> eyre::Result<Vec<String>> {
      Ok(texts.iter().filter(|t| self.tags.contains(*t)).cloned().collect())
    }
  }

  fn lookups() -> FakeLookups {
    FakeLookups {
      categories: vec![1],
      tags: vec![String::from("rust")]
    }
  }

  fn form(category_id: Option<Option<i64>>, tags: Option<Vec<&str>>) -> ArticleForm {
    ArticleForm {
      title: Some(String::from("Title")),
      body: Some(String::from("Body")),
      category_id,
      tags: tags.map(|t| t.into_iter().map(String::from).collect())
    }
  }

  fn validation_errors(result: Result<ArticleWrite, Error>) -> ValidationErrors {
    match result {
      Err(Error::Validation(errors)) => errors,
      other => panic!("Expected validation errors, got {:?}", other)
    }
  }

  #[test]
  fn unknown_tags_are_returned_as_new() {
    let sut = form(None, Some(vec!["python", "rust", "web"]));
    let write = validate_article(&sut, WriteMode::Create, &lookups()).unwrap();
    assert_eq!(vec!["python", "web"], write.new_tags);
    assert_eq!(Some(vec![
      String::from("python"),
      String::from("rust"),
      String::from("web")
    ]), write.tags);
  }

  #[test]
  fn duplicate_tags_in_input_are_collapsed() {
    let sut = form(None, Some(vec!["web", "web", "rust"]));
    let write = validate_article(&sut, WriteMode::Create, &lookups()).unwrap();
    assert_eq!(vec!["web"], write.new_tags);
    assert_eq!(2, write.tags.unwrap().len());
  }

  #[test]
  fn missing_category_is_rejected() {
    let sut = form(Some(Some(9999)), None);
    let errors = validation_errors(validate_article(&sut, WriteMode::Create, &lookups()));
    assert_eq!(
      Some(&vec![String::from("Category with id 9999 does not exist.")]),
      errors.messages("category_id")
    );
  }

  #[test]
  fn null_category_is_accepted() {
    let sut = form(Some(None), None);
    let write = validate_article(&sut, WriteMode::Create, &lookups()).unwrap();
    assert_eq!(Some(None), write.category_id);
  }

  #[test]
  fn existing_category_is_accepted() {
    let sut = form(Some(Some(1)), None);
    assert!(validate_article(&sut, WriteMode::Create, &lookups()).is_ok());
  }

  #[test]
  fn create_requires_title_and_body() {
    let sut = ArticleForm {
      title: None,
      body: Some(String::from("   ")),
      category_id: None,
      tags: None
    };
    let errors = validation_errors(validate_article(&sut, WriteMode::Create, &lookups()));
    assert_eq!(Some(&vec![String::from(REQUIRED)]), errors.messages("title"));
    assert_eq!(Some(&vec![String::from(BLANK)]), errors.messages("body"));
  }

  #[test]
  fn partial_update_accepts_empty_form() {
    let sut = ArticleForm {
      title: None,
      body: None,
      category_id: None,
      tags: None
    };
    let write = validate_article(&sut, WriteMode::Partial, &lookups()).unwrap();
    assert!(write.title.is_none());
    assert!(write.tags.is_none());
    assert!(write.new_tags.is_empty());
  }

  #[test]
  fn blank_or_long_tags_are_rejected() {
    let long = "x".repeat(TAG_TEXT_MAX_LENGTH + 1);
    let sut = form(None, Some(vec!["", long.as_str()]));
    let errors = validation_errors(validate_article(&sut, WriteMode::Create, &lookups()));
    assert_eq!(2, errors.messages("tags").unwrap().len());
  }

  #[test]
  fn title_is_trimmed_and_length_checked() {
    let mut sut = form(None, None);
    sut.title = Some(String::from("  Spaced out  "));
    let write = validate_article(&sut, WriteMode::Create, &lookups()).unwrap();
    assert_eq!(Some(String::from("Spaced out")), write.title);

    sut.title = Some("t".repeat(TITLE_MAX_LENGTH + 1));
    let errors = validation_errors(validate_article(&sut, WriteMode::Create, &lookups()));
    assert!(errors.messages("title").is_some());
  }

  #[test]
  fn tag_text_is_required_unless_partial() {
    let sut = TagForm { text: None };
    assert!(validate_tag(&sut, WriteMode::Create).is_err());
    assert!(validate_tag(&sut, WriteMode::Replace).is_err());
    assert_eq!(None, validate_tag(&sut, WriteMode::Partial).unwrap());
  }

  #[test]
  fn new_article_takes_the_given_author() {
    let write = validate_article(&form(None, Some(vec!["web"])), WriteMode::Create, &lookups())
      .unwrap();
    let (article, new_tags) = write.into_new_article(7);
    assert_eq!(7, article.author_id);
    assert_eq!("Title", article.title);
    assert_eq!(vec!["web"], new_tags);
  }

}
