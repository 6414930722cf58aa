use actix_web::{http::header, HttpRequest};
use std::convert::TryFrom;
use url::form_urlencoded;
use crate::config::ApiInfo;
use super::dtos::{ListQuery, Page};
use super::error::Error;

// Resource names, also used as the first path segment
// of their endpoints.
pub const TAGS: &str = "tags";
pub const CATEGORIES: &str = "categories";
pub const ARTICLES: &str = "articles";
pub const AVATARS: &str = "avatars";

pub fn list_url(root: &str, resource: &str) -> String {
  format!("{}/{}/", root, resource)
}

pub fn resource_url(root: &str, resource: &str, id: i64) -> String {
  format!("{}/{}/{}/", root, resource, id)
}

// Extracting Actix header values is kinda convoluted.
// They check for an error in the header value not
// being convertable to string because of invalid
// characters.
// Expected format is "Authorization: Token <key>",
// anything else means an anonymous request.
pub fn auth_token(req: &HttpRequest) -> Option<String> {
  let value = req.headers().get(header::AUTHORIZATION)?
    .to_str()
    .ok()?;
  let mut parts = value.split_whitespace();
  match (parts.next(), parts.next(), parts.next()) {
    (Some(keyword), Some(token), None) if keyword.eq_ignore_ascii_case("token") =>
      Some(token.to_string()),
    _ => None
  }
}

fn invalid_page() -> Error {
  Error::NotFound(String::from("Invalid page."))
}

// Page number pagination for the list endpoints.
pub struct Paginator<'a> {
  root: &'a str,
  resource: &'a str,
  page: usize,
  page_size: usize,
  search: Option<&'a str>
}

impl<'a> Paginator<'a> {

  pub fn new(
    api_info: &'a ApiInfo,
    resource: &'a str,
    query: &'a ListQuery
  ) -> Result<Self, Error> {
    let page = match &query.page {
      None => 1,
      Some(p) => match p.trim().parse::<usize>() {
        Ok(n) if n >= 1 => n,
        _ => return Err(invalid_page())
      }
    };
    Ok(Self {
      root: &api_info.root,
      resource,
      page,
      page_size: api_info.page_size,
      search: query.search.as_deref().filter(|s| !s.trim().is_empty())
    })
  }

  pub fn limit(&self) -> usize {
    self.page_size
  }

  pub fn offset(&self) -> usize {
    (self.page - 1).saturating_mul(self.page_size)
  }

  // Has to be called before fetching the page. Page 1
  // is always valid, even when there's nothing at all.
  pub fn check(&self, count: i64) -> Result<(), Error> {
    if self.page > 1 && self.offset() >= to_usize(count) {
      Err(invalid_page())
    } else {
      Ok(())
    }
  }

  pub fn page<T>(&self, count: i64, results: Vec<T>) -> Page<T> {
    let count = to_usize(count);
    let next = if self.offset() + results.len() < count {
      Some(self.link(self.page + 1))
    } else {
      None
    };
    let previous = if self.page > 1 {
      Some(self.link(self.page - 1))
    } else {
      None
    };
    Page {
      count,
      next,
      previous,
      results
    }
  }

  // The link to page 1 doesn't have a page parameter.
  fn link(&self, page: usize) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    if page > 1 {
      query.append_pair("page", &page.to_string());
    }
    if let Some(search) = self.search {
      query.append_pair("search", search);
    }
    let query = query.finish();
    let base = list_url(self.root, self.resource);
    if query.is_empty() {
      base
    } else {
      format!("{}?{}", base, query)
    }
  }

}

fn to_usize(count: i64) -> usize {
  usize::try_from(count).unwrap_or(0)
}
