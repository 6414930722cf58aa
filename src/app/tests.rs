use actix_web::{
  body::MessageBody,
  dev::ServiceResponse,
  http::{Method, StatusCode},
  test,
  web,
  App
};
use serde_json::{json, Value};
use crate::config::ApiInfo;
use crate::db;
use super::{endpoints_config, AppState};

// Whole request/response cycle against an in-memory
// database. Two users exist: a staff one and a plain
// reader.

const ADMIN: &str = "Token admin-token";
const READER: &str = "Token reader-token";

fn app_state() -> web::Data<AppState> {
  let pool = db::memory_pool().unwrap();
  db::create_tables(&pool).unwrap();
  db::insert_user(&pool, "admin", true, "admin-token").unwrap();
  db::insert_user(&pool, "reader", false, "reader-token").unwrap();
  web::Data::new(AppState {
    pool,
    api_info: ApiInfo {
      root: String::from("http://testserver"),
      page_size: 10
    }
  })
}

// The test service type can't be named easily, hence
// the macros.
macro_rules! init_app {
  () => {
    test::init_service(
      App::new()
        .app_data(app_state())
        .configure(endpoints_config)
    ).await
  };
}

macro_rules! send {
  ($app:expr, $method:expr, $uri:expr, $token:expr, $body:expr) => {
    response_parts(
      test::call_service(
        &$app,
        build_request($method, $uri, $token, $body).to_request()
      ).await
    ).await
  };
}

fn build_request(
  method: &str,
  uri: &str,
  token: Option<&str>,
  body: Option<Value>
) -> test::TestRequest {
  let mut req = match method {
    "POST" => test::TestRequest::post(),
    "PUT" => test::TestRequest::put(),
    "PATCH" => test::TestRequest::patch(),
    "DELETE" => test::TestRequest::delete(),
    "HEAD" => test::TestRequest::default().method(Method::HEAD),
    _ => test::TestRequest::get()
  }.uri(uri);
  if let Some(token) = token {
    req = req.insert_header(("Authorization", token));
  }
  if let Some(body) = body {
    req = req.set_json(body);
  }
  req
}

async fn response_parts<B: MessageBody>(resp: ServiceResponse<B>) -> (StatusCode, Value) {
  let status = resp.status();
  let bytes = test::read_body(resp).await;
  let value = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, value)
}

#[actix_web::test]
async fn api_root_lists_resources() {
  let app = init_app!();
  let (status, body) = send!(app, "GET", "/", None, None);
  assert_eq!(StatusCode::OK, status);
  assert_eq!("http://testserver/articles/", body["articles"]);
  assert_eq!("http://testserver/tags/", body["tags"]);
}

#[actix_web::test]
async fn create_tag_and_reject_duplicate() {
  let app = init_app!();
  let (status, body) = send!(app, "POST", "/tags/", Some(ADMIN), Some(json!({"text": "rust"})));
  assert_eq!(StatusCode::CREATED, status);
  assert_eq!("rust", body["text"]);
  let id = body["id"].as_i64().unwrap();
  assert_eq!(format!("http://testserver/tags/{}/", id), body["url"]);

  let (status, body) = send!(app, "POST", "/tags/", Some(ADMIN), Some(json!({"text": "rust"})));
  assert_eq!(StatusCode::BAD_REQUEST, status);
  assert_eq!(json!(["Tag with text rust exists."]), body["text"]);

  let (_, body) = send!(app, "GET", "/tags/", None, None);
  assert_eq!(1, body["count"]);
}

#[actix_web::test]
async fn tag_update_keeps_its_own_text() {
  let app = init_app!();
  let (_, rust) = send!(app, "POST", "/tags/", Some(ADMIN), Some(json!({"text": "rust"})));
  send!(app, "POST", "/tags/", Some(ADMIN), Some(json!({"text": "go"})));
  let uri = format!("/tags/{}/", rust["id"]);

  let (status, _) = send!(app, "PUT", &uri, Some(ADMIN), Some(json!({"text": "rust"})));
  assert_eq!(StatusCode::OK, status);
  let (status, body) = send!(app, "PATCH", &uri, Some(ADMIN), Some(json!({"text": "go"})));
  assert_eq!(StatusCode::BAD_REQUEST, status);
  assert!(body["text"].is_array());
  let (status, body) = send!(app, "PATCH", &uri, Some(ADMIN), Some(json!({"text": "rustlang"})));
  assert_eq!(StatusCode::OK, status);
  assert_eq!("rustlang", body["text"]);
}

#[actix_web::test]
async fn tag_validation_errors() {
  let app = init_app!();
  let (status, body) = send!(app, "POST", "/tags/", Some(ADMIN), Some(json!({})));
  assert_eq!(StatusCode::BAD_REQUEST, status);
  assert_eq!(json!(["This field is required."]), body["text"]);
  let long = "x".repeat(31);
  let (status, body) = send!(app, "POST", "/tags/", Some(ADMIN), Some(json!({"text": long})));
  assert_eq!(StatusCode::BAD_REQUEST, status);
  assert!(body["text"].is_array());
}

#[actix_web::test]
async fn readers_cannot_write() {
  let app = init_app!();
  let resources = [
    ("/tags/", json!({"text": "rust"})),
    ("/categories/", json!({"name": "Code"})),
    ("/avatars/", json!({"content": "avatars/me.png"})),
    ("/articles/", json!({"title": "Hello", "body": "Text"}))
  ];
  for (collection, form) in resources.iter() {
    let (status, body) = send!(app, "POST", collection, Some(ADMIN), Some(form.clone()));
    assert_eq!(StatusCode::CREATED, status);
    let item = format!("{}{}/", collection, body["id"]);

    for token in [None, Some(READER)].iter() {
      let (status, body) = send!(app, "POST", collection, *token, Some(form.clone()));
      assert_eq!(StatusCode::FORBIDDEN, status);
      assert_eq!(
        "You do not have permission to perform this action.",
        body["detail"]
      );
      let (status, _) = send!(app, "PUT", &item, *token, Some(form.clone()));
      assert_eq!(StatusCode::FORBIDDEN, status);
      let (status, _) = send!(app, "PATCH", &item, *token, Some(form.clone()));
      assert_eq!(StatusCode::FORBIDDEN, status);
      let (status, _) = send!(app, "DELETE", &item, *token, None);
      assert_eq!(StatusCode::FORBIDDEN, status);
      let (status, _) = send!(app, "GET", &item, *token, None);
      assert_eq!(StatusCode::OK, status);
      let (status, body) = send!(app, "GET", collection, *token, None);
      assert_eq!(StatusCode::OK, status);
      // Nothing got through:
      assert_eq!(1, body["count"]);
    }
  }
}

#[actix_web::test]
async fn head_is_a_read() {
  let app = init_app!();
  send!(app, "POST", "/tags/", Some(ADMIN), Some(json!({"text": "rust"})));
  for uri in ["/", "/tags/", "/tags/1/", "/categories/", "/articles/", "/avatars/"].iter() {
    let resp = test::call_service(
      &app,
      build_request("HEAD", uri, Some(READER), None).to_request()
    ).await;
    assert_eq!(StatusCode::OK, resp.status());
  }
}

#[actix_web::test]
async fn unknown_token_is_unauthorized() {
  let app = init_app!();
  let (status, body) = send!(app, "GET", "/tags/", Some("Token nope"), None);
  assert_eq!(StatusCode::UNAUTHORIZED, status);
  assert_eq!("Invalid token.", body["detail"]);
}

#[actix_web::test]
async fn missing_resources_are_not_found() {
  let app = init_app!();
  for uri in ["/tags/42/", "/categories/42/", "/articles/42/", "/avatars/42/", "/tags/abc/"].iter() {
    let (status, body) = send!(app, "GET", uri, None, None);
    assert_eq!(StatusCode::NOT_FOUND, status);
    assert_eq!("Not found.", body["detail"]);
  }
  let (status, _) = send!(app, "DELETE", "/articles/42/", Some(ADMIN), None);
  assert_eq!(StatusCode::NOT_FOUND, status);
  let (status, _) = send!(app, "PATCH", "/articles/42/", Some(ADMIN), Some(json!({"title": "x"})));
  assert_eq!(StatusCode::NOT_FOUND, status);
}

#[actix_web::test]
async fn category_lifecycle() {
  let app = init_app!();
  let (status, body) = send!(app, "POST", "/categories/", Some(ADMIN), Some(json!({"name": "Code"})));
  assert_eq!(StatusCode::CREATED, status);
  assert_eq!("Code", body["name"]);
  assert!(body["created"].as_str().unwrap().ends_with('Z'));
  let uri = format!("/categories/{}/", body["id"]);

  let (status, body) = send!(app, "PATCH", &uri, Some(ADMIN), Some(json!({"name": "Programming"})));
  assert_eq!(StatusCode::OK, status);
  assert_eq!("Programming", body["name"]);

  let (status, body) = send!(app, "DELETE", &uri, Some(ADMIN), None);
  assert_eq!(StatusCode::NO_CONTENT, status);
  assert_eq!(Value::Null, body);
  let (status, _) = send!(app, "GET", &uri, None, None);
  assert_eq!(StatusCode::NOT_FOUND, status);
}

#[actix_web::test]
async fn avatar_lifecycle() {
  let app = init_app!();
  let (status, body) = send!(app, "POST", "/avatars/", Some(ADMIN), Some(json!({"content": "avatars/me.png"})));
  assert_eq!(StatusCode::CREATED, status);
  let uri = format!("/avatars/{}/", body["id"]);
  let (status, body) = send!(app, "PUT", &uri, Some(ADMIN), Some(json!({"content": "avatars/you.png"})));
  assert_eq!(StatusCode::OK, status);
  assert_eq!("avatars/you.png", body["content"]);
  let (status, body) = send!(app, "PUT", &uri, Some(ADMIN), Some(json!({})));
  assert_eq!(StatusCode::BAD_REQUEST, status);
  assert!(body["content"].is_array());
}

#[actix_web::test]
async fn article_creates_missing_tags() {
  let app = init_app!();
  send!(app, "POST", "/tags/", Some(ADMIN), Some(json!({"text": "python"})));
  let (status, body) = send!(app, "POST", "/articles/", Some(ADMIN), Some(json!({
    "title": "Hello",
    "body": "# Intro\n\nText",
    "tags": ["python", "web"]
  })));
  assert_eq!(StatusCode::CREATED, status);
  assert_eq!(json!(["python", "web"]), body["tags"]);

  let (_, tags) = send!(app, "GET", "/tags/", None, None);
  assert_eq!(2, tags["count"]);
  let texts: Vec<&str> = tags["results"].as_array().unwrap()
    .iter()
    .map(|t| t["text"].as_str().unwrap())
    .collect();
  assert_eq!(vec!["python", "web"], texts);
}

#[actix_web::test]
async fn article_author_is_the_requester() {
  let app = init_app!();
  let (status, body) = send!(app, "POST", "/articles/", Some(ADMIN), Some(json!({
    "title": "Mine",
    "body": "Text",
    "author": {"id": 2, "username": "reader"}
  })));
  assert_eq!(StatusCode::CREATED, status);
  assert_eq!("admin", body["author"]["username"]);
  assert!(body["author"].get("is_staff").is_none());
}

#[actix_web::test]
async fn article_category_must_exist() {
  let app = init_app!();
  let (status, body) = send!(app, "POST", "/articles/", Some(ADMIN), Some(json!({
    "title": "Lost",
    "body": "Text",
    "category_id": 9999,
    "tags": ["never-created"]
  })));
  assert_eq!(StatusCode::BAD_REQUEST, status);
  assert_eq!(
    json!(["Category with id 9999 does not exist."]),
    body["category_id"]
  );
  // Nothing was written:
  let (_, tags) = send!(app, "GET", "/tags/", None, None);
  assert_eq!(0, tags["count"]);

  let (status, body) = send!(app, "POST", "/articles/", Some(ADMIN), Some(json!({
    "title": "Found",
    "body": "Text",
    "category_id": null
  })));
  assert_eq!(StatusCode::CREATED, status);
  assert_eq!(Value::Null, body["category"]);
}

#[actix_web::test]
async fn list_and_detail_representations() {
  let app = init_app!();
  let (_, category) = send!(app, "POST", "/categories/", Some(ADMIN), Some(json!({"name": "Code"})));
  let (_, created) = send!(app, "POST", "/articles/", Some(ADMIN), Some(json!({
    "title": "Rendered",
    "body": "# Intro\n\n## Details\n\nSome *text*",
    "category_id": category["id"]
  })));

  let (status, list) = send!(app, "GET", "/articles/", None, None);
  assert_eq!(StatusCode::OK, status);
  let item = &list["results"][0];
  assert!(item.get("body").is_none());
  assert!(item.get("body_html").is_none());
  assert_eq!("Code", item["category"]["name"]);

  let uri = format!("/articles/{}/", created["id"]);
  let (status, detail) = send!(app, "GET", &uri, None, None);
  assert_eq!(StatusCode::OK, status);
  assert_eq!("# Intro\n\n## Details\n\nSome *text*", detail["body"]);
  assert!(detail["body_html"].as_str().unwrap().contains("<h1 id=\"intro\">"));
  assert!(detail["body_html"].as_str().unwrap().contains("<em>text</em>"));
  assert!(detail["toc_html"].as_str().unwrap().contains("href=\"#details\""));
  assert_eq!(json!([]), detail["comments"]);
  assert_eq!(format!("http://testserver{}", uri), detail["url"]);
}

#[actix_web::test]
async fn article_partial_update_keeps_the_rest() {
  let app = init_app!();
  let (_, category) = send!(app, "POST", "/categories/", Some(ADMIN), Some(json!({"name": "Code"})));
  let (_, created) = send!(app, "POST", "/articles/", Some(ADMIN), Some(json!({
    "title": "Before",
    "body": "Body",
    "category_id": category["id"],
    "tags": ["a"]
  })));
  let uri = format!("/articles/{}/", created["id"]);

  let (status, body) = send!(app, "PATCH", &uri, Some(ADMIN), Some(json!({"title": "After"})));
  assert_eq!(StatusCode::OK, status);
  assert_eq!("After", body["title"]);
  assert_eq!("Body", body["body"]);
  assert_eq!("Code", body["category"]["name"]);
  assert_eq!(json!(["a"]), body["tags"]);

  let (status, body) = send!(app, "PATCH", &uri, Some(ADMIN), Some(json!({"category_id": null, "tags": []})));
  assert_eq!(StatusCode::OK, status);
  assert_eq!(Value::Null, body["category"]);
  assert_eq!(json!([]), body["tags"]);

  // A full update needs everything that's required:
  let (status, body) = send!(app, "PUT", &uri, Some(ADMIN), Some(json!({"title": "Only title"})));
  assert_eq!(StatusCode::BAD_REQUEST, status);
  assert!(body["body"].is_array());
}

#[actix_web::test]
async fn search_by_title() {
  let app = init_app!();
  for title in ["Rust web services", "Python tricks", "Rust embedded"].iter() {
    send!(app, "POST", "/articles/", Some(ADMIN), Some(json!({
      "title": title,
      "body": "Text"
    })));
  }
  let (_, body) = send!(app, "GET", "/articles/?search=rust", None, None);
  assert_eq!(2, body["count"]);
  let (_, body) = send!(app, "GET", "/articles/?search=rust%20web", None, None);
  assert_eq!(1, body["count"]);
  assert_eq!("Rust web services", body["results"][0]["title"]);
  let (_, body) = send!(app, "GET", "/articles/?search=java", None, None);
  assert_eq!(0, body["count"]);
  assert_eq!(json!([]), body["results"]);
}

#[actix_web::test]
async fn search_ignores_case_of_accented_letters() {
  let app = init_app!();
  send!(app, "POST", "/articles/", Some(ADMIN), Some(json!({
    "title": "Élan vital",
    "body": "Text"
  })));
  for query in ["%C3%A9lan", "%C3%89LAN", "VITAL"].iter() {
    let uri = format!("/articles/?search={}", query);
    let (status, body) = send!(app, "GET", &uri, None, None);
    assert_eq!(StatusCode::OK, status);
    assert_eq!(1, body["count"]);
    assert_eq!("Élan vital", body["results"][0]["title"]);
  }
}

#[actix_web::test]
async fn article_update_creates_missing_tags() {
  let app = init_app!();
  let (_, created) = send!(app, "POST", "/articles/", Some(ADMIN), Some(json!({
    "title": "Hello",
    "body": "Text"
  })));
  let uri = format!("/articles/{}/", created["id"]);

  let (status, body) = send!(app, "PUT", &uri, Some(ADMIN), Some(json!({
    "title": "Hello",
    "body": "Text",
    "tags": ["python", "web"]
  })));
  assert_eq!(StatusCode::OK, status);
  assert_eq!(json!(["python", "web"]), body["tags"]);
  let (_, tags) = send!(app, "GET", "/tags/", None, None);
  assert_eq!(2, tags["count"]);

  let (status, body) = send!(app, "PATCH", &uri, Some(ADMIN), Some(json!({
    "tags": ["web", "rust"]
  })));
  assert_eq!(StatusCode::OK, status);
  assert_eq!(json!(["web", "rust"]), body["tags"]);
  let (_, tags) = send!(app, "GET", "/tags/", None, None);
  assert_eq!(3, tags["count"]);
}

#[actix_web::test]
async fn lists_are_paginated() {
  let app = init_app!();
  for i in 0..12 {
    send!(app, "POST", "/tags/", Some(ADMIN), Some(json!({"text": format!("tag{}", i)})));
  }
  let (_, page1) = send!(app, "GET", "/tags/", None, None);
  assert_eq!(12, page1["count"]);
  assert_eq!(10, page1["results"].as_array().unwrap().len());
  assert_eq!("http://testserver/tags/?page=2", page1["next"]);
  assert_eq!(Value::Null, page1["previous"]);

  let (_, page2) = send!(app, "GET", "/tags/?page=2", None, None);
  assert_eq!(2, page2["results"].as_array().unwrap().len());
  assert_eq!(Value::Null, page2["next"]);
  assert!(page2["previous"].is_string());

  let (status, body) = send!(app, "GET", "/tags/?page=3", None, None);
  assert_eq!(StatusCode::NOT_FOUND, status);
  assert_eq!("Invalid page.", body["detail"]);
  let (status, _) = send!(app, "GET", "/tags/?page=abc", None, None);
  assert_eq!(StatusCode::NOT_FOUND, status);
}

#[actix_web::test]
async fn deleting_an_article() {
  let app = init_app!();
  let (_, created) = send!(app, "POST", "/articles/", Some(ADMIN), Some(json!({
    "title": "Gone soon",
    "body": "Text",
    "tags": ["kept"]
  })));
  let uri = format!("/articles/{}/", created["id"]);
  let (status, _) = send!(app, "DELETE", &uri, Some(ADMIN), None);
  assert_eq!(StatusCode::NO_CONTENT, status);
  let (status, _) = send!(app, "GET", &uri, None, None);
  assert_eq!(StatusCode::NOT_FOUND, status);
  // Tags outlive their articles:
  let (_, tags) = send!(app, "GET", "/tags/", None, None);
  assert_eq!(1, tags["count"]);
}

#[actix_web::test]
async fn malformed_json_is_a_bad_request() {
  let app = init_app!();
  let req = test::TestRequest::post()
    .uri("/tags/")
    .insert_header(("Authorization", ADMIN))
    .insert_header(("Content-Type", "application/json"))
    .set_payload("{not json")
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(StatusCode::BAD_REQUEST, resp.status());
}
