use iron::headers::{AccessControlAllowOrigin, ContentType, Headers};
use iron::status::{self, Status};
use iron::{Chain, Response};
use iron_test::{request, response};
use posts_backend::handlers;
use posts_backend::Database;
use serde_json::Value;
use tempfile::TempDir;

const BASE: &str = "http://localhost:5002";

fn setup() -> (TempDir, Chain) {
    let dir = TempDir::new().unwrap();
    let chain = handlers::chain(Database::new(dir.path().join("posts.json")));
    (dir, chain)
}

fn url(path: &str) -> String {
    format!("{}{}", BASE, path)
}

fn allows_any_origin(res: &Response) -> bool {
    res.headers.get::<AccessControlAllowOrigin>() == Some(&AccessControlAllowOrigin::Any)
}

fn status_and_json(res: Response) -> (Option<Status>, Value) {
    assert!(allows_any_origin(&res));
    let status = res.status;
    let body = response::extract_body_to_string(res);
    (status, serde_json::from_str(&body).unwrap())
}

fn create(chain: &Chain, body: &str) -> (Option<Status>, Value) {
    let res = request::post(&url("/api/posts"), Headers::new(), body, chain).unwrap();
    status_and_json(res)
}

#[test]
fn create_returns_created_post() {
    let (_dir, chain) = setup();

    let (status, post) = create(&chain, r#"{"title": "First post", "content": "Hello", "date": "2023-06-01"}"#);
    assert_eq!(status, Some(status::Created));
    assert_eq!(post["id"], 1);
    assert_eq!(post["author"], "Unknown Author");
    assert_eq!(post["date"], "2023-06-01");

    let res = request::get(&url("/api/posts/1"), Headers::new(), &chain).unwrap();
    assert_eq!(res.headers.get::<ContentType>(), Some(&ContentType::json()));
    let (status, fetched) = status_and_json(res);
    assert_eq!(status, Some(status::Ok));
    assert_eq!(fetched, post);
}

#[test]
fn create_without_content_is_bad_request() {
    let (_dir, chain) = setup();

    let (status, body) = create(&chain, r#"{"title": "Only a title"}"#);
    assert_eq!(status, Some(status::BadRequest));
    assert!(body["error"].as_str().unwrap().contains("content"));

    let (status, _) = create(&chain, "not json");
    assert_eq!(status, Some(status::BadRequest));
}

#[test]
fn list_sorts_and_rejects_unknown_fields() {
    let (_dir, chain) = setup();
    create(&chain, r#"{"title": "banana", "content": "b"}"#);
    create(&chain, r#"{"title": "Apple", "content": "a"}"#);

    let res = request::get(&url("/api/posts?sort=title&direction=asc"), Headers::new(), &chain).unwrap();
    let (status, posts) = status_and_json(res);
    assert_eq!(status, Some(status::Ok));
    assert_eq!(posts[0]["title"], "Apple");
    assert_eq!(posts[1]["title"], "banana");

    let res = request::get(&url("/api/posts?sort=views&direction=asc"), Headers::new(), &chain).unwrap();
    let (status, body) = status_and_json(res);
    assert_eq!(status, Some(status::BadRequest));
    assert!(body["error"].as_str().unwrap().contains("views"));
}

#[test]
fn search_route_is_not_taken_for_an_id() {
    let (_dir, chain) = setup();
    create(&chain, r#"{"title": "First post", "content": "one"}"#);
    create(&chain, r#"{"title": "Second post", "content": "two"}"#);

    let res = request::get(&url("/api/posts/search?title=first"), Headers::new(), &chain).unwrap();
    let (status, posts) = status_and_json(res);
    assert_eq!(status, Some(status::Ok));
    assert_eq!(posts.as_array().unwrap().len(), 1);
    assert_eq!(posts[0]["title"], "First post");

    let res = request::get(&url("/api/posts/search"), Headers::new(), &chain).unwrap();
    let (_, posts) = status_and_json(res);
    assert_eq!(posts.as_array().unwrap().len(), 2);
}

#[test]
fn update_reports_missing_posts_and_bad_dates() {
    let (_dir, chain) = setup();
    create(&chain, r#"{"title": "First post", "content": "one"}"#);

    let res = request::put(&url("/api/posts/999"), Headers::new(), "{}", &chain).unwrap();
    let (status, _) = status_and_json(res);
    assert_eq!(status, Some(status::NotFound));

    let res = request::put(&url("/api/posts/1"), Headers::new(), r#"{"date": "2023-13-40"}"#, &chain).unwrap();
    let (status, _) = status_and_json(res);
    assert_eq!(status, Some(status::BadRequest));

    let res = request::put(&url("/api/posts/1"), Headers::new(), r#"{"author": "Ada"}"#, &chain).unwrap();
    let (status, post) = status_and_json(res);
    assert_eq!(status, Some(status::Ok));
    assert_eq!(post["author"], "Ada");
    assert_eq!(post["title"], "First post");
}

#[test]
fn delete_confirms_then_reports_not_found() {
    let (_dir, chain) = setup();
    create(&chain, r#"{"title": "First post", "content": "one"}"#);

    let res = request::delete(&url("/api/posts/1"), Headers::new(), &chain).unwrap();
    let (status, body) = status_and_json(res);
    assert_eq!(status, Some(status::Ok));
    assert_eq!(body["message"], "Post with id 1 has been deleted successfully.");

    let res = request::delete(&url("/api/posts/1"), Headers::new(), &chain).unwrap();
    let (status, body) = status_and_json(res);
    assert_eq!(status, Some(status::NotFound));
    assert_eq!(body["error"], "Post with id 1 not found.");

    let res = request::get(&url("/api/posts/abc"), Headers::new(), &chain).unwrap();
    let (status, _) = status_and_json(res);
    assert_eq!(status, Some(status::NotFound));
}

#[test]
fn preflight_is_answered_with_cors_headers() {
    let (_dir, chain) = setup();

    let res = request::options(&url("/api/posts"), Headers::new(), &chain).unwrap();
    assert_eq!(res.status, Some(status::Ok));
    assert!(allows_any_origin(&res));

    let res = request::options(&url("/api/posts/1"), Headers::new(), &chain).unwrap();
    assert_eq!(res.status, Some(status::Ok));
    assert!(allows_any_origin(&res));
}

#[test]
fn unknown_routes_still_allow_any_origin() {
    let (_dir, chain) = setup();

    let err = request::get(&url("/api/nothing"), Headers::new(), &chain).unwrap_err();
    assert_eq!(err.response.status, Some(status::NotFound));
    assert!(allows_any_origin(&err.response));
}
