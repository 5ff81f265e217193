use std::collections::HashMap;
use std::io::Read;
use std::sync::{Arc, Mutex};

use iron::headers::{AccessControlAllowMethods, AccessControlAllowOrigin, ContentType};
use iron::method::Method;
use iron::status::{self, Status};
use iron::{AfterMiddleware, Chain, Handler, IronError, IronResult, Request, Response};
use logger::Logger;
use router::Router;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;

use crate::database::Database;
use crate::error::{BlogError, Result};
use crate::model::{NewPost, PostUpdate};
use crate::query::{self, SearchQuery};

/// Match a `Result` into its inner value or return the JSON error response
/// for its `BlogError`, or for the status given as the second argument.
macro_rules! try_handler {
    ( $e:expr ) => {
        match $e {
            Ok(x) => x,
            Err(e) => return Ok(error_response(&e)),
        }
    };
    ( $e:expr, $error:expr ) => {
        match $e {
            Ok(x) => x,
            Err(e) => return Ok(json_error($error, &e.to_string())),
        }
    };
}

/// Lock a `Mutex`. The database keeps no state besides its path, so a lock
/// poisoned by a panicking handler is still safe to use.
macro_rules! lock {
    ( $e:expr ) => {
        match $e.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    };
}

/// Get the value of a parameter in the URI.
/// If the parameter was absent, return `400 Bad Request`.
/// If we could not obtain the parameter list, return `500 Internal Server Error`.
macro_rules! get_http_param {
    ( $r:expr, $e:expr ) => {
        match $r.extensions.get::<Router>() {
            Some(router) => match router.find($e) {
                Some(val) => val.to_string(),
                None => return Ok(json_error(status::BadRequest, "missing path parameter")),
            },
            None => return Ok(Response::with(status::InternalServerError)),
        }
    };
}

pub fn status_for(err: &BlogError) -> Status {
    match *err {
        BlogError::MissingField(_)
        | BlogError::InvalidDateFormat(_)
        | BlogError::InvalidQueryParameter { .. }
        | BlogError::InvalidBody(_) => status::BadRequest,
        BlogError::NotFound(_) | BlogError::InvalidPostId(_) => status::NotFound,
        BlogError::IdsExhausted(_) | BlogError::StorageWrite { .. } => status::InternalServerError,
    }
}

fn error_response(err: &BlogError) -> Response {
    let status = status_for(err);
    if status == status::InternalServerError {
        error!("{}", err);
    } else {
        debug!("rejected request: {}", err);
    }
    json_error(status, &err.to_string())
}

fn json_error(status: Status, message: &str) -> Response {
    Response::with((status, json!({ "error": message }).to_string()))
}

fn json_response<T: Serialize>(status: Status, value: &T) -> IronResult<Response> {
    let payload = try_handler!(serde_json::to_string(value), status::InternalServerError);
    Ok(Response::with((status, payload)))
}

fn read_json<T: DeserializeOwned>(req: &mut Request) -> Result<T> {
    let mut payload = String::new();
    req.body
        .read_to_string(&mut payload)
        .map_err(|e| BlogError::InvalidBody(e.to_string()))?;
    serde_json::from_str(&payload).map_err(|e| BlogError::InvalidBody(e.to_string()))
}

fn query_params(req: &Request) -> HashMap<String, String> {
    req.url.as_ref().query_pairs().into_owned().collect()
}

pub fn parse_post_id(raw: &str) -> Result<u64> {
    raw.parse().map_err(|_| BlogError::InvalidPostId(raw.to_string()))
}

/// Builds a search from query parameters; missing ones become empty strings.
pub fn search_query(params: &HashMap<String, String>) -> SearchQuery {
    let param = |name: &str| params.get(name).cloned().unwrap_or_default();
    SearchQuery {
        title: param("title"),
        content: param("content"),
        author: param("author"),
        date: param("date"),
    }
}

/// Routes every endpoint over `database`, wrapped in access logging, JSON and
/// CORS middleware.
pub fn chain(database: Database) -> Chain {
    let handlers = Handlers::new(database);

    let mut router = Router::new();
    router.get("/api/posts", handlers.list_posts, "list_posts");
    router.get("/api/posts/search", handlers.search_posts, "search_posts");
    router.get("/api/posts/:id", handlers.post, "post");
    router.post("/api/posts", handlers.make_post, "make_post");
    router.put("/api/posts/:id", handlers.update_post, "update_post");
    router.delete("/api/posts/:id", handlers.delete_post, "delete_post");
    router.options("/api/posts", PreflightHandler, "posts_preflight");
    router.options("/api/posts/:id", PreflightHandler, "post_preflight");

    let (logger_before, logger_after) = Logger::new(None);

    let mut chain = Chain::new(router);
    chain.link_before(logger_before); // Should be first!
    chain.link_after(JsonAfterMiddleware);
    chain.link_after(CorsAfterMiddleware);
    chain.link_after(logger_after); // Should be last!
    chain
}

pub struct Handlers {
    pub list_posts: ListPostsHandler,
    pub search_posts: SearchPostsHandler,
    pub post: PostHandler,
    pub make_post: MakePostHandler,
    pub update_post: UpdatePostHandler,
    pub delete_post: DeletePostHandler,
}

impl Handlers {
    pub fn new(database: Database) -> Handlers {
        let database = Arc::new(Mutex::new(database));
        Handlers {
            list_posts: ListPostsHandler { database: database.clone() },
            search_posts: SearchPostsHandler { database: database.clone() },
            post: PostHandler { database: database.clone() },
            make_post: MakePostHandler { database: database.clone() },
            update_post: UpdatePostHandler { database: database.clone() },
            delete_post: DeletePostHandler { database: database },
        }
    }
}

/// `GET /api/posts`, optionally sorted with `sort` and `direction`.
pub struct ListPostsHandler {
    database: Arc<Mutex<Database>>,
}

impl Handler for ListPostsHandler {
    fn handle(&self, req: &mut Request) -> IronResult<Response> {
        let params = query_params(req);
        let posts = lock!(self.database).list_posts();
        let posts = try_handler!(query::sort(
            posts,
            params.get("sort").map(String::as_str),
            params.get("direction").map(String::as_str),
        ));
        json_response(status::Ok, &posts)
    }
}

/// `GET /api/posts/search`
pub struct SearchPostsHandler {
    database: Arc<Mutex<Database>>,
}

impl Handler for SearchPostsHandler {
    fn handle(&self, req: &mut Request) -> IronResult<Response> {
        let search = search_query(&query_params(req));
        let posts = lock!(self.database).list_posts();
        json_response(status::Ok, &query::search(&posts, &search))
    }
}

/// `GET /api/posts/:id`
pub struct PostHandler {
    database: Arc<Mutex<Database>>,
}

impl Handler for PostHandler {
    fn handle(&self, req: &mut Request) -> IronResult<Response> {
        let id = try_handler!(parse_post_id(&get_http_param!(req, "id")));
        let post = try_handler!(lock!(self.database).find_post(id));
        json_response(status::Ok, &post)
    }
}

/// `POST /api/posts`
pub struct MakePostHandler {
    database: Arc<Mutex<Database>>,
}

impl Handler for MakePostHandler {
    fn handle(&self, req: &mut Request) -> IronResult<Response> {
        let new_post: NewPost = try_handler!(read_json(req));
        let post = try_handler!(lock!(self.database).add_post(new_post));
        json_response(status::Created, &post)
    }
}

/// `PUT /api/posts/:id`
pub struct UpdatePostHandler {
    database: Arc<Mutex<Database>>,
}

impl Handler for UpdatePostHandler {
    fn handle(&self, req: &mut Request) -> IronResult<Response> {
        let id = try_handler!(parse_post_id(&get_http_param!(req, "id")));
        let update: PostUpdate = try_handler!(read_json(req));
        let post = try_handler!(lock!(self.database).update_post(id, update));
        json_response(status::Ok, &post)
    }
}

/// `DELETE /api/posts/:id`
pub struct DeletePostHandler {
    database: Arc<Mutex<Database>>,
}

impl Handler for DeletePostHandler {
    fn handle(&self, req: &mut Request) -> IronResult<Response> {
        let id = try_handler!(parse_post_id(&get_http_param!(req, "id")));
        try_handler!(lock!(self.database).delete_post(id));
        let message = format!("Post with id {} has been deleted successfully.", id);
        json_response(status::Ok, &json!({ "message": message }))
    }
}

/// Answers CORS preflight requests; the headers come from `CorsAfterMiddleware`.
pub struct PreflightHandler;

impl Handler for PreflightHandler {
    fn handle(&self, _: &mut Request) -> IronResult<Response> {
        Ok(Response::with(status::Ok))
    }
}

pub struct JsonAfterMiddleware;

impl AfterMiddleware for JsonAfterMiddleware {
    fn after(&self, _: &mut Request, mut res: Response) -> IronResult<Response> {
        res.headers.set(ContentType::json());
        Ok(res)
    }
}

/// Allows cross-origin requests from any origin, on errors too.
pub struct CorsAfterMiddleware;

impl CorsAfterMiddleware {
    fn allow(res: &mut Response) {
        res.headers.set(AccessControlAllowOrigin::Any);
        res.headers.set(AccessControlAllowMethods(vec![
            Method::Get,
            Method::Post,
            Method::Put,
            Method::Delete,
            Method::Options,
        ]));
        res.headers
            .set_raw("Access-Control-Allow-Headers", vec![b"Content-Type".to_vec()]);
    }
}

impl AfterMiddleware for CorsAfterMiddleware {
    fn after(&self, _: &mut Request, mut res: Response) -> IronResult<Response> {
        CorsAfterMiddleware::allow(&mut res);
        Ok(res)
    }

    fn catch(&self, _: &mut Request, mut err: IronError) -> IronResult<Response> {
        CorsAfterMiddleware::allow(&mut err.response);
        Err(err)
    }
}
