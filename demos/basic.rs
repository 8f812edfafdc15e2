//! Minimal sprig example: CRUD-style endpoints, scoped auth, cache headers.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/users/42
//!   curl -X POST http://localhost:3000/users -d '{"name":"alice"}'
//!   curl -X DELETE http://localhost:3000/users/42
//!   curl -u admin:s3cret http://localhost:3000/admin/stats
//!   curl -i http://localhost:3000/assets/logo

use std::time::Duration;

use sprig::middleware::{BasicAuth, Cache, Trace};
use sprig::{ContentType, Context, Method, Request, Response, Router, Server, StatusCode};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut app = Router::new();
    app.layer(Trace);

    app.get("/users/:id", get_user);
    app.post("/users", create_user);
    app.delete("/users/:id", delete_user);

    app.get("/admin/stats", stats);
    app.layer_at(Method::GET, "/admin", BasicAuth::users([("admin", "s3cret")]).realm("admin"));

    app.get_immutable("/assets/logo", |_req, res, _cx| {
        res.bytes(ContentType::Xml, b"<svg/>".to_vec());
    });
    app.get("/assets/manifest", |_req, res, _cx| res.text("v1"))
        .layer(Cache::new(Duration::from_secs(300)));

    let addr = std::env::var("SPRIG_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_owned());
    Server::bind(&addr)
        .serve(app)
        .await
        .expect("server error");
}

// GET /users/:id
fn get_user(_req: &Request, res: &mut Response, cx: &mut Context) {
    let id = cx.param("id").unwrap_or("unknown");
    res.json(format!(r#"{{"id":"{id}","name":"alice"}}"#).into_bytes());
}

// POST /users
//
// req.body() is the fully buffered body: parse with serde_json::from_slice etc.
fn create_user(req: &Request, res: &mut Response, _cx: &mut Context) {
    if req.body().is_empty() {
        return res.error(StatusCode::BAD_REQUEST);
    }
    res.set_status(StatusCode::CREATED);
    res.set_header("location", "/users/99");
    res.json(br#"{"id":"99","name":"new_user"}"#.to_vec());
}

// DELETE /users/:id → 204 No Content
fn delete_user(_req: &Request, res: &mut Response, _cx: &mut Context) {
    res.set_status(StatusCode::NO_CONTENT);
}

// GET /admin/stats: only reached with valid credentials
fn stats(_req: &Request, res: &mut Response, cx: &mut Context) {
    res.text(format!("hello {}", cx.identity().unwrap_or("nobody")));
}
