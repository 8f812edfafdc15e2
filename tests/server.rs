//! Drives a real server over TCP with raw HTTP/1.1.

use std::time::Duration;

use sprig::middleware::BasicAuth;
use sprig::{Method, Router, Server, StatusCode};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::oneshot;

fn free_addr() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().to_string()
}

async fn connect(addr: &str) -> TcpStream {
    for _ in 0..50 {
        match TcpStream::connect(addr).await {
            Ok(s) => return s,
            Err(_) => tokio::time::sleep(Duration::from_millis(20)).await,
        }
    }
    panic!("server did not start");
}

async fn send(addr: &str, raw: &str) -> String {
    let mut stream = connect(addr).await;
    stream.write_all(raw.as_bytes()).await.unwrap();
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await.unwrap();
    String::from_utf8(buf).unwrap()
}

#[tokio::test]
async fn serves_routes_and_not_found() {
    let mut app = Router::new();
    app.get("/users/:id", |_req, res, cx| {
        res.json(format!(r#"{{"id":"{}"}}"#, cx.param("id").unwrap_or_default()).into_bytes());
    });
    app.post("/users", |req, res, _cx| {
        res.set_status(StatusCode::CREATED);
        res.text(String::from_utf8_lossy(req.body()).into_owned());
    });
    app.get("/admin", |_req, res, cx| res.text(cx.identity().unwrap_or_default()));
    app.layer_at(Method::GET, "/admin", BasicAuth::users([("admin", "s3cret")]));

    let addr = free_addr();
    let (stop, stopped) = oneshot::channel::<()>();
    let server = tokio::spawn(
        Server::bind(&addr).serve_with_shutdown(app, async move {
            let _ = stopped.await;
        }),
    );

    let res = send(&addr, "GET /users/42 HTTP/1.1\r\nhost: x\r\nconnection: close\r\n\r\n").await;
    assert!(res.starts_with("HTTP/1.1 200 OK"), "{res}");
    assert!(res.contains("content-type: application/json"), "{res}");
    assert!(res.ends_with(r#"{"id":"42"}"#), "{res}");

    let res = send(
        &addr,
        "POST /users HTTP/1.1\r\nhost: x\r\ncontent-length: 5\r\nconnection: close\r\n\r\nalice",
    )
    .await;
    assert!(res.starts_with("HTTP/1.1 201 Created"), "{res}");
    assert!(res.ends_with("alice"), "{res}");

    let res = send(&addr, "GET /users/42/posts HTTP/1.1\r\nhost: x\r\nconnection: close\r\n\r\n").await;
    assert!(res.starts_with("HTTP/1.1 404 Not Found"), "{res}");

    let res = send(&addr, "GET /admin HTTP/1.1\r\nhost: x\r\nconnection: close\r\n\r\n").await;
    assert!(res.starts_with("HTTP/1.1 401 Unauthorized"), "{res}");

    // "admin:s3cret"
    let res = send(
        &addr,
        "GET /admin HTTP/1.1\r\nhost: x\r\nauthorization: Basic YWRtaW46czNjcmV0\r\nconnection: close\r\n\r\n",
    )
    .await;
    assert!(res.starts_with("HTTP/1.1 200 OK"), "{res}");
    assert!(res.ends_with("admin"), "{res}");

    let res = send(&addr, "GET /users/john%20doe HTTP/1.1\r\nhost: x\r\nconnection: close\r\n\r\n").await;
    assert!(res.ends_with(r#"{"id":"john doe"}"#), "{res}");

    stop.send(()).unwrap();
    server.await.unwrap().unwrap();
}

#[tokio::test]
async fn shutdown_closes_idle_keep_alive_connections() {
    let mut app = Router::new();
    app.get("/ping", |_req, res, _cx| res.text("pong"));

    let addr = free_addr();
    let (stop, stopped) = oneshot::channel::<()>();
    let server = tokio::spawn(
        Server::bind(&addr).serve_with_shutdown(app, async move {
            let _ = stopped.await;
        }),
    );

    let mut stream = connect(&addr).await;
    stream.write_all(b"GET /ping HTTP/1.1\r\nhost: x\r\n\r\n").await.unwrap();
    let mut buf = Vec::new();
    while !buf.ends_with(b"pong") {
        let mut chunk = [0u8; 256];
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed before the response arrived");
        buf.extend_from_slice(&chunk[..n]);
    }

    stop.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(3), server)
        .await
        .expect("server kept waiting on an idle connection")
        .unwrap()
        .unwrap();

    let mut rest = Vec::new();
    stream.read_to_end(&mut rest).await.unwrap();
    assert!(rest.is_empty());
}
