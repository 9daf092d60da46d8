//! End-to-end tests over a real `may_minihttp` listener.
//!
//! Each test builds an engine, binds it to an ephemeral port and talks raw
//! HTTP/1.1 over a `TcpStream`.

use std::fs;
use tempfile::TempDir;
use xia::{Context, Engine, Recovery, Templates, ResponsePayload};

mod common;
use common::http::{get, parse_response, send_request};
use common::test_server::start;

fn app() -> Engine {
    let mut engine = Engine::classic();
    engine.use_middleware(Recovery);
    engine.get("/p/:lang/doc", |c: &mut Context| {
        let body = format!("doc:{}", c.param("lang"));
        c.string(200, body);
    });
    engine.get("/json", |c: &mut Context| {
        c.json(201, &serde_json::json!({"ok": true}));
    });
    engine.post("/login", |c: &mut Context| {
        let body = format!("user={}", c.post_form("username"));
        c.string(200, body);
    });
    engine.get("/panic", |_: &mut Context| panic!("handler exploded"));
    engine
}

#[test]
fn test_routed_get_with_params() {
    let (handle, addr) = start(app());
    let resp = get(&addr, "/p/go/doc");
    handle.stop();

    let (status, ct, body) = parse_response(&resp);
    assert_eq!(status, 200);
    assert_eq!(ct, "text/plain");
    assert_eq!(body, "doc:go");
}

#[test]
fn test_unknown_path_is_404() {
    let (handle, addr) = start(app());
    let resp = get(&addr, "/nowhere?x=1");
    handle.stop();

    let (status, ct, body) = parse_response(&resp);
    assert_eq!(status, 404);
    assert_eq!(ct, "text/plain");
    assert_eq!(body, "404 NOT FOUND: /nowhere\n");
}

#[test]
fn test_wrong_method_is_404() {
    let (handle, addr) = start(app());
    let resp = get(&addr, "/login");
    handle.stop();
    assert_eq!(parse_response(&resp).0, 404);
}

#[test]
fn test_panic_is_500() {
    let (handle, addr) = start(app());
    let resp = get(&addr, "/panic");
    // The server keeps serving after a panic.
    let after = get(&addr, "/p/rust/doc");
    handle.stop();

    let (status, _, body) = parse_response(&resp);
    assert_eq!(status, 500);
    assert_eq!(body, "Internal Server Error");
    assert_eq!(parse_response(&after).2, "doc:rust");
}

#[test]
fn test_panic_without_recovery_middleware_is_500() {
    let mut engine = Engine::new();
    engine.get("/bare", |_: &mut Context| panic!("no middleware here"));
    let (handle, addr) = start(engine);
    let resp = get(&addr, "/bare");
    handle.stop();
    assert_eq!(parse_response(&resp).0, 500);
}

#[test]
fn test_json_response() {
    let (handle, addr) = start(app());
    let resp = get(&addr, "/json");
    handle.stop();

    let (status, ct, body) = parse_response(&resp);
    assert_eq!(status, 201);
    assert_eq!(ct, "application/json; charset=UTF-8");
    assert_eq!(body, "{\"ok\":true}\n");
}

#[test]
fn test_form_post() {
    let (handle, addr) = start(app());
    let form = "username=xia";
    let req = format!(
        "POST /login HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/x-www-form-urlencoded\r\nContent-Length: {}\r\n\r\n{}",
        form.len(),
        form
    );
    let resp = send_request(&addr, &req);
    handle.stop();
    assert_eq!(parse_response(&resp).2, "user=xia");
}

#[test]
fn test_health_endpoint() {
    let (handle, addr) = start(app());
    let resp = get(&addr, "/health");
    handle.stop();

    let (status, ct, body) = parse_response(&resp);
    assert_eq!(status, 200);
    assert_eq!(ct, "application/json");
    assert_eq!(body, r#"{"status":"ok"}"#);
}

#[test]
fn test_static_files_and_templates() {
    let assets = TempDir::new().unwrap();
    fs::write(assets.path().join("app.js"), "console.log(1)").unwrap();
    let views = TempDir::new().unwrap();
    fs::write(views.path().join("index.html"), "<h1>{{ message }}</h1>").unwrap();

    let mut engine = app();
    engine.static_files("/assets", &assets.path().to_string_lossy());
    let templates = Templates::new(views.path().to_string_lossy()).with_cache(true);
    engine.get("/", move |c: &mut Context| {
        c.write_template(&templates, "index.html", &ResponsePayload::new(serde_json::Value::Null, 200, "home"));
    });

    let (handle, addr) = start(engine);
    let js = get(&addr, "/assets/app.js");
    let missing = get(&addr, "/assets/nope.js");
    let page = get(&addr, "/");
    handle.stop();

    let (status, ct, body) = parse_response(&js);
    assert_eq!(status, 200);
    assert_eq!(ct, "application/javascript");
    assert_eq!(body, "console.log(1)");

    assert_eq!(parse_response(&missing).0, 404);

    let (status, ct, body) = parse_response(&page);
    assert_eq!(status, 200);
    assert_eq!(ct, "text/html; charset=UTF-8");
    assert_eq!(body, "<h1>home</h1>");
}

#[test]
fn test_escaped_path_is_decoded_for_params_and_static_files() {
    let assets = TempDir::new().unwrap();
    fs::write(assets.path().join("my file.css"), "p{}").unwrap();

    let mut engine = app();
    engine.get("/hello/:name", |c: &mut Context| {
        let body = c.param("name").to_string();
        c.string(200, body);
    });
    engine.static_files("/assets", &assets.path().to_string_lossy());

    let (handle, addr) = start(engine);
    let hello = get(&addr, "/hello/J%C3%B6rg");
    let css = get(&addr, "/assets/my%20file.css");
    handle.stop();

    let (status, _, body) = parse_response(&hello);
    assert_eq!(status, 200);
    assert_eq!(body, "Jörg");

    let (status, ct, body) = parse_response(&css);
    assert_eq!(status, 200);
    assert_eq!(ct, "text/css");
    assert_eq!(body, "p{}");
}
