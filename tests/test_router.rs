use lantern::files::{DocumentRoot, Resolution, route};
use lantern::http::request::{Method, Request, RequestBuilder};
use lantern::http::response::{Body, StatusCode};
use std::fs;
use tempfile::TempDir;

fn site() -> (TempDir, DocumentRoot) {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("index.html"), b"<h1>hi</h1>").unwrap();
    fs::create_dir(dir.path().join("docs")).unwrap();
    fs::write(dir.path().join("docs").join("guide.txt"), b"guide").unwrap();

    let root = DocumentRoot::new(dir.path()).unwrap();
    (dir, root)
}

fn request(method: Method, uri: &str) -> Request {
    RequestBuilder::new()
        .method(method)
        .uri(uri)
        .build()
        .unwrap()
}

#[test]
fn test_get_existing_file_is_ok() {
    let (_dir, root) = site();
    let resp = route(&request(Method::GET, "/index.html"), &root);

    assert_eq!(resp.status(), StatusCode::Ok);
    assert_eq!(resp.header("Content-Length"), Some("11"));
    assert!(matches!(resp.body(), Body::File { len: 11, .. }));
}

#[test]
fn test_get_ignores_query_string() {
    let (_dir, root) = site();
    let resp = route(&request(Method::GET, "/docs/guide.txt?v=2"), &root);

    assert_eq!(resp.status(), StatusCode::Ok);
    assert_eq!(resp.header("Content-Type"), Some("text/plain"));
}

#[test]
fn test_get_missing_file_is_not_found() {
    let (_dir, root) = site();
    let resp = route(&request(Method::GET, "/nope.html"), &root);

    assert_eq!(resp.status(), StatusCode::NotFound);
    assert_eq!(resp.body(), &Body::Empty);
}

#[test]
fn test_get_directory_is_forbidden() {
    let (_dir, root) = site();

    for uri in ["/", "/docs", "/docs/"] {
        let resp = route(&request(Method::GET, uri), &root);
        assert_eq!(resp.status(), StatusCode::Forbidden, "{}", uri);
    }
}

#[test]
fn test_get_traversal_is_forbidden_whether_or_not_target_exists() {
    let (dir, root) = site();

    // A file that exists right next to the document root
    let outside = dir.path().parent().unwrap().join("lantern-outside.txt");
    let _ = fs::write(&outside, b"secret");
    let name = outside.file_name().unwrap().to_str().unwrap().to_string();

    for uri in [
        "/../../etc/passwd".to_string(),
        "/docs/../../x".to_string(),
        format!("/../{}", name),
    ] {
        let resp = route(&request(Method::GET, &uri), &root);
        assert_eq!(resp.status(), StatusCode::Forbidden, "{}", uri);
    }

    let _ = fs::remove_file(&outside);
}

#[test]
fn test_dot_segments_inside_root_are_allowed() {
    let (_dir, root) = site();
    let resp = route(&request(Method::GET, "/docs/../index.html"), &root);

    assert_eq!(resp.status(), StatusCode::Ok);
}

#[test]
fn test_head_matches_get_status() {
    let (_dir, root) = site();

    for uri in ["/index.html", "/missing", "/docs", "/../../etc/passwd"] {
        let get = route(&request(Method::GET, uri), &root);
        let head = route(&request(Method::HEAD, uri), &root);
        assert_eq!(head.status(), get.status(), "{}", uri);
    }
}

#[test]
fn test_head_existing_file_has_no_body() {
    let (_dir, root) = site();
    let resp = route(&request(Method::HEAD, "/index.html"), &root);

    assert_eq!(resp.status(), StatusCode::Ok);
    assert_eq!(resp.header("Content-Length"), Some("11"));
    assert!(matches!(resp.body(), Body::Head { .. }));
}

#[test]
fn test_trace_echoes_request() {
    let (_dir, root) = site();
    let req = RequestBuilder::new()
        .method(Method::TRACE)
        .uri("/anything")
        .header("X-Probe", "1")
        .build()
        .unwrap();

    let resp = route(&req, &root);

    assert_eq!(resp.status(), StatusCode::Ok);
    assert_eq!(resp.body(), &Body::Raw(req.raw.clone()));
}

#[test]
fn test_other_methods_not_implemented() {
    let (_dir, root) = site();

    for method in ["POST", "PUT", "DELETE", "OPTIONS", "get"] {
        let resp = route(&request(Method::parse(method), "/index.html"), &root);
        assert_eq!(resp.status(), StatusCode::NotImplemented, "{}", method);
    }
}

#[test]
fn test_resolve_reports_each_outcome() {
    let (dir, root) = site();
    let base = fs::canonicalize(dir.path()).unwrap();

    assert_eq!(root.resolve("/../x"), Resolution::Outside);
    assert_eq!(root.resolve("/missing"), Resolution::Missing);
    assert_eq!(root.resolve("/docs"), Resolution::Directory(base.join("docs")));
    assert_eq!(
        root.resolve("/index.html"),
        Resolution::File(base.join("index.html"))
    );
}
