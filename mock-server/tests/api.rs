use axum::http::{self, Request, StatusCode};
use axum::routing::RouterIntoService;
use http_body_util::BodyExt;
use mock_server::{app, Todo, TokenResponse};
use tower::{Service, ServiceExt};

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

async fn body_text(response: axum::response::Response) -> String {
    String::from_utf8(body_bytes(response).await.to_vec()).unwrap()
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: &str) -> Request<String> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(http::header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(body.to_string()).unwrap()
}

fn bare_request(method: &str, uri: &str, token: Option<&str>) -> Request<String> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(http::header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(String::new()).unwrap()
}

type Svc = RouterIntoService<String>;

async fn send(app: &mut Svc, request: Request<String>) -> axum::response::Response {
    ServiceExt::ready(app)
        .await
        .unwrap()
        .call(request)
        .await
        .unwrap()
}

async fn register(app: &mut Svc, email: &str) -> String {
    let body = format!(r#"{{"username":"ann","email":"{email}","password":"pw"}}"#);
    let resp = send(app, json_request("POST", "/api/auth/register", None, &body)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let token: TokenResponse = body_json(resp).await;
    token.token
}

// --- auth ---

#[tokio::test]
async fn register_rejects_missing_fields() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            None,
            r#"{"username":"","email":"a@b.com","password":"pw"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(resp).await, "Username, email, and password are required");
}

#[tokio::test]
async fn register_twice_conflicts() {
    let mut app = app().into_service();
    register(&mut app, "a@b.com").await;

    let body = r#"{"username":"bob","email":"a@b.com","password":"other"}"#;
    let resp = send(&mut app, json_request("POST", "/api/auth/register", None, body)).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn login_with_wrong_password_is_unauthorized() {
    let mut app = app().into_service();
    register(&mut app, "a@b.com").await;

    let body = r#"{"email":"a@b.com","password":"nope"}"#;
    let resp = send(&mut app, json_request("POST", "/api/auth/login", None, body)).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_text(resp).await, "Invalid credentials");
}

#[tokio::test]
async fn todos_require_bearer_token() {
    let resp = app()
        .oneshot(bare_request("GET", "/api/todos", None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_text(resp).await, "Authorization header is required");

    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/api/todos")
                .header(http::header::AUTHORIZATION, "Token abc")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_text(resp).await, "Invalid authorization format");

    let resp = app()
        .oneshot(bare_request("GET", "/api/todos", Some("unknown")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_text(resp).await, "Invalid or expired token");
}

#[tokio::test]
async fn logout_revokes_token() {
    let mut app = app().into_service();
    let token = register(&mut app, "a@b.com").await;

    let resp = send(&mut app, bare_request("POST", "/api/auth/logout", Some(&token))).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = send(&mut app, bare_request("GET", "/api/todos", Some(&token))).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// --- todos ---

#[tokio::test]
async fn create_todo_requires_title() {
    let mut app = app().into_service();
    let token = register(&mut app, "a@b.com").await;

    let resp = send(
        &mut app,
        json_request("POST", "/api/todos", Some(&token), r#"{"title":""}"#),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(resp).await, "Title is required");
}

#[tokio::test]
async fn get_todo_bad_uuid_returns_400() {
    let mut app = app().into_service();
    let token = register(&mut app, "a@b.com").await;

    let resp = send(&mut app, bare_request("GET", "/api/todos/not-a-uuid", Some(&token))).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn todos_are_private_to_their_owner() {
    let mut app = app().into_service();
    let ann = register(&mut app, "ann@b.com").await;
    let bob = register(&mut app, "bob@b.com").await;

    let resp = send(
        &mut app,
        json_request("POST", "/api/todos", Some(&ann), r#"{"title":"Secret"}"#),
    )
    .await;
    let created: Todo = body_json(resp).await;

    let resp = send(&mut app, bare_request("GET", "/api/todos", Some(&bob))).await;
    let todos: Vec<Todo> = body_json(resp).await;
    assert!(todos.is_empty());

    let uri = format!("/api/todos/{}", created.id);
    let resp = send(&mut app, bare_request("DELETE", &uri, Some(&bob))).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_is_newest_first() {
    let mut app = app().into_service();
    let token = register(&mut app, "a@b.com").await;

    for title in ["first", "second"] {
        let body = format!(r#"{{"title":"{title}"}}"#);
        let resp = send(&mut app, json_request("POST", "/api/todos", Some(&token), &body)).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let resp = send(&mut app, bare_request("GET", "/api/todos", Some(&token))).await;
    let todos: Vec<Todo> = body_json(resp).await;
    let titles: Vec<&str> = todos.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, ["second", "first"]);
}

// --- full CRUD lifecycle ---

#[tokio::test]
async fn crud_lifecycle() {
    let mut app = app().into_service();
    let token = register(&mut app, "a@b.com").await;
    let token = Some(token.as_str());

    // create
    let resp = send(
        &mut app,
        json_request(
            "POST",
            "/api/todos",
            token,
            r#"{"title":"Walk dog","description":"Around the block"}"#,
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Todo = body_json(resp).await;
    assert_eq!(created.title, "Walk dog");
    assert_eq!(created.description, "Around the block");
    assert!(!created.completed);
    let id = created.id;
    let uri = format!("/api/todos/{id}");

    // get
    let resp = send(&mut app, bare_request("GET", &uri, token)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let fetched: Todo = body_json(resp).await;
    assert_eq!(fetched.id, id);

    // update: only completed
    let resp = send(&mut app, json_request("PUT", &uri, token, r#"{"completed":true}"#)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Todo = body_json(resp).await;
    assert_eq!(updated.title, "Walk dog");
    assert!(updated.completed);

    // update: empty strings leave fields unchanged
    let resp = send(
        &mut app,
        json_request("PUT", &uri, token, r#"{"title":"Walk cat","description":""}"#),
    )
    .await;
    let updated: Todo = body_json(resp).await;
    assert_eq!(updated.title, "Walk cat");
    assert_eq!(updated.description, "Around the block");
    assert!(updated.completed);

    // delete
    let resp = send(&mut app, bare_request("DELETE", &uri, token)).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());

    // get after delete
    let resp = send(&mut app, bare_request("GET", &uri, token)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // list after delete
    let resp = send(&mut app, bare_request("GET", "/api/todos", token)).await;
    let todos: Vec<Todo> = body_json(resp).await;
    assert!(todos.is_empty());
}
