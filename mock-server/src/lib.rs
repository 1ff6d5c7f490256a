use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{FromRequestParts, Path, State},
    http::{header, request::Parts, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Todo {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub user_id: Uuid,
}

#[derive(Deserialize)]
pub struct CreateTodo {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Deserialize)]
pub struct UpdateTodo {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

struct User {
    id: Uuid,
    password: String,
}

#[derive(Default)]
pub struct Store {
    users: HashMap<String, User>,
    tokens: HashMap<String, Uuid>,
    todos: Vec<Todo>,
}

pub type Db = Arc<RwLock<Store>>;

type ApiRejection = (StatusCode, &'static str);

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/todos", get(list_todos).post(create_todo))
        .route(
            "/api/todos/{id}",
            get(get_todo).put(update_todo).delete(delete_todo),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// The caller behind a valid bearer token.
pub struct AuthUser {
    pub user_id: Uuid,
    pub token: String,
}

impl FromRequestParts<Db> for AuthUser {
    type Rejection = ApiRejection;

    async fn from_request_parts(parts: &mut Parts, db: &Db) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or((StatusCode::UNAUTHORIZED, "Authorization header is required"))?
            .to_str()
            .map_err(|_| (StatusCode::UNAUTHORIZED, "Invalid authorization format"))?;
        let token = value
            .strip_prefix("Bearer ")
            .ok_or((StatusCode::UNAUTHORIZED, "Invalid authorization format"))?;
        let user_id = db
            .read()
            .await
            .tokens
            .get(token)
            .copied()
            .ok_or((StatusCode::UNAUTHORIZED, "Invalid or expired token"))?;
        Ok(AuthUser {
            user_id,
            token: token.to_string(),
        })
    }
}

fn issue_token(store: &mut Store, user_id: Uuid) -> String {
    let token = Uuid::new_v4().simple().to_string();
    store.tokens.insert(token.clone(), user_id);
    token
}

async fn register(
    State(db): State<Db>,
    Json(input): Json<RegisterRequest>,
) -> Result<Json<TokenResponse>, ApiRejection> {
    if input.username.is_empty() || input.email.is_empty() || input.password.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Username, email, and password are required",
        ));
    }
    let mut store = db.write().await;
    if store.users.contains_key(&input.email) {
        return Err((StatusCode::CONFLICT, "User with this email already exists"));
    }
    let id = Uuid::new_v4();
    store.users.insert(
        input.email,
        User {
            id,
            password: input.password,
        },
    );
    tracing::info!(user = %id, "registered user");
    let token = issue_token(&mut store, id);
    Ok(Json(TokenResponse { token }))
}

async fn login(
    State(db): State<Db>,
    Json(input): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiRejection> {
    if input.email.is_empty() || input.password.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Email and password are required"));
    }
    let mut store = db.write().await;
    let id = match store.users.get(&input.email) {
        Some(user) if user.password == input.password => user.id,
        _ => return Err((StatusCode::UNAUTHORIZED, "Invalid credentials")),
    };
    let token = issue_token(&mut store, id);
    Ok(Json(TokenResponse { token }))
}

async fn logout(State(db): State<Db>, auth: AuthUser) -> Json<serde_json::Value> {
    db.write().await.tokens.remove(&auth.token);
    Json(serde_json::json!({ "message": "Successfully logged out" }))
}

async fn list_todos(State(db): State<Db>, auth: AuthUser) -> Json<Vec<Todo>> {
    let store = db.read().await;
    // Newest first.
    Json(
        store
            .todos
            .iter()
            .rev()
            .filter(|todo| todo.user_id == auth.user_id)
            .cloned()
            .collect(),
    )
}

async fn create_todo(
    State(db): State<Db>,
    auth: AuthUser,
    Json(input): Json<CreateTodo>,
) -> Result<(StatusCode, Json<Todo>), ApiRejection> {
    if input.title.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Title is required"));
    }
    let todo = Todo {
        id: Uuid::new_v4(),
        title: input.title,
        description: input.description,
        completed: false,
        user_id: auth.user_id,
    };
    db.write().await.todos.push(todo.clone());
    Ok((StatusCode::CREATED, Json(todo)))
}

async fn get_todo(
    State(db): State<Db>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Todo>, ApiRejection> {
    let store = db.read().await;
    store
        .todos
        .iter()
        .find(|todo| todo.id == id && todo.user_id == auth.user_id)
        .cloned()
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Todo not found"))
}

async fn update_todo(
    State(db): State<Db>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateTodo>,
) -> Result<Json<Todo>, ApiRejection> {
    let mut store = db.write().await;
    let todo = store
        .todos
        .iter_mut()
        .find(|todo| todo.id == id && todo.user_id == auth.user_id)
        .ok_or((StatusCode::NOT_FOUND, "Todo not found"))?;
    // Empty strings leave the field unchanged.
    if let Some(title) = input.title.filter(|t| !t.is_empty()) {
        todo.title = title;
    }
    if let Some(description) = input.description.filter(|d| !d.is_empty()) {
        todo.description = description;
    }
    if let Some(completed) = input.completed {
        todo.completed = completed;
    }
    Ok(Json(todo.clone()))
}

async fn delete_todo(
    State(db): State<Db>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiRejection> {
    let mut store = db.write().await;
    let index = store
        .todos
        .iter()
        .position(|todo| todo.id == id && todo.user_id == auth.user_id)
        .ok_or((StatusCode::NOT_FOUND, "Todo not found"))?;
    store.todos.remove(index);
    Ok(StatusCode::NO_CONTENT)
}
