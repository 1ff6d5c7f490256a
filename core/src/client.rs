//! Stateless HTTP request builder and response parser for the todo API.
//!
//! # Design
//! `TodoClient` holds only a `base_url` and carries no mutable state between
//! calls. Each operation is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`.
//! Authenticated builders take the caller's `Session` so the bearer header is
//! derived per request rather than installed globally.

use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::http::{auth_headers, json_headers, HttpMethod, HttpRequest, HttpResponse};
use crate::session::Session;
use crate::types::{CreateTodo, LoginRequest, RegisterRequest, Todo, TokenResponse, UpdateTodo};

/// Synchronous, stateless client for the todo API.
#[derive(Debug, Clone)]
pub struct TodoClient {
    base_url: String,
}

impl TodoClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // --- auth ---

    pub fn build_register(&self, input: &RegisterRequest) -> Result<HttpRequest, ApiError> {
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: format!("{}/api/auth/register", self.base_url),
            headers: json_headers(None),
            body: Some(to_json(input)?),
        })
    }

    pub fn build_login(&self, input: &LoginRequest) -> Result<HttpRequest, ApiError> {
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: format!("{}/api/auth/login", self.base_url),
            headers: json_headers(None),
            body: Some(to_json(input)?),
        })
    }

    pub fn build_logout(&self, session: &Session) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Post,
            path: format!("{}/api/auth/logout", self.base_url),
            headers: auth_headers(session),
            body: None,
        }
    }

    /// Parse the `{token}` body shared by register and login.
    pub fn parse_token(&self, response: HttpResponse) -> Result<TokenResponse, ApiError> {
        check_status(&response, 200)?;
        from_json(&response.body)
    }

    /// Any 2xx counts; the body is informational only.
    pub fn parse_logout(&self, response: HttpResponse) -> Result<(), ApiError> {
        if (200..300).contains(&response.status) {
            return Ok(());
        }
        Err(status_error(response))
    }

    // --- todos ---

    pub fn build_list_todos(&self, session: &Session) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: format!("{}/api/todos", self.base_url),
            headers: auth_headers(session),
            body: None,
        }
    }

    pub fn build_get_todo(&self, session: &Session, id: Uuid) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: format!("{}/api/todos/{id}", self.base_url),
            headers: auth_headers(session),
            body: None,
        }
    }

    pub fn build_create_todo(
        &self,
        session: &Session,
        input: &CreateTodo,
    ) -> Result<HttpRequest, ApiError> {
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: format!("{}/api/todos", self.base_url),
            headers: json_headers(Some(session)),
            body: Some(to_json(input)?),
        })
    }

    pub fn build_update_todo(
        &self,
        session: &Session,
        id: Uuid,
        input: &UpdateTodo,
    ) -> Result<HttpRequest, ApiError> {
        Ok(HttpRequest {
            method: HttpMethod::Put,
            path: format!("{}/api/todos/{id}", self.base_url),
            headers: json_headers(Some(session)),
            body: Some(to_json(input)?),
        })
    }

    pub fn build_delete_todo(&self, session: &Session, id: Uuid) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Delete,
            path: format!("{}/api/todos/{id}", self.base_url),
            headers: auth_headers(session),
            body: None,
        }
    }

    pub fn parse_list_todos(&self, response: HttpResponse) -> Result<Vec<Todo>, ApiError> {
        check_status(&response, 200)?;
        from_json(&response.body)
    }

    pub fn parse_get_todo(&self, response: HttpResponse) -> Result<Todo, ApiError> {
        check_status(&response, 200)?;
        from_json(&response.body)
    }

    pub fn parse_create_todo(&self, response: HttpResponse) -> Result<Todo, ApiError> {
        check_status(&response, 201)?;
        from_json(&response.body)
    }

    pub fn parse_update_todo(&self, response: HttpResponse) -> Result<Todo, ApiError> {
        check_status(&response, 200)?;
        from_json(&response.body)
    }

    pub fn parse_delete_todo(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, 204)?;
        Ok(())
    }
}

fn to_json<T: Serialize>(input: &T) -> Result<String, ApiError> {
    serde_json::to_string(input).map_err(|e| ApiError::SerializationError(e.to_string()))
}

fn from_json<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::DeserializationError(e.to_string()))
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse, expected: u16) -> Result<(), ApiError> {
    if response.status == expected {
        return Ok(());
    }
    Err(status_error(response.clone()))
}

fn status_error(response: HttpResponse) -> ApiError {
    match response.status {
        404 => ApiError::NotFound(response.body),
        401 => ApiError::Unauthorized(response.body),
        status => ApiError::HttpError {
            status,
            body: response.body,
        },
    }
}
