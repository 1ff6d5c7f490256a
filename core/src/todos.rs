//! Todo Collection Client: the list, the draft, and the inline-edit slot.
//!
//! # Design
//! The server is the source of truth. Every successful mutation is followed by
//! a full `fetch_all`; nothing is patched into `items` locally, so there is no
//! rollback path. Each network operation clears the previous error, brackets
//! the call with `loading`, and on failure records a display message while
//! leaving the rest of the state as it was.

use tracing::{debug, warn};
use uuid::Uuid;

use crate::client::TodoClient;
use crate::error::{ApiError, ClientError};
use crate::http::{HttpRequest, HttpResponse};
use crate::session::Session;
use crate::transport::Transport;
use crate::types::{CreateTodo, Draft, EditBuffer, Todo, UpdateTodo};

pub const TITLE_REQUIRED: &str = "Title is required";
const LOAD_FAILED: &str = "Failed to load todos. Please try again.";
const CREATE_FAILED: &str = "Failed to add todo. Please try again.";
const UPDATE_FAILED: &str = "Failed to update todo. Please try again.";
const DELETE_FAILED: &str = "Failed to delete todo. Please try again.";

pub struct TodoCollection<T> {
    client: TodoClient,
    transport: T,
    items: Vec<Todo>,
    editing_id: Option<Uuid>,
    draft: Draft,
    edit_buffer: EditBuffer,
    loading: bool,
    error: Option<String>,
}

impl<T: Transport> TodoCollection<T> {
    pub fn new(client: TodoClient, transport: T) -> Self {
        Self {
            client,
            transport,
            items: Vec::new(),
            editing_id: None,
            draft: Draft::default(),
            edit_buffer: EditBuffer::default(),
            loading: false,
            error: None,
        }
    }

    /// Items in server order.
    pub fn items(&self) -> &[Todo] {
        &self.items
    }

    pub fn editing_id(&self) -> Option<Uuid> {
        self.editing_id
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut Draft {
        &mut self.draft
    }

    pub fn edit_buffer(&self) -> &EditBuffer {
        &self.edit_buffer
    }

    pub fn edit_buffer_mut(&mut self) -> &mut EditBuffer {
        &mut self.edit_buffer
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Replace `items` with the server's list. On failure the previous items
    /// stay in place.
    pub fn fetch_all(&mut self, session: &Session) -> Result<&[Todo], ClientError> {
        let request = self.client.build_list_todos(session);
        let todos = self.exchange(Ok(request), TodoClient::parse_list_todos, LOAD_FAILED)?;
        debug!(count = todos.len(), "loaded todos");
        self.items = todos;
        Ok(&self.items)
    }

    /// Create a todo, then reload the list.
    pub fn create(
        &mut self,
        session: &Session,
        title: &str,
        description: &str,
    ) -> Result<(), ClientError> {
        self.require_title(title)?;
        let input = CreateTodo {
            title: title.to_string(),
            description: description.to_string(),
        };
        let request = self.client.build_create_todo(session, &input);
        self.exchange(request, TodoClient::parse_create_todo, CREATE_FAILED)?;
        self.draft = Draft::default();
        self.reload(session)
    }

    /// `create` from the current draft.
    pub fn submit_draft(&mut self, session: &Session) -> Result<(), ClientError> {
        let Draft { title, description } = self.draft.clone();
        self.create(session, &title, &description)
    }

    /// Apply `fields` to the todo `id`, then reload the list.
    ///
    /// A title, when present, must not be blank.
    pub fn update(
        &mut self,
        session: &Session,
        id: Uuid,
        fields: &UpdateTodo,
    ) -> Result<(), ClientError> {
        self.send_update(session, id, fields)?;
        if self.editing_id == Some(id) {
            self.clear_edit();
        }
        self.reload(session)
    }

    /// Save the edit buffer as a full-form update of the item under edit.
    pub fn save_edit(&mut self, session: &Session) -> Result<(), ClientError> {
        let Some(id) = self.editing_id else {
            let err = ClientError::Validation("No todo is being edited".to_string());
            self.error = Some(err.message().to_string());
            return Err(err);
        };
        let fields = UpdateTodo::from(&self.edit_buffer);
        self.update(session, id, &fields)
    }

    pub fn delete(&mut self, session: &Session, id: Uuid) -> Result<(), ClientError> {
        let request = self.client.build_delete_todo(session, id);
        self.exchange(Ok(request), TodoClient::parse_delete_todo, DELETE_FAILED)?;
        if self.editing_id == Some(id) {
            self.clear_edit();
        }
        self.reload(session)
    }

    /// Flip `completed`, sending no other field. An open editor is left alone,
    /// even on the same item.
    pub fn toggle_complete(&mut self, session: &Session, item: &Todo) -> Result<(), ClientError> {
        self.send_update(session, item.id, &UpdateTodo::completed(!item.completed))?;
        self.reload(session)
    }

    fn send_update(
        &mut self,
        session: &Session,
        id: Uuid,
        fields: &UpdateTodo,
    ) -> Result<(), ClientError> {
        if let Some(title) = &fields.title {
            self.require_title(title)?;
        }
        let request = self.client.build_update_todo(session, id, fields);
        self.exchange(request, TodoClient::parse_update_todo, UPDATE_FAILED)?;
        Ok(())
    }

    pub fn begin_edit(&mut self, item: &Todo) {
        self.editing_id = Some(item.id);
        self.edit_buffer = EditBuffer::from(item);
    }

    pub fn cancel_edit(&mut self) {
        self.clear_edit();
    }

    fn clear_edit(&mut self) {
        self.editing_id = None;
        self.edit_buffer = EditBuffer::default();
    }

    fn require_title(&mut self, title: &str) -> Result<(), ClientError> {
        if title.trim().is_empty() {
            self.error = Some(TITLE_REQUIRED.to_string());
            return Err(ClientError::Validation(TITLE_REQUIRED.to_string()));
        }
        Ok(())
    }

    fn reload(&mut self, session: &Session) -> Result<(), ClientError> {
        self.fetch_all(session).map(|_| ())
    }

    /// Execute one request with the error/loading bookkeeping every
    /// operation shares.
    fn exchange<R>(
        &mut self,
        request: Result<HttpRequest, ApiError>,
        parse: fn(&TodoClient, HttpResponse) -> Result<R, ApiError>,
        fallback: &str,
    ) -> Result<R, ClientError> {
        self.error = None;
        self.loading = true;
        let outcome = request
            .and_then(|req| self.transport.execute(req))
            .and_then(|response| parse(&self.client, response));
        self.loading = false;

        outcome.map_err(|e| {
            warn!("todo request failed: {e}");
            let err = ClientError::from_api(&e, fallback);
            self.error = Some(err.message().to_string());
            err
        })
    }
}
