//! PostgREST access to the `todos` relation.

use crate::client::SupabaseClient;
use reqwest::{header, Method, RequestBuilder};
use serde_json::json;
use std::future::Future;
use todos::{NewTodo, Todo, TodoError, TodoId, TodoRepository, UserId};

/// Ask PostgREST to return the written rows
const RETURN_REPRESENTATION: &str = "return=representation";

/// Ask PostgREST for nothing back
const RETURN_MINIMAL: &str = "return=minimal";

/// Ask PostgREST for exactly one row as a bare object
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

/// The `todos` relation of a Supabase project
///
/// Requests run with the client's session, so row-level security scopes
/// every call to the signed-in user.
#[derive(Clone, Debug)]
pub struct SupabaseTodoRepository {
    client: SupabaseClient,
}

impl SupabaseTodoRepository {
    /// Repository using `client` and its session
    #[must_use]
    pub const fn new(client: SupabaseClient) -> Self {
        Self { client }
    }
}

fn relation(client: &SupabaseClient, method: Method) -> RequestBuilder {
    client.request(method, &client.config().rest_url("todos"))
}

/// Request for the single row with `id`
fn row(client: &SupabaseClient, method: Method, id: TodoId) -> RequestBuilder {
    relation(client, method).query(&[("id", format!("eq.{id}"))])
}

impl TodoRepository for SupabaseTodoRepository {
    fn list(&self, owner: UserId) -> impl Future<Output = todos::Result<Vec<Todo>>> + Send {
        let client = self.client.clone();

        async move {
            tracing::debug!(%owner, "Listing todos");
            client
                .send_authorized_json(move |client| {
                    relation(client, Method::GET).query(&[
                        ("select", "*".to_string()),
                        ("user_id", format!("eq.{owner}")),
                        ("order", "created_at.desc".to_string()),
                    ])
                })
                .await
                .map_err(TodoError::from)
        }
    }

    fn insert(&self, todo: NewTodo) -> impl Future<Output = todos::Result<Todo>> + Send {
        let client = self.client.clone();

        async move {
            tracing::debug!("Inserting todo");
            client
                .send_authorized_json(move |client| {
                    relation(client, Method::POST)
                        .query(&[("select", "*")])
                        .header("Prefer", RETURN_REPRESENTATION)
                        .header(header::ACCEPT, SINGLE_OBJECT)
                        .json(&todo)
                })
                .await
                .map_err(TodoError::from)
        }
    }

    fn set_completed(
        &self,
        id: TodoId,
        completed: bool,
    ) -> impl Future<Output = todos::Result<()>> + Send {
        let client = self.client.clone();

        async move {
            tracing::debug!(%id, completed, "Updating todo completion");
            client
                .send_authorized(move |client| {
                    row(client, Method::PATCH, id)
                        .header("Prefer", RETURN_MINIMAL)
                        .json(&json!({ "is_completed": completed }))
                })
                .await
                .map(drop)
                .map_err(TodoError::from)
        }
    }

    fn update_text(&self, id: TodoId, text: String) -> impl Future<Output = todos::Result<Todo>> + Send {
        let client = self.client.clone();

        async move {
            tracing::debug!(%id, "Updating todo text");
            client
                .send_authorized_json(move |client| {
                    row(client, Method::PATCH, id)
                        .query(&[("select", "*")])
                        .header("Prefer", RETURN_REPRESENTATION)
                        .header(header::ACCEPT, SINGLE_OBJECT)
                        .json(&json!({ "text": text }))
                })
                .await
                .map_err(TodoError::from)
        }
    }

    fn delete(&self, id: TodoId) -> impl Future<Output = todos::Result<()>> + Send {
        let client = self.client.clone();

        async move {
            tracing::debug!(%id, "Deleting todo");
            client
                .send_authorized(move |client| row(client, Method::DELETE, id))
                .await
                .map(drop)
                .map_err(TodoError::from)
        }
    }
}
