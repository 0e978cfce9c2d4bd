//! Response bodies and the response envelope handlers return.

use serde::Serialize;
use serde_json::{json, Value};

use relmap_core::{PostId, ProfileId, RoleId, Todo, UserId};

use crate::error::DemoError;

/// `{"message": ...}` wrapper used by the relationship routes.
#[derive(Debug, Serialize)]
pub struct Message<T> {
    pub message: T,
}

#[derive(Debug, Serialize)]
pub struct PostSummary {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct NameOnly {
    pub name: String,
}

/// A user with everything reachable from it.
#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: UserId,
    pub name: String,
    pub profile_bio: Option<String>,
    pub posts: Vec<PostSummary>,
    pub roles: Vec<NameOnly>,
}

#[derive(Debug, Serialize)]
pub struct PostView {
    pub id: PostId,
    pub title: String,
    pub description: String,
    pub author_name: String,
}

#[derive(Debug, Serialize)]
pub struct RoleView {
    pub id: RoleId,
    pub name: String,
    pub users: Vec<NameOnly>,
}

#[derive(Debug, Serialize)]
pub struct ProfileView {
    pub id: ProfileId,
    pub bio: String,
    pub user_name: String,
}

/// The todo page: every todo, newest first, plus the one being edited.
#[derive(Debug, Serialize)]
pub struct TodoPage {
    pub todos: Vec<Todo>,
    pub edit_todo: Option<Todo>,
}

/// One-shot notification carried by a redirect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Flash {
    pub message: String,
    pub category: String,
}

impl Flash {
    pub fn success(message: &str) -> Self {
        Self {
            message: message.to_string(),
            category: "success".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Json(Value),
    Text(String),
    Redirect {
        location: String,
        flash: Option<Flash>,
    },
}

/// What a handler produces: a status and a body.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub body: Body,
}

impl Response {
    pub fn json(value: &impl Serialize) -> crate::error::Result<Self> {
        Ok(Self {
            status: 200,
            body: Body::Json(serde_json::to_value(value)?),
        })
    }

    pub fn text(text: &str) -> Self {
        Self {
            status: 200,
            body: Body::Text(text.to_string()),
        }
    }

    pub fn redirect(location: &str, flash: Option<Flash>) -> Self {
        Self {
            status: 302,
            body: Body::Redirect {
                location: location.to_string(),
                flash,
            },
        }
    }

    pub fn is_success(&self) -> bool {
        self.status < 400
    }

    /// Render the body as it would go over the wire.
    pub fn render(&self) -> String {
        match &self.body {
            Body::Json(value) => value.to_string(),
            Body::Text(text) => text.clone(),
            Body::Redirect { location, flash } => {
                json!({ "redirect": location, "flash": flash }).to_string()
            }
        }
    }
}

impl From<DemoError> for Response {
    fn from(err: DemoError) -> Self {
        let status = err.status();
        if status >= 500 {
            tracing::error!(error = %err, "Request failed");
        } else {
            tracing::debug!(status, error = %err, "Request rejected");
        }
        Self {
            status,
            body: Body::Json(json!({ "error": err.to_string() })),
        }
    }
}
