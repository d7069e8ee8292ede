//! Headless View
//!
//! Renders the demo page as lines of text. The page is a tree of
//! [`Boundary`] scopes. A boundary collects the reads made by its subtree:
//!
//! - if any read is rejected, the whole subtree renders the error fallback
//!   (the error text itself is never shown);
//! - otherwise, if any read is pending, it renders the loading fallback;
//! - otherwise it renders its children.
//!
//! A nested boundary resolves its own subtree first, so a failure inside it
//! does not reach the parent.

use serde::{Deserialize, Serialize};

use crate::app::App;
use crate::reactive::Loadable;

/// Text shown in place of a subtree that cannot render yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Fallbacks {
    pub loading: String,
    pub error: String,
}

impl Default for Fallbacks {
    fn default() -> Self {
        Self {
            loading: "Loading...".to_string(),
            error: "Error!".to_string(),
        }
    }
}

/// A failure-isolation scope.
#[derive(Debug)]
pub struct Boundary<'f> {
    fallbacks: &'f Fallbacks,
    rejected: bool,
    pending: bool,
    lines: Vec<String>,
}

impl<'f> Boundary<'f> {
    pub fn new(fallbacks: &'f Fallbacks) -> Self {
        Self {
            fallbacks,
            rejected: false,
            pending: false,
            lines: Vec::new(),
        }
    }

    /// Take part of this scope's outcome. Returns the value when resolved.
    pub fn consume<T>(&mut self, loadable: Loadable<T>) -> Option<T> {
        match loadable {
            Loadable::Resolved(value) => Some(value),
            Loadable::Pending => {
                self.pending = true;
                None
            }
            Loadable::Rejected(err) => {
                tracing::debug!(%err, "boundary caught a rejection");
                self.rejected = true;
                None
            }
        }
    }

    pub fn line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// Render `child` in place. Its state stays inside it.
    pub fn nest(&mut self, child: Boundary<'_>) {
        self.lines.extend(child.render());
    }

    pub fn render(self) -> Vec<String> {
        if self.rejected {
            vec![self.fallbacks.error.clone()]
        } else if self.pending {
            vec![self.fallbacks.loading.clone()]
        } else {
            self.lines
        }
    }
}

/// Render the demo page: the pinned users, the search box and the current
/// user with their friends, all inside one boundary.
pub fn render_app(app: &App) -> Vec<String> {
    let store = app.store();
    let queries = app.queries();
    let mut page = Boundary::new(&app.config().fallbacks);

    for &id in &app.config().pinned_users {
        if let Some(name) = page.consume(store.read_family(&queries.user_name, id)) {
            page.line(name);
        }
    }

    page.line("[search]");

    let user = page.consume(store.read(&queries.current_user_info));
    let friends = page.consume(store.read(&queries.friends_info));
    if let (Some(Some(user)), Some(friends)) = (user, friends) {
        page.line(format!("# {}", user.name));
        for friend in friends {
            page.line(format!("- {}", friend.name));
        }
    }

    page.render()
}
