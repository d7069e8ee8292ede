//! Demo Application
//!
//! A user directory built on the graph: an atom for the selected user,
//! lookups of user records through a [`DataSource`], and a friends list
//! that fans out one lookup per friend.
//!
//! ```text
//! current_user_id ──► current_user_name
//!        │
//!        └──────────► current_user_info ──► friends_info
//!                           │                    │
//!                           ▼                    ▼
//!                   user_info(id)        user_info(friend) × n
//! ```

use std::sync::Arc;

use crate::config::Config;
use crate::error::{AppError, NodeError};
use crate::graph::{AggregateMode, EntryState, Store};
use crate::reactive::{Atom, Selector, SelectorFamily};
use crate::source::{DataSource, Record, SimulatedDb, UserId};

/// The node declarations of the demo graph.
#[derive(Debug, Clone)]
pub struct Queries {
    pub current_user_id: Atom<Option<UserId>>,
    pub current_user_name: Selector<Option<String>>,
    pub user_name: SelectorFamily<UserId, String>,
    pub user_info: SelectorFamily<UserId, Record>,
    pub current_user_info: Selector<Option<Record>>,
    pub friends_info: Selector<Vec<Record>>,
}

impl Queries {
    pub fn new(source: Arc<dyn DataSource>, mode: AggregateMode) -> Self {
        let current_user_id: Atom<Option<UserId>> = Atom::new("current_user_id", None);

        let current_user_name = {
            let source = Arc::clone(&source);
            let current_user_id = current_user_id.clone();
            Selector::new("current_user_name", move |ctx| {
                let id = ctx.get_atom(&current_user_id);
                let source = Arc::clone(&source);
                async move {
                    let Some(id) = id? else {
                        return Ok(None);
                    };
                    let record = source.lookup(id).await.into_result()?;
                    Ok(Some(record.name))
                }
            })
        };

        let user_name = {
            let source = Arc::clone(&source);
            SelectorFamily::new("user_name", move |id: UserId, _ctx| {
                let lookup = source.lookup(id);
                async move { Ok(lookup.await.into_result()?.name) }
            })
        };

        let user_info = {
            let source = Arc::clone(&source);
            SelectorFamily::new("user_info", move |id: UserId, _ctx| {
                let lookup = source.lookup(id);
                async move { lookup.await.into_result() }
            })
        };

        let current_user_info = {
            let current_user_id = current_user_id.clone();
            let user_info = user_info.clone();
            Selector::new("current_user_info", move |ctx| {
                let id = ctx.get_atom(&current_user_id);
                let user_info = user_info.clone();
                async move {
                    match id? {
                        Some(id) => Ok(Some(ctx.get_family(&user_info, id).await?)),
                        None => Ok(None),
                    }
                }
            })
        };

        let friends_info = {
            let current_user_info = current_user_info.clone();
            let user_info = user_info.clone();
            Selector::new("friends_info", move |ctx| {
                let current_user_info = current_user_info.clone();
                let user_info = user_info.clone();
                async move {
                    let Some(user) = ctx.get(&current_user_info).await? else {
                        return Ok(Vec::new());
                    };
                    let friends: Vec<_> = user.friends.iter().map(|&id| user_info.at(id)).collect();
                    ctx.aggregate(&friends, mode).await
                }
            })
        };

        Self {
            current_user_id,
            current_user_name,
            user_name,
            user_info,
            current_user_info,
            friends_info,
        }
    }
}

/// The demo application: a store, the graph declarations and the handlers
/// for user input.
#[derive(Debug)]
pub struct App {
    config: Config,
    store: Store,
    queries: Queries,
}

impl App {
    /// An app backed by a [`SimulatedDb`] built from `config`.
    pub fn new(config: Config) -> Self {
        let source = Arc::new(SimulatedDb::from_config(&config));
        Self::with_source(config, source)
    }

    pub fn with_source(config: Config, source: Arc<dyn DataSource>) -> Self {
        let queries = Queries::new(source, config.aggregate_mode);
        Self {
            config,
            store: Store::new(),
            queries,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn queries(&self) -> &Queries {
        &self.queries
    }

    /// Handle the search box: parse `input` as a user id and select it.
    /// Nothing is written when the input is not an id.
    pub fn search(&self, input: &str) -> Result<UserId, AppError> {
        let id = input
            .trim()
            .parse::<UserId>()
            .map_err(|_| AppError::InvalidUserId(input.to_string()))?;
        self.set_current_user(id);
        Ok(id)
    }

    /// Handle a click on a friend.
    pub fn select_friend(&self, id: UserId) {
        self.set_current_user(id);
    }

    /// Start loading `id`'s record, then select it. Returns the state of the
    /// record at the time of the switch.
    pub fn change_user(&self, id: UserId) -> EntryState {
        let state = self.store.prefetch(&self.queries.user_info.at(id));
        self.set_current_user(id);
        state
    }

    /// Name of the selected user, waiting for the lookup.
    pub async fn current_user_name(&self) -> Result<Option<String>, NodeError> {
        self.store.resolve(&self.queries.current_user_name).await
    }

    /// The page as it looks right now.
    pub fn render(&self) -> Vec<String> {
        crate::view::render_app(self)
    }

    fn set_current_user(&self, id: UserId) {
        tracing::debug!(id, "current user changed");
        self.store.write_atom(&self.queries.current_user_id, Some(id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::Loadable;
    use std::time::Duration;

    fn app(delay_ms: u64) -> (App, Arc<SimulatedDb>) {
        let config = Config {
            fetch_delay_ms: delay_ms,
            ..Config::default()
        };
        let db = Arc::new(SimulatedDb::from_config(&config));
        (App::with_source(config, db.clone()), db)
    }

    #[test]
    fn search_rejects_non_numeric_input() {
        let (app, _) = app(10);

        assert_eq!(app.search("abc"), Err(AppError::InvalidUserId("abc".into())));
        assert_eq!(app.store().read_atom(&app.queries().current_user_id), None);

        assert_eq!(app.search(" 4 "), Ok(4));
        assert_eq!(app.store().read_atom(&app.queries().current_user_id), Some(4));
    }

    #[test]
    fn no_selected_user_means_no_lookups() {
        let (app, db) = app(10);
        let queries = app.queries();

        assert_eq!(app.store().read(&queries.current_user_info), Loadable::Resolved(None));
        assert_eq!(app.store().read(&queries.friends_info), Loadable::Resolved(vec![]));
        assert_eq!(db.lookups(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn change_user_prefetches_the_record() {
        let (app, db) = app(100);
        let queries = app.queries();

        assert_eq!(app.change_user(2), EntryState::Pending);
        assert_eq!(db.lookups(), 1);

        // The dependent read joins the lookup already in flight.
        assert!(app.store().read(&queries.current_user_info).is_pending());
        assert_eq!(db.lookups(), 1);

        tokio::time::sleep(Duration::from_millis(150)).await;
        let user = app.store().read(&queries.current_user_info).into_value().flatten();
        assert_eq!(user.map(|user| user.name), Some("Name of 2".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn friends_are_fetched_concurrently() {
        let (app, db) = app(100);
        let queries = app.queries();
        app.select_friend(1);

        let friends = app.store().resolve(&queries.friends_info).await.unwrap();

        let names: Vec<_> = friends.iter().map(|friend| friend.name.as_str()).collect();
        assert_eq!(names, ["Name of 1", "Name of 2", "Name of 3", "Name of 4"]);
        // user_info(1) is shared by the current user and the first friend.
        assert_eq!(db.lookups(), 4);
    }
}
