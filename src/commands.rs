use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use tracing::debug;

use crate::config::Config;
use crate::db::{Database, User};
use crate::error::CommandError;
use crate::fetcher::Fetcher;
use crate::handlers;
use crate::middleware;

/// Everything a handler may read or mutate during one invocation.
pub struct State {
    pub config: Config,
    /// Where `config` is rewritten when the current user changes
    pub config_path: PathBuf,
    pub db: Database,
    pub fetcher: Fetcher,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub name: String,
    pub args: Vec<String>,
}

impl Command {
    pub fn new<I, S>(name: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.to_string(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = anyhow::Result<()>> + 'a>>;

pub type PlainHandler = for<'a> fn(&'a mut State, &'a Command) -> HandlerFuture<'a>;

pub type UserHandler = for<'a> fn(&'a mut State, &'a Command, User) -> HandlerFuture<'a>;

#[derive(Clone, Copy)]
pub enum Handler {
    Plain(PlainHandler),
    /// Runs only once the current user has been resolved
    LoggedIn(UserHandler),
}

#[derive(Default)]
pub struct Commands {
    registered: HashMap<String, Handler>,
}

impl Commands {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in command.
    pub fn default_registry() -> Self {
        let mut commands = Self::new();
        commands.register("login", Handler::Plain(handlers::login));
        commands.register("register", Handler::Plain(handlers::register));
        commands.register("reset", Handler::Plain(handlers::reset));
        commands.register("users", Handler::Plain(handlers::users));
        commands.register("agg", Handler::Plain(handlers::agg));
        commands.register("feeds", Handler::Plain(handlers::feeds));
        commands.register("addfeed", Handler::LoggedIn(handlers::add_feed));
        commands
    }

    /// Replaces any handler already registered under `name`.
    pub fn register(&mut self, name: &str, handler: Handler) {
        self.registered.insert(name.to_string(), handler);
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.registered.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub async fn run(&self, state: &mut State, cmd: &Command) -> anyhow::Result<()> {
        let Some(handler) = self.registered.get(&cmd.name).copied() else {
            debug!("Unknown command: {}", cmd.name);
            return Err(CommandError::NotFound(cmd.name.clone()).into());
        };

        debug!("Dispatching '{}' with {} args", cmd.name, cmd.args.len());
        match handler {
            Handler::Plain(f) => f(state, cmd).await,
            Handler::LoggedIn(f) => middleware::logged_in(state, cmd, f).await,
        }
    }
}
