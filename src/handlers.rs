//! Command handlers.
//!
//! Each command is an `async fn` taking the shared [`State`]; the boxed
//! wrappers below give them the fn-pointer shape the registry stores.

use anyhow::Context;
use tracing::info;

use crate::commands::{Command, HandlerFuture, State};
use crate::db::{AddFeedParams, CreateUserParams, Feed, User};
use crate::error::CommandError;

/// Feed fetched by `agg`.
pub const AGG_FEED_URL: &str = "https://www.wagslane.dev/index.xml";

pub fn login<'a>(state: &'a mut State, cmd: &'a Command) -> HandlerFuture<'a> {
    Box::pin(handle_login(state, cmd))
}

pub fn register<'a>(state: &'a mut State, cmd: &'a Command) -> HandlerFuture<'a> {
    Box::pin(handle_register(state, cmd))
}

pub fn reset<'a>(state: &'a mut State, cmd: &'a Command) -> HandlerFuture<'a> {
    Box::pin(handle_reset(state, cmd))
}

pub fn users<'a>(state: &'a mut State, cmd: &'a Command) -> HandlerFuture<'a> {
    Box::pin(handle_users(state, cmd))
}

pub fn agg<'a>(state: &'a mut State, cmd: &'a Command) -> HandlerFuture<'a> {
    Box::pin(handle_agg(state, cmd))
}

pub fn feeds<'a>(state: &'a mut State, cmd: &'a Command) -> HandlerFuture<'a> {
    Box::pin(handle_feeds(state, cmd))
}

pub fn add_feed<'a>(state: &'a mut State, cmd: &'a Command, user: User) -> HandlerFuture<'a> {
    Box::pin(handle_add_feed(state, cmd, user))
}

pub async fn handle_login(state: &mut State, cmd: &Command) -> anyhow::Result<()> {
    let name = match cmd.args.as_slice() {
        [name] if !name.trim().is_empty() => name,
        _ => return Err(CommandError::usage(&cmd.name, "<name>").into()),
    };

    match state.db.get_user_by_name(name).await {
        Ok(Some(_)) => {}
        Ok(None) => return Err(CommandError::UserNotFound(name.clone()).into()),
        Err(e) => return Err(e.context(CommandError::UserNotFound(name.clone()))),
    }

    state
        .config
        .set_user(name, &state.config_path)
        .context("couldn't set current user")?;

    info!("Logged in as {}", name);
    println!("Username {} set", name);
    Ok(())
}

pub async fn handle_register(state: &mut State, cmd: &Command) -> anyhow::Result<()> {
    let Some(name) = cmd.args.first().filter(|n| !n.trim().is_empty()) else {
        return Err(CommandError::usage(&cmd.name, "<name>").into());
    };

    let existing = state
        .db
        .get_user_by_name(name)
        .await
        .with_context(|| format!("couldn't get user {}", name))?;
    if existing.is_some() {
        return Err(CommandError::UserExists(name.clone()).into());
    }

    let user = state
        .db
        .create_user(&CreateUserParams::new(name))
        .await
        .with_context(|| format!("couldn't create user {}", name))?;

    state
        .config
        .set_user(&user.name, &state.config_path)
        .context("couldn't set current user")?;

    info!("Registered user {} ({})", user.name, user.id);
    println!("User created: {:?}", user);
    Ok(())
}

pub async fn handle_reset(state: &mut State, _cmd: &Command) -> anyhow::Result<()> {
    let deleted = state
        .db
        .delete_users()
        .await
        .context("couldn't truncate users table")?;

    info!("Deleted {} users", deleted);
    println!("Database reset: {} users deleted", deleted);
    Ok(())
}

pub async fn handle_users(state: &mut State, _cmd: &Command) -> anyhow::Result<()> {
    let users = state.db.get_users().await.context("couldn't get users")?;

    for row in user_rows(&users, &state.config.current_user_name) {
        println!("{}", row);
    }
    Ok(())
}

/// One `* name` line per user, in listing order; the current user's line
/// ends with ` (current)`.
pub fn user_rows(users: &[User], current_user_name: &str) -> Vec<String> {
    users
        .iter()
        .map(|u| {
            if u.name == current_user_name {
                format!("* {} (current)", u.name)
            } else {
                format!("* {}", u.name)
            }
        })
        .collect()
}

pub async fn handle_agg(state: &mut State, _cmd: &Command) -> anyhow::Result<()> {
    let feed = state
        .fetcher
        .fetch_feed(AGG_FEED_URL)
        .await
        .with_context(|| format!("couldn't fetch feed {}", AGG_FEED_URL))?;

    println!("{:#?}", feed);
    Ok(())
}

pub async fn handle_feeds(state: &mut State, _cmd: &Command) -> anyhow::Result<()> {
    let feeds = state.db.get_feeds().await.context("couldn't get feeds")?;

    for feed in feeds {
        let owner = state
            .db
            .get_user(feed.user_id)
            .await
            .with_context(|| format!("couldn't get owner of feed {}", feed.name))?;
        for line in feed_lines(&feed, &owner) {
            println!("{}", line);
        }
    }
    Ok(())
}

pub fn feed_lines(feed: &Feed, owner: &User) -> [String; 3] {
    [
        format!("feed name: {}", feed.name),
        format!("feed url: {}", feed.url),
        format!("feed user name: {}", owner.name),
    ]
}

pub async fn handle_add_feed(state: &mut State, cmd: &Command, user: User) -> anyhow::Result<()> {
    let [name, url] = cmd.args.as_slice() else {
        return Err(CommandError::usage(&cmd.name, "<name> <url>").into());
    };

    let feed = state
        .db
        .add_feed(&AddFeedParams::new(name, url, user.id))
        .await
        .with_context(|| format!("couldn't create feed {}", name))?;

    info!("User {} added feed {} ({})", user.name, feed.name, feed.url);
    println!("Feed created: {:?}", feed);
    Ok(())
}
