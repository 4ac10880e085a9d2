use anyhow::Context;
use tracing::debug;

use crate::commands::{Command, State, UserHandler};
use crate::error::CommandError;

/// Resolves the configured current user and hands it to `handler`.
/// The handler never runs if the user can't be resolved.
pub async fn logged_in(
    state: &mut State,
    cmd: &Command,
    handler: UserHandler,
) -> anyhow::Result<()> {
    let name = state.config.current_user_name.clone();
    if name.is_empty() {
        return Err(CommandError::NotLoggedIn.into());
    }

    let user = state
        .db
        .get_user_by_name(&name)
        .await
        .with_context(|| format!("couldn't resolve current user {}", name))?
        .ok_or_else(|| CommandError::UserNotFound(name.clone()))
        .with_context(|| format!("couldn't resolve current user {}", name))?;

    debug!("Resolved current user {} ({})", user.name, user.id);
    handler(state, cmd, user).await
}
