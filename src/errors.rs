use {
  crate::{
    BotData,
    BotError
  },
  poise::{
    FrameworkError,
    serenity_prelude::{
      self as serenity,
      GuildId
    }
  },
  thiserror::Error,
  tracing::{
    error,
    warn
  }
};

#[derive(Debug, Error)]
pub enum TrackerError {
  #[error("This command can only be used in a guild.")]
  NotInGuild,
  #[error("An error occurred while checking invitations.")]
  TargetNotFound,
  #[error("failed to fetch invites for guild {guild_id}")]
  Fetch {
    guild_id: GuildId,
    #[source]
    source:   serenity::Error
  }
}

impl TrackerError {
  /// Errors that are answered in chat instead of being treated as failures.
  pub fn is_user_facing(&self) -> bool { matches!(self, Self::NotInGuild | Self::TargetNotFound) }
}

async fn reply_ephemeral(
  ctx: poise::Context<'_, BotData, BotError>,
  content: String
) {
  if let Err(e) = ctx
    .send(poise::CreateReply::default().content(content).ephemeral(true))
    .await
  {
    error!("Poise[ReplyError] ({}): {e}", ctx.command().qualified_name);
  }
}

pub async fn fw_errors(error: FrameworkError<'_, BotData, BotError>) {
  match error {
    FrameworkError::Command { error, ctx, .. } => {
      if let Some(tracker_error) = error.downcast_ref::<TrackerError>().filter(|e| e.is_user_facing()) {
        // Deferred replies are answered through the same handle
        if let Err(e) = ctx.say(tracker_error.to_string()).await {
          error!("PoiseCommandError({}): {e}", ctx.command().qualified_name);
        }
        return;
      }

      error!("PoiseCommandError({}): {error:?}", ctx.command().qualified_name);
      reply_ephemeral(
        ctx,
        "Encountered an error during command execution, check the console for more details!".to_owned()
      )
      .await;
    },
    FrameworkError::CommandPanic { payload, ctx, .. } => {
      error!("PoiseCommandPanic({}): {payload:#?}", ctx.command().qualified_name);
      reply_ephemeral(
        ctx,
        "Encountered a panic during command execution, check the console for more details!".to_owned()
      )
      .await;
    },
    FrameworkError::ArgumentParse { error, ctx, input, .. } => {
      let input = input.unwrap_or_default();
      warn!("PoiseArgumentParse({}): {error} (input: {input})", ctx.command().qualified_name);
      reply_ephemeral(ctx, format!("Error parsing your input: {error}")).await;
    },
    FrameworkError::GuildOnly { ctx, .. } => reply_ephemeral(ctx, TrackerError::NotInGuild.to_string()).await,
    FrameworkError::EventHandler { error, event, .. } => {
      error!("EventHandler[{}] {error}", event.snake_case_name());
    },
    other => {
      if let Err(e) = poise::builtins::on_error(other).await {
        error!("PoiseOtherError: {e}");
      }
    }
  }
}
