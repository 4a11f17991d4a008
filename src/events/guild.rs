use crate::{
  BotData,
  BotError,
  internals::platform::SerenityPlatform
};

use {
  poise::serenity_prelude::{
    Context,
    Guild,
    UnavailableGuild
  },
  tracing::debug
};

/// Startup and reconnects replay GuildCreate for guilds we're already in.
fn is_join(is_new: Option<bool>) -> bool { is_new != Some(false) }

/// An unavailable guild is an outage, not a removal.
fn is_removal(unavailable: bool) -> bool { !unavailable }

pub async fn on_guild_create(
  ctx: &Context,
  data: &BotData,
  guild: &Guild,
  is_new: Option<bool>
) -> Result<(), BotError> {
  if !is_join(is_new) {
    return Ok(());
  }

  debug!("GuildCreate[Debug] Joined {} ({})", guild.name, guild.id);
  let platform = SerenityPlatform::from(ctx);
  data.invite_data.on_guild_join(&platform, guild.id).await?;

  Ok(())
}

pub async fn on_guild_delete(
  data: &BotData,
  incomplete: &UnavailableGuild
) {
  if !is_removal(incomplete.unavailable) {
    return;
  }

  debug!("GuildDelete[Debug] Left {}", incomplete.id);
  data.invite_data.on_guild_leave(incomplete.id).await;
}
