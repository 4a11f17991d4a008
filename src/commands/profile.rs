use crate::{
  BotError,
  internals::utils::{
    format_timestamp,
    resolve_target,
    time_in_guild
  }
};

use poise::serenity_prelude::{
  CreateEmbed,
  Timestamp
};

/// Show when a member joined and how long they've been around
#[poise::command(slash_command, guild_only)]
pub async fn profile(
  ctx: super::PoiseContext<'_>,
  #[description = "Member to look up (defaults to you)"] target: Option<String>
) -> Result<(), BotError> {
  ctx.defer().await?;

  let member = resolve_target(ctx, target).await?;

  let (join_date, tenure) = match member.joined_at {
    Some(joined) => {
      let (days, hours) = time_in_guild(joined.unix_timestamp(), Timestamp::now().unix_timestamp());
      (
        format_timestamp(joined.unix_timestamp()),
        format!("{days} day(s) and {hours} hour(s)")
      )
    },
    None => ("Unknown".to_owned(), "Unknown".to_owned())
  };

  let embed = CreateEmbed::new()
    .color(ctx.data().config.embed_colors.primary)
    .thumbnail(member.user.face())
    .field("Username", member.user.tag(), false)
    .field("Join date", join_date, false)
    .field("Time in guild", tenure, false);

  ctx.send(poise::CreateReply::default().embed(embed)).await?;

  Ok(())
}
