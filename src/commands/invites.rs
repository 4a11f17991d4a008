use crate::{
  BotError,
  internals::{
    platform::SerenityPlatform,
    utils::resolve_target
  }
};

/// Show how many invites a member created and how often they were used
#[poise::command(slash_command, guild_only)]
pub async fn invites(
  ctx: super::PoiseContext<'_>,
  #[description = "Member to look up (defaults to you)"] target: Option<String>
) -> Result<(), BotError> {
  // First use may walk every guild's invite list
  ctx.defer().await?;

  let member = resolve_target(ctx, target).await?;
  let platform = SerenityPlatform::from(ctx.serenity_context());
  let summary = ctx
    .data()
    .invite_data
    .summary(&platform, member.guild_id, member.user.id)
    .await;

  ctx.say(summary.describe(&member.user.name)).await?;

  Ok(())
}
