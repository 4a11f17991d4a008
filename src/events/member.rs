use crate::{
  BotData,
  BotError,
  internals::platform::SerenityPlatform
};

use {
  poise::serenity_prelude::{
    Context,
    Member
  },
  tracing::info
};

pub async fn on_guild_member_addition(
  ctx: &Context,
  data: &BotData,
  new_member: &Member
) -> Result<(), BotError> {
  let platform = SerenityPlatform::from(ctx);

  match data.invite_data.on_member_join(&platform, new_member.guild_id).await? {
    Some(code) => info!(
      "GuildMemberAddition[Info] {} joined {} through invite {code}",
      new_member.user.tag(),
      new_member.guild_id
    ),
    None => info!(
      "GuildMemberAddition[Info] {} joined {}, invite could not be determined",
      new_member.user.tag(),
      new_member.guild_id
    )
  }

  Ok(())
}
