mod guild;
mod invite;
mod member;
mod ready;

use {
  crate::{
    BotData,
    BotError
  },
  poise::{
    FrameworkContext,
    serenity_prelude::{
      Context,
      FullEvent
    }
  },
  tracing::trace
};

pub async fn dispatch(
  ctx: &Context,
  event: &FullEvent,
  _framework: FrameworkContext<'_, BotData, BotError>,
  data: &BotData
) -> Result<(), BotError> {
  trace!("Event[{}] received", event.snake_case_name());

  match event {
    FullEvent::Ready { data_about_bot, .. } => ready::on_ready(ctx, data_about_bot),
    FullEvent::GuildCreate { guild, is_new, .. } => guild::on_guild_create(ctx, data, guild, *is_new).await?,
    FullEvent::GuildDelete { incomplete, .. } => guild::on_guild_delete(data, incomplete).await,
    FullEvent::InviteCreate { data: invite, .. } => invite::on_invite_create(data, invite).await,
    FullEvent::InviteDelete { data: invite, .. } => invite::on_invite_delete(data, invite).await,
    FullEvent::GuildMemberAddition { new_member, .. } => member::on_guild_member_addition(ctx, data, new_member).await?,
    _ => ()
  }

  Ok(())
}
