use crate::{
  BotData,
  internals::invite_data::InvitationRecord
};

use poise::serenity_prelude::{
  InviteCreateEvent,
  InviteDeleteEvent
};

pub async fn on_invite_create(
  data: &BotData,
  invite: &InviteCreateEvent
) {
  let record = InvitationRecord::new(invite.code.clone(), invite.inviter.as_ref().map(|u| u.id), invite.uses);
  data.invite_data.on_invite_create(invite.guild_id, record).await;
}

pub async fn on_invite_delete(
  data: &BotData,
  invite: &InviteDeleteEvent
) {
  data.invite_data.on_invite_delete(invite.guild_id, &invite.code).await;
}
