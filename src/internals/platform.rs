use {
  super::invite_data::InvitationRecord,
  crate::errors::TrackerError,
  poise::serenity_prelude::{
    Cache,
    Context,
    GuildId,
    Http,
    RichInvite,
    async_trait
  },
  std::sync::Arc
};

/// Live view of the chat platform that the tracker reconciles against.
#[async_trait]
pub trait InvitePlatform: Send + Sync {
  /// Guilds the bot is currently a member of.
  async fn live_guilds(&self) -> Vec<GuildId>;

  async fn live_invites(
    &self,
    guild_id: GuildId
  ) -> Result<Vec<InvitationRecord>, TrackerError>;
}

impl From<&RichInvite> for InvitationRecord {
  fn from(invite: &RichInvite) -> Self {
    Self {
      code:    invite.code.clone(),
      creator: invite.inviter.as_ref().map(|u| u.id),
      uses:    invite.uses
    }
  }
}

/// Discord through serenity's gateway cache and REST client.
#[derive(Clone)]
pub struct SerenityPlatform {
  cache: Arc<Cache>,
  http:  Arc<Http>
}

impl From<&Context> for SerenityPlatform {
  fn from(ctx: &Context) -> Self {
    Self {
      cache: Arc::clone(&ctx.cache),
      http:  Arc::clone(&ctx.http)
    }
  }
}

#[async_trait]
impl InvitePlatform for SerenityPlatform {
  async fn live_guilds(&self) -> Vec<GuildId> { self.cache.guilds() }

  async fn live_invites(
    &self,
    guild_id: GuildId
  ) -> Result<Vec<InvitationRecord>, TrackerError> {
    let invites = guild_id
      .invites(&self.http)
      .await
      .map_err(|source| TrackerError::Fetch { guild_id, source })?;

    Ok(invites.iter().map(InvitationRecord::from).collect())
  }
}
