use {
  poise::serenity_prelude::{
    Context,
    Ready
  },
  tracing::info
};

pub fn on_ready(
  ctx: &Context,
  ready: &Ready
) {
  info!("Event[Ready] Build version: v{}", env!("CARGO_PKG_VERSION"));
  info!("Event[Ready] Connected to API as {}", ready.user.name);
  info!(
    "Event[Ready] Shard {} sees {} guild(s), invite snapshots load on first /invites",
    ctx.shard_id.0,
    ready.guilds.len()
  );
}
