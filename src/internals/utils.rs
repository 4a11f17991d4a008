use {
  crate::{
    BotError,
    errors::TrackerError
  },
  poise::serenity_prelude::{
    Member,
    UserId
  },
  regex::Regex,
  std::sync::LazyLock
};

static MENTION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(?:<@!?(\d+)>|(\d+))$").unwrap());

pub fn format_timestamp(timestamp: i64) -> String { format!("<t:{timestamp}:f>\n<t:{timestamp}:R>") }

/// Accepts `<@id>`, `<@!id>` or a bare snowflake.
pub fn parse_mention(input: &str) -> Option<UserId> {
  let caps = MENTION.captures(input.trim())?;
  let id = caps.get(1).or_else(|| caps.get(2))?.as_str().parse::<u64>().ok()?;

  (id != 0).then(|| UserId::new(id))
}

/// Whole days and leftover whole hours between two unix timestamps.
pub fn time_in_guild(
  joined_at: i64,
  now: i64
) -> (u64, u64) {
  let secs = now.saturating_sub(joined_at).max(0) as u64;
  (secs / 86400, (secs % 86400) / 3600)
}

/// Resolves the command's target: the mentioned member, or the author when none was given.
pub async fn resolve_target(
  ctx: crate::commands::PoiseContext<'_>,
  target: Option<String>
) -> Result<Member, BotError> {
  let guild_id = ctx.guild_id().ok_or(TrackerError::NotInGuild)?;

  let user_id = match target.as_deref() {
    Some(input) => parse_mention(input).ok_or(TrackerError::TargetNotFound)?,
    None => ctx.author().id
  };

  guild_id
    .member(ctx.serenity_context(), user_id)
    .await
    .map_err(|_| TrackerError::TargetNotFound.into())
}
