mod invites;
mod profile;

pub use {
  invites::invites,
  profile::profile
};

pub type PoiseContext<'a> = poise::Context<'a, crate::BotData, crate::BotError>;

macro_rules! collect {
  () => {
    vec![
      // tracking
      commands::invites(),
      // members
      commands::profile(),
    ]
  };
}
pub(crate) use collect;
