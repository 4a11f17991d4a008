use {
  dashmap::DashMap,
  poise::serenity_prelude::{
    GuildId,
    UserId
  },
  std::sync::{
    Arc,
    atomic::{
      AtomicU8,
      Ordering
    }
  },
  tokio::sync::{
    Mutex,
    OwnedMutexGuard
  }
};

/// A single invite as the tracker remembers it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvitationRecord {
  pub code:    String,
  pub creator: Option<UserId>,
  pub uses:    u64
}

impl InvitationRecord {
  pub fn new(
    code: impl Into<String>,
    creator: Option<UserId>,
    uses: u64
  ) -> Self {
    Self {
      code: code.into(),
      creator,
      uses
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum InitState {
  Uninitialized = 0,
  Initializing = 1,
  Ready = 2
}

impl From<u8> for InitState {
  fn from(value: u8) -> Self {
    match value {
      1 => Self::Initializing,
      2 => Self::Ready,
      _ => Self::Uninitialized
    }
  }
}

/// Aggregated invite stats for one creator in one guild.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InviteSummary {
  pub invites: usize,
  pub uses:    u64
}

impl InviteSummary {
  /// Reply text for the `/invites` command. A missing snapshot and an empty
  /// one read the same.
  pub fn describe(
    &self,
    username: &str
  ) -> String {
    if self.invites == 0 {
      format!("{username} has no invitations.")
    } else {
      format!("{username} has {} invitation(s) with {} uses.", self.invites, self.uses)
    }
  }
}

/// Per-guild invite snapshots.
///
/// Lists are never handed out by reference; callers go through the
/// operations below, each of which is atomic on its own. Sequences that
/// span an await (fetch, then write) must hold [`InviteStore::lock_guild`].
pub struct InviteStore {
  snapshots: DashMap<GuildId, Vec<InvitationRecord>>,
  locks:     DashMap<GuildId, Arc<Mutex<()>>>,
  state:     AtomicU8
}

impl Default for InviteStore {
  fn default() -> Self { Self::new() }
}

impl InviteStore {
  pub fn new() -> Self {
    Self {
      snapshots: DashMap::new(),
      locks:     DashMap::new(),
      state:     AtomicU8::new(InitState::Uninitialized as u8)
    }
  }

  pub fn state(&self) -> InitState { InitState::from(self.state.load(Ordering::Acquire)) }

  pub(crate) fn set_state(
    &self,
    state: InitState
  ) {
    self.state.store(state as u8, Ordering::Release);
  }

  pub fn is_ready(&self) -> bool { self.state() == InitState::Ready }

  pub async fn lock_guild(
    &self,
    guild_id: GuildId
  ) -> OwnedMutexGuard<()> {
    // Clone the Arc out first so no map shard stays locked across the await
    let lock = Arc::clone(self.locks.entry(guild_id).or_default().value());
    lock.lock_owned().await
  }

  pub fn get(
    &self,
    guild_id: GuildId
  ) -> Option<Vec<InvitationRecord>> {
    self.snapshots.get(&guild_id).map(|records| records.value().clone())
  }

  pub fn contains(
    &self,
    guild_id: GuildId
  ) -> bool {
    self.snapshots.contains_key(&guild_id)
  }

  pub fn set(
    &self,
    guild_id: GuildId,
    records: Vec<InvitationRecord>
  ) {
    self.snapshots.insert(guild_id, records);
  }

  pub fn delete(
    &self,
    guild_id: GuildId
  ) {
    self.snapshots.remove(&guild_id);
    // Holders of the old lock keep their Arc; the next caller gets a fresh one
    self.locks.remove(&guild_id);
  }

  /// Appends without checking for an existing record with the same code.
  pub fn upsert_record(
    &self,
    guild_id: GuildId,
    record: InvitationRecord
  ) {
    self.snapshots.entry(guild_id).or_default().push(record);
  }

  pub fn remove_record(
    &self,
    guild_id: GuildId,
    code: &str
  ) {
    if let Some(mut records) = self.snapshots.get_mut(&guild_id) {
      records.retain(|record| record.code != code);
    }
  }

  /// Bumps the first record matching `code` by one. Returns whether a record was found.
  pub fn increment_uses(
    &self,
    guild_id: GuildId,
    code: &str
  ) -> bool {
    let Some(mut records) = self.snapshots.get_mut(&guild_id) else {
      return false;
    };

    match records.iter_mut().find(|record| record.code == code) {
      Some(record) => {
        record.uses += 1;
        true
      },
      None => false
    }
  }

  /// Cached use count of the first record matching `code`.
  pub fn cached_uses(
    &self,
    guild_id: GuildId,
    code: &str
  ) -> Option<u64> {
    self
      .snapshots
      .get(&guild_id)
      .and_then(|records| records.iter().find(|record| record.code == code).map(|record| record.uses))
  }

  pub fn summarize(
    &self,
    guild_id: GuildId,
    creator: UserId
  ) -> InviteSummary {
    let Some(records) = self.snapshots.get(&guild_id) else {
      return InviteSummary::default();
    };

    records
      .iter()
      .filter(|record| record.creator == Some(creator))
      .fold(InviteSummary::default(), |acc, record| InviteSummary {
        invites: acc.invites + 1,
        uses:    acc.uses + record.uses
      })
  }

  pub fn guild_count(&self) -> usize { self.snapshots.len() }

  #[cfg(test)]
  fn lock_count(&self) -> usize { self.locks.len() }
}
