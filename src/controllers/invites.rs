use {
  crate::{
    errors::TrackerError,
    internals::{
      invite_data::{
        InitState,
        InvitationRecord,
        InviteStore,
        InviteSummary
      },
      platform::InvitePlatform
    }
  },
  poise::serenity_prelude::{
    GuildId,
    UserId
  },
  tokio::sync::Mutex,
  tracing::{
    debug,
    info,
    warn
  }
};

/// Keeps [`InviteStore`] in step with gateway events and works out which
/// invite a new member came through.
///
/// Discord doesn't say which invite a member used, so on every join the
/// live use counts are diffed against the snapshot. The first live invite
/// whose count went up wins. If two invites were used between joins, only
/// one of them is credited until the next join triggers another pass.
#[derive(Default)]
pub struct InviteTracker {
  store:     InviteStore,
  init_gate: Mutex<()>
}

impl InviteTracker {
  pub fn new() -> Self { Self::default() }

  #[cfg(test)]
  pub fn store(&self) -> &InviteStore { &self.store }

  /// Populates every joined guild once. Concurrent callers wait for the
  /// first one to finish; later calls return immediately.
  pub async fn ensure_initialized<P: InvitePlatform + ?Sized>(
    &self,
    platform: &P
  ) {
    if self.store.is_ready() {
      return;
    }

    let _gate = self.init_gate.lock().await;
    if self.store.is_ready() {
      return;
    }

    self.store.set_state(InitState::Initializing);
    let guilds = platform.live_guilds().await;
    info!("InviteTracker[Init] Populating invite snapshots for {} guild(s)", guilds.len());

    for guild_id in guilds {
      let _guard = self.store.lock_guild(guild_id).await;
      match platform.live_invites(guild_id).await {
        Ok(records) => self.store.set(guild_id, records),
        Err(e) => warn!("InviteTracker[Init] Skipping guild {guild_id}: {e}")
      }
    }

    self.store.set_state(InitState::Ready);
    info!("InviteTracker[Init] Ready with {} snapshot(s)", self.store.guild_count());
  }

  pub async fn on_guild_join<P: InvitePlatform + ?Sized>(
    &self,
    platform: &P,
    guild_id: GuildId
  ) -> Result<(), TrackerError> {
    // Population may already have listed guilds before this one arrived
    if self.store.state() == InitState::Initializing {
      drop(self.init_gate.lock().await);
    }

    if !self.store.is_ready() {
      return Ok(());
    }

    let _guard = self.store.lock_guild(guild_id).await;
    let records = platform.live_invites(guild_id).await?;
    info!("InviteTracker[GuildJoin] Snapshot of {} invite(s) taken for guild {guild_id}", records.len());
    self.store.set(guild_id, records);

    Ok(())
  }

  pub async fn on_guild_leave(
    &self,
    guild_id: GuildId
  ) {
    if !self.store.is_ready() {
      return;
    }

    let _guard = self.store.lock_guild(guild_id).await;
    self.store.delete(guild_id);
    info!("InviteTracker[GuildLeave] Dropped snapshot for guild {guild_id}");
  }

  pub async fn on_invite_create(
    &self,
    guild_id: Option<GuildId>,
    record: InvitationRecord
  ) {
    let Some(guild_id) = guild_id.filter(|_| self.store.is_ready()) else {
      return;
    };

    let _guard = self.store.lock_guild(guild_id).await;
    debug!("InviteTracker[InviteCreate] {} in guild {guild_id}", record.code);
    self.store.upsert_record(guild_id, record);
  }

  pub async fn on_invite_delete(
    &self,
    guild_id: Option<GuildId>,
    code: &str
  ) {
    let Some(guild_id) = guild_id.filter(|_| self.store.is_ready()) else {
      return;
    };

    let _guard = self.store.lock_guild(guild_id).await;
    if !self.store.contains(guild_id) {
      return;
    }

    debug!("InviteTracker[InviteDelete] {code} in guild {guild_id}");
    self.store.remove_record(guild_id, code);
  }

  /// Returns the code credited for this join, if any.
  pub async fn on_member_join<P: InvitePlatform + ?Sized>(
    &self,
    platform: &P,
    guild_id: GuildId
  ) -> Result<Option<String>, TrackerError> {
    if !self.store.is_ready() {
      return Ok(None);
    }

    let _guard = self.store.lock_guild(guild_id).await;
    let live = platform.live_invites(guild_id).await?;

    if !self.store.contains(guild_id) {
      return Ok(None);
    }

    let used = live.into_iter().find(|invite| {
      self
        .store
        .cached_uses(guild_id, &invite.code)
        .is_some_and(|cached| invite.uses > cached)
    });

    match used {
      Some(invite) => {
        self.store.increment_uses(guild_id, &invite.code);
        debug!("InviteTracker[MemberJoin] Attributed join in guild {guild_id} to {}", invite.code);
        Ok(Some(invite.code))
      },
      None => {
        debug!("InviteTracker[MemberJoin] No invite in guild {guild_id} moved past its snapshot");
        Ok(None)
      }
    }
  }

  /// Invite count and total uses for everything `creator` made in `guild_id`.
  pub async fn summary<P: InvitePlatform + ?Sized>(
    &self,
    platform: &P,
    guild_id: GuildId,
    creator: UserId
  ) -> InviteSummary {
    self.ensure_initialized(platform).await;
    self.store.summarize(guild_id, creator)
  }
}

#[cfg(test)]
mod tests {
  use {
    super::*,
    poise::serenity_prelude::{
      self as serenity,
      async_trait
    },
    std::{
      collections::HashMap,
      sync::{
        Arc,
        Mutex as StdMutex,
        atomic::{
          AtomicUsize,
          Ordering
        }
      }
    }
  };

  #[derive(Default)]
  struct FakePlatform {
    guilds:  StdMutex<Vec<GuildId>>,
    invites: StdMutex<HashMap<GuildId, Vec<InvitationRecord>>>,
    broken:  StdMutex<Vec<GuildId>>,
    fetches: AtomicUsize,
    stall:   Mutex<()>
  }

  impl FakePlatform {
    fn with_guild(
      self,
      guild_id: GuildId,
      records: Vec<InvitationRecord>
    ) -> Self {
      self.guilds.lock().unwrap().push(guild_id);
      self.invites.lock().unwrap().insert(guild_id, records);
      self
    }

    fn with_broken_guild(
      self,
      guild_id: GuildId
    ) -> Self {
      self.guilds.lock().unwrap().push(guild_id);
      self.broken.lock().unwrap().push(guild_id);
      self
    }

    fn set_live(
      &self,
      guild_id: GuildId,
      records: Vec<InvitationRecord>
    ) {
      self.invites.lock().unwrap().insert(guild_id, records);
    }
  }

  #[async_trait]
  impl InvitePlatform for FakePlatform {
    async fn live_guilds(&self) -> Vec<GuildId> { self.guilds.lock().unwrap().clone() }

    async fn live_invites(
      &self,
      guild_id: GuildId
    ) -> Result<Vec<InvitationRecord>, TrackerError> {
      self.fetches.fetch_add(1, Ordering::SeqCst);
      drop(self.stall.lock().await);
      tokio::task::yield_now().await;

      if self.broken.lock().unwrap().contains(&guild_id) {
        return Err(TrackerError::Fetch {
          guild_id,
          source: serenity::Error::Other("missing permissions")
        });
      }

      Ok(self.invites.lock().unwrap().get(&guild_id).cloned().unwrap_or_default())
    }
  }

  fn guild_a() -> GuildId { GuildId::new(100) }

  fn record(
    code: &str,
    creator: u64,
    uses: u64
  ) -> InvitationRecord {
    InvitationRecord::new(code, Some(UserId::new(creator)), uses)
  }

  fn uses_of(
    tracker: &InviteTracker,
    guild_id: GuildId
  ) -> Vec<(String, u64)> {
    tracker
      .store()
      .get(guild_id)
      .unwrap()
      .into_iter()
      .map(|r| (r.code, r.uses))
      .collect()
  }

  async fn ready_tracker(platform: &FakePlatform) -> InviteTracker {
    let tracker = InviteTracker::new();
    tracker.ensure_initialized(platform).await;
    tracker
  }

  #[tokio::test]
  async fn guild_join_before_init_is_noop() {
    let platform = FakePlatform::default().with_guild(guild_a(), vec![record("x1", 1, 2)]);
    let tracker = InviteTracker::new();

    tracker.on_guild_join(&platform, guild_a()).await.unwrap();

    assert_eq!(tracker.store().get(guild_a()), None);
    assert_eq!(platform.fetches.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn events_before_init_are_ignored() {
    let tracker = InviteTracker::new();

    tracker.on_invite_create(Some(guild_a()), record("x1", 1, 0)).await;
    tracker.on_invite_delete(Some(guild_a()), "x1").await;
    tracker.on_guild_leave(guild_a()).await;

    assert_eq!(tracker.store().get(guild_a()), None);
    assert_eq!(tracker.store().state(), InitState::Uninitialized);
  }

  #[tokio::test]
  async fn init_mirrors_live_codes_for_every_guild() {
    let guild_b = GuildId::new(200);
    let platform = FakePlatform::default()
      .with_guild(guild_a(), vec![record("x1", 1, 2), record("x2", 2, 0)])
      .with_guild(guild_b, Vec::new());

    let tracker = ready_tracker(&platform).await;

    assert_eq!(tracker.store().state(), InitState::Ready);
    assert_eq!(tracker.store().get(guild_a()).unwrap(), vec![record("x1", 1, 2), record("x2", 2, 0)]);
    assert_eq!(tracker.store().get(guild_b), Some(Vec::new()));
  }

  #[tokio::test]
  async fn init_skips_guilds_whose_fetch_fails() {
    let broken = GuildId::new(300);
    let platform = FakePlatform::default()
      .with_broken_guild(broken)
      .with_guild(guild_a(), vec![record("x1", 1, 2)]);

    let tracker = ready_tracker(&platform).await;

    assert!(tracker.store().is_ready());
    assert_eq!(tracker.store().get(broken), None);
    assert_eq!(tracker.store().get(guild_a()).unwrap().len(), 1);
  }

  #[tokio::test]
  async fn concurrent_init_populates_once() {
    let platform = Arc::new(FakePlatform::default().with_guild(guild_a(), vec![record("x1", 1, 2)]));
    let tracker = Arc::new(InviteTracker::new());

    let mut handles = Vec::new();
    for _ in 0..8 {
      let platform = Arc::clone(&platform);
      let tracker = Arc::clone(&tracker);
      handles.push(tokio::spawn(async move { tracker.ensure_initialized(platform.as_ref()).await }));
    }
    for handle in handles {
      handle.await.unwrap();
    }

    assert_eq!(platform.fetches.load(Ordering::SeqCst), 1);
    assert!(tracker.store().is_ready());
  }

  #[tokio::test]
  async fn invite_create_appends_after_existing() {
    let platform = FakePlatform::default().with_guild(guild_a(), vec![record("x1", 1, 2)]);
    let tracker = ready_tracker(&platform).await;

    tracker.on_invite_create(Some(guild_a()), record("x2", 2, 0)).await;

    assert_eq!(tracker.store().get(guild_a()).unwrap(), vec![record("x1", 1, 2), record("x2", 2, 0)]);
  }

  #[tokio::test]
  async fn invite_without_guild_is_skipped() {
    let platform = FakePlatform::default().with_guild(guild_a(), vec![record("x1", 1, 2)]);
    let tracker = ready_tracker(&platform).await;

    tracker.on_invite_create(None, record("x2", 2, 0)).await;
    tracker.on_invite_delete(None, "x1").await;

    assert_eq!(tracker.store().get(guild_a()).unwrap(), vec![record("x1", 1, 2)]);
  }

  #[tokio::test]
  async fn invite_delete_removes_by_code_and_ignores_unknown_guild() {
    let platform = FakePlatform::default().with_guild(guild_a(), vec![record("x1", 1, 2), record("x2", 2, 0)]);
    let tracker = ready_tracker(&platform).await;

    tracker.on_invite_delete(Some(guild_a()), "x1").await;
    tracker.on_invite_delete(Some(GuildId::new(999)), "x2").await;

    assert_eq!(tracker.store().get(guild_a()).unwrap(), vec![record("x2", 2, 0)]);
    assert_eq!(tracker.store().get(GuildId::new(999)), None);
  }

  #[tokio::test]
  async fn guild_join_and_leave_after_init() {
    let guild_b = GuildId::new(200);
    let platform = FakePlatform::default().with_guild(guild_a(), Vec::new());
    let tracker = ready_tracker(&platform).await;

    platform.set_live(guild_b, vec![record("y1", 3, 4)]);
    tracker.on_guild_join(&platform, guild_b).await.unwrap();
    assert_eq!(tracker.store().get(guild_b).unwrap(), vec![record("y1", 3, 4)]);

    tracker.on_guild_leave(guild_b).await;
    assert_eq!(tracker.store().get(guild_b), None);
  }

  #[tokio::test]
  async fn guild_joined_during_init_still_gets_snapshot() {
    let guild_b = GuildId::new(200);
    let platform = Arc::new(FakePlatform::default().with_guild(guild_a(), vec![record("x1", 1, 2)]));
    let tracker = Arc::new(InviteTracker::new());

    let stalled = platform.stall.lock().await;
    let init = {
      let (platform, tracker) = (Arc::clone(&platform), Arc::clone(&tracker));
      tokio::spawn(async move { tracker.ensure_initialized(platform.as_ref()).await })
    };
    while platform.fetches.load(Ordering::SeqCst) == 0 {
      tokio::task::yield_now().await;
    }
    assert_eq!(tracker.store().state(), InitState::Initializing);

    platform.set_live(guild_b, vec![record("y1", 3, 4)]);
    let join = {
      let (platform, tracker) = (Arc::clone(&platform), Arc::clone(&tracker));
      tokio::spawn(async move { tracker.on_guild_join(platform.as_ref(), guild_b).await })
    };
    for _ in 0..10 {
      tokio::task::yield_now().await;
    }

    drop(stalled);
    init.await.unwrap();
    join.await.unwrap().unwrap();

    assert!(tracker.store().is_ready());
    assert_eq!(tracker.store().get(guild_b).unwrap(), vec![record("y1", 3, 4)]);
  }

  #[tokio::test]
  async fn member_join_bumps_cached_count() {
    let platform = FakePlatform::default().with_guild(guild_a(), vec![record("x1", 1, 2), record("x2", 2, 0)]);
    let tracker = ready_tracker(&platform).await;

    platform.set_live(guild_a(), vec![record("x1", 1, 2), record("x2", 2, 1)]);
    let used = tracker.on_member_join(&platform, guild_a()).await.unwrap();

    assert_eq!(used.as_deref(), Some("x2"));
    assert_eq!(uses_of(&tracker, guild_a()), vec![("x1".to_owned(), 2), ("x2".to_owned(), 1)]);
  }

  #[tokio::test]
  async fn member_join_credits_only_first_increase() {
    let platform = FakePlatform::default().with_guild(guild_a(), vec![record("x1", 1, 2), record("x2", 2, 0)]);
    let tracker = ready_tracker(&platform).await;

    platform.set_live(guild_a(), vec![record("x1", 1, 3), record("x2", 2, 1)]);
    let used = tracker.on_member_join(&platform, guild_a()).await.unwrap();

    assert_eq!(used.as_deref(), Some("x1"));
    assert_eq!(uses_of(&tracker, guild_a()), vec![("x1".to_owned(), 3), ("x2".to_owned(), 0)]);

    // The next join catches up on the invite that was missed
    let used = tracker.on_member_join(&platform, guild_a()).await.unwrap();
    assert_eq!(used.as_deref(), Some("x2"));
  }

  #[tokio::test]
  async fn member_join_without_increase_or_snapshot() {
    let platform = FakePlatform::default().with_guild(guild_a(), vec![record("x1", 1, 2)]);
    let tracker = ready_tracker(&platform).await;

    // Invite made and used before the bot saw it
    platform.set_live(guild_a(), vec![record("x1", 1, 2), record("fresh", 2, 1)]);
    assert_eq!(tracker.on_member_join(&platform, guild_a()).await.unwrap(), None);
    assert_eq!(tracker.store().get(guild_a()).unwrap().len(), 1);

    platform.set_live(GuildId::new(999), vec![record("z", 1, 5)]);
    assert_eq!(tracker.on_member_join(&platform, GuildId::new(999)).await.unwrap(), None);
    assert_eq!(tracker.store().get(GuildId::new(999)), None);
  }

  #[tokio::test]
  async fn member_join_fetch_failure_leaves_snapshot_untouched() {
    let platform = FakePlatform::default().with_guild(guild_a(), vec![record("x1", 1, 2)]);
    let tracker = ready_tracker(&platform).await;

    platform.broken.lock().unwrap().push(guild_a());
    let result = tracker.on_member_join(&platform, guild_a()).await;

    assert!(matches!(result, Err(TrackerError::Fetch { .. })));
    assert_eq!(tracker.store().get(guild_a()).unwrap(), vec![record("x1", 1, 2)]);
  }

  #[tokio::test]
  async fn summary_initializes_lazily_and_aggregates() {
    let platform =
      FakePlatform::default().with_guild(guild_a(), vec![record("x1", 1, 2), record("x2", 1, 3), record("x3", 2, 9)]);
    let tracker = InviteTracker::new();

    let summary = tracker.summary(&platform, guild_a(), UserId::new(1)).await;
    assert_eq!(summary, InviteSummary { invites: 2, uses: 5 });
    assert!(tracker.store().is_ready());

    let nobody = tracker.summary(&platform, guild_a(), UserId::new(42)).await;
    assert_eq!(nobody.describe("nobody"), "nobody has no invitations.");
  }
}
