use crate::classifier::Classifier;
use crate::constants::{
    CLEANUP_INTERVAL_SECS, FLUSH_INTERVAL_SECS, RETENTION_DAYS, STALE_SESSION_SECS,
};
use crate::db::Database;
use crate::domain::domain_from_url;
use crate::events::{IdleState, Signal, TrackingStatus};
use crate::janitor;
use crate::ledger;
use crate::models::SessionRecord;
use log::{error, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub flush_interval_secs: u64,
    pub cleanup_interval_secs: u64,
    pub stale_session_secs: i64,
    pub retention_days: u32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            flush_interval_secs: FLUSH_INTERVAL_SECS,
            cleanup_interval_secs: CLEANUP_INTERVAL_SECS,
            stale_session_secs: STALE_SESSION_SECS,
            retention_days: RETENTION_DAYS,
        }
    }
}

/// The tracking state machine.
///
/// Time accrues to `current_domain` only while the gating predicate holds:
/// a target and a running timer, the window focused, and the user either
/// active or audibly playing media. Every transition writes a session
/// snapshot; every flush converts the interval since the last timer reset
/// into a ledger increment and advances the timer with the write.
///
/// All transition methods take the current unix timestamp from the caller,
/// so tests drive the machine with synthetic time.
pub struct Tracker {
    db: Arc<Mutex<Database>>,
    classifier: Arc<Mutex<Classifier>>,
    config: TrackerConfig,
    current_domain: Option<String>,
    tracking_start: Option<i64>,
    is_idle: bool,
    is_audible: bool,
    is_window_focused: bool,
}

impl Tracker {
    pub fn new(
        db: Arc<Mutex<Database>>,
        classifier: Arc<Mutex<Classifier>>,
        config: TrackerConfig,
    ) -> Self {
        Self {
            db,
            classifier,
            config,
            current_domain: None,
            tracking_start: None,
            is_idle: false,
            is_audible: false,
            is_window_focused: true,
        }
    }

    fn gate(&self) -> bool {
        self.current_domain.is_some()
            && self.tracking_start.is_some()
            && self.is_window_focused
            && (!self.is_idle || self.is_audible)
    }

    pub fn handle_signal(&mut self, signal: &Signal, now: i64) {
        match signal {
            Signal::ViewChanged { url } => self.handle_view_change(url.as_deref(), now),
            Signal::FocusChanged { focused, active_url } => {
                self.handle_focus_change(*focused, active_url.as_deref(), now);
            }
            Signal::IdleChanged { state } => self.handle_idle_change(*state, now),
            Signal::AudibleChanged { audible } => self.handle_audible_change(*audible, now),
        }
    }

    /// The resource in view changed. An unparseable or internal locator
    /// invalidates the target, exactly like "nothing in view".
    pub fn handle_view_change(&mut self, url: Option<&str>, now: i64) {
        match url.and_then(domain_from_url) {
            None => {
                self.flush(now);
                self.current_domain = None;
                self.tracking_start = None;
                self.persist_session(now);
            }
            Some(domain) => {
                if self.current_domain.as_deref() == Some(domain.as_str()) {
                    return;
                }
                self.flush(now);
                self.current_domain = Some(domain.clone());
                self.tracking_start = Some(now);
                self.record_visit(&domain, now);
                self.persist_session(now);
            }
        }
    }

    /// Window focus changed. The unfocused interval is never credited
    /// retroactively: losing focus flushes and stops the timer, regaining
    /// focus starts a fresh one.
    pub fn handle_focus_change(&mut self, focused: bool, active_url: Option<&str>, now: i64) {
        if focused {
            self.is_window_focused = true;
            if self.current_domain.is_some() {
                self.tracking_start = Some(now);
            }
            self.persist_session(now);
            // the view may have changed while we were unfocused
            if active_url.is_some() {
                self.handle_view_change(active_url, now);
            }
        } else {
            self.flush(now);
            self.is_window_focused = false;
            self.tracking_start = None;
            self.persist_session(now);
        }
    }

    /// Idle state changed. Going idle flushes first so the pre-idle
    /// interval is credited; the timer keeps running when audio is playing,
    /// since the gate still holds through an audible idle period.
    pub fn handle_idle_change(&mut self, state: IdleState, now: i64) {
        match state {
            IdleState::Idle | IdleState::Locked => {
                self.flush(now);
                self.is_idle = true;
                if !self.is_audible {
                    self.tracking_start = None;
                }
                self.persist_session(now);
            }
            IdleState::Active => {
                self.is_idle = false;
                if self.current_domain.is_some()
                    && self.is_window_focused
                    && self.tracking_start.is_none()
                {
                    self.tracking_start = Some(now);
                }
                self.persist_session(now);
            }
        }
    }

    /// Audibility changed. Never resets the timer by itself; it only
    /// changes whether an idle period counts. Turning audio off flushes
    /// first so an audible-idle interval is credited before the gate
    /// degrades, and stops the timer when the user is idle.
    pub fn handle_audible_change(&mut self, audible: bool, now: i64) {
        if !audible {
            self.flush(now);
            if self.is_idle {
                self.tracking_start = None;
            }
        }
        self.is_audible = audible;
        self.persist_session(now);
    }

    /// Convert the elapsed interval since the last timer reset into a
    /// ledger increment. Returns whether the ledger was written.
    ///
    /// The timer advances only together with a successful write: on a
    /// transient storage failure the interval stays pending and the next
    /// cycle retries it, so no time is invented and none is lost.
    pub fn flush(&mut self, now: i64) -> bool {
        if !self.gate() {
            return false;
        }
        let Some(domain) = self.current_domain.clone() else {
            return false;
        };
        let Some(start) = self.tracking_start else {
            return false;
        };

        let elapsed = now - start;
        if elapsed <= 0 {
            return false;
        }

        let category = self.classify(&domain);
        let result = {
            let db = self.lock_db();
            ledger::add_time(db.connection(), &ledger::date_key(now), &domain, elapsed, &category)
        };

        match result {
            Ok(()) => {
                self.tracking_start = Some(now);
                self.persist_session(now);
                true
            }
            Err(e) => {
                error!("failed to flush {elapsed}s for {domain}: {e}");
                false
            }
        }
    }

    /// Seed state from the persisted snapshot. A fresh snapshot is resumed
    /// as-is; a stale one gets a single flush crediting time up to its
    /// `last_updated`, then the target is abandoned — the machine cannot
    /// know what happened during the gap and must not attribute it.
    pub fn recover(&mut self, now: i64) {
        let loaded = {
            let db = self.lock_db();
            SessionRecord::load(db.connection())
        };

        let record = match loaded {
            Ok(Some(record)) => record,
            Ok(None) => {
                self.persist_session(now);
                return;
            }
            Err(e) => {
                warn!("discarding unreadable session snapshot: {e}");
                self.persist_session(now);
                return;
            }
        };

        if now - record.last_updated > self.config.stale_session_secs {
            self.credit_abandoned(&record);
            self.current_domain = None;
            self.tracking_start = None;
            self.is_idle = false;
            self.is_audible = false;
            self.is_window_focused = true;
            self.persist_session(now);
        } else {
            self.current_domain = record.domain;
            self.tracking_start = record.tracking_start;
            self.is_idle = record.is_idle;
            self.is_audible = record.is_audible;
            self.is_window_focused = record.is_window_focused;
            if let Some(domain) = self.current_domain.as_deref() {
                info!("resumed tracking session for {domain}");
            }
        }
    }

    /// One flush for a stale snapshot, gated by the snapshot's own fields
    /// and credited to the day it was last written.
    fn credit_abandoned(&self, record: &SessionRecord) {
        let Some(domain) = record.domain.as_deref() else {
            return;
        };
        let Some(start) = record.tracking_start else {
            return;
        };
        if !record.is_window_focused || (record.is_idle && !record.is_audible) {
            return;
        }

        let elapsed = record.last_updated - start;
        if elapsed <= 0 {
            return;
        }

        let category = self.classify(domain);
        let db = self.lock_db();
        let date = ledger::date_key(record.last_updated);
        match ledger::add_time(db.connection(), &date, domain, elapsed, &category) {
            Ok(()) => info!("credited {elapsed}s to {domain} from an abandoned session"),
            Err(e) => error!("failed to credit abandoned session for {domain}: {e}"),
        }
    }

    pub fn status(&self) -> TrackingStatus {
        TrackingStatus {
            domain: self.current_domain.clone(),
            is_tracking: self.gate(),
            is_idle: self.is_idle,
            is_audible: self.is_audible,
            is_window_focused: self.is_window_focused,
            tracking_start: self.tracking_start,
        }
    }

    fn record_visit(&self, domain: &str, now: i64) {
        let category = self.classify(domain);
        let db = self.lock_db();
        if let Err(e) = ledger::add_visit(db.connection(), &ledger::date_key(now), domain, &category)
        {
            error!("failed to record visit for {domain}: {e}");
        }
    }

    fn persist_session(&self, now: i64) {
        let record = SessionRecord {
            domain: self.current_domain.clone(),
            tracking_start: self.tracking_start,
            is_idle: self.is_idle,
            is_window_focused: self.is_window_focused,
            is_audible: self.is_audible,
            last_updated: now,
        };

        let db = self.lock_db();
        if let Err(e) = record.save(db.connection()) {
            error!("failed to persist session snapshot: {e}");
        }
    }

    fn classify(&self, domain: &str) -> String {
        match self.classifier.lock() {
            Ok(classifier) => classifier.classify(domain),
            Err(poisoned) => poisoned.into_inner().classify(domain),
        }
    }

    fn lock_db(&self) -> MutexGuard<'_, Database> {
        match self.db.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("database mutex was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

/// Owns the tracker behind a mutex and drives it from two periodic
/// threads: a short-period flush and a long-period retention sweep. The
/// two are independent timers; they touch commutative state (adding time
/// vs. deleting old buckets) so their interleaving is unordered.
pub struct TrackerService {
    tracker: Arc<Mutex<Tracker>>,
    db: Arc<Mutex<Database>>,
    config: TrackerConfig,
    running: Arc<AtomicBool>,
}

impl TrackerService {
    pub fn new(
        db: Arc<Mutex<Database>>,
        classifier: Arc<Mutex<Classifier>>,
        config: TrackerConfig,
    ) -> Self {
        let tracker = Tracker::new(Arc::clone(&db), classifier, config.clone());
        Self {
            tracker: Arc::new(Mutex::new(tracker)),
            db,
            config,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Recover the persisted session, then start the flush and retention
    /// threads. Returns both join handles.
    pub fn start(&self) -> (thread::JoinHandle<()>, thread::JoinHandle<()>) {
        self.running.store(true, Ordering::SeqCst);

        self.lock_tracker().recover(current_timestamp());

        let running = Arc::clone(&self.running);
        let tracker = Arc::clone(&self.tracker);
        let flush_interval = self.config.flush_interval_secs;
        let flush_handle = thread::spawn(move || {
            while running.load(Ordering::SeqCst) {
                thread::sleep(Duration::from_secs(flush_interval));
                if !running.load(Ordering::SeqCst) {
                    break;
                }
                let mut tracker = match tracker.lock() {
                    Ok(guard) => guard,
                    Err(poisoned) => poisoned.into_inner(),
                };
                tracker.flush(current_timestamp());
            }
        });

        let running = Arc::clone(&self.running);
        let db = Arc::clone(&self.db);
        let cleanup_interval = self.config.cleanup_interval_secs;
        let retention_days = self.config.retention_days;
        let cleanup_handle = thread::spawn(move || {
            let mut elapsed = 0u64;
            while running.load(Ordering::SeqCst) {
                thread::sleep(Duration::from_secs(1));
                elapsed += 1;
                if elapsed < cleanup_interval {
                    continue;
                }
                elapsed = 0;

                let db = match db.lock() {
                    Ok(guard) => guard,
                    Err(poisoned) => poisoned.into_inner(),
                };
                if let Err(e) = janitor::sweep(db.connection(), current_timestamp(), retention_days)
                {
                    error!("retention sweep failed: {e}");
                }
            }
        });

        (flush_handle, cleanup_handle)
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn handle_signal(&self, signal: &Signal) {
        self.lock_tracker().handle_signal(signal, current_timestamp());
    }

    pub fn status(&self) -> TrackingStatus {
        self.lock_tracker().status()
    }

    fn lock_tracker(&self) -> MutexGuard<'_, Tracker> {
        match self.tracker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("tracker mutex was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

fn current_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::setup_test_db;
    use tempfile::TempDir;

    // 2023-11-14, mid-morning UTC: small offsets never cross a local
    // midnight in any timezone
    const T0: i64 = 1_699_950_000;

    fn setup() -> (Tracker, Arc<Mutex<Database>>, TempDir) {
        let (db, dir) = setup_test_db();
        let db = Arc::new(Mutex::new(db));
        let classifier = {
            let guard = db.lock().unwrap();
            Classifier::new(guard.connection()).unwrap()
        };
        let tracker = Tracker::new(
            Arc::clone(&db),
            Arc::new(Mutex::new(classifier)),
            TrackerConfig::default(),
        );
        (tracker, db, dir)
    }

    fn time_for(db: &Arc<Mutex<Database>>, at: i64, domain: &str) -> i64 {
        let guard = db.lock().unwrap();
        ledger::bucket(guard.connection(), &ledger::date_key(at))
            .unwrap()
            .get(domain)
            .map_or(0, |r| r.time)
    }

    fn visits_for(db: &Arc<Mutex<Database>>, at: i64, domain: &str) -> i64 {
        let guard = db.lock().unwrap();
        ledger::bucket(guard.connection(), &ledger::date_key(at))
            .unwrap()
            .get(domain)
            .map_or(0, |r| r.visits)
    }

    fn session(db: &Arc<Mutex<Database>>) -> SessionRecord {
        let guard = db.lock().unwrap();
        SessionRecord::load(guard.connection()).unwrap().unwrap()
    }

    #[test]
    fn test_target_change_flushes_old_and_restarts_timer() {
        let (mut tracker, db, _dir) = setup();

        tracker.handle_view_change(Some("https://a.com"), T0);
        tracker.handle_view_change(Some("https://b.com"), T0 + 120);

        assert_eq!(time_for(&db, T0 + 120, "a.com"), 120);
        assert_eq!(time_for(&db, T0 + 120, "b.com"), 0);
        assert_eq!(tracker.status().tracking_start, Some(T0 + 120));
    }

    #[test]
    fn test_visits_counted_per_target_change() {
        let (mut tracker, db, _dir) = setup();

        tracker.handle_view_change(Some("https://a.com"), T0);
        tracker.handle_view_change(Some("https://b.com"), T0 + 10);
        tracker.handle_view_change(Some("https://a.com"), T0 + 20);

        assert_eq!(visits_for(&db, T0 + 20, "a.com"), 2);
        assert_eq!(visits_for(&db, T0 + 20, "b.com"), 1);
    }

    #[test]
    fn test_same_domain_navigation_keeps_timer() {
        let (mut tracker, db, _dir) = setup();

        tracker.handle_view_change(Some("https://a.com/page1"), T0);
        tracker.handle_view_change(Some("https://a.com/page2"), T0 + 50);
        tracker.flush(T0 + 100);

        assert_eq!(time_for(&db, T0 + 100, "a.com"), 100);
        assert_eq!(visits_for(&db, T0 + 100, "a.com"), 1);
    }

    #[test]
    fn test_split_flushes_sum_exactly() {
        let (mut tracker, db, _dir) = setup();

        tracker.handle_view_change(Some("https://a.com"), T0);
        assert!(tracker.flush(T0 + 30));
        assert!(tracker.flush(T0 + 50));
        assert!(tracker.flush(T0 + 120));

        assert_eq!(time_for(&db, T0 + 120, "a.com"), 120);
    }

    #[test]
    fn test_flush_with_zero_elapsed_writes_nothing() {
        let (mut tracker, db, _dir) = setup();

        tracker.handle_view_change(Some("https://a.com"), T0);
        assert!(!tracker.flush(T0));
        assert_eq!(time_for(&db, T0, "a.com"), 0);
    }

    #[test]
    fn test_flush_without_target_writes_nothing() {
        let (mut tracker, db, _dir) = setup();
        assert!(!tracker.flush(T0 + 60));
        let guard = db.lock().unwrap();
        let bucket = ledger::bucket(guard.connection(), &ledger::date_key(T0 + 60)).unwrap();
        assert!(bucket.is_empty());
    }

    #[test]
    fn test_invalid_view_clears_target_and_credits_tail() {
        let (mut tracker, db, _dir) = setup();

        tracker.handle_view_change(Some("https://a.com"), T0);
        tracker.handle_view_change(Some("chrome://newtab"), T0 + 60);

        assert_eq!(time_for(&db, T0 + 60, "a.com"), 60);
        assert_eq!(tracker.status().domain, None);
        assert!(!tracker.status().is_tracking);
    }

    #[test]
    fn test_focus_loss_credits_and_suspends() {
        let (mut tracker, db, _dir) = setup();

        tracker.handle_view_change(Some("https://a.com"), T0);
        tracker.handle_focus_change(false, None, T0 + 60);

        assert_eq!(time_for(&db, T0 + 60, "a.com"), 60);
        assert!(!tracker.flush(T0 + 120), "no accrual while unfocused");
        assert_eq!(time_for(&db, T0 + 120, "a.com"), 60);
    }

    #[test]
    fn test_focus_gain_does_not_credit_unfocused_interval() {
        let (mut tracker, db, _dir) = setup();

        tracker.handle_view_change(Some("https://a.com"), T0);
        tracker.handle_focus_change(false, None, T0 + 60);
        tracker.handle_focus_change(true, None, T0 + 200);
        tracker.flush(T0 + 260);

        // 60s before unfocus + 60s after refocus; the 140s gap is dropped
        assert_eq!(time_for(&db, T0 + 260, "a.com"), 120);
    }

    #[test]
    fn test_focus_gain_reevaluates_view() {
        let (mut tracker, db, _dir) = setup();

        tracker.handle_view_change(Some("https://a.com"), T0);
        tracker.handle_focus_change(false, None, T0 + 30);
        tracker.handle_focus_change(true, Some("https://b.com"), T0 + 100);

        assert_eq!(tracker.status().domain, Some("b.com".to_string()));
        assert_eq!(visits_for(&db, T0 + 100, "b.com"), 1);

        tracker.flush(T0 + 160);
        assert_eq!(time_for(&db, T0 + 160, "b.com"), 60);
        assert_eq!(time_for(&db, T0 + 160, "a.com"), 30);
    }

    #[test]
    fn test_idle_credits_pre_idle_interval_and_suspends() {
        let (mut tracker, db, _dir) = setup();

        tracker.handle_view_change(Some("https://a.com"), T0);
        tracker.handle_idle_change(IdleState::Idle, T0 + 45);

        assert_eq!(time_for(&db, T0 + 45, "a.com"), 45);
        assert!(!tracker.flush(T0 + 100), "no accrual while idle and silent");

        tracker.handle_idle_change(IdleState::Active, T0 + 100);
        tracker.flush(T0 + 160);
        assert_eq!(time_for(&db, T0 + 160, "a.com"), 105);
    }

    #[test]
    fn test_locked_behaves_like_idle() {
        let (mut tracker, db, _dir) = setup();

        tracker.handle_view_change(Some("https://a.com"), T0);
        tracker.handle_idle_change(IdleState::Locked, T0 + 30);

        assert_eq!(time_for(&db, T0 + 30, "a.com"), 30);
        assert!(!tracker.status().is_tracking);
    }

    #[test]
    fn test_audible_idle_keeps_accruing() {
        let (mut tracker, db, _dir) = setup();

        tracker.handle_view_change(Some("https://youtube.com"), T0);
        tracker.handle_audible_change(true, T0 + 10);
        tracker.handle_idle_change(IdleState::Idle, T0 + 50);

        // pre-idle interval credited, timer still running
        assert_eq!(time_for(&db, T0 + 50, "youtube.com"), 50);
        assert!(tracker.status().is_tracking);

        assert!(tracker.flush(T0 + 110));
        assert_eq!(time_for(&db, T0 + 110, "youtube.com"), 110);

        // audio stops: the audible tail is credited, then accrual halts
        tracker.handle_audible_change(false, T0 + 150);
        assert_eq!(time_for(&db, T0 + 150, "youtube.com"), 150);
        assert!(!tracker.flush(T0 + 200));
        assert_eq!(time_for(&db, T0 + 200, "youtube.com"), 150);

        // activity resumes: fresh timer
        tracker.handle_idle_change(IdleState::Active, T0 + 250);
        tracker.flush(T0 + 280);
        assert_eq!(time_for(&db, T0 + 280, "youtube.com"), 180);
    }

    #[test]
    fn test_audible_change_alone_does_not_reset_timer() {
        let (mut tracker, db, _dir) = setup();

        tracker.handle_view_change(Some("https://a.com"), T0);
        tracker.handle_audible_change(true, T0 + 20);
        assert_eq!(tracker.status().tracking_start, Some(T0));

        // turning audio off while active flushes but accrual continues
        tracker.handle_audible_change(false, T0 + 40);
        assert_eq!(time_for(&db, T0 + 40, "a.com"), 40);
        tracker.flush(T0 + 100);
        assert_eq!(time_for(&db, T0 + 100, "a.com"), 100);
    }

    #[test]
    fn test_status_reflects_gate() {
        let (mut tracker, _db, _dir) = setup();

        assert!(!tracker.status().is_tracking);

        tracker.handle_view_change(Some("https://a.com"), T0);
        let status = tracker.status();
        assert!(status.is_tracking);
        assert_eq!(status.domain, Some("a.com".to_string()));
        assert_eq!(status.tracking_start, Some(T0));

        tracker.handle_focus_change(false, None, T0 + 10);
        assert!(!tracker.status().is_tracking);
    }

    #[test]
    fn test_every_transition_persists_snapshot() {
        let (mut tracker, db, _dir) = setup();

        tracker.handle_view_change(Some("https://a.com"), T0);
        let record = session(&db);
        assert_eq!(record.domain, Some("a.com".to_string()));
        assert_eq!(record.tracking_start, Some(T0));
        assert_eq!(record.last_updated, T0);

        tracker.handle_idle_change(IdleState::Idle, T0 + 30);
        let record = session(&db);
        assert!(record.is_idle);
        assert_eq!(record.tracking_start, None);
        assert_eq!(record.last_updated, T0 + 30);
    }

    #[test]
    fn test_recovery_fresh_snapshot_resumes() {
        let (mut tracker, db, _dir) = setup();

        tracker.handle_view_change(Some("https://a.com"), T0);
        drop(tracker);

        let classifier = {
            let guard = db.lock().unwrap();
            Classifier::new(guard.connection()).unwrap()
        };
        let mut restarted = Tracker::new(
            Arc::clone(&db),
            Arc::new(Mutex::new(classifier)),
            TrackerConfig::default(),
        );
        restarted.recover(T0 + 300);

        let status = restarted.status();
        assert_eq!(status.domain, Some("a.com".to_string()));
        assert_eq!(status.tracking_start, Some(T0));
        assert!(status.is_tracking);

        // the next periodic flush accounts for time since the snapshot
        restarted.flush(T0 + 360);
        assert_eq!(time_for(&db, T0 + 360, "a.com"), 360);
    }

    #[test]
    fn test_recovery_stale_snapshot_credits_once_and_clears() {
        let (tracker, db, _dir) = setup();
        drop(tracker);

        let record = SessionRecord {
            domain: Some("a.com".to_string()),
            tracking_start: Some(T0),
            is_idle: false,
            is_window_focused: true,
            is_audible: false,
            last_updated: T0 + 600,
        };
        {
            let guard = db.lock().unwrap();
            record.save(guard.connection()).unwrap();
        }

        let classifier = {
            let guard = db.lock().unwrap();
            Classifier::new(guard.connection()).unwrap()
        };
        let mut restarted = Tracker::new(
            Arc::clone(&db),
            Arc::new(Mutex::new(classifier)),
            TrackerConfig::default(),
        );
        // 45 minutes after the snapshot was last written
        restarted.recover(T0 + 600 + 2700);

        // exactly the interval up to last_updated, nothing more
        assert_eq!(time_for(&db, T0 + 600, "a.com"), 600);
        assert_eq!(restarted.status().domain, None);
        assert_eq!(restarted.status().tracking_start, None);

        let cleared = session(&db);
        assert_eq!(cleared.domain, None);
        assert_eq!(cleared.tracking_start, None);
    }

    #[test]
    fn test_recovery_stale_snapshot_respects_its_own_gate() {
        let (tracker, db, _dir) = setup();
        drop(tracker);

        let record = SessionRecord {
            domain: Some("a.com".to_string()),
            tracking_start: Some(T0),
            is_idle: true,
            is_window_focused: true,
            is_audible: false,
            last_updated: T0 + 600,
        };
        {
            let guard = db.lock().unwrap();
            record.save(guard.connection()).unwrap();
        }

        let classifier = {
            let guard = db.lock().unwrap();
            Classifier::new(guard.connection()).unwrap()
        };
        let mut restarted = Tracker::new(
            Arc::clone(&db),
            Arc::new(Mutex::new(classifier)),
            TrackerConfig::default(),
        );
        restarted.recover(T0 + 600 + 2700);

        assert_eq!(time_for(&db, T0 + 600, "a.com"), 0);
        assert_eq!(restarted.status().domain, None);
    }

    #[test]
    fn test_recovery_stale_audible_idle_snapshot_is_credited() {
        let (tracker, db, _dir) = setup();
        drop(tracker);

        let record = SessionRecord {
            domain: Some("youtube.com".to_string()),
            tracking_start: Some(T0),
            is_idle: true,
            is_window_focused: true,
            is_audible: true,
            last_updated: T0 + 300,
        };
        {
            let guard = db.lock().unwrap();
            record.save(guard.connection()).unwrap();
        }

        let classifier = {
            let guard = db.lock().unwrap();
            Classifier::new(guard.connection()).unwrap()
        };
        let mut restarted = Tracker::new(
            Arc::clone(&db),
            Arc::new(Mutex::new(classifier)),
            TrackerConfig::default(),
        );
        restarted.recover(T0 + 300 + 2700);

        assert_eq!(time_for(&db, T0 + 300, "youtube.com"), 300);
    }

    #[test]
    fn test_recovery_with_no_snapshot_starts_clean() {
        let (mut tracker, db, _dir) = setup();

        tracker.recover(T0);
        assert_eq!(tracker.status().domain, None);
        assert!(!tracker.status().is_tracking);
        assert_eq!(session(&db).last_updated, T0);
    }

    #[test]
    fn test_recovery_with_partial_snapshot_uses_safe_defaults() {
        let (tracker, db, _dir) = setup();
        drop(tracker);

        {
            let guard = db.lock().unwrap();
            crate::db::set(
                guard.connection(),
                crate::constants::SESSION_KEY,
                &serde_json::json!({ "domain": "a.com" }),
            )
            .unwrap();
        }

        let classifier = {
            let guard = db.lock().unwrap();
            Classifier::new(guard.connection()).unwrap()
        };
        let mut restarted = Tracker::new(
            Arc::clone(&db),
            Arc::new(Mutex::new(classifier)),
            TrackerConfig::default(),
        );
        restarted.recover(T0);

        // last_updated defaulted to 0, so the snapshot is stale; no
        // timestamp means nothing to credit
        assert_eq!(restarted.status().domain, None);
        assert_eq!(time_for(&db, T0, "a.com"), 0);
    }

    #[test]
    fn test_service_starts_and_stops() {
        let (db, _dir) = setup_test_db();
        let db = Arc::new(Mutex::new(db));
        let classifier = {
            let guard = db.lock().unwrap();
            Classifier::new(guard.connection()).unwrap()
        };
        let config = TrackerConfig {
            flush_interval_secs: 1,
            cleanup_interval_secs: 1,
            ..TrackerConfig::default()
        };
        let service = TrackerService::new(db, Arc::new(Mutex::new(classifier)), config);

        assert!(!service.is_running());

        let (flush_handle, cleanup_handle) = service.start();
        assert!(service.is_running());

        service.handle_signal(&Signal::ViewChanged {
            url: Some("https://github.com".to_string()),
        });
        assert_eq!(service.status().domain, Some("github.com".to_string()));

        thread::sleep(Duration::from_millis(100));

        service.stop();
        flush_handle.join().unwrap();
        cleanup_handle.join().unwrap();

        assert!(!service.is_running());
    }
}
