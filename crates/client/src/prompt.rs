// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, NaiveDate, TimeZone};
use dashmap::DashSet;

use crate::{
    error::ClientError,
    freshness::has_checked_in_today,
    models::{CheckIn, Membership},
};

/// Gives the prompt surface time to mount before it is opened.
pub const DEFAULT_PROMPT_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptState {
    Idle,
    /// Membership known, waiting for check-ins
    Evaluating,
    Prompted,
    Suppressed,
}

impl PromptState {
    pub fn is_terminal(self) -> bool {
        matches!(self, PromptState::Prompted | PromptState::Suppressed)
    }
}

/// Opens the check-in prompt.
pub trait PromptPresenter {
    fn present_check_in_prompt(&self, membership: &Membership);
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PromptKey {
    pub user_id: String,
    pub challenge_id: i64,
    pub date: NaiveDate,
}

/// Remembers which (user, challenge, day) combinations were already prompted.
pub trait PromptLedger: Send + Sync {
    fn contains(&self, key: &PromptKey) -> bool;
    /// Records `key`. Returns `false` if it was already recorded.
    fn record(&self, key: PromptKey) -> bool;
}

#[derive(Default)]
pub struct InMemoryPromptLedger {
    seen: DashSet<PromptKey>,
}

impl InMemoryPromptLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PromptLedger for InMemoryPromptLedger {
    fn contains(&self, key: &PromptKey) -> bool {
        self.seen.contains(key)
    }

    fn record(&self, key: PromptKey) -> bool {
        self.seen.insert(key)
    }
}

/// How often the automatic prompt may fire.
#[derive(Clone, Default)]
pub enum PromptGuard {
    /// Once per controller instance; a new controller may prompt again.
    #[default]
    PerMount,
    /// Once per user, challenge and local day across all controllers sharing
    /// the ledger.
    Daily(Arc<dyn PromptLedger>),
}

/// Decides whether to show the check-in prompt for one viewing session.
///
/// Feed it the membership as soon as it is known, then the check-ins. Once
/// it reaches [`PromptState::Prompted`] or [`PromptState::Suppressed`] it
/// ignores all further input.
pub struct CheckInPromptController<P: PromptPresenter> {
    presenter: P,
    guard: PromptGuard,
    delay: Duration,
    state: PromptState,
    membership: Option<Membership>,
}

impl<P: PromptPresenter> CheckInPromptController<P> {
    pub fn new(presenter: P, guard: PromptGuard) -> Self {
        Self {
            presenter,
            guard,
            delay: DEFAULT_PROMPT_DELAY,
            state: PromptState::Idle,
            membership: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn state(&self) -> PromptState {
        self.state
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    /// Check-ins should only be fetched once the membership is known.
    pub fn wants_check_ins(&self) -> bool {
        self.state == PromptState::Evaluating
    }

    fn transition(&mut self, next: PromptState) {
        if self.state != next {
            tracing::info!("Check-in prompt: {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }

    /// Suppresses when the daily ledger says the prompt was already shown.
    fn already_prompted(&mut self, seen: impl FnOnce(&dyn PromptLedger) -> bool) -> bool {
        let PromptGuard::Daily(ledger) = &self.guard else {
            return false;
        };
        if !seen(ledger.as_ref()) {
            return false;
        }
        tracing::debug!("Check-in prompt already shown today");
        self.transition(PromptState::Suppressed);
        true
    }

    pub fn membership_changed(&mut self, membership: Option<Membership>) -> PromptState {
        if self.state.is_terminal() {
            return self.state;
        }
        match membership {
            Some(membership) => {
                self.membership = Some(membership);
                self.transition(PromptState::Evaluating);
            }
            None if self.state == PromptState::Evaluating => {
                self.membership = None;
                self.transition(PromptState::Suppressed);
            }
            None => {}
        }
        self.state
    }

    /// Evaluates freshness and, when the user has not checked in today,
    /// waits for the mount delay and opens the prompt.
    ///
    /// Nothing is committed before the delay has passed, so dropping the
    /// returned future leaves the controller in [`PromptState::Evaluating`].
    pub async fn check_ins_loaded<Tz: TimeZone>(
        &mut self,
        check_ins: &[CheckIn],
        now: &DateTime<Tz>,
    ) -> PromptState {
        if self.state != PromptState::Evaluating {
            return self.state;
        }
        let Some(membership) = self.membership.clone() else {
            return self.state;
        };
        if has_checked_in_today(check_ins, now) {
            self.transition(PromptState::Suppressed);
            return self.state;
        }
        let key = PromptKey {
            user_id: membership.user_id.clone(),
            challenge_id: membership.challenge_id,
            date: now.date_naive(),
        };
        if self.already_prompted(|ledger| ledger.contains(&key)) {
            return self.state;
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        // Another controller sharing the ledger may have prompted meanwhile.
        if self.already_prompted(|ledger| !ledger.record(key)) {
            return self.state;
        }
        self.transition(PromptState::Prompted);
        self.presenter.present_check_in_prompt(&membership);
        self.state
    }

    /// A failed check-in fetch leaves the controller waiting; nothing is
    /// retried from here.
    pub fn check_ins_failed(&mut self, error: &ClientError) -> PromptState {
        tracing::warn!("Could not load check-ins for prompt evaluation: {error}");
        self.state
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::{NaiveDateTime, Utc};

    use super::*;

    #[derive(Default, Clone)]
    struct CountingPresenter(Arc<AtomicUsize>);

    impl CountingPresenter {
        fn count(&self) -> usize {
            self.0.load(Ordering::SeqCst)
        }
    }

    impl PromptPresenter for CountingPresenter {
        fn present_check_in_prompt(&self, _membership: &Membership) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn membership() -> Membership {
        serde_json::from_str(r#"{"id": 1, "userId": "user_1", "challengeId": 5, "cohortId": null}"#)
            .unwrap()
    }

    fn now() -> DateTime<Utc> {
        NaiveDateTime::parse_from_str("2024-06-01T10:00:00", "%Y-%m-%dT%H:%M:%S")
            .unwrap()
            .and_utc()
    }

    fn controller(guard: PromptGuard) -> CheckInPromptController<CountingPresenter> {
        CheckInPromptController::new(CountingPresenter::default(), guard)
            .with_delay(Duration::ZERO)
    }

    fn done_today() -> Vec<CheckIn> {
        vec![CheckIn {
            created_at: "2024-06-01T09:00:00".to_string(),
            ..Default::default()
        }]
    }

    #[tokio::test]
    async fn test_no_membership_never_prompts() {
        let mut controller = controller(PromptGuard::PerMount);
        assert_eq!(controller.membership_changed(None), PromptState::Idle);
        assert!(!controller.wants_check_ins());
        assert_eq!(controller.check_ins_loaded(&[], &now()).await, PromptState::Idle);
        assert_eq!(controller.presenter().count(), 0);
    }

    #[tokio::test]
    async fn test_not_checked_in_prompts_once() {
        let mut controller = controller(PromptGuard::PerMount);
        assert_eq!(
            controller.membership_changed(Some(membership())),
            PromptState::Evaluating
        );
        assert!(controller.wants_check_ins());
        assert_eq!(controller.check_ins_loaded(&[], &now()).await, PromptState::Prompted);
        // Refetches within the same mount change nothing.
        controller.check_ins_loaded(&[], &now()).await;
        controller.membership_changed(Some(membership()));
        controller.check_ins_loaded(&[], &now()).await;
        assert_eq!(controller.state(), PromptState::Prompted);
        assert_eq!(controller.presenter().count(), 1);
    }

    #[tokio::test]
    async fn test_checked_in_today_is_suppressed() {
        let mut controller = controller(PromptGuard::PerMount);
        controller.membership_changed(Some(membership()));
        assert_eq!(
            controller.check_ins_loaded(&done_today(), &now()).await,
            PromptState::Suppressed
        );
        controller.check_ins_loaded(&[], &now()).await;
        assert_eq!(controller.state(), PromptState::Suppressed);
        assert_eq!(controller.presenter().count(), 0);
    }

    #[tokio::test]
    async fn test_losing_membership_suppresses() {
        let mut controller = controller(PromptGuard::PerMount);
        controller.membership_changed(Some(membership()));
        assert_eq!(controller.membership_changed(None), PromptState::Suppressed);
        controller.check_ins_loaded(&[], &now()).await;
        assert_eq!(controller.presenter().count(), 0);
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_evaluating() {
        let mut controller = controller(PromptGuard::PerMount);
        controller.membership_changed(Some(membership()));
        let state = controller.check_ins_failed(&ClientError::Network {
            host: "http://localhost:3000".to_string(),
            message: "timeout".to_string(),
        });
        assert_eq!(state, PromptState::Evaluating);
        assert_eq!(controller.presenter().count(), 0);
    }

    #[tokio::test]
    async fn test_remount_prompts_again_per_mount() {
        let presenter = CountingPresenter::default();
        for _ in 0..2 {
            let mut controller =
                CheckInPromptController::new(presenter.clone(), PromptGuard::PerMount)
                    .with_delay(Duration::ZERO);
            controller.membership_changed(Some(membership()));
            controller.check_ins_loaded(&[], &now()).await;
        }
        assert_eq!(presenter.count(), 2);
    }

    #[tokio::test]
    async fn test_daily_guard_spans_mounts() {
        let presenter = CountingPresenter::default();
        let ledger: Arc<dyn PromptLedger> = Arc::new(InMemoryPromptLedger::new());
        let mut states = Vec::new();
        for _ in 0..2 {
            let mut controller = CheckInPromptController::new(
                presenter.clone(),
                PromptGuard::Daily(ledger.clone()),
            )
            .with_delay(Duration::ZERO);
            controller.membership_changed(Some(membership()));
            states.push(controller.check_ins_loaded(&[], &now()).await);
        }
        assert_eq!(states, vec![PromptState::Prompted, PromptState::Suppressed]);
        assert_eq!(presenter.count(), 1);

        // Next day prompts again.
        let mut controller =
            CheckInPromptController::new(presenter.clone(), PromptGuard::Daily(ledger))
                .with_delay(Duration::ZERO);
        controller.membership_changed(Some(membership()));
        let tomorrow = now() + chrono::Duration::days(1);
        controller.check_ins_loaded(&[], &tomorrow).await;
        assert_eq!(presenter.count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_prompt_waits_for_mount_delay() {
        let presenter = CountingPresenter::default();
        let mut controller =
            CheckInPromptController::new(presenter.clone(), PromptGuard::PerMount);
        controller.membership_changed(Some(membership()));
        let started = tokio::time::Instant::now();
        controller.check_ins_loaded(&[], &now()).await;
        assert!(started.elapsed() >= DEFAULT_PROMPT_DELAY);
        assert_eq!(presenter.count(), 1);
    }

    #[tokio::test]
    async fn test_end_to_end_scenarios() {
        let mut prompted = controller(PromptGuard::PerMount);
        prompted.membership_changed(Some(
            serde_json::from_str(r#"{"id": 1, "cohortId": null}"#).unwrap(),
        ));
        assert_eq!(prompted.check_ins_loaded(&[], &now()).await, PromptState::Prompted);
        assert_eq!(prompted.presenter().count(), 1);

        let mut suppressed = controller(PromptGuard::PerMount);
        suppressed.membership_changed(Some(serde_json::from_str(r#"{"id": 1}"#).unwrap()));
        let check_ins: Vec<CheckIn> =
            serde_json::from_str(r#"[{"createdAt": "2024-06-01T09:00:00"}]"#).unwrap();
        assert_eq!(
            suppressed.check_ins_loaded(&check_ins, &now()).await,
            PromptState::Suppressed
        );
        assert_eq!(suppressed.presenter().count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_delay_commits_nothing() {
        let presenter = CountingPresenter::default();
        let ledger: Arc<dyn PromptLedger> = Arc::new(InMemoryPromptLedger::new());
        let mut controller =
            CheckInPromptController::new(presenter.clone(), PromptGuard::Daily(ledger.clone()));
        controller.membership_changed(Some(membership()));

        let cancelled = tokio::time::timeout(
            Duration::from_millis(100),
            controller.check_ins_loaded(&[], &now()),
        )
        .await;
        assert!(cancelled.is_err());
        assert_eq!(controller.state(), PromptState::Evaluating);
        assert_eq!(presenter.count(), 0);
        let key = PromptKey {
            user_id: "user_1".to_string(),
            challenge_id: 5,
            date: now().date_naive(),
        };
        assert!(!ledger.contains(&key));

        assert_eq!(
            controller.check_ins_loaded(&[], &now()).await,
            PromptState::Prompted
        );
        assert_eq!(presenter.count(), 1);
        assert!(ledger.contains(&key));
    }

    #[tokio::test(start_paused = true)]
    async fn test_daily_guard_race_during_delay_prompts_once() {
        let presenter = CountingPresenter::default();
        let ledger: Arc<dyn PromptLedger> = Arc::new(InMemoryPromptLedger::new());
        let mut first =
            CheckInPromptController::new(presenter.clone(), PromptGuard::Daily(ledger.clone()));
        let mut second =
            CheckInPromptController::new(presenter.clone(), PromptGuard::Daily(ledger));
        first.membership_changed(Some(membership()));
        second.membership_changed(Some(membership()));

        let today = now();
        let (a, b) = tokio::join!(
            first.check_ins_loaded(&[], &today),
            second.check_ins_loaded(&[], &today)
        );
        let mut states = vec![a, b];
        states.sort_by_key(|s| *s == PromptState::Suppressed);
        assert_eq!(states, vec![PromptState::Prompted, PromptState::Suppressed]);
        assert_eq!(presenter.count(), 1);
    }
}
