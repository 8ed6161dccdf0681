/// Queue advancement between students.
pub mod advancer;
/// Dismissible operator alert registry.
pub mod alert_service;
/// Engine reachability probes and status forwarding.
pub mod connection;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Periodic sync-status polling.
pub mod poller;
/// Batched authoritative score refresh.
pub mod scores;
/// Session lifecycle and operator-triggered operations.
pub mod session_service;
/// Event stream plumbing for SSE observers.
pub mod stream;
/// End-of-session summary statistics.
pub mod summary;

#[cfg(test)]
pub(crate) mod test_support {
    //! Scripted engine stub and state harness for the service tests.

    use std::{
        collections::VecDeque,
        sync::{Arc, Mutex},
        time::Duration,
    };

    use futures::future::BoxFuture;

    use crate::{
        config::AppConfig,
        engine::{
            GameEngine,
            error::{EngineError, EngineResult},
            models::{
                AllScores, GameId, RosterEntry, ScoreEntry, StudentId, SyncSnapshot, UserId,
            },
        },
        state::{AppState, PhaseEvent, PlaySession, SharedState, Student},
    };

    /// Engine whose responses are scripted by the test.
    ///
    /// Sync snapshots and probe results are consumed front-to-back; an empty
    /// queue yields an empty snapshot / a successful probe. Every outbound
    /// signal is recorded for assertions.
    #[derive(Default)]
    pub struct StubEngine {
        pub roster: Mutex<Vec<RosterEntry>>,
        pub snapshots: Mutex<VecDeque<EngineResult<SyncSnapshot>>>,
        pub scores: Mutex<AllScores>,
        pub probes: Mutex<VecDeque<EngineResult<()>>>,
        pub start_signals: Mutex<Vec<StudentId>>,
        pub session_starts: Mutex<Vec<StudentId>>,
        pub sync_calls: Mutex<usize>,
        pub fail_scores: Mutex<Option<()>>,
    }

    impl StubEngine {
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        pub fn push_snapshot(&self, snapshot: SyncSnapshot) {
            self.snapshots.lock().unwrap().push_back(Ok(snapshot));
        }

        pub fn push_sync_error(&self, error: EngineError) {
            self.snapshots.lock().unwrap().push_back(Err(error));
        }

        pub fn push_probe_failure(&self) {
            self.probes
                .lock()
                .unwrap()
                .push_back(Err(EngineError::Timeout {
                    path: "gamesession/ui-sync-status".into(),
                }));
        }

        pub fn set_scores(&self, entries: &[(StudentId, u16)]) {
            let mut scores = self.scores.lock().unwrap();
            scores.clear();
            for (id, score) in entries {
                scores.insert(
                    id.to_string(),
                    ScoreEntry {
                        completed: true,
                        score: Some(*score),
                    },
                );
            }
        }

        pub fn start_signals(&self) -> Vec<StudentId> {
            self.start_signals.lock().unwrap().clone()
        }

        pub fn sync_calls(&self) -> usize {
            *self.sync_calls.lock().unwrap()
        }
    }

    impl GameEngine for Arc<StubEngine> {
        fn fetch_roster(
            &self,
            _game_id: GameId,
        ) -> BoxFuture<'static, EngineResult<Vec<RosterEntry>>> {
            let stub = Arc::clone(self);
            Box::pin(async move { Ok(stub.roster.lock().unwrap().clone()) })
        }

        fn sync_status(&self) -> BoxFuture<'static, EngineResult<SyncSnapshot>> {
            let stub = Arc::clone(self);
            Box::pin(async move {
                *stub.sync_calls.lock().unwrap() += 1;
                stub.snapshots
                    .lock()
                    .unwrap()
                    .pop_front()
                    .unwrap_or_else(|| Ok(SyncSnapshot::default()))
            })
        }

        fn send_start_signal(
            &self,
            _game_id: GameId,
            student_id: StudentId,
            _user_id: UserId,
        ) -> BoxFuture<'static, EngineResult<()>> {
            let stub = Arc::clone(self);
            Box::pin(async move {
                stub.start_signals.lock().unwrap().push(student_id);
                Ok(())
            })
        }

        fn all_scores(
            &self,
            _game_id: GameId,
            _student_ids: &[StudentId],
        ) -> BoxFuture<'static, EngineResult<AllScores>> {
            let stub = Arc::clone(self);
            Box::pin(async move {
                if stub.fail_scores.lock().unwrap().is_some() {
                    return Err(EngineError::Timeout {
                        path: "gamesession/all-scores".into(),
                    });
                }
                Ok(stub.scores.lock().unwrap().clone())
            })
        }

        fn start_session(
            &self,
            _game_id: GameId,
            student_id: StudentId,
        ) -> BoxFuture<'static, EngineResult<()>> {
            let stub = Arc::clone(self);
            Box::pin(async move {
                stub.session_starts.lock().unwrap().push(student_id);
                Ok(())
            })
        }

        fn probe(&self) -> BoxFuture<'static, EngineResult<()>> {
            let stub = Arc::clone(self);
            Box::pin(async move {
                stub.probes
                    .lock()
                    .unwrap()
                    .pop_front()
                    .unwrap_or(Ok(()))
            })
        }

        fn endpoint(&self) -> String {
            "stub://engine".to_string()
        }
    }

    /// Config with zeroed delays so tests never sleep.
    pub fn fast_config() -> AppConfig {
        AppConfig {
            advance_settle_delay: Duration::ZERO,
            exhaustion_cooldown: Duration::from_millis(50),
            ..AppConfig::default()
        }
    }

    pub fn student(id: StudentId, grade: &str) -> Student {
        Student {
            id,
            name: format!("Student {id}"),
            grade: grade.to_string(),
            avg_score: 50.0,
        }
    }

    /// State with a three-student running session installed.
    pub async fn running_state(stub: &Arc<StubEngine>) -> SharedState {
        let state = AppState::new(fast_config(), Arc::new(Arc::clone(stub)));
        let session = PlaySession::new(
            42,
            7,
            vec![
                student(1, "1. Sınıf"),
                student(2, "1. Sınıf"),
                student(3, "2. Sınıf"),
            ],
        );
        {
            let mut slot = state.session().write().await;
            *slot = Some(session);
        }
        state.apply_phase(PhaseEvent::BeginSession).await.unwrap();
        state.set_polling(true);
        state
    }
}
