//! Offline [`GameEngine`] used when no engine is reachable.
//!
//! Fabricates a small synthetic roster with most students already scored so
//! the operator can demo the session flow without any network. The mock
//! never progresses runs on its own; it answers the same questions the live
//! engine would, from seeded data.

use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;
use indexmap::IndexMap;
use rand::Rng;

use super::{
    GameEngine,
    error::EngineResult,
    models::{AllScores, GameId, RosterEntry, ScoreEntry, StudentId, SyncSnapshot, UserId},
};

/// Number of students fabricated per mock roster.
const MOCK_ROSTER_SIZE: usize = 3;
/// Probability that a fabricated student starts out already scored.
const MOCK_SCORED_RATIO: f64 = 0.7;

#[derive(Debug)]
struct MockWorld {
    roster: Vec<RosterEntry>,
    scores: IndexMap<StudentId, u16>,
    active: Option<StudentId>,
}

#[derive(Clone)]
/// Seeded in-memory engine stand-in.
pub struct MockEngine {
    world: Arc<Mutex<MockWorld>>,
}

impl MockEngine {
    /// Fabricate a fresh mock world with randomized grades, averages, and scores.
    pub fn seeded() -> Self {
        let mut rng = rand::rng();

        let roster: Vec<RosterEntry> = (1..=MOCK_ROSTER_SIZE as StudentId)
            .map(|id| RosterEntry {
                id,
                name: format!("Öğrenci {id}"),
                grade: format!("{}. Sınıf", rng.random_range(1..=5)),
                avg_score: rng.random_range(0..=100) as f64,
            })
            .collect();

        let mut scores = IndexMap::new();
        for entry in &roster {
            if rng.random::<f64>() < MOCK_SCORED_RATIO {
                scores.insert(entry.id, rng.random_range(0..=100u16));
            }
        }

        let active = roster
            .iter()
            .map(|entry| entry.id)
            .find(|id| !scores.contains_key(id))
            .or_else(|| roster.first().map(|entry| entry.id));

        Self {
            world: Arc::new(Mutex::new(MockWorld {
                roster,
                scores,
                active,
            })),
        }
    }

    /// Build a mock with explicit contents, used by tests that need determinism.
    #[cfg(test)]
    pub fn with_world(roster: Vec<RosterEntry>, scores: IndexMap<StudentId, u16>) -> Self {
        let active = roster.first().map(|entry| entry.id);
        Self {
            world: Arc::new(Mutex::new(MockWorld {
                roster,
                scores,
                active,
            })),
        }
    }
}

impl GameEngine for MockEngine {
    fn fetch_roster(&self, _game_id: GameId) -> BoxFuture<'static, EngineResult<Vec<RosterEntry>>> {
        let world = Arc::clone(&self.world);
        Box::pin(async move { Ok(world.lock().expect("mock world lock").roster.clone()) })
    }

    fn sync_status(&self) -> BoxFuture<'static, EngineResult<SyncSnapshot>> {
        let world = Arc::clone(&self.world);
        Box::pin(async move {
            let world = world.lock().expect("mock world lock");
            let Some(active) = world.active else {
                return Ok(SyncSnapshot::default());
            };
            let score = world.scores.get(&active).copied();
            Ok(SyncSnapshot {
                student_id: Some(active),
                completed: Some(score.is_some()),
                score,
            })
        })
    }

    fn send_start_signal(
        &self,
        _game_id: GameId,
        student_id: StudentId,
        _user_id: UserId,
    ) -> BoxFuture<'static, EngineResult<()>> {
        let world = Arc::clone(&self.world);
        Box::pin(async move {
            world.lock().expect("mock world lock").active = Some(student_id);
            Ok(())
        })
    }

    fn all_scores(
        &self,
        _game_id: GameId,
        student_ids: &[StudentId],
    ) -> BoxFuture<'static, EngineResult<AllScores>> {
        let world = Arc::clone(&self.world);
        let requested = student_ids.to_vec();
        Box::pin(async move {
            let world = world.lock().expect("mock world lock");
            let scores = requested
                .iter()
                .map(|id| {
                    let score = world.scores.get(id).copied();
                    (
                        id.to_string(),
                        ScoreEntry {
                            completed: score.is_some(),
                            score,
                        },
                    )
                })
                .collect();
            Ok(scores)
        })
    }

    fn start_session(
        &self,
        _game_id: GameId,
        _student_id: StudentId,
    ) -> BoxFuture<'static, EngineResult<()>> {
        Box::pin(async move { Ok(()) })
    }

    fn probe(&self) -> BoxFuture<'static, EngineResult<()>> {
        Box::pin(async move { Ok(()) })
    }

    fn endpoint(&self) -> String {
        "mock://classroom".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn seeded_mock_serves_consistent_roster_and_scores() {
        let mock = MockEngine::seeded();
        let roster = mock.fetch_roster(1).await.unwrap();
        assert_eq!(roster.len(), MOCK_ROSTER_SIZE);

        let ids: Vec<StudentId> = roster.iter().map(|entry| entry.id).collect();
        let scores = mock.all_scores(1, &ids).await.unwrap();
        assert_eq!(scores.len(), MOCK_ROSTER_SIZE);
        for entry in scores.values() {
            assert_eq!(entry.completed, entry.score.is_some());
        }
    }

    #[tokio::test]
    async fn start_signal_moves_the_active_student() {
        let roster = vec![
            RosterEntry {
                id: 1,
                name: "A".into(),
                grade: "1. Sınıf".into(),
                avg_score: 50.0,
            },
            RosterEntry {
                id: 2,
                name: "B".into(),
                grade: "1. Sınıf".into(),
                avg_score: 60.0,
            },
        ];
        let mock = MockEngine::with_world(roster, IndexMap::new());

        mock.send_start_signal(1, 2, 9).await.unwrap();
        let snapshot = mock.sync_status().await.unwrap();
        assert_eq!(snapshot.student_id, Some(2));
        assert_eq!(snapshot.completed, Some(false));
    }
}
