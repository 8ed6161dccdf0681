//! Wire models for the game-engine REST boundary.
//!
//! The engine is loose about numeric encodings: identifiers and scores may
//! arrive as JSON numbers or as numeric strings, and completion flags as
//! booleans or 0/1 integers. The models below accept exactly that looseness
//! and nothing more; any other shape fails deserialization.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_with::{BoolFromInt, DisplayFromStr, PickFirst, serde_as};

/// Numeric identifier of a student in the engine's database.
pub type StudentId = i64;
/// Numeric identifier of a game definition.
pub type GameId = i64;
/// Numeric identifier of the operator driving the session.
pub type UserId = i64;

#[serde_as]
#[derive(Debug, Clone, Deserialize, PartialEq)]
/// One roster entry as returned by `GET /games/{id}/students`.
pub struct RosterEntry {
    /// Student identifier; tolerated as number or numeric string.
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub id: StudentId,
    /// Display name.
    pub name: String,
    /// Grade/class label, e.g. `"3. Sınıf"`.
    pub grade: String,
    /// Historical average score; the engine omits it for students without history.
    #[serde(default)]
    pub avg_score: f64,
}

#[serde_as]
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
/// Latest poll result from `GET /gamesession/ui-sync-status`.
///
/// The engine answers `{}` between sessions; every field is therefore
/// optional and an all-empty snapshot means "no update this tick".
pub struct SyncSnapshot {
    /// Student currently active on the engine side.
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    #[serde(default)]
    pub student_id: Option<StudentId>,
    /// Whether that student's run just completed.
    #[serde_as(as = "Option<PickFirst<(_, BoolFromInt)>>")]
    #[serde(default)]
    pub completed: Option<bool>,
    /// Final score of the completed run, when `completed` is set.
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    #[serde(default)]
    pub score: Option<u16>,
}

impl SyncSnapshot {
    /// Whether the engine reported nothing at all this tick.
    pub fn is_empty(&self) -> bool {
        self.student_id.is_none() && self.completed.is_none() && self.score.is_none()
    }

    /// The completion event carried by this snapshot, if any.
    pub fn completion(&self) -> Option<(StudentId, u16)> {
        match (self.completed, self.student_id, self.score) {
            (Some(true), Some(student_id), Some(score)) => Some((student_id, score)),
            _ => None,
        }
    }
}

#[serde_as]
#[derive(Debug, Clone, Deserialize, PartialEq)]
/// Per-student entry of the batched `GET /gamesession/all-scores` response.
pub struct ScoreEntry {
    /// Whether the student finished their run.
    #[serde_as(as = "PickFirst<(_, BoolFromInt)>")]
    #[serde(default)]
    pub completed: bool,
    /// Final score, present once completed.
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    #[serde(default)]
    pub score: Option<u16>,
}

/// Batched score map keyed by student id.
///
/// JSON object keys are always strings on the wire, so the map is parsed
/// with string keys and converted with [`completed_scores`].
pub type AllScores = IndexMap<String, ScoreEntry>;

/// Extract the `(student, score)` pairs for completed runs, in response order.
///
/// Entries whose key is not a numeric id are dropped; the engine has no
/// business returning them and they carry nothing actionable.
pub fn completed_scores(scores: &AllScores) -> Vec<(StudentId, u16)> {
    scores
        .iter()
        .filter_map(|(key, entry)| {
            let id: StudentId = key.parse().ok()?;
            match (entry.completed, entry.score) {
                (true, Some(score)) => Some((id, score)),
                _ => None,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, PartialEq)]
/// Body of `POST /gamesession/send-start-signal`.
pub struct StartSignal {
    /// Game being played.
    pub game_id: GameId,
    /// Student whose turn begins.
    pub student_id: StudentId,
    /// Operator on whose behalf the signal is sent.
    pub user_id: UserId,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
/// Body of the fire-and-forget `POST /gamesession/start` session initiation.
pub struct SessionStart {
    /// Game being played.
    pub game_id: GameId,
    /// Student whose engine-side session is pre-created.
    pub student_id: StudentId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_accepts_numbers_and_numeric_strings() {
        let by_number: SyncSnapshot =
            serde_json::from_str(r#"{"student_id": 7, "completed": true, "score": 85}"#).unwrap();
        let by_string: SyncSnapshot =
            serde_json::from_str(r#"{"student_id": "7", "completed": 1, "score": "85"}"#).unwrap();
        assert_eq!(by_number, by_string);
        assert_eq!(by_number.completion(), Some((7, 85)));
    }

    #[test]
    fn empty_snapshot_is_no_update() {
        let snapshot: SyncSnapshot = serde_json::from_str("{}").unwrap();
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.completion(), None);
    }

    #[test]
    fn incomplete_snapshot_carries_no_completion() {
        let snapshot: SyncSnapshot =
            serde_json::from_str(r#"{"student_id": 4, "completed": false, "score": 0}"#).unwrap();
        assert_eq!(snapshot.completion(), None);
        assert_eq!(snapshot.student_id, Some(4));
    }

    #[test]
    fn malformed_score_is_rejected_not_coerced() {
        let result = serde_json::from_str::<SyncSnapshot>(r#"{"student_id": 4, "score": "high"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn roster_entry_defaults_missing_average() {
        let entry: RosterEntry =
            serde_json::from_str(r#"{"id": "12", "name": "Ada", "grade": "2. Sınıf"}"#).unwrap();
        assert_eq!(entry.id, 12);
        assert_eq!(entry.avg_score, 0.0);
    }

    #[test]
    fn completed_scores_skips_pending_and_junk_keys() {
        let scores: AllScores = serde_json::from_str(
            r#"{
                "3": {"completed": 1, "score": "92"},
                "5": {"completed": false, "score": null},
                "oops": {"completed": true, "score": 10}
            }"#,
        )
        .unwrap();
        assert_eq!(completed_scores(&scores), vec![(3, 92)]);
    }
}
