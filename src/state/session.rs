//! In-memory play session: roster, completion map, and turn pointer.

use indexmap::IndexMap;

use crate::engine::models::{GameId, RosterEntry, StudentId, UserId};

/// Highest score the engine can legitimately report.
pub const MAX_SCORE: u16 = 100;

/// Roster member participating in the play session.
#[derive(Debug, Clone, PartialEq)]
pub struct Student {
    /// Engine-side identifier.
    pub id: StudentId,
    /// Display name.
    pub name: String,
    /// Grade/class label used for the per-grade summary.
    pub grade: String,
    /// Historical average carried over from the roster fetch.
    pub avg_score: f64,
}

impl From<RosterEntry> for Student {
    fn from(entry: RosterEntry) -> Self {
        Self {
            id: entry.id,
            name: entry.name,
            grade: entry.grade,
            avg_score: entry.avg_score,
        }
    }
}

/// Aggregated state for an in-progress play session.
///
/// The completed-set is the key set of `scores`; there is deliberately no
/// second mirror of it, so the two can never drift apart. All mutation goes
/// through the methods below, which maintain the invariants the loops rely
/// on: scores only attach to roster members, the active index stays in
/// bounds, and recording is idempotent per student.
#[derive(Debug, Clone)]
pub struct PlaySession {
    /// Game definition being played.
    pub game_id: GameId,
    /// Operator driving the session.
    pub user_id: UserId,
    roster: Vec<Student>,
    scores: IndexMap<StudentId, u16>,
    active_index: usize,
    last_completed: Option<StudentId>,
}

impl PlaySession {
    /// Build a session from a fetched roster, deduplicating by student id
    /// while preserving the engine's ordering.
    pub fn new(game_id: GameId, user_id: UserId, roster: Vec<Student>) -> Self {
        let mut deduped: Vec<Student> = Vec::with_capacity(roster.len());
        for student in roster {
            if !deduped.iter().any(|existing| existing.id == student.id) {
                deduped.push(student);
            }
        }

        Self {
            game_id,
            user_id,
            roster: deduped,
            scores: IndexMap::new(),
            active_index: 0,
            last_completed: None,
        }
    }

    /// The fixed roster for this session.
    pub fn roster(&self) -> &[Student] {
        &self.roster
    }

    /// Roster size.
    pub fn len(&self) -> usize {
        self.roster.len()
    }

    /// Whether the roster is empty (a session should never be installed empty).
    pub fn is_empty(&self) -> bool {
        self.roster.is_empty()
    }

    /// Ids of every roster member, in roster order.
    pub fn student_ids(&self) -> Vec<StudentId> {
        self.roster.iter().map(|student| student.id).collect()
    }

    /// Position of a student in the roster, if they belong to it.
    pub fn position_of(&self, id: StudentId) -> Option<usize> {
        self.roster.iter().position(|student| student.id == id)
    }

    /// The student whose turn is current.
    pub fn active_student(&self) -> Option<&Student> {
        self.roster.get(self.active_index)
    }

    /// Index of the current turn.
    pub fn active_index(&self) -> usize {
        self.active_index
    }

    /// Move the turn pointer to an explicit roster position.
    ///
    /// Out-of-bounds positions are ignored; the pointer never leaves the roster.
    pub fn set_active_index(&mut self, index: usize) {
        if index < self.roster.len() {
            self.active_index = index;
        }
    }

    /// Adopt the engine's report of who is currently playing.
    ///
    /// Returns the adopted position when the student belongs to the roster.
    pub fn adopt_active(&mut self, id: StudentId) -> Option<usize> {
        let position = self.position_of(id)?;
        self.active_index = position;
        Some(position)
    }

    /// Completion map in insertion order.
    pub fn scores(&self) -> &IndexMap<StudentId, u16> {
        &self.scores
    }

    /// Recorded score of a student, if they finished.
    pub fn score_of(&self, id: StudentId) -> Option<u16> {
        self.scores.get(&id).copied()
    }

    /// Whether a student already has a recorded score.
    pub fn is_completed(&self, id: StudentId) -> bool {
        self.scores.contains_key(&id)
    }

    /// Number of students with a recorded score.
    pub fn completed_count(&self) -> usize {
        self.scores.len()
    }

    /// Whether every roster member has a recorded score.
    pub fn is_exhausted(&self) -> bool {
        !self.roster.is_empty() && self.scores.len() == self.roster.len()
    }

    /// The student whose completion was observed most recently.
    pub fn last_completed(&self) -> Option<StudentId> {
        self.last_completed
    }

    /// Record a completion observed by the poller.
    ///
    /// Idempotent: a student already recorded, a non-roster id, or an
    /// out-of-range score leaves the map untouched and returns `false`.
    pub fn record_completion(&mut self, id: StudentId, score: u16) -> bool {
        if score > MAX_SCORE || self.position_of(id).is_none() || self.scores.contains_key(&id) {
            return false;
        }

        self.scores.insert(id, score);
        self.last_completed = Some(id);
        true
    }

    /// Replace the completion map wholesale with the engine's batched truth.
    ///
    /// This is the aggregator's authoritative refresh: entries for unknown
    /// students or out-of-range scores are dropped, everything else replaces
    /// whatever the poller accumulated. Applying the same data twice yields
    /// the same map.
    pub fn replace_scores(&mut self, entries: impl IntoIterator<Item = (StudentId, u16)>) {
        self.scores = entries
            .into_iter()
            .filter(|(id, score)| *score <= MAX_SCORE && self.roster.iter().any(|s| s.id == *id))
            .collect();

        if let Some(last) = self.last_completed {
            if !self.scores.contains_key(&last) {
                self.last_completed = self.scores.keys().last().copied();
            }
        } else {
            self.last_completed = self.scores.keys().last().copied();
        }
    }

    /// Find the next student eligible to play after the given roster position.
    ///
    /// Scans forward from `position + 1`, wrapping modulo the roster length,
    /// for at most one full traversal, skipping students with a recorded
    /// score. Returns `None` when everyone is recorded — i.e. exactly when
    /// the roster is exhausted.
    pub fn next_eligible_after(&self, position: usize) -> Option<usize> {
        if self.roster.is_empty() {
            return None;
        }

        let len = self.roster.len();
        (1..=len)
            .map(|step| (position + step) % len)
            .find(|candidate| !self.is_completed(self.roster[*candidate].id))
    }

    /// First roster position without a recorded score, scanning from the top.
    ///
    /// The aggregator reconciles the turn pointer with this after a refresh;
    /// unlike [`Self::next_eligible_after`] it does not start from the
    /// current turn, matching the refresh's from-scratch view of the session.
    pub fn first_pending(&self) -> Option<usize> {
        self.roster
            .iter()
            .position(|student| !self.is_completed(student.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student(id: StudentId, grade: &str) -> Student {
        Student {
            id,
            name: format!("Student {id}"),
            grade: grade.to_string(),
            avg_score: 50.0,
        }
    }

    fn three_student_session() -> PlaySession {
        PlaySession::new(
            42,
            7,
            vec![
                student(1, "1. Sınıf"),
                student(2, "1. Sınıf"),
                student(3, "2. Sınıf"),
            ],
        )
    }

    #[test]
    fn roster_is_deduplicated_preserving_order() {
        let session = PlaySession::new(
            42,
            7,
            vec![student(1, "a"), student(2, "a"), student(1, "a")],
        );
        assert_eq!(session.student_ids(), vec![1, 2]);
    }

    #[test]
    fn completed_set_is_monotone_and_bounded() {
        let mut session = three_student_session();

        assert!(session.record_completion(1, 92));
        assert!(session.record_completion(2, 81));
        assert!(session.record_completion(3, 77));
        assert_eq!(session.completed_count(), 3);
        assert!(session.is_exhausted());

        // No further recording can grow the set past the roster size.
        assert!(!session.record_completion(1, 10));
        assert!(!session.record_completion(99, 50));
        assert_eq!(session.completed_count(), session.len());
    }

    #[test]
    fn duplicate_completion_is_recorded_once() {
        let mut session = three_student_session();
        assert!(session.record_completion(1, 92));
        assert!(!session.record_completion(1, 92));
        assert_eq!(session.score_of(1), Some(92));
        assert_eq!(session.completed_count(), 1);
    }

    #[test]
    fn out_of_range_score_is_rejected() {
        let mut session = three_student_session();
        assert!(!session.record_completion(1, 101));
        assert_eq!(session.completed_count(), 0);
    }

    #[test]
    fn advancement_picks_lowest_following_uncompleted() {
        let mut session = three_student_session();
        session.record_completion(2, 60);

        // After position 0, student 2 (position 1) is recorded, so the next
        // eligible is position 2.
        assert_eq!(session.next_eligible_after(0), Some(2));

        // Wraps around past the end.
        session.record_completion(3, 70);
        assert_eq!(session.next_eligible_after(1), Some(0));
    }

    #[test]
    fn advancement_stops_when_roster_exhausted() {
        let mut session = three_student_session();
        session.record_completion(1, 10);
        session.record_completion(2, 20);
        session.record_completion(3, 30);
        assert_eq!(session.next_eligible_after(0), None);
        assert_eq!(session.first_pending(), None);
    }

    #[test]
    fn wholesale_refresh_is_idempotent() {
        let mut session = three_student_session();
        session.record_completion(1, 40);

        let truth = vec![(1, 92), (3, 77)];
        session.replace_scores(truth.clone());
        let first = session.scores().clone();

        session.replace_scores(truth);
        assert_eq!(session.scores(), &first);
        assert_eq!(session.score_of(1), Some(92));
        assert_eq!(session.score_of(3), Some(77));
        assert!(!session.is_completed(2));
    }

    #[test]
    fn refresh_drops_unknown_students_and_bad_scores() {
        let mut session = three_student_session();
        session.replace_scores(vec![(1, 92), (99, 50), (2, 200)]);
        assert_eq!(session.completed_count(), 1);
        assert_eq!(session.score_of(1), Some(92));
    }

    #[test]
    fn adopt_active_only_for_roster_members() {
        let mut session = three_student_session();
        assert_eq!(session.adopt_active(3), Some(2));
        assert_eq!(session.active_index(), 2);
        assert_eq!(session.adopt_active(99), None);
        assert_eq!(session.active_index(), 2);
    }

    #[test]
    fn active_index_never_leaves_bounds() {
        let mut session = three_student_session();
        session.set_active_index(99);
        assert_eq!(session.active_index(), 0);
        session.set_active_index(2);
        assert_eq!(session.active_index(), 2);
    }
}
