//! End-of-session summary statistics.

use indexmap::IndexMap;

use crate::state::{PlaySession, Student};

/// Score paired with the student who holds it.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreHolder {
    /// The student in question.
    pub student: Student,
    /// Their recorded final score.
    pub score: u16,
}

/// Aggregated statistics over the recorded scores of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct GameSummary {
    /// Highest recorded score and its holder.
    pub highest: ScoreHolder,
    /// Lowest recorded score and its holder.
    pub lowest: ScoreHolder,
    /// Mean of all recorded scores.
    pub average: f64,
    /// Mean score per grade label, in roster order of first appearance.
    pub grade_averages: IndexMap<String, f64>,
    /// Number of students with a recorded score.
    pub completed_count: usize,
    /// Roster size.
    pub roster_size: usize,
}

/// Compute the summary over the session's roster and completion map.
///
/// Pure over its input: recomputed on demand, no caching. Returns `None`
/// until at least one score exists. Ties on highest/lowest go to the
/// earlier roster position, matching how the scores were presented.
pub fn compute(session: &PlaySession) -> Option<GameSummary> {
    let mut highest: Option<ScoreHolder> = None;
    let mut lowest: Option<ScoreHolder> = None;
    let mut total: u64 = 0;
    let mut count: usize = 0;
    let mut grade_totals: IndexMap<String, (u64, usize)> = IndexMap::new();

    for student in session.roster() {
        let Some(score) = session.score_of(student.id) else {
            continue;
        };

        if highest.as_ref().is_none_or(|best| score > best.score) {
            highest = Some(ScoreHolder {
                student: student.clone(),
                score,
            });
        }
        if lowest.as_ref().is_none_or(|worst| score < worst.score) {
            lowest = Some(ScoreHolder {
                student: student.clone(),
                score,
            });
        }

        total += u64::from(score);
        count += 1;

        let entry = grade_totals.entry(student.grade.clone()).or_insert((0, 0));
        entry.0 += u64::from(score);
        entry.1 += 1;
    }

    let highest = highest?;
    let lowest = lowest.expect("lowest exists whenever highest does");

    let grade_averages = grade_totals
        .into_iter()
        .map(|(grade, (sum, members))| (grade, sum as f64 / members as f64))
        .collect();

    Some(GameSummary {
        highest,
        lowest,
        average: total as f64 / count as f64,
        grade_averages,
        completed_count: count,
        roster_size: session.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student(id: i64, name: &str, grade: &str) -> Student {
        Student {
            id,
            name: name.to_string(),
            grade: grade.to_string(),
            avg_score: 0.0,
        }
    }

    fn session_with_scores(scores: &[(i64, u16)]) -> PlaySession {
        let mut session = PlaySession::new(
            1,
            1,
            vec![
                student(1, "Ayşe", "1. Sınıf"),
                student(2, "Bora", "1. Sınıf"),
                student(3, "Cem", "2. Sınıf"),
            ],
        );
        for (id, score) in scores {
            session.record_completion(*id, *score);
        }
        session
    }

    #[test]
    fn no_scores_means_no_summary() {
        let session = session_with_scores(&[]);
        assert!(compute(&session).is_none());
    }

    #[test]
    fn full_session_summary_matches_hand_computation() {
        let session = session_with_scores(&[(1, 92), (2, 81), (3, 77)]);
        let summary = compute(&session).unwrap();

        assert_eq!(summary.highest.student.name, "Ayşe");
        assert_eq!(summary.highest.score, 92);
        assert_eq!(summary.lowest.student.name, "Cem");
        assert_eq!(summary.lowest.score, 77);
        assert!((summary.average - 83.333_333).abs() < 1e-4);
        assert_eq!(summary.completed_count, 3);
        assert_eq!(summary.roster_size, 3);

        assert_eq!(summary.grade_averages.get("1. Sınıf"), Some(&86.5));
        assert_eq!(summary.grade_averages.get("2. Sınıf"), Some(&77.0));
    }

    #[test]
    fn partial_session_summarizes_recorded_scores_only() {
        let session = session_with_scores(&[(2, 55)]);
        let summary = compute(&session).unwrap();

        assert_eq!(summary.highest.student.id, 2);
        assert_eq!(summary.lowest.student.id, 2);
        assert_eq!(summary.average, 55.0);
        assert_eq!(summary.completed_count, 1);
        assert_eq!(summary.roster_size, 3);
        assert_eq!(summary.grade_averages.len(), 1);
    }

    #[test]
    fn tied_scores_go_to_the_earlier_roster_position() {
        let session = session_with_scores(&[(1, 80), (2, 80)]);
        let summary = compute(&session).unwrap();
        assert_eq!(summary.highest.student.id, 1);
        assert_eq!(summary.lowest.student.id, 1);
    }
}
