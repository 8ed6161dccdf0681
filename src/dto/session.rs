//! Payloads for the session lifecycle and status endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    dto::{connection::ConnectionView, validation::validate_student_ids},
    engine::models::{GameId, StudentId, UserId},
    services::summary::GameSummary,
    state::{EngineMode, PlaySession, RunState, SessionPhase},
};

/// Payload used to begin a play session for a selected roster subset.
#[derive(Debug, Deserialize, ToSchema)]
pub struct BeginSessionRequest {
    /// Game definition to play.
    pub game_id: GameId,
    /// Students selected in the setup step, in play order.
    pub student_ids: Vec<StudentId>,
    /// Operator on whose behalf start signals are sent.
    pub user_id: UserId,
}

impl Validate for BeginSessionRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.game_id < 1 {
            let mut err = ValidationError::new("game_id_positive");
            err.message = Some("game_id must be positive".into());
            errors.add("game_id", err);
        }

        if let Err(err) = validate_student_ids(&self.student_ids) {
            errors.add("student_ids", err);
        }

        if self.user_id < 1 {
            let mut err = ValidationError::new("user_id_positive");
            err.message = Some("user_id must be positive".into());
            errors.add("user_id", err);
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Payload toggling the poll loop on or off.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PollingRequest {
    /// Whether the poll loop should issue sync requests.
    pub enabled: bool,
}

/// Serialized projection of the session phase machine.
#[derive(Debug, Clone, Copy, Serialize, ToSchema, PartialEq, Eq)]
pub struct PhaseView {
    /// Engine mode axis (`live` or `mock`).
    pub mode: ModeView,
    /// Run-state axis (`idle`, `running`, or `completed`).
    pub run: RunView,
}

/// Serialized engine mode.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ModeView {
    /// Live HTTP engine.
    Live,
    /// Fabricated offline engine.
    Mock,
}

/// Serialized run state.
#[derive(Debug, Clone, Copy, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunView {
    /// No session loaded.
    Idle,
    /// Session active, loops running.
    Running,
    /// Roster exhausted, loops stopped.
    Completed,
}

impl From<SessionPhase> for PhaseView {
    fn from(phase: SessionPhase) -> Self {
        Self {
            mode: match phase.mode {
                EngineMode::Live => ModeView::Live,
                EngineMode::Mock => ModeView::Mock,
            },
            run: match phase.run {
                RunState::Idle => RunView::Idle,
                RunState::Running => RunView::Running,
                RunState::Completed => RunView::Completed,
            },
        }
    }
}

/// One roster member as shown on the session board.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StudentCard {
    /// Engine-side identifier.
    pub id: StudentId,
    /// Display name.
    pub name: String,
    /// Grade/class label.
    pub grade: String,
    /// Historical average score.
    pub avg_score: f64,
    /// Final score, once recorded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u16>,
    /// Whether the student finished their run.
    pub completed: bool,
    /// Whether it is currently this student's turn.
    pub active: bool,
}

/// Status view of the loaded session returned by `GET /session`.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionStatusResponse {
    /// Current phase of the session machine.
    pub phase: PhaseView,
    /// Engine reachability as seen by the connection monitor.
    pub connection: ConnectionView,
    /// Whether the poll loop is issuing sync requests.
    pub polling: bool,
    /// Where the engine client points.
    pub engine_endpoint: String,
    /// Game being played, when a session is loaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_id: Option<GameId>,
    /// Roster cards, empty when no session is loaded.
    pub students: Vec<StudentCard>,
    /// Number of students with a recorded score.
    pub completed_count: usize,
    /// Roster size.
    pub roster_size: usize,
    /// Student whose completion was observed most recently.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_completed: Option<StudentId>,
}

impl SessionStatusResponse {
    /// Build the status view from the shared pieces of state.
    pub fn build(
        phase: SessionPhase,
        connection: ConnectionView,
        polling: bool,
        engine_endpoint: String,
        session: Option<&PlaySession>,
    ) -> Self {
        let students = session
            .map(|session| {
                session
                    .roster()
                    .iter()
                    .enumerate()
                    .map(|(index, student)| StudentCard {
                        id: student.id,
                        name: student.name.clone(),
                        grade: student.grade.clone(),
                        avg_score: student.avg_score,
                        score: session.score_of(student.id),
                        completed: session.is_completed(student.id),
                        active: index == session.active_index(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            phase: phase.into(),
            connection,
            polling,
            engine_endpoint,
            game_id: session.map(|session| session.game_id),
            completed_count: session.map(PlaySession::completed_count).unwrap_or(0),
            roster_size: session.map(PlaySession::len).unwrap_or(0),
            last_completed: session.and_then(PlaySession::last_completed),
            students,
        }
    }
}

/// Score + holder pair inside the summary.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ScoreHolderView {
    /// Student identifier.
    pub student_id: StudentId,
    /// Student display name.
    pub name: String,
    /// The score in question.
    pub score: u16,
}

/// Mean score for one grade label.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GradeAverageView {
    /// Grade/class label.
    pub grade: String,
    /// Mean recorded score of that grade's students.
    pub average: f64,
}

/// Summary statistics returned by `GET /session/summary`.
#[derive(Debug, Serialize, ToSchema)]
pub struct SummaryResponse {
    /// Highest recorded score and its holder.
    pub highest: ScoreHolderView,
    /// Lowest recorded score and its holder.
    pub lowest: ScoreHolderView,
    /// Mean of all recorded scores.
    pub average: f64,
    /// Mean score per grade label, in roster order of first appearance.
    pub grade_averages: Vec<GradeAverageView>,
    /// Number of students with a recorded score.
    pub completed_count: usize,
    /// Roster size.
    pub roster_size: usize,
}

impl From<GameSummary> for SummaryResponse {
    fn from(summary: GameSummary) -> Self {
        Self {
            highest: ScoreHolderView {
                student_id: summary.highest.student.id,
                name: summary.highest.student.name,
                score: summary.highest.score,
            },
            lowest: ScoreHolderView {
                student_id: summary.lowest.student.id,
                name: summary.lowest.student.name,
                score: summary.lowest.score,
            },
            average: summary.average,
            grade_averages: summary
                .grade_averages
                .into_iter()
                .map(|(grade, average)| GradeAverageView { grade, average })
                .collect(),
            completed_count: summary.completed_count,
            roster_size: summary.roster_size,
        }
    }
}
