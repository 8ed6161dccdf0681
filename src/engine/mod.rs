//! Client boundary to the external game engine.
//!
//! The engine is the physical/motion game backend that actually runs each
//! student's session; this service only observes and steers it. The
//! [`GameEngine`] trait abstracts the wire so the live HTTP client and the
//! offline mock are interchangeable at runtime.

/// Engine failure taxonomy and probe classification.
pub mod error;
/// Live reqwest-backed engine client.
pub mod http;
/// Offline simulation used for classroom demos without an engine.
pub mod mock;
/// Wire payload models.
pub mod models;

use futures::future::BoxFuture;

use self::{
    error::EngineResult,
    models::{AllScores, GameId, RosterEntry, StudentId, SyncSnapshot, UserId},
};

/// Abstraction over the game-engine REST boundary.
pub trait GameEngine: Send + Sync {
    /// Fetch the full roster of students attached to a game definition.
    fn fetch_roster(&self, game_id: GameId) -> BoxFuture<'static, EngineResult<Vec<RosterEntry>>>;

    /// Fetch the latest UI sync snapshot (active student / completion / score).
    fn sync_status(&self) -> BoxFuture<'static, EngineResult<SyncSnapshot>>;

    /// Tell the engine which student plays next.
    fn send_start_signal(
        &self,
        game_id: GameId,
        student_id: StudentId,
        user_id: UserId,
    ) -> BoxFuture<'static, EngineResult<()>>;

    /// Fetch scores for the whole roster in one batched call.
    fn all_scores(
        &self,
        game_id: GameId,
        student_ids: &[StudentId],
    ) -> BoxFuture<'static, EngineResult<AllScores>>;

    /// Pre-create a student's engine-side session (fire-and-forget at begin).
    fn start_session(
        &self,
        game_id: GameId,
        student_id: StudentId,
    ) -> BoxFuture<'static, EngineResult<()>>;

    /// Lightweight reachability probe with a short deadline.
    fn probe(&self) -> BoxFuture<'static, EngineResult<()>>;

    /// Human-readable description of where this engine lives, for status views.
    fn endpoint(&self) -> String;
}
