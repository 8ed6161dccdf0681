//! Session phase machine.
//!
//! The classroom UI historically tracked `mockMode` and `gameCompleted` as
//! independent booleans; here the combination is an explicit machine so
//! invalid flows (starting a second session, completing an idle one) are
//! rejected with a typed error instead of silently tolerated.

use thiserror::Error;

/// Which engine implementation the service is driving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineMode {
    /// Talking to the real engine over HTTP.
    Live,
    /// Serving fabricated data without any network.
    Mock,
}

/// Lifecycle of the play session itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// No session is loaded; a new one can begin.
    Idle,
    /// A session is active and the sync loops are running.
    Running,
    /// Every roster member has a recorded score; loops are stopped.
    Completed,
}

/// Combined phase: engine mode × run state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPhase {
    /// Engine mode axis.
    pub mode: EngineMode,
    /// Run-state axis.
    pub run: RunState,
}

impl SessionPhase {
    /// Initial phase: live engine, nothing running.
    pub fn initial() -> Self {
        Self {
            mode: EngineMode::Live,
            run: RunState::Idle,
        }
    }

    /// Whether the session reached the terminal completed state.
    pub fn is_completed(&self) -> bool {
        self.run == RunState::Completed
    }

    /// Whether a session is currently active.
    pub fn is_running(&self) -> bool {
        self.run == RunState::Running
    }
}

/// Events that can be applied to the phase machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseEvent {
    /// A roster was installed and the sync loops are starting.
    BeginSession,
    /// The completed-set reached the roster size.
    AllCompleted,
    /// The operator tore the session down (page-unmount path).
    EndSession,
    /// Switch to the fabricated offline engine.
    EnableMock,
    /// Return to the live HTTP engine.
    DisableMock,
}

/// Error returned when an event cannot be applied in the current phase.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// Phase the machine was in when the invalid event arrived.
    pub from: SessionPhase,
    /// The rejected event.
    pub event: PhaseEvent,
}

/// State machine implementing the session lifecycle.
#[derive(Debug, Clone)]
pub struct SessionMachine {
    phase: SessionPhase,
    version: usize,
}

impl Default for SessionMachine {
    fn default() -> Self {
        Self {
            phase: SessionPhase::initial(),
            version: 0,
        }
    }
}

impl SessionMachine {
    /// Create a machine in the initial live/idle phase.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Transition count, incremented on every applied event.
    pub fn version(&self) -> usize {
        self.version
    }

    /// Apply an event, returning the new phase or a typed rejection.
    pub fn apply(&mut self, event: PhaseEvent) -> Result<SessionPhase, InvalidTransition> {
        let next = self.compute_transition(event)?;
        self.phase = next;
        self.version += 1;
        Ok(next)
    }

    fn compute_transition(&self, event: PhaseEvent) -> Result<SessionPhase, InvalidTransition> {
        let SessionPhase { mode, run } = self.phase;
        let next = match (mode, run, event) {
            (_, RunState::Idle, PhaseEvent::BeginSession) => SessionPhase {
                mode,
                run: RunState::Running,
            },
            (_, RunState::Running, PhaseEvent::AllCompleted) => SessionPhase {
                mode,
                run: RunState::Completed,
            },
            (_, RunState::Running | RunState::Completed, PhaseEvent::EndSession) => SessionPhase {
                mode,
                run: RunState::Idle,
            },
            (EngineMode::Live, _, PhaseEvent::EnableMock) => SessionPhase {
                mode: EngineMode::Mock,
                run,
            },
            (EngineMode::Mock, _, PhaseEvent::DisableMock) => SessionPhase {
                mode: EngineMode::Live,
                run,
            },
            (_, _, event) => {
                return Err(InvalidTransition {
                    from: self.phase,
                    event,
                });
            }
        };

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(machine: &mut SessionMachine, event: PhaseEvent) -> SessionPhase {
        machine.apply(event).unwrap()
    }

    #[test]
    fn initial_phase_is_live_idle() {
        let machine = SessionMachine::new();
        assert_eq!(machine.phase(), SessionPhase::initial());
        assert!(!machine.phase().is_running());
    }

    #[test]
    fn full_session_lifecycle() {
        let mut machine = SessionMachine::new();

        let running = apply(&mut machine, PhaseEvent::BeginSession);
        assert!(running.is_running());

        let completed = apply(&mut machine, PhaseEvent::AllCompleted);
        assert!(completed.is_completed());

        let idle = apply(&mut machine, PhaseEvent::EndSession);
        assert_eq!(idle.run, RunState::Idle);
        assert_eq!(machine.version(), 3);
    }

    #[test]
    fn mock_toggle_preserves_run_state() {
        let mut machine = SessionMachine::new();
        apply(&mut machine, PhaseEvent::BeginSession);

        let mocked = apply(&mut machine, PhaseEvent::EnableMock);
        assert_eq!(mocked.mode, EngineMode::Mock);
        assert!(mocked.is_running());

        let live = apply(&mut machine, PhaseEvent::DisableMock);
        assert_eq!(live.mode, EngineMode::Live);
        assert!(live.is_running());
    }

    #[test]
    fn double_begin_is_rejected() {
        let mut machine = SessionMachine::new();
        apply(&mut machine, PhaseEvent::BeginSession);

        let err = machine.apply(PhaseEvent::BeginSession).unwrap_err();
        assert_eq!(err.event, PhaseEvent::BeginSession);
        assert!(err.from.is_running());
    }

    #[test]
    fn completion_requires_a_running_session() {
        let mut machine = SessionMachine::new();
        let err = machine.apply(PhaseEvent::AllCompleted).unwrap_err();
        assert_eq!(err.from, SessionPhase::initial());
    }

    #[test]
    fn double_mock_enable_is_rejected() {
        let mut machine = SessionMachine::new();
        apply(&mut machine, PhaseEvent::EnableMock);
        assert!(machine.apply(PhaseEvent::EnableMock).is_err());
    }
}
