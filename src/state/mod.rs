//! Shared application state for the sync service.

/// Broadcast hub for session events.
pub mod events;
/// Session phase machine.
pub mod machine;
/// In-memory play session data.
pub mod session;

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU32, Ordering},
    },
    time::{Instant, SystemTime},
};

use dashmap::DashMap;
use tokio::sync::{Mutex, RwLock, watch};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::{config::AppConfig, engine::GameEngine};

pub use self::events::EventHub;
pub use self::machine::{
    EngineMode, InvalidTransition, PhaseEvent, RunState, SessionMachine, SessionPhase,
};
pub use self::session::{MAX_SCORE, PlaySession, Student};

/// Shared handle to the application state.
pub type SharedState = Arc<AppState>;

/// Capacity of the session event broadcast channel.
const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Reachability of the game engine as seen by the connection monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// The last probe succeeded.
    Connected,
    /// A probe is underway or none has completed yet.
    Connecting,
    /// The last probe failed.
    Disconnected,
}

/// Severity-free category of a dismissible operator alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    /// The reachability probe failed.
    Connection,
    /// A sync poll failed.
    Sync,
    /// The engine rejected a start signal.
    StartSignal,
    /// The batched score refresh failed.
    Scores,
    /// The roster fetch failed.
    Roster,
}

#[derive(Debug, Clone)]
/// Dismissible failure notice surfaced to the operator.
pub struct Alert {
    /// Registry key used for dismissal.
    pub id: Uuid,
    /// What failed.
    pub kind: AlertKind,
    /// Operator-facing description.
    pub message: String,
    /// When the alert was raised.
    pub raised_at: SystemTime,
}

/// Central application state shared between the routes and the sync loops.
pub struct AppState {
    config: AppConfig,
    engine: RwLock<Arc<dyn GameEngine>>,
    live_engine_url: RwLock<String>,
    session: RwLock<Option<PlaySession>>,
    machine: RwLock<SessionMachine>,
    connection: watch::Sender<ConnectionStatus>,
    probe_failures: AtomicU32,
    polling: AtomicBool,
    poll_gate: Mutex<()>,
    cooldown_until: RwLock<Option<Instant>>,
    alerts: DashMap<Uuid, Alert>,
    events: EventHub,
    loops: Mutex<Vec<JoinHandle<()>>>,
    session_gate: RwLock<Option<watch::Sender<bool>>>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The service starts with no session, polling disabled, and the
    /// connection considered in-progress until the first probe answers.
    pub fn new(config: AppConfig, engine: Arc<dyn GameEngine>) -> SharedState {
        let (connection_tx, _rx) = watch::channel(ConnectionStatus::Connecting);
        let live_engine_url = config.engine_base_url.clone();
        Arc::new(Self {
            config,
            engine: RwLock::new(engine),
            live_engine_url: RwLock::new(live_engine_url),
            session: RwLock::new(None),
            machine: RwLock::new(SessionMachine::new()),
            connection: connection_tx,
            probe_failures: AtomicU32::new(0),
            polling: AtomicBool::new(false),
            poll_gate: Mutex::new(()),
            cooldown_until: RwLock::new(None),
            alerts: DashMap::new(),
            events: EventHub::new(EVENT_CHANNEL_CAPACITY),
            loops: Mutex::new(Vec::new()),
            session_gate: RwLock::new(None),
        })
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Obtain a handle to the currently installed engine client.
    pub async fn engine(&self) -> Arc<dyn GameEngine> {
        self.engine.read().await.clone()
    }

    /// Swap the engine client (base-URL override or mock toggle).
    pub async fn install_engine(&self, engine: Arc<dyn GameEngine>) {
        let mut guard = self.engine.write().await;
        *guard = engine;
    }

    /// Base URL the live engine client points (or last pointed) at.
    ///
    /// Survives a round-trip through mock mode so a runtime override is not
    /// lost when the operator toggles back.
    pub async fn live_engine_url(&self) -> String {
        self.live_engine_url.read().await.clone()
    }

    /// Remember a runtime override of the live engine base URL.
    pub async fn set_live_engine_url(&self, url: String) {
        let mut guard = self.live_engine_url.write().await;
        *guard = url;
    }

    /// Currently loaded play session, if any.
    pub fn session(&self) -> &RwLock<Option<PlaySession>> {
        &self.session
    }

    /// Snapshot the current phase of the session machine.
    pub async fn phase(&self) -> SessionPhase {
        self.machine.read().await.phase()
    }

    /// Apply a lifecycle event to the session machine.
    pub async fn apply_phase(
        &self,
        event: PhaseEvent,
    ) -> Result<SessionPhase, InvalidTransition> {
        let mut machine = self.machine.write().await;
        machine.apply(event)
    }

    /// Latest connection status published by the monitor.
    pub fn connection_status(&self) -> ConnectionStatus {
        *self.connection.borrow()
    }

    /// Subscribe to connection status updates.
    pub fn watch_connection(&self) -> watch::Receiver<ConnectionStatus> {
        self.connection.subscribe()
    }

    /// Publish a connection status change (no-op when unchanged).
    pub fn set_connection_status(&self, status: ConnectionStatus) {
        self.connection.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
    }

    /// Consecutive failed probes since the last success.
    pub fn probe_failures(&self) -> u32 {
        self.probe_failures.load(Ordering::Relaxed)
    }

    /// Count one more failed probe, returning the new total.
    pub fn record_probe_failure(&self) -> u32 {
        self.probe_failures.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Reset the failed-probe counter after a successful probe.
    pub fn reset_probe_failures(&self) {
        self.probe_failures.store(0, Ordering::Relaxed);
    }

    /// Whether the poll loop should issue sync requests.
    pub fn polling_enabled(&self) -> bool {
        self.polling.load(Ordering::Relaxed)
    }

    /// Enable or disable the poll loop.
    pub fn set_polling(&self, enabled: bool) {
        self.polling.store(enabled, Ordering::Relaxed);
    }

    /// Single-flight guard ensuring at most one sync request is outstanding.
    pub fn poll_gate(&self) -> &Mutex<()> {
        &self.poll_gate
    }

    /// Pause polling until the given instant (resource-exhaustion cool-down).
    pub async fn start_cooldown(&self, until: Instant) {
        let mut guard = self.cooldown_until.write().await;
        *guard = Some(until);
    }

    /// Whether polling is currently paused by a cool-down.
    ///
    /// An elapsed cool-down is cleared as a side effect.
    pub async fn in_cooldown(&self) -> bool {
        {
            let guard = self.cooldown_until.read().await;
            match *guard {
                None => return false,
                Some(until) if Instant::now() < until => return true,
                Some(_) => {}
            }
        }

        let mut guard = self.cooldown_until.write().await;
        if matches!(*guard, Some(until) if Instant::now() >= until) {
            *guard = None;
        }
        guard.is_some()
    }

    /// Drop any active cool-down (polling restart).
    pub async fn clear_cooldown(&self) {
        let mut guard = self.cooldown_until.write().await;
        *guard = None;
    }

    /// Registry of live alerts keyed by their identifier.
    pub fn alerts(&self) -> &DashMap<Uuid, Alert> {
        &self.alerts
    }

    /// Broadcast hub for session events.
    pub fn events(&self) -> &EventHub {
        &self.events
    }

    /// Remember a spawned loop handle so teardown can abort it.
    pub async fn register_loop(&self, handle: JoinHandle<()>) {
        self.loops.lock().await.push(handle);
    }

    /// Install a fresh stop gate for the loops of a new session, returning a
    /// receiver for them to select on.
    pub async fn reset_session_gate(&self) -> watch::Receiver<bool> {
        let (tx, rx) = watch::channel(false);
        let mut guard = self.session_gate.write().await;
        *guard = Some(tx);
        rx
    }

    /// Signal the session loops to stop at their next tick.
    pub async fn signal_session_stop(&self) {
        let guard = self.session_gate.read().await;
        if let Some(gate) = guard.as_ref() {
            let _ = gate.send(true);
        }
    }

    /// Abort every registered loop and forget the handles.
    pub async fn abort_loops(&self) {
        let mut guard = self.loops.lock().await;
        for handle in guard.drain(..) {
            handle.abort();
        }
    }
}
