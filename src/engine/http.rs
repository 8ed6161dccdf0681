//! Live [`GameEngine`] implementation speaking to the engine over HTTP.

use std::{sync::Arc, time::Duration};

use futures::future::BoxFuture;
use reqwest::{Client, Method};
use serde::{Serialize, de::DeserializeOwned};

use super::{
    GameEngine,
    error::{EngineError, EngineResult},
    models::{
        AllScores, GameId, RosterEntry, SessionStart, StartSignal, StudentId, SyncSnapshot, UserId,
    },
};

/// Path of the sync-status endpoint, doubling as the reachability probe target.
const SYNC_STATUS_PATH: &str = "gamesession/ui-sync-status";

#[derive(Clone)]
/// Reqwest-backed engine client.
///
/// Cloning is cheap; every trait method clones the client into the returned
/// future so the caller's borrow ends at the call site.
pub struct HttpEngine {
    client: Client,
    base_url: Arc<str>,
    request_timeout: Duration,
}

impl HttpEngine {
    /// Build a client for the given base URL and per-request deadline.
    pub fn connect(base_url: &str, request_timeout: Duration) -> EngineResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| EngineError::ClientBuilder { source })?;

        Ok(Self {
            client,
            base_url: Arc::from(base_url.trim_end_matches('/')),
            request_timeout,
        })
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", self.base_url, path);
        self.client
            .request(method, url)
            .timeout(self.request_timeout)
            .header("Cache-Control", "no-cache")
    }

    fn map_send_error(path: &str, source: reqwest::Error) -> EngineError {
        if source.is_timeout() {
            EngineError::Timeout {
                path: path.to_string(),
            }
        } else {
            EngineError::RequestSend {
                path: path.to_string(),
                source,
            }
        }
    }

    async fn get_json<T>(&self, path: &str) -> EngineResult<T>
    where
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::GET, path)
            .send()
            .await
            .map_err(|source| Self::map_send_error(path, source))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EngineError::from_status(path, status));
        }

        response
            .json::<T>()
            .await
            .map_err(|source| EngineError::DecodeResponse {
                path: path.to_string(),
                source,
            })
    }

    async fn post_json<B>(&self, path: &str, body: &B) -> EngineResult<()>
    where
        B: ?Sized + Serialize,
    {
        let response = self
            .request(Method::POST, path)
            .json(body)
            .send()
            .await
            .map_err(|source| Self::map_send_error(path, source))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(EngineError::from_status(path, status))
        }
    }

    async fn head_like_probe(&self) -> EngineResult<()> {
        // The engine rejects HEAD (405), so the probe issues the same GET the
        // poller uses and discards the body.
        let response = self
            .request(Method::GET, SYNC_STATUS_PATH)
            .send()
            .await
            .map_err(|source| Self::map_send_error(SYNC_STATUS_PATH, source))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(EngineError::from_status(SYNC_STATUS_PATH, status))
        }
    }
}

impl GameEngine for HttpEngine {
    fn fetch_roster(&self, game_id: GameId) -> BoxFuture<'static, EngineResult<Vec<RosterEntry>>> {
        let engine = self.clone();
        Box::pin(async move {
            let path = format!("games/{game_id}/students");
            engine.get_json::<Vec<RosterEntry>>(&path).await
        })
    }

    fn sync_status(&self) -> BoxFuture<'static, EngineResult<SyncSnapshot>> {
        let engine = self.clone();
        Box::pin(async move { engine.get_json::<SyncSnapshot>(SYNC_STATUS_PATH).await })
    }

    fn send_start_signal(
        &self,
        game_id: GameId,
        student_id: StudentId,
        user_id: UserId,
    ) -> BoxFuture<'static, EngineResult<()>> {
        let engine = self.clone();
        Box::pin(async move {
            let body = StartSignal {
                game_id,
                student_id,
                user_id,
            };
            engine
                .post_json("gamesession/send-start-signal", &body)
                .await
        })
    }

    fn all_scores(
        &self,
        game_id: GameId,
        student_ids: &[StudentId],
    ) -> BoxFuture<'static, EngineResult<AllScores>> {
        let engine = self.clone();
        let joined = student_ids
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        Box::pin(async move {
            let path = format!("gamesession/all-scores?game_id={game_id}&student_ids={joined}");
            engine.get_json::<AllScores>(&path).await
        })
    }

    fn start_session(
        &self,
        game_id: GameId,
        student_id: StudentId,
    ) -> BoxFuture<'static, EngineResult<()>> {
        let engine = self.clone();
        Box::pin(async move {
            let body = SessionStart {
                game_id,
                student_id,
            };
            engine.post_json("gamesession/start", &body).await
        })
    }

    fn probe(&self) -> BoxFuture<'static, EngineResult<()>> {
        let engine = self.clone();
        Box::pin(async move { engine.head_like_probe().await })
    }

    fn endpoint(&self) -> String {
        self.base_url.to_string()
    }
}
