use std::{
    future::Future,
    io::{ErrorKind, SeekFrom},
    path::{Path, PathBuf},
};

use anyhow::Result;
use fs4::tokio::AsyncFileExt;
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt},
};
use tracing::{debug, info, warn};

use crate::utils::clock::SharedClock;

use super::entities::SessionEntity;

/// Name of the file holding the session log. Mirrors the storage key of the browser version.
pub const SESSIONS_FILE_NAME: &str = "timerSessions.json";

/// Interface for abstracting storage of saved sessions.
pub trait SessionStorage {
    /// Returns every saved session in the order they were saved. Missing or damaged data is
    /// reported as an empty log, never as an error.
    fn load(&self) -> impl Future<Output = Vec<SessionEntity>>;

    /// Appends a session of `seconds` stamped with the current time. The record is durable once
    /// the returned future resolves.
    fn append(&self, seconds: u64) -> impl Future<Output = Result<SessionEntity>>;
}

/// The main realization of [SessionStorage].
pub struct SessionStorageImpl {
    path: PathBuf,
    clock: SharedClock,
}

impl SessionStorageImpl {
    pub fn new(data_dir: &Path, clock: SharedClock) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(data_dir)?;

        Ok(Self {
            path: data_dir.join(SESSIONS_FILE_NAME),
            clock,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load_inner(&self) -> Result<Vec<SessionEntity>, std::io::Error> {
        debug!("Loading sessions from {:?}", self.path);
        let mut file = File::open(&self.path).await?;
        file.lock_shared()?;
        let mut content = String::new();
        let read = file.read_to_string(&mut content).await;
        file.unlock_async().await?;
        read?;

        Ok(parse_sessions(&self.path, &content))
    }

    async fn append_inner(&self, session: SessionEntity) -> Result<()> {
        let mut file = File::options()
            .write(true)
            .create(true)
            .read(true)
            .truncate(false)
            .open(&self.path)
            .await?;

        // Semi-safe acquire-release for a file
        file.lock_exclusive()?;
        let result = Self::append_with_file(&self.path, &mut file, session).await;
        file.unlock_async().await?;
        result
    }

    async fn append_with_file(path: &Path, file: &mut File, session: SessionEntity) -> Result<()> {
        let mut content = String::new();
        file.read_to_string(&mut content).await?;

        let mut sessions = parse_sessions(path, &content);
        sessions.push(session);

        let buffer = serde_json::to_vec(&sessions)?;
        file.seek(SeekFrom::Start(0)).await?;
        file.set_len(0).await?;
        file.write_all(&buffer).await?;
        file.flush().await?;
        file.sync_all().await?;
        Ok(())
    }
}

impl SessionStorage for SessionStorageImpl {
    async fn load(&self) -> Vec<SessionEntity> {
        match self.load_inner().await {
            Ok(sessions) => sessions,
            Err(e) if e.kind() == ErrorKind::NotFound => vec![],
            Err(e) => {
                warn!("Failed to read sessions from {:?}: {e}", self.path);
                vec![]
            }
        }
    }

    async fn append(&self, seconds: u64) -> Result<SessionEntity> {
        let session = SessionEntity::new(seconds, self.clock.time());
        self.append_inner(session).await?;
        info!("Saved session of {seconds}s");
        Ok(session)
    }
}

/// An empty file is an empty log. Anything that isn't a JSON array of sessions is treated the
/// same way.
fn parse_sessions(path: &Path, content: &str) -> Vec<SessionEntity> {
    if content.trim().is_empty() {
        return vec![];
    }
    match serde_json::from_str::<Vec<SessionEntity>>(content) {
        Ok(sessions) => sessions,
        Err(e) => {
            warn!("Session log {:?} is corrupted, ignoring it: {e}", path);
            vec![]
        }
    }
}
