//! Redis-backed terminal session store.
//!
//! Holds the per-browser `terminal_flow` state, a read-once error message,
//! and the one-time form tokens. Keys are scoped by the session id carried
//! in the kiosk cookie.

use rand::RngCore;
use redis::{AsyncCommands, Client};
use sha2::{Digest, Sha256};

use crate::{
    error::{AppError, AppResult},
    models::TerminalFlow,
};

/// One-time form tokens live shorter than the flow itself
const TOKEN_TTL_SECONDS: u64 = 3600;

/// Error messages are transient; read once or gone within a minute
const ERROR_TTL_SECONDS: u64 = 60;

#[derive(Clone)]
pub struct SessionService {
    client: Client,
    ttl_seconds: u64,
}

impl SessionService {
    /// Create a new session service and verify the Redis connection
    pub async fn new(url: &str, ttl_seconds: u64) -> AppResult<Self> {
        let client = Client::open(url)
            .map_err(|e| AppError::Session(format!("Failed to create Redis client: {}", e)))?;

        let mut conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Session(format!("Failed to connect to Redis: {}", e)))?;

        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(|e| AppError::Session(format!("Redis connection test failed: {}", e)))?;

        Ok(Self { client, ttl_seconds })
    }

    async fn conn(&self) -> AppResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Session(format!("Failed to get Redis connection: {}", e)))
    }

    /// Load the flow for a session, creating a fresh one on first touch.
    /// State that no longer parses (schema drift, manual edits) is treated
    /// like the unrecognized-step case: full reset.
    pub async fn load_flow(&self, session_id: &str) -> AppResult<TerminalFlow> {
        let mut conn = self.conn().await?;
        let key = format!("terminal:flow:{}", session_id);
        let raw: Option<String> = conn
            .get(&key)
            .await
            .map_err(|e| AppError::Session(format!("Failed to read flow state: {}", e)))?;

        match raw.and_then(|json| serde_json::from_str::<TerminalFlow>(&json).ok()) {
            Some(flow) => Ok(flow),
            None => {
                let flow = TerminalFlow::reset();
                self.save_flow(session_id, &flow).await?;
                Ok(flow)
            }
        }
    }

    /// Persist the flow, refreshing the session TTL
    pub async fn save_flow(&self, session_id: &str, flow: &TerminalFlow) -> AppResult<()> {
        let mut conn = self.conn().await?;
        let key = format!("terminal:flow:{}", session_id);
        let json = serde_json::to_string(flow)
            .map_err(|e| AppError::Session(format!("Failed to serialize flow state: {}", e)))?;
        conn.set_ex::<_, _, ()>(&key, json, self.ttl_seconds)
            .await
            .map_err(|e| AppError::Session(format!("Failed to store flow state: {}", e)))?;
        Ok(())
    }

    /// Reset the flow to its initial state and return it
    pub async fn reset_flow(&self, session_id: &str) -> AppResult<TerminalFlow> {
        let flow = TerminalFlow::reset();
        self.save_flow(session_id, &flow).await?;
        Ok(flow)
    }

    /// Store the transient, session-scoped error message
    pub async fn set_error(&self, session_id: &str, message: &str) -> AppResult<()> {
        let mut conn = self.conn().await?;
        let key = format!("terminal:error:{}", session_id);
        conn.set_ex::<_, _, ()>(&key, message, ERROR_TTL_SECONDS)
            .await
            .map_err(|e| AppError::Session(format!("Failed to store error message: {}", e)))?;
        Ok(())
    }

    /// Read and clear the error message (shown exactly once)
    pub async fn take_error(&self, session_id: &str) -> AppResult<Option<String>> {
        let mut conn = self.conn().await?;
        let key = format!("terminal:error:{}", session_id);
        let message: Option<String> = conn
            .get(&key)
            .await
            .map_err(|e| AppError::Session(format!("Failed to read error message: {}", e)))?;
        if message.is_some() {
            let _: () = conn
                .del(&key)
                .await
                .map_err(|e| AppError::Session(format!("Failed to clear error message: {}", e)))?;
        }
        Ok(message)
    }

    /// Issue a one-time token for the terminal step form
    pub async fn issue_token(&self, session_id: &str) -> AppResult<String> {
        let token = {
            let mut rng = rand::thread_rng();
            let mut bytes = [0u8; 32];
            rng.fill_bytes(&mut bytes);
            let mut hasher = Sha256::new();
            hasher.update(bytes);
            hex::encode(hasher.finalize())
        };

        let mut conn = self.conn().await?;
        let key = format!("terminal:token:{}:{}", session_id, token);
        conn.set_ex::<_, _, ()>(&key, "1", TOKEN_TTL_SECONDS)
            .await
            .map_err(|e| AppError::Session(format!("Failed to store form token: {}", e)))?;
        Ok(token)
    }

    /// Verify and consume a one-time token. Returns false for unknown,
    /// expired, or already-used tokens.
    pub async fn consume_token(&self, session_id: &str, token: &str) -> AppResult<bool> {
        // Token format is fixed; reject anything else without touching Redis
        if token.len() != 64 || !token.chars().all(|c| c.is_ascii_hexdigit()) {
            return Ok(false);
        }

        let mut conn = self.conn().await?;
        let key = format!("terminal:token:{}:{}", session_id, token);
        let deleted: i64 = conn
            .del(&key)
            .await
            .map_err(|e| AppError::Session(format!("Failed to consume form token: {}", e)))?;
        Ok(deleted > 0)
    }
}
