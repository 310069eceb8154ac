//! Session state store
//!
//! Tracks which issued tokens are still admissible, in Redis, so that logout
//! takes effect before the token's cryptographic expiry. Two policies cover
//! the same contract from opposite directions:
//!
//! - `whitelist`: login writes a record with the token's TTL; a token is
//!   admissible only while its record exists. Logout deletes the record.
//! - `blacklist`: login writes nothing; a token is admissible unless a
//!   revocation record exists. Logout writes one, expiring with the token.
//!
//! Every operation is bounded by a timeout, and any store failure surfaces
//! as `SessionStoreError::Unavailable` so callers can fail closed.

use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use redis::AsyncCommands;
use redis::aio::ConnectionManager;

/// Value stored for admissible tokens under the whitelist policy
const LIVE_MARKER: &str = "live";

/// Value stored for revoked tokens under the blacklist policy
const BLACKLIST_MARKER: &str = "blacklisted";

/// Session store error types
#[derive(Debug, thiserror::Error)]
pub enum SessionStoreError {
    #[error("failed to connect to session store: {0}")]
    Connect(String),

    #[error("session store unavailable: {0}")]
    Unavailable(String),
}

/// Unknown session policy name
#[derive(Debug, thiserror::Error)]
#[error("unknown session policy: {0}")]
pub struct UnknownPolicy(pub String);

/// Session admission policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPolicy {
    /// Tokens are admissible only while a login record exists
    Whitelist,
    /// Tokens are admissible unless a revocation record exists
    Blacklist,
}

impl SessionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPolicy::Whitelist => "whitelist",
            SessionPolicy::Blacklist => "blacklist",
        }
    }
}

impl std::fmt::Display for SessionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SessionPolicy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "whitelist" => Ok(SessionPolicy::Whitelist),
            "blacklist" => Ok(SessionPolicy::Blacklist),
            other => Err(UnknownPolicy(other.to_string())),
        }
    }
}

/// Session store tracking token admissibility in Redis
#[derive(Clone)]
pub struct SessionStore {
    conn: ConnectionManager,
    policy: SessionPolicy,
    token_ttl: Duration,
    op_timeout: Duration,
}

impl SessionStore {
    /// Connect to the session store.
    ///
    /// `token_ttl` must match the lifetime of issued tokens: whitelist
    /// records expire with the token they admit.
    pub async fn connect(
        url: &str,
        policy: SessionPolicy,
        token_ttl: Duration,
        op_timeout: Duration,
    ) -> Result<Self, SessionStoreError> {
        let client =
            redis::Client::open(url).map_err(|err| SessionStoreError::Connect(err.to_string()))?;

        let conn = client
            .get_connection_manager()
            .await
            .map_err(|err| SessionStoreError::Connect(err.to_string()))?;

        Ok(Self {
            conn,
            policy,
            token_ttl,
            op_timeout,
        })
    }

    /// The admission policy this store runs under
    pub fn policy(&self) -> SessionPolicy {
        self.policy
    }

    /// Record a successful login for the given token
    pub async fn record_login(&self, token: &str) -> Result<(), SessionStoreError> {
        match self.policy {
            SessionPolicy::Whitelist => {
                let mut conn = self.conn.clone();
                let ttl = self.token_ttl.as_secs();
                self.run(async move { conn.set_ex::<_, _, ()>(token, LIVE_MARKER, ttl).await })
                    .await
            }
            // Absence of a revocation record already means admissible
            SessionPolicy::Blacklist => Ok(()),
        }
    }

    /// Record a logout for the given token.
    ///
    /// `remaining` is the time left until the token's cryptographic expiry;
    /// blacklist records only need to outlive the token itself.
    pub async fn record_logout(
        &self,
        token: &str,
        remaining: Duration,
    ) -> Result<(), SessionStoreError> {
        match self.policy {
            SessionPolicy::Whitelist => {
                let mut conn = self.conn.clone();
                self.run(async move { conn.del::<_, ()>(token).await }).await
            }
            SessionPolicy::Blacklist => {
                let mut conn = self.conn.clone();
                let ttl = remaining.as_secs().max(1);
                self.run(
                    async move { conn.set_ex::<_, _, ()>(token, BLACKLIST_MARKER, ttl).await },
                )
                .await
            }
        }
    }

    /// Whether the given token is still admissible under the active policy
    pub async fn is_live(&self, token: &str) -> Result<bool, SessionStoreError> {
        let mut conn = self.conn.clone();
        let record = self
            .run(async move { conn.get::<_, Option<String>>(token).await })
            .await?;

        match self.policy {
            SessionPolicy::Whitelist => Ok(record.is_some()),
            SessionPolicy::Blacklist => Ok(record.is_none()),
        }
    }

    /// Run a store operation under the configured timeout
    async fn run<T>(
        &self,
        op: impl Future<Output = redis::RedisResult<T>>,
    ) -> Result<T, SessionStoreError> {
        match tokio::time::timeout(self.op_timeout, op).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(SessionStoreError::Unavailable(err.to_string())),
            Err(_) => Err(SessionStoreError::Unavailable(
                "operation timed out".to_string(),
            )),
        }
    }
}
