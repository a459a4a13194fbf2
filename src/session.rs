//! Session management for the guard using this device.
//!
//! The session is a verified [`Identity`] persisted under two fixed keys in
//! the local key-value store. [`SessionManager`] is the only writer of those
//! keys and always writes or clears both together.

use crate::domain::{
    ApiError, AttendanceApiPtr, Identity, KeyValueStorePtr, MetricsPtr, Notice, UserVerification,
};
use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;

// ---

/// Store key holding the verified identifier.
pub const USER_ID_KEY: &str = "userId";

/// Store key holding the display name.
pub const USER_NAME_KEY: &str = "userName";

/// Leading greeting the server wraps the display name in.
static WELCOME_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^welcome\s+").expect("valid welcome regex"));

// ---

/// Why a login attempt failed. `Display` is the user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoginError {
    #[error("Please enter a valid Guard ID.")]
    EmptyId,

    /// The server answered but did not accept the identifier.
    #[error("{0}")]
    Rejected(String),

    #[error("Server error: {0}")]
    ServerStatus(u16),

    #[error("Request timed out. Please check your internet connection.")]
    Timeout,

    #[error("Network error. Please ensure you are connected to the internet.")]
    Network,

    #[error("Could not save your session. Please try again.")]
    Storage,
}

impl LoginError {
    // ---
    /// Alert title matching the kind of failure.
    pub fn title(&self) -> &'static str {
        match self {
            LoginError::EmptyId => "Validation Error",
            _ => "Login Failed",
        }
    }

    pub fn notice(&self) -> Notice {
        Notice::new(self.title(), self.to_string())
    }

    fn outcome(&self) -> &'static str {
        // ---
        match self {
            LoginError::EmptyId => "empty_id",
            LoginError::Rejected(_) => "rejected",
            LoginError::ServerStatus(_) => "server_status",
            LoginError::Timeout => "timeout",
            LoginError::Network => "network",
            LoginError::Storage => "storage",
        }
    }
}

impl From<ApiError> for LoginError {
    fn from(err: ApiError) -> Self {
        // ---
        match err {
            ApiError::Timeout => LoginError::Timeout,
            ApiError::Status(code) => LoginError::ServerStatus(code),
            ApiError::Network(_) | ApiError::Decode(_) | ApiError::InvalidRequest(_) => {
                LoginError::Network
            }
        }
    }
}

/// Extracts the display name from a `"Welcome <name>"` greeting.
///
/// The greeting is matched case-insensitively and only at the start; a
/// message without it is used as-is after trimming.
pub fn display_name_from_welcome(message: &str) -> String {
    WELCOME_PREFIX.replace(message, "").trim().to_string()
}

// ---

/// Owns the in-memory session and keeps it in step with the store.
pub struct SessionManager {
    // ---
    store: KeyValueStorePtr,
    api: AttendanceApiPtr,
    metrics: MetricsPtr,
    identity: RwLock<Option<Identity>>,

    /// True until `initialize` completes and while a login is in flight.
    loading: AtomicBool,
}

/// Shared handle to the session manager.
pub type SessionManagerPtr = Arc<SessionManager>;

/// Clears the loading flag when dropped, whatever path the caller takes.
struct LoadingGuard<'a>(&'a AtomicBool);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl SessionManager {
    // ---
    pub fn new(store: KeyValueStorePtr, api: AttendanceApiPtr, metrics: MetricsPtr) -> Self {
        // ---
        Self {
            store,
            api,
            metrics,
            identity: RwLock::new(None),
            loading: AtomicBool::new(true),
        }
    }

    /// Loads the persisted session.
    ///
    /// Returns whether a session was found. Storage failures are logged and
    /// treated as "logged out"; they are never returned.
    pub async fn initialize(&self) -> bool {
        // ---
        let _loading = self.begin_loading();

        let loaded = match self.load_persisted().await {
            Ok(identity) => identity,
            Err(e) => {
                tracing::warn!("Failed to read persisted session, starting logged out: {:?}", e);
                None
            }
        };

        match &loaded {
            Some(identity) => tracing::info!("Restored session for user: {}", identity.user_id),
            None => tracing::info!("No persisted session"),
        }

        let logged_in = loaded.is_some();
        *self.identity.write().unwrap_or_else(PoisonError::into_inner) = loaded;
        logged_in
    }

    async fn load_persisted(&self) -> Result<Option<Identity>> {
        // ---
        let user_id = self.store.get(USER_ID_KEY).await?;
        let user_name = self.store.get(USER_NAME_KEY).await?;

        Ok(match (user_id, user_name) {
            (Some(id), Some(name)) if !id.is_empty() => Some(Identity::new(id, name)),
            _ => None,
        })
    }

    /// Verifies `candidate_id` with the server and adopts it as the session.
    ///
    /// On any failure the current session, in memory and on disk, is left
    /// untouched.
    pub async fn login(&self, candidate_id: &str) -> Result<(), LoginError> {
        // ---
        let result = self.try_login(candidate_id).await;

        match &result {
            Ok(()) => self.metrics.record_login("ok"),
            Err(e) => {
                tracing::warn!("Login failed: {}", e);
                self.metrics.record_login(e.outcome());
            }
        }
        result
    }

    async fn try_login(&self, candidate_id: &str) -> Result<(), LoginError> {
        // ---
        let user_id = candidate_id.trim();
        if user_id.is_empty() {
            return Err(LoginError::EmptyId);
        }

        let _loading = self.begin_loading();

        let message = match self.api.verify_user(user_id).await? {
            UserVerification::Verified { message } => message,
            UserVerification::Rejected { message } => {
                return Err(LoginError::Rejected(
                    message.unwrap_or_else(|| "Unknown error from server.".to_string()),
                ))
            }
        };

        let mut user_name = display_name_from_welcome(&message);
        if user_name.is_empty() {
            user_name = user_id.to_string();
        }

        self.store
            .multi_set(&[(USER_ID_KEY, user_id), (USER_NAME_KEY, &user_name)])
            .await
            .map_err(|e| {
                //
                tracing::error!("Failed to persist session for user '{}': {:?}", user_id, e);
                LoginError::Storage
            })?;

        tracing::info!("Logged in user: {} ({})", user_id, user_name);
        *self.identity.write().unwrap_or_else(PoisonError::into_inner) =
            Some(Identity::new(user_id, user_name));

        Ok(())
    }

    /// Clears the session everywhere. Never fails from the caller's view.
    pub async fn logout(&self) {
        // ---
        if let Err(e) = self.store.multi_remove(&[USER_ID_KEY, USER_NAME_KEY]).await {
            tracing::error!("Failed to clear persisted session: {:?}", e);
        }

        let previous = self
            .identity
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(identity) = previous {
            tracing::info!("Logged out user: {}", identity.user_id);
        }
    }

    pub fn identity(&self) -> Option<Identity> {
        self.identity
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn user_id(&self) -> Option<String> {
        self.identity().map(|i| i.user_id)
    }

    pub fn user_name(&self) -> Option<String> {
        self.identity().map(|i| i.user_name)
    }

    pub fn is_logged_in(&self) -> bool {
        self.identity
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Busy indicator for the login gate.
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    fn begin_loading(&self) -> LoadingGuard<'_> {
        // ---
        self.loading.store(true, Ordering::SeqCst);
        LoadingGuard(&self.loading)
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::domain::KeyValueStore;
    use crate::infrastructure::storage::MemoryStore;
    use crate::infrastructure::create_noop_metrics;
    use crate::testing::{FailingStore, FakeApi};

    fn manager_with(store: Arc<MemoryStore>, api: Arc<FakeApi>) -> SessionManager {
        SessionManager::new(store, api, create_noop_metrics().unwrap())
    }

    #[test]
    fn test_welcome_prefix_is_stripped() {
        // ---
        assert_eq!(display_name_from_welcome("Welcome Guard One"), "Guard One");
        assert_eq!(display_name_from_welcome("WELCOME   Guard One  "), "Guard One");
        assert_eq!(display_name_from_welcome("welcome\tGuard"), "Guard");
        assert_eq!(display_name_from_welcome("Guard One"), "Guard One");
        assert_eq!(display_name_from_welcome("Welcomer Bob"), "Welcomer Bob");
        assert_eq!(display_name_from_welcome("Welcome"), "Welcome");
        assert_eq!(display_name_from_welcome("  Welcome Guard"), "Welcome Guard");
        assert_eq!(display_name_from_welcome("Welcome   "), "");
    }

    #[tokio::test]
    async fn test_successful_login_persists_both_fields() {
        // ---
        let store = Arc::new(MemoryStore::new());
        let api = Arc::new(FakeApi::new().with_user_reply(Ok(UserVerification::Verified {
            message: "Welcome Guard One".into(),
        })));
        let manager = manager_with(store.clone(), api.clone());

        assert!(!manager.initialize().await);
        manager.login("  guard1 ").await.unwrap();

        assert!(manager.is_logged_in());
        assert_eq!(manager.user_name().as_deref(), Some("Guard One"));
        assert_eq!(store.get(USER_ID_KEY).await.unwrap().as_deref(), Some("guard1"));
        assert_eq!(store.get(USER_NAME_KEY).await.unwrap().as_deref(), Some("Guard One"));
        assert_eq!(api.verified_users(), vec!["guard1".to_string()]);
        assert!(!manager.is_loading());
    }

    #[tokio::test]
    async fn test_blank_id_never_reaches_the_server() {
        // ---
        let api = Arc::new(FakeApi::new());
        let manager = manager_with(Arc::new(MemoryStore::new()), api.clone());

        assert_eq!(manager.login("   ").await.unwrap_err(), LoginError::EmptyId);
        assert_eq!(LoginError::EmptyId.title(), "Validation Error");
        assert!(api.verified_users().is_empty());
    }

    #[tokio::test]
    async fn test_rejection_leaves_existing_session() {
        // ---
        let store = Arc::new(MemoryStore::new());
        store
            .multi_set(&[(USER_ID_KEY, "guard1"), (USER_NAME_KEY, "Guard One")])
            .await
            .unwrap();

        let api = Arc::new(FakeApi::new().with_user_reply(Ok(UserVerification::Rejected {
            message: Some("Unknown guard".into()),
        })));
        let manager = manager_with(store.clone(), api);
        assert!(manager.initialize().await);

        let err = manager.login("guard2").await.unwrap_err();
        assert_eq!(err.to_string(), "Unknown guard");
        assert_eq!(manager.user_id().as_deref(), Some("guard1"));
        assert_eq!(store.get(USER_ID_KEY).await.unwrap().as_deref(), Some("guard1"));
    }

    #[tokio::test]
    async fn test_rejection_without_message_uses_fallback() {
        // ---
        let api = Arc::new(
            FakeApi::new().with_user_reply(Ok(UserVerification::Rejected { message: None })),
        );
        let manager = manager_with(Arc::new(MemoryStore::new()), api);

        let err = manager.login("guard1").await.unwrap_err();
        assert_eq!(err.to_string(), "Unknown error from server.");
        assert!(!manager.is_logged_in());
    }

    #[tokio::test]
    async fn test_transport_errors_map_to_distinct_messages() {
        // ---
        let cases = [
            (
                ApiError::Timeout,
                "Request timed out. Please check your internet connection.",
            ),
            (
                ApiError::Network("refused".into()),
                "Network error. Please ensure you are connected to the internet.",
            ),
            (ApiError::Status(503), "Server error: 503"),
        ];

        for (api_error, expected) in cases {
            let api = Arc::new(FakeApi::new().with_user_reply(Err(api_error)));
            let manager = manager_with(Arc::new(MemoryStore::new()), api);

            let err = manager.login("guard1").await.unwrap_err();
            assert_eq!(err.to_string(), expected);
            assert_eq!(err.title(), "Login Failed");
            assert!(!manager.is_logged_in());
        }
    }

    #[tokio::test]
    async fn test_storage_failure_on_login_keeps_logged_out() {
        // ---
        let api = Arc::new(FakeApi::new());
        let manager =
            SessionManager::new(Arc::new(FailingStore), api, create_noop_metrics().unwrap());

        assert_eq!(manager.login("guard1").await.unwrap_err(), LoginError::Storage);
        assert!(!manager.is_logged_in());
    }

    #[tokio::test]
    async fn test_unreadable_store_initializes_logged_out() {
        // ---
        let manager = SessionManager::new(
            Arc::new(FailingStore),
            Arc::new(FakeApi::new()),
            create_noop_metrics().unwrap(),
        );

        assert!(manager.is_loading());
        assert!(!manager.initialize().await);
        assert!(!manager.is_logged_in());
        assert!(!manager.is_loading());
    }

    #[tokio::test]
    async fn test_half_a_session_is_no_session() {
        // ---
        let store = Arc::new(MemoryStore::new());
        store.multi_set(&[(USER_ID_KEY, "guard1")]).await.unwrap();

        let manager = manager_with(store, Arc::new(FakeApi::new()));
        assert!(!manager.initialize().await);
    }

    #[tokio::test]
    async fn test_logout_survives_restart() {
        // ---
        let store = Arc::new(MemoryStore::new());
        let manager = manager_with(store.clone(), Arc::new(FakeApi::new()));
        manager.login("guard1").await.unwrap();
        manager.logout().await;

        assert!(!manager.is_logged_in());
        assert!(store.snapshot().await.is_empty());

        let restarted = manager_with(store, Arc::new(FakeApi::new()));
        assert!(!restarted.initialize().await);
    }

    #[tokio::test]
    async fn test_logout_with_broken_store_still_clears_memory() {
        // ---
        let store = Arc::new(MemoryStore::new());
        let manager = manager_with(store, Arc::new(FakeApi::new()));
        manager.login("guard1").await.unwrap();

        let broken = SessionManager::new(
            Arc::new(FailingStore),
            Arc::new(FakeApi::new()),
            create_noop_metrics().unwrap(),
        );
        *broken.identity.write().unwrap() = manager.identity();

        broken.logout().await;
        assert!(!broken.is_logged_in());
    }
}
