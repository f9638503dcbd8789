// file: src/inventory/session.rs
// version: 1.0.0
// guid: 44ce53cb-18dc-41a7-b27b-d8a132a14b8b

//! Inventory service capability traits and session lifecycle

use super::{EntityKind, InventoryNode};
use crate::Result;
use std::fmt;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Login information for an inventory endpoint
#[derive(Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub username: String,
    pub password: String,
    pub port: u16,
    pub verify_tls: bool,
    pub connect_timeout: Option<Duration>,
    pub request_timeout: Option<Duration>,
    pub api_version: String,
}

impl Endpoint {
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        port: u16,
    ) -> Self {
        Self {
            host: host.into(),
            username: username.into(),
            password: password.into(),
            port,
            verify_tls: true,
            connect_timeout: None,
            request_timeout: None,
            api_version: "6.0".to_string(),
        }
    }

    /// Whether host, username and password are all present
    pub fn has_credentials(&self) -> bool {
        !self.host.is_empty() && !self.username.is_empty() && !self.password.is_empty()
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("port", &self.port)
            .field("verify_tls", &self.verify_tls)
            .field("connect_timeout", &self.connect_timeout)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// Enumeration handle over a subtree, restricted to some entity kinds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerView {
    pub id: String,
    pub view: Vec<InventoryNode>,
}

/// Opens authenticated sessions to an inventory service
#[async_trait::async_trait]
pub trait InventoryConnector: Send + Sync {
    type Session: InventorySession;

    /// Open a session.
    ///
    /// Rejected logins must surface as `ResolverError::AuthenticationRejected`
    /// and transport failures reaching the endpoint as
    /// `ResolverError::Unreachable`.
    async fn open(&self, endpoint: &Endpoint) -> Result<Self::Session>;
}

/// Authenticated connection to an inventory service
#[async_trait::async_trait]
pub trait InventorySession: Send + Sync {
    /// Root folder of the inventory
    async fn root_folder(&self) -> Result<InventoryNode>;

    /// Create a view over the entities of `kinds` below `container`
    async fn create_container_view(
        &self,
        container: &InventoryNode,
        kinds: &[EntityKind],
        recursive: bool,
    ) -> Result<ContainerView>;

    async fn destroy_view(&self, view: &ContainerView) -> Result<()>;

    /// Datastores or networks attached to a host
    async fn host_attachments(
        &self,
        host: &InventoryNode,
        kind: EntityKind,
    ) -> Result<Vec<InventoryNode>>;

    async fn disconnect(&self) -> Result<()>;
}

/// Open a session, converting the expected failures (missing credentials,
/// rejected login, unreachable endpoint) to `None`. Any other failure is
/// returned as an error.
pub async fn connect<C>(connector: &C, endpoint: &Endpoint) -> Result<Option<C::Session>>
where
    C: InventoryConnector + ?Sized,
{
    if !endpoint.has_credentials() {
        error!("vCenter host, username, and password required");
        return Ok(None);
    }

    debug!("Connecting to {}:{} as {}", endpoint.host, endpoint.port, endpoint.username);
    match connector.open(endpoint).await {
        Ok(session) => Ok(Some(session)),
        Err(e) if e.is_expected() => {
            error!("Could not connect to {}: {}", endpoint.host, e);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Disconnect a session; failures are logged, never returned
pub async fn release<S>(session: S)
where
    S: InventorySession,
{
    if let Err(e) = session.disconnect().await {
        warn!("Failed to disconnect inventory session: {}", e);
    }
}

/// Enumerate the entities of `kinds` below `container`, destroying the view
/// before returning
pub async fn enumerate<S>(
    session: &S,
    container: &InventoryNode,
    kinds: &[EntityKind],
) -> Result<Vec<InventoryNode>>
where
    S: InventorySession + ?Sized,
{
    let view = session.create_container_view(container, kinds, true).await?;
    session.destroy_view(&view).await?;
    Ok(view.view)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResolverError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedConnector {
        outcome: fn() -> ResolverError,
        attempts: AtomicUsize,
    }

    struct NeverSession;

    #[async_trait::async_trait]
    impl InventorySession for NeverSession {
        async fn root_folder(&self) -> Result<InventoryNode> {
            unreachable!()
        }
        async fn create_container_view(
            &self,
            _container: &InventoryNode,
            _kinds: &[EntityKind],
            _recursive: bool,
        ) -> Result<ContainerView> {
            unreachable!()
        }
        async fn destroy_view(&self, _view: &ContainerView) -> Result<()> {
            unreachable!()
        }
        async fn host_attachments(
            &self,
            _host: &InventoryNode,
            _kind: EntityKind,
        ) -> Result<Vec<InventoryNode>> {
            unreachable!()
        }
        async fn disconnect(&self) -> Result<()> {
            Ok(())
        }
    }

    #[async_trait::async_trait]
    impl InventoryConnector for ScriptedConnector {
        type Session = NeverSession;

        async fn open(&self, _endpoint: &Endpoint) -> Result<NeverSession> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err((self.outcome)())
        }
    }

    fn endpoint() -> Endpoint {
        Endpoint::new("vc.lab", "admin", "secret", 443)
    }

    #[tokio::test]
    async fn test_missing_credentials_skip_connect() -> Result<()> {
        let connector = ScriptedConnector {
            outcome: || ResolverError::other("should not be called"),
            attempts: AtomicUsize::new(0),
        };
        let endpoint = Endpoint::new("vc.lab", "", "secret", 443);

        assert!(connect(&connector, &endpoint).await?.is_none());
        assert_eq!(connector.attempts.load(Ordering::SeqCst), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_rejected_login_is_none() -> Result<()> {
        let connector = ScriptedConnector {
            outcome: || ResolverError::auth("incorrect user name or password"),
            attempts: AtomicUsize::new(0),
        };
        assert!(connect(&connector, &endpoint()).await?.is_none());

        let connector = ScriptedConnector {
            outcome: || ResolverError::unreachable("connection refused"),
            attempts: AtomicUsize::new(0),
        };
        assert!(connect(&connector, &endpoint()).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_unexpected_failure_propagates() {
        let connector = ScriptedConnector {
            outcome: || ResolverError::protocol("truncated envelope"),
            attempts: AtomicUsize::new(0),
        };
        let result = connect(&connector, &endpoint()).await;
        assert!(matches!(result, Err(ResolverError::Protocol(_))));
    }

    #[test]
    fn test_debug_redacts_password() {
        let rendered = format!("{:?}", endpoint());
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("vc.lab"));
    }
}
