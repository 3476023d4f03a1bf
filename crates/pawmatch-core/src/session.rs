//! Session validity probe.

use tracing::debug;

use crate::error::{CatalogError, CatalogResult};
use crate::service::CatalogService;

/// Whether the stored session is accepted by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Authenticated calls succeed.
    Authenticated,
    /// The service rejected the session.
    Anonymous,
}

/// Probe the session with a cheap authenticated call.
///
/// An auth rejection is a normal answer, not an error.
///
/// # Errors
///
/// Returns [`CatalogError::Transport`] when the service cannot be reached.
pub async fn check_session(service: &dyn CatalogService) -> CatalogResult<SessionStatus> {
    match service.fetch_breeds().await {
        Ok(_) => Ok(SessionStatus::Authenticated),
        Err(err @ CatalogError::Auth { .. }) => {
            debug!(error = %err, "session rejected");
            Ok(SessionStatus::Anonymous)
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeCatalog;

    #[tokio::test]
    async fn successful_probe_is_authenticated() -> anyhow::Result<()> {
        let service = FakeCatalog::default();
        assert_eq!(check_session(&service).await?, SessionStatus::Authenticated);
        Ok(())
    }

    #[tokio::test]
    async fn auth_rejection_is_anonymous() -> anyhow::Result<()> {
        let service = FakeCatalog::default();
        service.fail_breeds(CatalogError::Auth {
            operation: "fetch_breeds",
        });
        assert_eq!(check_session(&service).await?, SessionStatus::Anonymous);
        Ok(())
    }

    #[tokio::test]
    async fn transport_failure_propagates() {
        let service = FakeCatalog::default();
        service.fail_breeds(CatalogError::transport("fetch_breeds", "refused"));
        assert!(check_session(&service).await.is_err());
    }
}
