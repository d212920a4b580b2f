use async_trait::async_trait;
use tracing::info;

/// Outbound mail used by the auth flows.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_password_reset(&self, to: &str, link: &str) -> anyhow::Result<()>;
}

/// Writes outgoing mail to the log instead of delivering it.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_password_reset(&self, to: &str, link: &str) -> anyhow::Result<()> {
        info!(%to, %link, "password reset mail");
        Ok(())
    }
}
