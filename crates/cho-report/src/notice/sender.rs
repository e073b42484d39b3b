//! Notice delivery channels

use std::time::Duration;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::info;

use super::{Notice, NoticeSender};

/// Writes notices to the `notice` log target only
#[derive(Debug, Default, Clone)]
pub struct LogNoticeSender;

#[async_trait]
impl NoticeSender for LogNoticeSender {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn send(&self, notice: &Notice) -> anyhow::Result<()> {
        let recipients: Vec<&str> = notice.recipients.iter().map(|r| r.email.as_str()).collect();
        for item in &notice.items {
            info!(
                target: "notice",
                barangay = %notice.barangay_name,
                recipients = ?recipients,
                submission_id = item.submission_id,
                report_type = %item.report_type,
                period = %item.period,
                due_at = %item.due_at,
                overdue = item.overdue,
                "pending report submission"
            );
        }
        Ok(())
    }
}

/// Posts each notice as JSON to a mail relay
pub struct WebhookNoticeSender {
    client: reqwest::Client,
    url: String,
    secret: Option<String>,
}

impl WebhookNoticeSender {
    pub fn new(url: impl Into<String>, secret: Option<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
            secret: secret.filter(|s| !s.is_empty()),
        })
    }
}

#[async_trait]
impl NoticeSender for WebhookNoticeSender {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn send(&self, notice: &Notice) -> anyhow::Result<()> {
        let payload = serde_json::to_string(notice)?;

        let mut request = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .header("X-Notice-Barangay", notice.barangay_id.to_string());

        if let Some(secret) = &self.secret {
            let signature = compute_signature(&payload, secret)?;
            request = request.header("X-Notice-Signature", format!("sha256={}", signature));
        }

        let response = request.body(payload).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body: String = body.chars().take(512).collect();
            anyhow::bail!("notice relay answered HTTP {}: {}", status.as_u16(), body);
        }
        Ok(())
    }
}

/// HMAC-SHA256 of the payload, hex encoded
pub fn compute_signature(payload: &str, secret: &str) -> anyhow::Result<String> {
    type HmacSha256 = Hmac<Sha256>;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| anyhow::anyhow!("invalid notice secret: {}", e))?;
    mac.update(payload.as_bytes());
    Ok(const_hex::encode(mac.finalize().into_bytes()))
}
