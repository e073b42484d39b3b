//! Application state shared across all handlers

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;

use cho_auth::{AuthService, AuthSettings, SessionCipher, UserService};
use cho_common::Clock;
use cho_persistence::PersistenceService;
use cho_report::{
    AppointmentService, BarangayService, LogNoticeSender, NoticeJob, NoticeSender, ReportService,
    StatusService, SubmissionService, WebhookNoticeSender,
};

use super::config::{Configuration, NoticeSenderKind};

pub struct AppState {
    pub configuration: Configuration,
    pub persistence: Arc<dyn PersistenceService>,
    pub clock: Arc<dyn Clock>,
    pub auth: AuthService,
    pub session: SessionCipher,
    pub users: UserService,
    pub barangays: BarangayService,
    pub appointments: AppointmentService,
    pub submissions: SubmissionService,
    pub statuses: StatusService,
    pub reports: ReportService,
    pub notice: Arc<NoticeJob>,
    /// Present once the Prometheus recorder is installed
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(
        configuration: Configuration,
        persistence: Arc<dyn PersistenceService>,
        clock: Arc<dyn Clock>,
    ) -> anyhow::Result<Self> {
        let token_secret = configuration.token_secret_key();
        if token_secret.trim().is_empty() {
            anyhow::bail!("cho.auth.token.secret is not configured");
        }

        let sender: Arc<dyn NoticeSender> = match configuration.notice_sender()? {
            NoticeSenderKind::Log => Arc::new(LogNoticeSender),
            NoticeSenderKind::Webhook {
                url,
                secret,
                timeout,
            } => Arc::new(WebhookNoticeSender::new(url, secret, timeout)?),
        };
        let notice = Arc::new(NoticeJob::new(
            persistence.clone(),
            clock.clone(),
            sender,
            configuration.notice_lead_days(),
        ));

        let settings = AuthSettings {
            token_secret,
            expire_seconds: configuration.token_expire_seconds(),
        };

        Ok(Self {
            auth: AuthService::new(persistence.clone(), clock.clone(), settings),
            session: SessionCipher::new(&configuration.cookie_secret_key()),
            users: UserService::new(persistence.clone(), clock.clone()),
            barangays: BarangayService::new(persistence.clone(), clock.clone()),
            appointments: AppointmentService::new(persistence.clone(), clock.clone()),
            submissions: SubmissionService::new(
                persistence.clone(),
                clock.clone(),
                Some(notice.clone()),
            ),
            statuses: StatusService::new(persistence.clone(), clock.clone()),
            reports: ReportService::new(persistence.clone()),
            notice,
            configuration,
            persistence,
            clock,
            metrics: None,
        })
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    pub fn persistence(&self) -> &dyn PersistenceService {
        self.persistence.as_ref()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("configuration", &self.configuration)
            .field("storage_mode", &self.persistence.storage_mode())
            .field("metrics", &self.metrics.is_some())
            .finish()
    }
}
