use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use revbot_slack::gateway::SlackGateway;
use serde::Serialize;
use tracing::{error, info};

#[derive(Clone)]
pub struct HealthState {
    gateway: Arc<dyn SlackGateway>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub slack: HealthCheck,
    pub checked_at: String,
}

pub fn router(gateway: Arc<dyn SlackGateway>) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { gateway })
}

pub async fn spawn(
    bind_address: &str,
    port: u16,
    gateway: Arc<dyn SlackGateway>,
) -> std::io::Result<()> {
    let address = format!("{bind_address}:{port}");
    let listener = tokio::net::TcpListener::bind(&address).await?;

    info!(
        event_name = "health_endpoint_started",
        correlation_id = "bootstrap",
        bind_address = %address,
        "health endpoint started"
    );

    tokio::spawn(async move {
        if let Err(error) = axum::serve(listener, router(gateway)).await {
            error!(
                event_name = "health_endpoint_error",
                correlation_id = "bootstrap",
                error = %error,
                "health endpoint server terminated unexpectedly"
            );
        }
    });

    Ok(())
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let slack = slack_check(state.gateway.as_ref()).await;
    let ready = slack.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "revbot-server runtime initialized".to_string(),
        },
        slack,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

async fn slack_check(gateway: &dyn SlackGateway) -> HealthCheck {
    match gateway.auth_check().await {
        Ok(()) => HealthCheck { status: "ready", detail: "slack auth check succeeded".to_string() },
        Err(error) => {
            HealthCheck { status: "degraded", detail: format!("slack auth check failed: {error}") }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{extract::State, http::StatusCode, Json};
    use revbot_slack::blocks::{MessageTemplate, ModalView};
    use revbot_slack::gateway::{GatewayError, SlackGateway};

    use crate::health::{health, HealthState};

    struct StubGateway {
        healthy: bool,
    }

    #[async_trait]
    impl SlackGateway for StubGateway {
        async fn open_view(&self, _: &str, _: &ModalView) -> Result<(), GatewayError> {
            Ok(())
        }

        async fn post_message(&self, _: &str, _: &MessageTemplate) -> Result<String, GatewayError> {
            Ok("0.0".to_owned())
        }

        async fn post_thread_reply(&self, _: &str, _: &str, _: &str) -> Result<(), GatewayError> {
            Ok(())
        }

        async fn pin_message(&self, _: &str, _: &str) -> Result<(), GatewayError> {
            Ok(())
        }

        async fn auth_check(&self) -> Result<(), GatewayError> {
            if self.healthy {
                Ok(())
            } else {
                Err(GatewayError::Api {
                    method: "auth.test",
                    error: "invalid_auth".to_owned(),
                })
            }
        }
    }

    #[tokio::test]
    async fn health_returns_ready_when_slack_auth_succeeds() {
        let state = HealthState { gateway: Arc::new(StubGateway { healthy: true }) };

        let (status, Json(payload)) = health(State(state)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.slack.status, "ready");
        assert_eq!(payload.service.status, "ready");
    }

    #[tokio::test]
    async fn health_returns_service_unavailable_when_slack_auth_fails() {
        let state = HealthState { gateway: Arc::new(StubGateway { healthy: false }) };

        let (status, Json(payload)) = health(State(state)).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload.status, "degraded");
        assert_eq!(payload.slack.status, "degraded");
        assert!(payload.slack.detail.contains("invalid_auth"));
    }
}
