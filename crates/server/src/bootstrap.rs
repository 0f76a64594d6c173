use std::sync::Arc;

use revbot_core::config::{AppConfig, ConfigError, LoadOptions};
use revbot_slack::events::build_dispatcher;
use revbot_slack::gateway::{GatewayError, SlackWebClient};
use revbot_slack::socket::{
    NoopSocketTransport, ReconnectPolicy, SocketModeRunner, SocketTransport, WebSocketTransport,
};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub gateway: Arc<SlackWebClient>,
    pub slack_runner: SocketModeRunner,
    pub transport_mode: &'static str,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "bootstrap_start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let gateway = Arc::new(SlackWebClient::new(config.slack.bot_token.clone())?);
    let dispatcher = build_dispatcher(gateway.clone());

    let (transport, transport_mode): (Arc<dyn SocketTransport>, &'static str) =
        if config.slack.socket_mode {
            let transport = WebSocketTransport::new(
                gateway.as_ref().clone(),
                config.slack.app_token.clone(),
            );
            (Arc::new(transport), "socket")
        } else {
            (Arc::new(NoopSocketTransport), "noop")
        };

    let slack_runner = SocketModeRunner::new(transport, dispatcher, ReconnectPolicy::default());

    info!(
        event_name = "bootstrap_complete",
        correlation_id = "bootstrap",
        transport_mode,
        "application bootstrap complete"
    );

    Ok(Application { config, gateway, slack_runner, transport_mode })
}
