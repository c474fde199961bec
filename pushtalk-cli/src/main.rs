use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use pushtalk_server::{
    ConnectionManager, DEFAULT_SERVER_NAME, DEFAULT_STUN_URL, DEFAULT_TURN_CREDENTIAL,
    DEFAULT_TURN_URL, DEFAULT_TURN_USERNAME, EngineConfig, IceServerConfig, ManagerConfig,
    RelayMode, ServerConfig, SignalingService, WebRtcEngine,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Policy {
    /// Все слышат всех
    Open,
    /// Push-to-talk: слышно только текущего говорящего
    SpeakerGate,
    /// Периодически заглушать случайного участника
    RotatingMute,
}

#[derive(Parser, Debug)]
#[command(name = "pushtalk", version, about = "Push-to-talk WebRTC audio relay")]
struct Args {
    /// Адрес HTTP-сигналинга
    #[arg(long, env = "PUSHTALK_BIND", default_value = "0.0.0.0:8080")]
    bind: SocketAddr,

    #[arg(long, env = "PUSHTALK_STUN", default_value = DEFAULT_STUN_URL)]
    stun: String,

    #[arg(long, env = "PUSHTALK_TURN", default_value = DEFAULT_TURN_URL)]
    turn: String,

    #[arg(long, env = "PUSHTALK_TURN_USERNAME", default_value = DEFAULT_TURN_USERNAME)]
    turn_username: String,

    #[arg(long, env = "PUSHTALK_TURN_CREDENTIAL", default_value = DEFAULT_TURN_CREDENTIAL)]
    turn_credential: String,

    /// Только host-кандидаты, без STUN/TURN
    #[arg(long)]
    host_only: bool,

    #[arg(long, value_enum, env = "PUSHTALK_POLICY", default_value = "speaker-gate")]
    policy: Policy,

    /// Период ротации для rotating-mute
    #[arg(long, default_value_t = 15)]
    rotation_secs: u64,

    /// Сколько ждать сбора ICE-кандидатов в get_offer
    #[arg(long, default_value_t = 10_000)]
    gathering_timeout_ms: u64,

    /// Отдавать offer сразу, кандидаты забирать через get_candidates
    #[arg(long)]
    no_await_gathering: bool,

    #[arg(long, env = "PUSHTALK_SERVER_NAME", default_value = DEFAULT_SERVER_NAME)]
    server_name: String,
}

impl Args {
    fn engine_config(&self) -> EngineConfig {
        if self.host_only {
            return EngineConfig::host_only();
        }
        EngineConfig {
            ice_servers: vec![
                IceServerConfig::stun(&self.stun),
                IceServerConfig::turn(&self.turn, &self.turn_username, &self.turn_credential),
            ],
            ..EngineConfig::default()
        }
    }

    fn server_config(&self) -> ServerConfig {
        ServerConfig { bind: self.bind }
    }

    fn manager_config(&self) -> ManagerConfig {
        let relay_mode = match self.policy {
            Policy::Open => RelayMode::Open,
            Policy::SpeakerGate => RelayMode::SpeakerGate,
            Policy::RotatingMute => RelayMode::RotatingMute {
                interval: Duration::from_secs(self.rotation_secs.max(1)),
            },
        };
        ManagerConfig {
            relay_mode,
            await_gathering: !self.no_await_gathering,
            gathering_timeout: Duration::from_millis(self.gathering_timeout_ms),
            server_name: self.server_name.clone(),
            ..ManagerConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    info!("Starting pushtalk with {:?}", args.policy);

    let engine = Arc::new(WebRtcEngine::new(args.engine_config()));
    let manager = ConnectionManager::new(engine, args.manager_config());
    let signaling = SignalingService::new(manager.clone());

    signaling
        .serve(&args.server_config(), async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown requested");
        })
        .await
        .context("Signaling server failed")?;

    manager.shutdown().await;
    Ok(())
}
