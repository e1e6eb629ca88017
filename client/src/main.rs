use clap::Parser;
use client::config::{DEFAULT_SELF_PORT, DEFAULT_SERVER_PORT};
use client::{Controller, Session, SessionConfig};
use log::{debug, info};
use shared::{Bullet, ControlCommand, Tank, Vector, Wall};
use std::net::IpAddr;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address the server listens on
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: IpAddr,

    /// Local address to bind
    #[arg(long, default_value = "127.0.0.1")]
    bind_host: IpAddr,

    /// Local port, announced to the server in every frame
    #[arg(short = 'p', long = "self-port", env = "SELF-PORT", default_value_t = DEFAULT_SELF_PORT)]
    self_port: u16,

    /// Server port
    #[arg(short = 's', long = "server", env = "SERVER", default_value_t = DEFAULT_SERVER_PORT)]
    server_port: u16,

    /// Pause before re-sending the handshake after an idle receive
    #[arg(long, default_value = "100")]
    reconnect_delay_ms: u64,

    /// Treat this many milliseconds without a datagram as idle
    #[arg(long)]
    idle_timeout_ms: Option<u64>,
}

impl Args {
    fn session_config(&self) -> SessionConfig {
        SessionConfig::default()
            .with_hosts(self.bind_host, self.host)
            .with_ports(self.self_port, self.server_port)
            .with_reconnect_delay(Duration::from_millis(self.reconnect_delay_ms))
            .with_idle_timeout(self.idle_timeout_ms.map(Duration::from_millis))
    }
}

/// Drives forward and fires on every state update; swap in real logic here.
#[derive(Default)]
struct DemoController {
    walls: Vec<Wall>,
}

impl Controller for DemoController {
    fn on_map_change(&mut self, walls: &[Wall]) -> Option<ControlCommand> {
        info!("Map changed: {} walls", walls.len());
        self.walls = walls.to_vec();
        None
    }

    fn on_state_change(&mut self, tanks: &[Tank], bullets: &[Bullet]) -> Option<ControlCommand> {
        let command = ControlCommand::new(Vector::new(50.0, 20.0), 1000.0, true);
        debug!(
            "{} tanks, {} bullets, {} walls known -> {}",
            tanks.len(),
            bullets.len(),
            self.walls.len(),
            command
        );
        Some(command)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    info!("Starting client...");
    let mut session = Session::bind(args.session_config(), DemoController::default()).await?;

    session
        .run_until(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    info!("Client stopped");
    Ok(())
}
