//! Local stand-in for the game server.
//!
//! Answers connect handshakes with a map snapshot, streams state snapshots at
//! a fixed tick rate and logs the commands it gets back. Commands carrying a
//! stale secret are rejected, and every `--disconnect-every` ticks all clients
//! are told to reconnect.

use clap::Parser;
use log::{debug, error, info, warn};
use rand::Rng;
use shared::{Bullet, ClientMessage, ControlCommand, Secret, ServerMessage, Tank, Vector, Wall};
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use tokio::net::UdpSocket;
use tokio::time::{interval, Duration, MissedTickBehavior};

const MAP_SIZE: f32 = 100.0;
const TANK_SPEED: f32 = 0.05;
const BULLET_SPEED: f32 = 40.0;
const MAX_BULLETS: usize = 64;
/// Tank counts travel as a single byte
const MAX_PLAYERS: usize = 32;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: IpAddr,

    /// Port to listen on
    #[arg(short, long, env = "SERVER", default_value = "4000")]
    port: u16,

    /// State snapshots per second
    #[arg(short, long, default_value = "10")]
    tick_rate: u32,

    /// Send a disconnect notice every this many ticks, 0 for never
    #[arg(long, default_value = "0")]
    disconnect_every: u64,
}

struct Player {
    secret: Secret,
    tank: Tank,
    last_command: Option<ControlCommand>,
}

impl Player {
    fn spawn() -> Self {
        let mut rng = rand::thread_rng();
        Self {
            secret: Secret::new(rng.gen()),
            tank: Tank::new(
                Vector::new(rng.gen_range(0.0..MAP_SIZE), rng.gen_range(0.0..MAP_SIZE)),
                Vector::new(1.0, 0.0),
                Vector::new(1.0, 0.0),
            ),
            last_command: None,
        }
    }

    fn advance(&mut self, dt: f32, bullets: &mut Vec<Bullet>) {
        let Some(command) = self.last_command else {
            return;
        };

        let track = command.track_acceleration_target;
        if track.length() > 0.0 {
            let heading = Vector::new(track.x / track.length(), track.y / track.length());
            self.tank.direction = heading;
            self.tank.position = Vector::new(
                (self.tank.position.x + track.x * TANK_SPEED * dt).clamp(0.0, MAP_SIZE),
                (self.tank.position.y + track.y * TANK_SPEED * dt).clamp(0.0, MAP_SIZE),
            );
        }

        let angle = self.tank.turret.y.atan2(self.tank.turret.x)
            + command.turret_acceleration_target.clamp(-1.0, 1.0) * dt;
        self.tank.turret = Vector::new(angle.cos(), angle.sin());

        if command.shoot && bullets.len() < MAX_BULLETS {
            bullets.push(Bullet::new(self.tank.position, self.tank.turret));
        }
    }
}

/// Finds or creates the player behind `addr`. New players are turned away
/// once the table is full.
fn admit(players: &mut HashMap<SocketAddr, Player>, addr: SocketAddr) -> Option<&mut Player> {
    if !players.contains_key(&addr) && players.len() >= MAX_PLAYERS {
        return None;
    }
    Some(players.entry(addr).or_insert_with(Player::spawn))
}

fn square_map() -> Vec<Wall> {
    let corners = [
        Vector::new(0.0, 0.0),
        Vector::new(MAP_SIZE, 0.0),
        Vector::new(MAP_SIZE, MAP_SIZE),
        Vector::new(0.0, MAP_SIZE),
    ];
    (0..corners.len())
        .map(|i| Wall::new(corners[i], corners[(i + 1) % corners.len()]))
        .collect()
}

fn advance_bullets(bullets: &mut Vec<Bullet>, dt: f32) {
    for bullet in bullets.iter_mut() {
        bullet.position = Vector::new(
            bullet.position.x + bullet.direction.x * BULLET_SPEED * dt,
            bullet.position.y + bullet.direction.y * BULLET_SPEED * dt,
        );
    }
    bullets.retain(|b| {
        (0.0..=MAP_SIZE).contains(&b.position.x) && (0.0..=MAP_SIZE).contains(&b.position.y)
    });
}

async fn send(socket: &UdpSocket, message: &ServerMessage, addr: SocketAddr) {
    let data = match message.encode() {
        Ok(data) => data,
        Err(e) => {
            error!("Failed to encode {:?} snapshot: {}", message.kind(), e);
            return;
        }
    };
    if let Err(e) = socket.send_to(&data, addr).await {
        error!("Failed to send to {}: {}", addr, e);
    }
}

async fn handle_packet(
    socket: &UdpSocket,
    players: &mut HashMap<SocketAddr, Player>,
    walls: &[Wall],
    data: &[u8],
    from: SocketAddr,
) {
    match ClientMessage::decode(data) {
        Ok(ClientMessage::Connect { self_port }) => {
            let addr = SocketAddr::new(from.ip(), self_port);
            let Some(player) = admit(players, addr) else {
                warn!("Turning away {}: {} players already connected", addr, MAX_PLAYERS);
                return;
            };
            info!("Client {} connected", addr);
            let map = ServerMessage::MapChange {
                secret: player.secret,
                walls: walls.to_vec(),
            };
            send(socket, &map, addr).await;
        }
        Ok(ClientMessage::Control {
            self_port,
            secret,
            command,
        }) => {
            let addr = SocketAddr::new(from.ip(), self_port);
            match players.get_mut(&addr) {
                Some(player) if player.secret == secret => {
                    debug!("{} -> {}", addr, command);
                    player.last_command = Some(command);
                }
                Some(_) => warn!("Rejecting command from {} with stale secret", addr),
                None => warn!("Command from unknown client {}", addr),
            }
        }
        Err(e) => warn!("Malformed packet from {}: {}", from, e),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();
    let address = SocketAddr::new(args.host, args.port);
    let socket = UdpSocket::bind(address).await?;
    info!("Mock server listening on {}", address);

    let walls = square_map();
    let mut players: HashMap<SocketAddr, Player> = HashMap::new();
    let mut bullets: Vec<Bullet> = Vec::new();

    let tick_rate = args.tick_rate.max(1);
    let dt = 1.0 / tick_rate as f32;
    let mut ticker = interval(Duration::from_secs_f32(dt));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut tick: u64 = 0;

    let mut buffer = [0u8; 2048];

    loop {
        tokio::select! {
            result = socket.recv_from(&mut buffer) => {
                match result {
                    Ok((len, from)) => {
                        handle_packet(&socket, &mut players, &walls, &buffer[..len], from).await;
                    }
                    Err(e) => {
                        error!("Error receiving packet: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }

            _ = ticker.tick() => {
                tick += 1;

                if args.disconnect_every > 0 && tick % args.disconnect_every == 0 {
                    info!("Tick {}: disconnecting {} clients", tick, players.len());
                    for addr in players.keys() {
                        send(&socket, &ServerMessage::Disconnected, *addr).await;
                    }
                    players.clear();
                    bullets.clear();
                    continue;
                }

                for player in players.values_mut() {
                    player.advance(dt, &mut bullets);
                }
                advance_bullets(&mut bullets, dt);

                let tanks: Vec<Tank> = players.values().map(|p| p.tank).collect();
                for (addr, player) in &players {
                    let state = ServerMessage::State {
                        secret: player.secret,
                        tanks: tanks.clone(),
                        bullets: bullets.clone(),
                    };
                    send(&socket, &state, *addr).await;
                }
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down");
                break;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_map_is_closed() {
        let walls = square_map();
        assert_eq!(walls.len(), 4);
        for (i, wall) in walls.iter().enumerate() {
            assert_eq!(wall.end, walls[(i + 1) % walls.len()].start);
        }
    }

    #[test]
    fn test_bullets_leave_the_map() {
        let mut bullets = vec![
            Bullet::new(Vector::new(99.0, 50.0), Vector::new(1.0, 0.0)),
            Bullet::new(Vector::new(50.0, 50.0), Vector::new(0.0, 1.0)),
        ];
        advance_bullets(&mut bullets, 0.1);
        assert_eq!(bullets.len(), 1);
        assert_eq!(bullets[0].position, Vector::new(50.0, 54.0));
    }

    #[test]
    fn test_admit_caps_player_count() {
        let mut players = HashMap::new();
        let addr = |port: u16| SocketAddr::from(([127, 0, 0, 1], port));

        for port in 0..MAX_PLAYERS as u16 {
            assert!(admit(&mut players, addr(5000 + port)).is_some());
        }
        assert!(admit(&mut players, addr(6000)).is_none());
        assert_eq!(players.len(), MAX_PLAYERS);

        let secret = players[&addr(5000)].secret;
        let again = admit(&mut players, addr(5000)).unwrap();
        assert_eq!(again.secret, secret);
    }

    #[test]
    fn test_player_fires_and_moves() {
        let mut player = Player::spawn();
        let start = player.tank.position;
        player.last_command = Some(ControlCommand::new(Vector::new(0.0, 0.0), 0.0, true));

        let mut bullets = Vec::new();
        player.advance(0.1, &mut bullets);
        assert_eq!(bullets.len(), 1);
        assert_eq!(player.tank.position, start);
    }
}
