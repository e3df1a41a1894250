use clap::Parser;
use client::RelayClient;
use log::{info, warn};
use shared::{AttackUpdate, PositionUpdate, ServerMessage, DEFAULT_PORT};
use tokio::time::{interval, Duration, MissedTickBehavior};

#[derive(Parser, Debug)]
#[command(author, version, about = "Scripted bot for the lobby relay server", long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value_t = format!("127.0.0.1:{}", DEFAULT_PORT))]
    server: String,

    /// Player name sent in PlayerData
    #[arg(short, long, default_value = "Bot")]
    name: String,

    /// Character choice sent in PlayerData
    #[arg(short, long, default_value = "Knight")]
    character: String,

    /// Do not send Ready after joining
    #[arg(long)]
    no_ready: bool,

    /// Milliseconds between Position updates once the match has begun
    #[arg(short = 'i', long, default_value = "100")]
    send_interval_ms: u64,

    /// Send an Attack every this many Position updates (0 disables attacks)
    #[arg(short = 'a', long, default_value = "10")]
    attack_every: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    info!("Connecting to {} as {} ({})", args.server, args.name, args.character);
    let mut client = RelayClient::connect(&args.server).await?;
    client.join(&args.name, &args.character).await?;

    let mut ticker = interval(Duration::from_millis(args.send_interval_ms.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut started = false;
    let mut x = 0.0f32;
    let mut facing_right = true;
    let mut sent = 0u32;

    loop {
        tokio::select! {
            _ = ticker.tick(), if started => {
                // Pace back and forth between x = 0 and x = 10
                x += if facing_right { 0.5 } else { -0.5 };
                if !(0.0..=10.0).contains(&x) {
                    facing_right = !facing_right;
                    x = x.clamp(0.0, 10.0);
                }

                client
                    .send_position(PositionUpdate::new(x, 0.0, facing_right, &args.character))
                    .await?;
                sent += 1;

                if args.attack_every > 0 && sent % args.attack_every == 0 {
                    client
                        .send_attack(AttackUpdate::new(x, 0.5, 10.0, facing_right, 1.5))
                        .await?;
                }
            }
            message = client.next_message() => {
                match message? {
                    Some(ServerMessage::SuccessPlayerConnect) => {
                        info!("Joined the lobby");
                        if !args.no_ready {
                            client.ready().await?;
                            info!("Sent Ready");
                        }
                    }
                    Some(ServerMessage::GameBegins) => {
                        info!("The game begins!");
                        started = true;
                    }
                    Some(ServerMessage::Position { update, sender }) => {
                        info!(
                            "Player {} ({}) at ({}, {}) facing {}",
                            sender,
                            update.sprite_name,
                            update.x,
                            update.y,
                            if update.is_right { "right" } else { "left" }
                        );
                    }
                    Some(ServerMessage::Attack { update, sender }) => {
                        info!(
                            "Player {} attacks from ({}, {}) for {} over {}",
                            sender, update.x, update.y, update.damage, update.range
                        );
                    }
                    None => {
                        warn!("Server closed the connection");
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, leaving");
                break;
            }
        }
    }

    Ok(())
}
