use anyhow::Result;
use colored::*;
use presence_client::{ClientConfig, MeshClient, RtcTransportFactory};
use presence_core::mesh::MeshEvent;
use presence_core::{Transform, Vec3};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::info;

use crate::{BotArgs, shutdown_signal};

const WALK_RADIUS: f64 = 2.0;

pub(crate) async fn run(args: BotArgs) -> Result<()> {
    let config = ClientConfig {
        url: args.url.clone(),
        transform_tick: Duration::from_millis(args.tick_ms.max(1)),
        ..Default::default()
    };

    let (pose_tx, pose_rx) = watch::channel(Transform::default());
    let (client, mut events) =
        MeshClient::connect(config, Arc::new(RtcTransportFactory::new()), pose_rx).await?;
    println!("{} {}", "Connected to".green().bold(), args.url);

    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            print_event(&event);
        }
    });

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_millis(50));
        let mut angle: f64 = 0.0;
        loop {
            ticker.tick().await;
            angle = (angle + 0.05) % std::f64::consts::TAU;
            let pose = Transform::new(
                Vec3::new(WALK_RADIUS * angle.cos(), 0.0, WALK_RADIUS * angle.sin()),
                Vec3::new(0.0, -angle, 0.0),
            );
            if pose_tx.send(pose).is_err() {
                break;
            }
        }
    });

    let duration = args.duration_secs.map(Duration::from_secs);
    let shutdown = async move {
        match duration {
            Some(d) => {
                tokio::select! {
                    _ = tokio::time::sleep(d) => info!("Bot duration elapsed"),
                    _ = shutdown_signal() => {}
                }
            }
            None => shutdown_signal().await,
        }
    };

    client.run(shutdown).await?;
    println!("{}", "Left the relay".cyan());
    Ok(())
}

fn print_event(event: &MeshEvent) {
    match event {
        MeshEvent::Welcomed { session_id } => {
            println!("{} {}", "welcomed as".green(), session_id)
        }
        MeshEvent::AvatarUpdated { .. } => {}
        MeshEvent::AvatarRemoved { id } => println!("{} {}", "avatar removed".yellow(), id),
        MeshEvent::LiveCount { count } => println!("{} {}", "live:".cyan(), count),
        MeshEvent::PeerStateChanged { remote, state } => {
            println!("{} {} -> {:?}", "peer".blue(), remote, state)
        }
        MeshEvent::TrackReceived { remote, track } => {
            println!("{} {} from {}", "track".magenta(), track.kind, remote)
        }
        MeshEvent::PeerClosed { remote, reason } => {
            println!("{} {} ({:?})", "peer closed".red(), remote, reason)
        }
        MeshEvent::MediaUnavailable { reason } => {
            println!("{} {}", "receive-only:".yellow(), reason)
        }
    }
}
