#[allow(dead_code)]
mod common;

use std::sync::atomic::Ordering;
use std::time::Duration;

use futures::SinkExt;
use tokio_tungstenite::tungstenite::Message;

use common::{join, recv, send, send_raw, try_recv, TestServer};
use ship_arena_server::config::Config;
use ship_arena_server::game::Team;
use ship_arena_server::ws::protocol::{ClientMsg, ServerMsg};

const QUIET: Duration = Duration::from_millis(150);

#[tokio::test]
async fn first_client_gets_self_snapshot_and_zero_score() {
    let server = TestServer::new().await;
    let (_a, a_id, players) = join(&server, &[]).await;

    assert_eq!(players.len(), 1);
    assert_eq!(players[&a_id].team, Team::Red);
    assert_eq!(players[&a_id].rotation, 0.0);
}

#[tokio::test]
async fn join_move_explode_scenario() {
    let server = TestServer::new().await;
    let (mut a, a_id, _) = join(&server, &[]).await;
    let (mut b, b_id, players) = join(&server, &[a_id]).await;

    // B's snapshot holds both players
    assert_eq!(players.len(), 2);
    assert_eq!(players[&b_id].team, Team::Blue);

    // A learns about B
    match recv(&mut a).await {
        ServerMsg::PlayerJoined { player } => {
            assert_eq!(player.connection_id, b_id);
            assert_eq!(player.team, Team::Blue);
        }
        other => panic!("Expected PlayerJoined, got: {other:?}"),
    }

    // A moves, B sees it
    send(
        &mut a,
        &ClientMsg::MovePlayer {
            x: 10.0,
            y: 20.0,
            rotation: 1.0,
        },
    )
    .await;
    assert_eq!(
        recv(&mut b).await,
        ServerMsg::PlayerMoved {
            connection_id: a_id,
            x: 10.0,
            y: 20.0,
            rotation: 1.0,
        }
    );

    // A explodes. A's next message must be the announcement, which also
    // proves its own movement was never echoed back.
    send(&mut a, &ClientMsg::ReportExplosion).await;
    for client in [&mut a, &mut b] {
        assert_eq!(
            recv(client).await,
            ServerMsg::ExplosionAnnounced { connection_id: a_id }
        );
        assert_eq!(recv(client).await, ServerMsg::ScoreUpdate { red: 0, blue: 1 });
    }
}

#[tokio::test]
async fn projectile_ids_do_not_collide_across_owners() {
    let server = TestServer::new().await;
    let (mut a, a_id, _) = join(&server, &[]).await;
    let (mut b, b_id, _) = join(&server, &[a_id]).await;
    let _ = recv(&mut a).await; // player_joined for B

    send(
        &mut a,
        &ClientMsg::SpawnProjectile {
            x: 100.0,
            y: 100.0,
            rotation: 0.0,
            projectile_id: 0,
        },
    )
    .await;
    assert!(matches!(
        recv(&mut b).await,
        ServerMsg::ProjectileSpawned { owner_id, projectile_id: 0, .. } if owner_id == a_id
    ));

    send(
        &mut b,
        &ClientMsg::SpawnProjectile {
            x: 700.0,
            y: 450.0,
            rotation: 3.0,
            projectile_id: 0,
        },
    )
    .await;
    assert!(matches!(
        recv(&mut a).await,
        ServerMsg::ProjectileSpawned { owner_id, projectile_id: 0, .. } if owner_id == b_id
    ));

    send(
        &mut a,
        &ClientMsg::MoveProjectile {
            x: 110.0,
            y: 120.0,
            rotation: 0.0,
            projectile_id: 0,
        },
    )
    .await;
    assert_eq!(
        recv(&mut b).await,
        ServerMsg::ProjectileMoved {
            owner_id: a_id,
            projectile_id: 0,
            x: 110.0,
            y: 120.0,
            rotation: 0.0,
        }
    );

    let registry = &server.state.arena.registry;
    assert_eq!(registry.get_projectile(b_id, 0).unwrap().pose.x, 700.0);
    assert_eq!(registry.get_projectile(a_id, 0).unwrap().pose.x, 110.0);
}

#[tokio::test]
async fn malformed_and_unknown_messages_are_dropped() {
    let server = TestServer::new().await;
    let (mut a, a_id, _) = join(&server, &[]).await;
    let (mut b, _b_id, _) = join(&server, &[a_id]).await;
    let _ = recv(&mut a).await; // player_joined for B

    send_raw(&mut a, "definitely not json").await;
    send_raw(&mut a, r#"{"type":"move_player","x":1}"#).await;
    send_raw(&mut a, r#"{"type":"warp_drive"}"#).await;
    a.send(Message::Binary(vec![1, 2, 3])).await.unwrap();
    // Unknown projectile: nobody hears about it
    send(
        &mut a,
        &ClientMsg::MoveProjectile {
            x: 1.0,
            y: 1.0,
            rotation: 0.0,
            projectile_id: 99,
        },
    )
    .await;

    // The connection survives and still relays valid input
    send(
        &mut a,
        &ClientMsg::MovePlayer {
            x: 5.0,
            y: 6.0,
            rotation: 0.5,
        },
    )
    .await;
    assert_eq!(
        recv(&mut b).await,
        ServerMsg::PlayerMoved {
            connection_id: a_id,
            x: 5.0,
            y: 6.0,
            rotation: 0.5,
        }
    );
    assert!(try_recv(&mut b, QUIET).await.is_none());
    assert!(try_recv(&mut a, QUIET).await.is_none());
}

#[tokio::test]
async fn disconnect_is_announced_once() {
    let server = TestServer::new().await;
    let (mut a, a_id, _) = join(&server, &[]).await;
    let (mut b, b_id, _) = join(&server, &[a_id]).await;
    let _ = recv(&mut a).await; // player_joined for B
    server.wait_for_players(2).await;

    b.close(None).await.unwrap();
    drop(b);

    assert_eq!(
        recv(&mut a).await,
        ServerMsg::PlayerLeft { connection_id: b_id }
    );
    assert!(try_recv(&mut a, QUIET).await.is_none());
    server.wait_for_players(1).await;
    assert_eq!(server.state.arena.connection_count(), 1);
}

#[tokio::test]
async fn abrupt_drop_cleans_up() {
    let server = TestServer::new().await;
    let (mut a, a_id, _) = join(&server, &[]).await;
    let (b, b_id, _) = join(&server, &[a_id]).await;
    let _ = recv(&mut a).await;

    // No close handshake
    drop(b);

    assert_eq!(
        recv(&mut a).await,
        ServerMsg::PlayerLeft { connection_id: b_id }
    );
    server.wait_for_players(1).await;
}

#[tokio::test]
async fn teams_alternate_across_connections() {
    let server = TestServer::new().await;
    let mut known = Vec::new();
    let mut clients = Vec::new();
    for expected in [Team::Red, Team::Blue, Team::Red, Team::Blue] {
        let (client, id, players) = join(&server, &known).await;
        assert_eq!(players[&id].team, expected);
        known.push(id);
        clients.push(client);
    }
    assert_eq!(server.state.arena.registry.player_count(), 4);
}

#[tokio::test]
async fn connection_limit_refuses_upgrade() {
    let server = TestServer::from_config(Config {
        max_connections: 1,
        ..Config::default()
    })
    .await;
    let (a, _a_id, _) = join(&server, &[]).await;

    let result = tokio_tungstenite::connect_async(server.ws_url()).await;
    assert!(result.is_err());

    // The slot frees up once the session is gone
    drop(a);
    for _ in 0..100 {
        if server.state.ws_connections.load(Ordering::Acquire) == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let (_b, _b_id, _) = join(&server, &[]).await;
}

#[tokio::test]
async fn concurrent_upgrades_respect_connection_limit() {
    let server = TestServer::from_config(Config {
        max_connections: 1,
        ..Config::default()
    })
    .await;

    let url = server.ws_url();
    let attempts = (0..8).map(|_| tokio_tungstenite::connect_async(url.clone()));
    let clients: Vec<_> = futures::future::join_all(attempts)
        .await
        .into_iter()
        .filter_map(Result::ok)
        .collect();

    assert_eq!(clients.len(), 1);
    server.wait_for_players(1).await;
    assert_eq!(server.state.arena.connection_count(), 1);
}
