use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use uuid::Uuid;

use ship_arena_server::ws::protocol::{ClientMsg, PlayerInfo, ServerMsg};
use ship_arena_server::{build_router, AppState, Config};

pub type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct TestServer {
    pub addr: SocketAddr,
    pub state: AppState,
    _shutdown: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// Start a server on an ephemeral port with a fixed spawn seed
    pub async fn new() -> Self {
        Self::from_config(Config {
            spawn_seed: Some(7),
            ..Config::default()
        })
        .await
    }

    pub async fn from_config(config: Config) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let state = AppState::new(config);
        let app = build_router(state.clone());

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            state,
            _shutdown: handle,
        }
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    /// Wait until the arena holds exactly `n` players
    pub async fn wait_for_players(&self, n: usize) {
        for _ in 0..100 {
            if self.state.arena.registry.player_count() == n {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!(
            "expected {n} players, arena has {}",
            self.state.arena.registry.player_count()
        );
    }
}

pub async fn ws_connect(url: &str) -> Client {
    let (stream, _) = tokio_tungstenite::connect_async(url).await.unwrap();
    stream
}

/// Connect and consume the join preamble (snapshot, then score).
///
/// `known` lists the connections already in the arena; the one snapshot
/// entry outside it is the new client's own id.
pub async fn join(server: &TestServer, known: &[Uuid]) -> (Client, Uuid, HashMap<Uuid, PlayerInfo>) {
    let mut client = ws_connect(&server.ws_url()).await;
    let players = match recv(&mut client).await {
        ServerMsg::SnapshotPlayers { players } => players,
        other => panic!("Expected SnapshotPlayers, got: {other:?}"),
    };
    match recv(&mut client).await {
        ServerMsg::ScoreUpdate { .. } => {}
        other => panic!("Expected ScoreUpdate, got: {other:?}"),
    }

    let own: Vec<Uuid> = players
        .keys()
        .filter(|id| !known.contains(id))
        .copied()
        .collect();
    assert_eq!(own.len(), 1, "snapshot should add exactly one new player");
    (client, own[0], players)
}

pub async fn send(client: &mut Client, msg: &ClientMsg) {
    let json = serde_json::to_string(msg).unwrap();
    client.send(Message::Text(json)).await.unwrap();
}

pub async fn send_raw(client: &mut Client, text: &str) {
    client.send(Message::Text(text.to_string())).await.unwrap();
}

/// Next server message, failing after two seconds
pub async fn recv(client: &mut Client) -> ServerMsg {
    tokio::time::timeout(Duration::from_secs(2), next_msg(client))
        .await
        .expect("timed out waiting for server message")
        .expect("connection closed")
}

/// Next server message if one arrives within `wait`
pub async fn try_recv(client: &mut Client, wait: Duration) -> Option<ServerMsg> {
    tokio::time::timeout(wait, next_msg(client)).await.ok().flatten()
}

async fn next_msg(client: &mut Client) -> Option<ServerMsg> {
    while let Some(frame) = client.next().await {
        match frame.ok()? {
            Message::Text(text) => return Some(serde_json::from_str(&text).unwrap()),
            Message::Close(_) => return None,
            _ => continue,
        }
    }
    None
}
