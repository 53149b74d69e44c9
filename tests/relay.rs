use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use nexus_sync::config::Config;
use nexus_sync::models::{Message, StreamKind};
use nexus_sync::routes::build_router;
use nexus_sync::sync::{
    ManualClock, RelayChannel, StreamVersion, SyncSettings, WireFormat, Workspace,
};
use nexus_sync::models::User;
use nexus_sync::ws::RelayHub;

const CHANNEL: &str = "nexus_workspace_sync_v2";

async fn start_relay() -> (SocketAddr, Arc<RelayHub>) {
    let hub = Arc::new(RelayHub::new(64));
    let app = build_router(hub.clone(), &Config::default());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, hub)
}

async fn attach(addr: SocketAddr, format: WireFormat, clock: Arc<ManualClock>, user: User) -> Workspace {
    let channel = RelayChannel::connect(&format!("ws://{}", addr), CHANNEL, format, 64)
        .await
        .unwrap();
    Workspace::attach(Arc::new(channel), clock, SyncSettings::default(), user).unwrap()
}

async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}

async fn wait_for_members(hub: &RelayHub, n: u32) {
    assert!(eventually(|| hub.stats().n_conn == n).await, "relay never saw {} members", n);
}

#[tokio::test]
async fn contexts_converge_through_relay() {
    let (addr, hub) = start_relay().await;
    let a = attach(addr, WireFormat::Json, Arc::new(ManualClock::new(100)), User::new("user-1", "Alice Chen")).await;
    let b = attach(addr, WireFormat::Cbor, Arc::new(ManualClock::new(150)), User::new("user-2", "Marcus Johnson")).await;
    wait_for_members(&hub, 2).await;

    a.set_messages(|_| vec![Message::from_user("m1", "user-1", "hello")]);
    b.set_messages(|_| {
        vec![
            Message::from_user("m1", "user-1", "hello"),
            Message::from_user("m2", "user-2", "hi Alice"),
        ]
    });

    let converged = eventually(|| {
        a.coordinator().version(StreamKind::Messages) == StreamVersion::HasVersion(150)
    })
    .await;
    assert!(converged);

    let ids = |ws: &Workspace| ws.snapshot().messages.iter().map(|m| m.id.clone()).collect::<Vec<_>>();
    assert_eq!(ids(&a), vec!["m1", "m2"]);
    assert_eq!(ids(&b), vec!["m1", "m2"]);
    assert_eq!(b.coordinator().version(StreamKind::Messages), StreamVersion::HasVersion(150));
}

#[tokio::test]
async fn typing_reaches_peer_but_not_sender() {
    let (addr, hub) = start_relay().await;
    let clock = Arc::new(ManualClock::new(0));
    let a = attach(addr, WireFormat::Json, clock.clone(), User::new("user-1", "Alice Chen")).await;
    let b = attach(addr, WireFormat::Json, clock.clone(), User::new("user-2", "Marcus Johnson")).await;
    wait_for_members(&hub, 2).await;

    assert!(a.broadcast_typing(true));
    assert!(eventually(|| b.active_typers().len() == 1).await);
    assert_eq!(b.active_typers()[0].display_name, "Alice Chen");

    assert!(a.broadcast_typing(false));
    assert!(eventually(|| b.active_typers().is_empty()).await);
    assert!(a.active_typers().is_empty());
    assert!(hub.stats().frames_relayed >= 2);
}

#[tokio::test]
async fn leaving_member_is_forgotten() {
    let (addr, hub) = start_relay().await;
    let a = attach(addr, WireFormat::Json, Arc::new(ManualClock::new(0)), User::new("user-1", "Alice Chen")).await;
    wait_for_members(&hub, 1).await;

    a.teardown();
    drop(a);
    assert!(eventually(|| hub.stats().n_channels == 0).await);
}
