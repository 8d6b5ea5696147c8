//! Client tests against a real server bound to an ephemeral port.

use onelane_arbiter::{ArbiterConfig, BridgeArbiter};
use onelane_driver::client::BridgeClient;
use onelane_driver::config::VehicleConfig;
use onelane_driver::vehicle::SimulatedVehicle;
use onelane_server::{router, BridgeRunner, SystemClock};
use onelane_types::{Direction, VehicleId, VehicleStatus};
use std::sync::Arc;
use std::time::Duration;
use tokio_test::assert_ok;
use tokio_util::sync::CancellationToken;

async fn spawn_server() -> String {
    let runner = BridgeRunner::new(
        BridgeArbiter::new(ArbiterConfig::default()),
        Arc::new(SystemClock::new()),
        None,
    )
    .unwrap();
    let app = router(runner.handle());
    tokio::spawn(runner.run(std::future::pending::<()>()));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_client_round_trip() {
    let endpoint = spawn_server().await;
    let client = BridgeClient::new(&endpoint).unwrap();
    assert_ok!(client.wait_for_ready(Duration::from_secs(5)).await);

    let registered = client
        .register(Direction::North, 10, Some("tok-1".into()))
        .await
        .unwrap();
    let id = registered.vehicle.id;
    assert_eq!(registered.vehicle.status, VehicleStatus::Crossing);
    assert!(registered.bridge.busy);

    let queued = client.register(Direction::South, 2, None).await.unwrap();
    let queues = client.queues().await.unwrap();
    assert_eq!(queues.south, vec![queued.vehicle.id]);

    assert_ok!(client.heartbeat(id).await);
    assert_eq!(client.vehicle(id).await.unwrap().token, "tok-1");
    assert_eq!(client.bridge().await.unwrap().current_vehicle_id, Some(id));

    assert_ok!(client.stop(id).await);
    assert!(client.vehicle(id).await.unwrap().stop_requested);
    assert_eq!(client.stats(id).await.unwrap().total_crossings, 0);
}

#[tokio::test]
async fn test_client_surfaces_api_errors() {
    let endpoint = spawn_server().await;
    let client = BridgeClient::new(&endpoint).unwrap();

    let err = client.vehicle(VehicleId(99)).await.unwrap_err();
    assert!(err.is_not_found());

    let err = client.register(Direction::North, 0, None).await.unwrap_err();
    assert!(!err.is_not_found() && !err.is_expired());
    assert!(err.to_string().contains("invalid_input"));
}

#[tokio::test]
async fn test_simulated_vehicle_stops_on_cancel() {
    let endpoint = spawn_server().await;
    let config = VehicleConfig::new(&endpoint, Direction::South, 4)
        .with_token("sim-1")
        .with_poll_interval(Duration::from_millis(50))
        .with_verbose(false);
    let cancel = CancellationToken::new();

    let task = tokio::spawn(SimulatedVehicle::new(config).unwrap().run(cancel.clone()));
    tokio::time::sleep(Duration::from_millis(300)).await;
    cancel.cancel();

    let outcome = task.await.unwrap().unwrap();
    assert_eq!(outcome.token, "sim-1");
    assert!(!outcome.expired);
    assert_eq!(outcome.stats.unwrap().total_crossings, 0);

    let client = BridgeClient::new(&endpoint).unwrap();
    assert!(client.vehicle(outcome.id).await.unwrap().stop_requested);
}
