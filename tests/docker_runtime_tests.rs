// Optional DockerRuntime tests when a Docker daemon is available

use docknet::runtime::{DockerRuntime, RuntimeClient};
use std::time::Duration;

#[tokio::test]
async fn docker_runtime_connect_list_and_fetch() {
    let runtime = DockerRuntime::new("unix:///var/run/docker.sock", Duration::from_secs(2));
    if runtime.ensure_connected().await.is_err() {
        return; // Skip when Docker is not available (e.g. CI without Docker)
    }
    // Idempotent once connected.
    runtime.ensure_connected().await.unwrap();

    let containers = runtime
        .list_containers(Duration::from_secs(2))
        .await
        .expect("list_containers");
    if let Some(c) = containers.first() {
        assert!(!c.name.starts_with('/'));
        // The container may exit between list and fetch; only a panic is a failure.
        let _ = runtime.fetch_stats(&c.id, Duration::from_secs(7)).await;
    }

    runtime.release().await;
    // Reconnect after release reuses the negotiated version.
    runtime.ensure_connected().await.unwrap();
    runtime.release().await;
}
