// ABOUTME: Tests for client activation wiring.
// ABOUTME: Runs offline — agent mode off, or pointed at an unreachable backend.

use banter::client::Client;
use banter::config::Config;

fn offline_config(dir: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.backend.agent_mode = false;
    config.storage.path = dir.to_string_lossy().to_string();
    config
}

#[tokio::test]
async fn test_activation_with_agent_mode_disabled_uses_direct_routing() {
    let dir = tempfile::tempdir().unwrap();
    let client = Client::activate(offline_config(dir.path())).await.unwrap();

    assert!(!client.dispatcher().routing().is_agent());
    assert!(client.channel_events().is_none());
    client.shutdown();
}

#[tokio::test]
async fn test_activation_falls_back_when_backend_unreachable() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = offline_config(dir.path());
    config.backend.agent_mode = true;
    // Nothing listens here; establishment must fail and degrade, not error.
    config.backend.base_url = "http://127.0.0.1:9".to_string();

    let client = Client::activate(config).await.unwrap();
    assert!(!client.dispatcher().routing().is_agent());
}

#[tokio::test]
async fn test_activation_degrades_when_socket_unreachable() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = offline_config(dir.path());
    config.backend.socket_url = Some("ws://127.0.0.1:9/ws".to_string());

    let client = Client::activate(config).await.unwrap();
    assert!(client.channel_events().is_none());
}

#[tokio::test]
async fn test_conversations_persist_across_activations() {
    let dir = tempfile::tempdir().unwrap();

    {
        let mut client = Client::activate(offline_config(dir.path())).await.unwrap();
        client
            .dispatcher_mut()
            .create_conversation("kept around")
            .await
            .unwrap();
    }

    let client = Client::activate(offline_config(dir.path())).await.unwrap();
    let conversations = client.dispatcher().store().conversations();
    assert_eq!(conversations.len(), 1);
    assert_eq!(conversations[0].title, "kept around");
}

#[tokio::test]
async fn test_device_user_id_is_stable_across_activations() {
    let dir = tempfile::tempdir().unwrap();

    let first = Client::activate(offline_config(dir.path()))
        .await
        .unwrap()
        .dispatcher()
        .store()
        .device_user_id();

    let second = Client::activate(offline_config(dir.path()))
        .await
        .unwrap()
        .dispatcher()
        .store()
        .device_user_id();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_toggle_theme_flips_and_persists() {
    let dir = tempfile::tempdir().unwrap();

    {
        let client = Client::activate(offline_config(dir.path())).await.unwrap();
        assert_eq!(client.dispatcher().store().theme(), "dark");
        assert_eq!(client.toggle_theme(), "light");
    }

    let client = Client::activate(offline_config(dir.path())).await.unwrap();
    assert_eq!(client.dispatcher().store().theme(), "light");
    assert_eq!(client.toggle_theme(), "dark");
}
