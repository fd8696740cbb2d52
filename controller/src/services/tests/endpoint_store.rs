//! Tests for the file-backed endpoint store

use super::fixtures::*;
use crate::error::ControllerError;
use crate::services::RealEndpointStore;
use crate::traits::EndpointStore;
use crate::types::Endpoint;
use tempfile::TempDir;

mod real_endpoint_store_tests {
    use super::*;

    #[tokio::test]
    async fn test_load_without_file_is_none() {
        let dir = TempDir::new().unwrap();
        let store = RealEndpointStore::with_path(dir.path().join("state.json"));

        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = RealEndpointStore::with_path(dir.path().join("state.json"));

        store.save(&test_endpoint()).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(test_endpoint()));

        // A second store on the same file sees it too
        let reopened = RealEndpointStore::with_path(dir.path().join("state.json"));
        assert_eq!(reopened.load().await.unwrap(), Some(test_endpoint()));
    }

    #[tokio::test]
    async fn test_save_overwrites_previous_endpoint() {
        let dir = TempDir::new().unwrap();
        let store = RealEndpointStore::with_path(dir.path().join("state.json"));

        store.save(&Endpoint::parse("10.0.0.1").unwrap()).await.unwrap();
        store.save(&Endpoint::parse("10.0.0.2").unwrap()).await.unwrap();

        assert_eq!(store.load().await.unwrap().unwrap().host(), "10.0.0.2");
        assert!(!dir.path().join("state.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_concurrent_saves_do_not_collide() {
        let dir = TempDir::new().unwrap();
        let store = RealEndpointStore::with_path(dir.path().join("state.json"));
        let endpoints: Vec<Endpoint> = (1..=16).map(|i| Endpoint::parse(&format!("10.0.0.{i}")).unwrap()).collect();

        let results = futures_util::future::join_all(endpoints.iter().map(|endpoint| store.save(endpoint))).await;

        assert!(results.iter().all(Result::is_ok), "{results:?}");
        let stored = store.load().await.unwrap().unwrap();
        assert!(endpoints.contains(&stored));
        assert!(!dir.path().join("state.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_save_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("deeper").join("state.json");
        let store = RealEndpointStore::with_path(&path);

        store.save(&test_endpoint()).await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_file_format() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        let store = RealEndpointStore::with_path(&path);

        store.save(&Endpoint::parse("192.168.4.1").unwrap()).await.unwrap();

        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value, serde_json::json!({ "endpoint": "192.168.4.1" }));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_store_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = RealEndpointStore::with_path(&path);
        assert!(matches!(store.load().await, Err(ControllerError::StoreError { .. })));
    }

    #[tokio::test]
    async fn test_hand_edited_invalid_endpoint_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, r#"{"endpoint": "bad host"}"#).unwrap();

        let store = RealEndpointStore::with_path(&path);
        assert!(matches!(store.load().await, Err(ControllerError::InvalidEndpoint { .. })));
    }

    #[tokio::test]
    async fn test_null_endpoint_loads_as_none() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, r#"{"endpoint": null}"#).unwrap();

        let store = RealEndpointStore::with_path(&path);
        assert_eq!(store.load().await.unwrap(), None);
    }
}
