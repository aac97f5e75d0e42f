//! Adapter tests against mocked storage

mod common;

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::{BlobRecord, BlobStore};
use common::{FakeFactory, FakePlayer, POLL_INTERVAL};
use core_library::{SourceKind, TrackId, TrackMetadata};
use core_playback::{
    LocalBlobAdapter, OutputDevice, Playable, PlaybackError, RemoteStreamAdapter, Session,
    SessionToken,
};
use mockall::mock;
use std::sync::Arc;
use tokio::sync::mpsc::unbounded_channel;

mock! {
    Store {}

    #[async_trait]
    impl BlobStore for Store {
        async fn put(&self, record: BlobRecord) -> BridgeResult<()>;
        async fn get(&self, id: &str) -> BridgeResult<Option<BlobRecord>>;
        async fn get_all(&self) -> BridgeResult<Vec<BlobRecord>>;
        async fn delete(&self, id: &str) -> BridgeResult<()>;
        async fn clear(&self) -> BridgeResult<()>;
    }
}

fn local_track() -> TrackMetadata {
    TrackMetadata::local("local_1", "Song", "Me", 60.0, "audio/mpeg", 5, chrono::Utc::now())
}

fn session(token: u64, id: &str) -> Session {
    Session::new(SessionToken::new(token), TrackId::from(id))
}

#[tokio::test]
async fn test_storage_error_propagates_from_attach() {
    let mut store = MockStore::new();
    store
        .expect_get()
        .times(1)
        .returning(|_| Err(BridgeError::Storage("disk unavailable".to_string())));

    let (tx, _rx) = unbounded_channel();
    let adapter = LocalBlobAdapter::new(
        Arc::new(store),
        Arc::new(FakeFactory::default()),
        Arc::new(OutputDevice::new()),
        tx,
        POLL_INTERVAL,
    );

    let err = adapter
        .attach(&local_track(), session(1, "local_1"))
        .await
        .unwrap_err();
    assert!(matches!(err, PlaybackError::Bridge(BridgeError::Storage(_))));
    assert!(!adapter.is_attached());
}

#[tokio::test]
async fn test_attach_after_cancel_is_refused() {
    let store = MockStore::new();
    let (tx, _rx) = unbounded_channel();
    let adapter = LocalBlobAdapter::new(
        Arc::new(store),
        Arc::new(FakeFactory::default()),
        Arc::new(OutputDevice::new()),
        tx,
        POLL_INTERVAL,
    );

    let cancelled = session(1, "local_1");
    cancelled.cancel();
    let err = adapter.attach(&local_track(), cancelled).await.unwrap_err();
    assert!(err.is_cancelled());
}

#[tokio::test]
async fn test_remote_refuses_busy_output() {
    let output = Arc::new(OutputDevice::new());
    output
        .claim(SourceKind::Local, SessionToken::new(1))
        .unwrap();

    let (tx, _rx) = unbounded_channel();
    let adapter = RemoteStreamAdapter::new(
        Arc::new(FakePlayer::default()),
        output.clone(),
        tx,
        POLL_INTERVAL,
    );

    let track = TrackMetadata::remote("abc", "Song", "Channel", 100.0);
    let err = adapter.attach(&track, session(2, "abc")).await.unwrap_err();
    assert!(matches!(err, PlaybackError::OutputBusy { .. }));
    assert!(!adapter.is_attached());
    assert!(adapter.play().is_err());
}
