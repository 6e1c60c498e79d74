use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_remote::TrackRemote;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MediaError {
    #[error("capture device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("capture device already in use by another call")]
    Busy,
}

/// Local capture owned by exactly one call session.
pub struct LocalMedia {
    id: Uuid,
    tracks: Vec<Arc<dyn TrackLocal + Send + Sync>>,
}

impl LocalMedia {
    pub fn new(tracks: Vec<Arc<dyn TrackLocal + Send + Sync>>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tracks,
        }
    }

    /// Media with no tracks, for engines that do not carry real audio.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn tracks(&self) -> &[Arc<dyn TrackLocal + Send + Sync>] {
        &self.tracks
    }
}

impl fmt::Debug for LocalMedia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalMedia")
            .field("id", &self.id)
            .field("tracks", &self.tracks.len())
            .finish()
    }
}

/// Audio arriving from the remote party. Identified by track and stream id;
/// `track` is absent for engines that carry no real audio.
#[derive(Clone)]
pub struct RemoteMedia {
    id: String,
    stream_id: String,
    track: Option<Arc<TrackRemote>>,
}

impl RemoteMedia {
    pub fn new(track: Arc<TrackRemote>) -> Self {
        Self {
            id: track.id(),
            stream_id: track.stream_id(),
            track: Some(track),
        }
    }

    pub fn detached(id: impl Into<String>, stream_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            stream_id: stream_id.into(),
            track: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn stream_id(&self) -> &str {
        &self.stream_id
    }

    /// The RTP track to read samples from.
    pub fn track(&self) -> Option<&Arc<TrackRemote>> {
        self.track.as_ref()
    }
}

impl PartialEq for RemoteMedia {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.stream_id == other.stream_id
    }
}

impl Eq for RemoteMedia {}

impl fmt::Debug for RemoteMedia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteMedia")
            .field("id", &self.id)
            .field("stream_id", &self.stream_id)
            .field("attached", &self.track.is_some())
            .finish()
    }
}

/// Where microphone capture comes from.
#[async_trait]
pub trait MediaSource: Send + Sync {
    async fn acquire(&self) -> Result<LocalMedia, MediaError>;

    /// Give back media obtained from `acquire`. Called on every session exit.
    async fn release(&self, media: LocalMedia);
}
