use crate::media::media_source::{LocalMedia, MediaError, MediaSource};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;
use webrtc::api::media_engine::MIME_TYPE_OPUS;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

/// Hands out one opus send track at a time.
///
/// Samples are written to the track by whatever owns the capture device;
/// this source only manages the track's lifetime.
pub struct AudioTrackSource {
    stream_id: String,
    held: Mutex<Option<(Uuid, Arc<TrackLocalStaticSample>)>>,
}

impl AudioTrackSource {
    pub fn new(stream_id: impl Into<String>) -> Self {
        Self {
            stream_id: stream_id.into(),
            held: Mutex::new(None),
        }
    }

    /// The track of the call currently holding the source, if any.
    pub async fn current_track(&self) -> Option<Arc<TrackLocalStaticSample>> {
        self.held.lock().await.as_ref().map(|(_, track)| track.clone())
    }
}

#[async_trait]
impl MediaSource for AudioTrackSource {
    async fn acquire(&self) -> Result<LocalMedia, MediaError> {
        let mut held = self.held.lock().await;
        if held.is_some() {
            return Err(MediaError::Busy);
        }

        let track = Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: MIME_TYPE_OPUS.to_owned(),
                clock_rate: 48000,
                channels: 2,
                ..Default::default()
            },
            "audio".to_owned(),
            self.stream_id.clone(),
        ));

        let media = LocalMedia::new(vec![track.clone() as Arc<dyn TrackLocal + Send + Sync>]);
        info!("Audio capture acquired ({})", media.id());
        *held = Some((media.id(), track));

        Ok(media)
    }

    async fn release(&self, media: LocalMedia) {
        let mut held = self.held.lock().await;
        match held.as_ref() {
            Some((id, _)) if *id == media.id() => {
                *held = None;
                info!("Audio capture released ({})", media.id());
            }
            _ => debug!("Release of unknown media {}", media.id()),
        }
    }
}
