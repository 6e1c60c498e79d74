use crate::media::{LocalMedia, RemoteMedia};
use crate::negotiation::engine::{
    ConnectionState, EngineEventSink, EngineFactory, NegotiationEngine,
};
use crate::negotiation::negotiation_error::NegotiationError;
use async_trait::async_trait;
use parley_core::{IceCandidate, IceServerConfig, SdpKind, SessionDescription};
use std::sync::Arc;
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::sdp_type::RTCSdpType;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::track::track_remote::TrackRemote;

impl From<RTCPeerConnectionState> for ConnectionState {
    fn from(state: RTCPeerConnectionState) -> Self {
        match state {
            RTCPeerConnectionState::Connecting => ConnectionState::Connecting,
            RTCPeerConnectionState::Connected => ConnectionState::Connected,
            RTCPeerConnectionState::Disconnected => ConnectionState::Disconnected,
            RTCPeerConnectionState::Failed => ConnectionState::Failed,
            RTCPeerConnectionState::Closed => ConnectionState::Closed,
            _ => ConnectionState::New,
        }
    }
}

fn to_rtc_description(
    description: SessionDescription,
) -> Result<RTCSessionDescription, NegotiationError> {
    let parsed = match description.kind {
        SdpKind::Offer => RTCSessionDescription::offer(description.sdp),
        SdpKind::Answer => RTCSessionDescription::answer(description.sdp),
    };
    parsed.map_err(|e| NegotiationError::InvalidDescription(e.to_string()))
}

fn from_rtc_description(
    description: RTCSessionDescription,
) -> Result<SessionDescription, NegotiationError> {
    match description.sdp_type {
        RTCSdpType::Offer => Ok(SessionDescription::offer(description.sdp)),
        RTCSdpType::Answer => Ok(SessionDescription::answer(description.sdp)),
        other => Err(NegotiationError::InvalidDescription(format!(
            "unsupported description type {other:?}"
        ))),
    }
}

fn to_rtc_ice_server(server: &IceServerConfig) -> RTCIceServer {
    RTCIceServer {
        urls: server.urls.clone(),
        username: server.username.clone().unwrap_or_default(),
        credential: server.credential.clone().unwrap_or_default(),
    }
}

/// One `RTCPeerConnection` carrying a single audio call.
pub struct WebRtcEngine {
    peer_connection: Arc<RTCPeerConnection>,
}

impl WebRtcEngine {
    pub async fn new(
        ice_servers: &[IceServerConfig],
        events: EngineEventSink,
    ) -> Result<Self, NegotiationError> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: ice_servers.iter().map(to_rtc_ice_server).collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(api.new_peer_connection(rtc_config).await?);

        let state_events = events.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let events = state_events.clone();

                Box::pin(async move {
                    info!(
                        "Peer connection state for session {}: {:?}",
                        events.session(),
                        s
                    );
                    events.connection_state(ConnectionState::from(s));
                })
            },
        ));

        let ice_events = events.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let events = ice_events.clone();

            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                events.local_candidate(IceCandidate {
                    candidate: init.candidate,
                    sdp_mid: init.sdp_mid,
                    sdp_m_line_index: init.sdp_mline_index,
                    username_fragment: init.username_fragment,
                });
            })
        }));

        let track_events = events.clone();
        peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                let events = track_events.clone();

                Box::pin(async move {
                    info!(
                        "Remote {:?} track arrived for session {}",
                        track.kind(),
                        events.session()
                    );
                    events.remote_media(RemoteMedia::new(track));
                })
            },
        ));

        Ok(Self { peer_connection })
    }
}

#[async_trait]
impl NegotiationEngine for WebRtcEngine {
    async fn attach_media(&mut self, media: &LocalMedia) -> Result<(), NegotiationError> {
        for track in media.tracks() {
            self.peer_connection.add_track(Arc::clone(track)).await?;
        }
        debug!("Attached {} local track(s)", media.tracks().len());
        Ok(())
    }

    async fn create_offer(&mut self) -> Result<SessionDescription, NegotiationError> {
        let offer = self.peer_connection.create_offer(None).await?;
        from_rtc_description(offer)
    }

    async fn create_answer(&mut self) -> Result<SessionDescription, NegotiationError> {
        let answer = self.peer_connection.create_answer(None).await?;
        from_rtc_description(answer)
    }

    async fn set_local_description(
        &mut self,
        description: SessionDescription,
    ) -> Result<(), NegotiationError> {
        let desc = to_rtc_description(description)?;
        self.peer_connection.set_local_description(desc).await?;
        Ok(())
    }

    async fn set_remote_description(
        &mut self,
        description: SessionDescription,
    ) -> Result<(), NegotiationError> {
        let desc = to_rtc_description(description)?;
        self.peer_connection
            .set_remote_description(desc)
            .await
            .map_err(|e| NegotiationError::InvalidDescription(e.to_string()))
    }

    async fn add_ice_candidate(&mut self, candidate: IceCandidate) -> Result<(), NegotiationError> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_m_line_index,
            username_fragment: candidate.username_fragment,
        };
        self.peer_connection
            .add_ice_candidate(init)
            .await
            .map_err(|e| NegotiationError::InvalidCandidate(e.to_string()))
    }

    async fn local_description(&self) -> Option<SessionDescription> {
        let description = self.peer_connection.local_description().await?;
        from_rtc_description(description).ok()
    }

    async fn close(&mut self) {
        if let Err(e) = self.peer_connection.close().await {
            warn!("Failed to close peer connection: {}", e);
        }
    }
}

/// Creates a `WebRtcEngine` per call with a fixed ICE server list.
#[derive(Debug, Clone)]
pub struct WebRtcEngineFactory {
    ice_servers: Vec<IceServerConfig>,
}

impl WebRtcEngineFactory {
    pub fn new(ice_servers: Vec<IceServerConfig>) -> Self {
        Self { ice_servers }
    }
}

#[async_trait]
impl EngineFactory for WebRtcEngineFactory {
    async fn create(
        &self,
        events: EngineEventSink,
    ) -> Result<Box<dyn NegotiationEngine>, NegotiationError> {
        let engine = WebRtcEngine::new(&self.ice_servers, events).await?;
        Ok(Box::new(engine))
    }
}
