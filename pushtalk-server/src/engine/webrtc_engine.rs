use crate::config::EngineConfig;
use crate::engine::session::{Engine, MediaSink, Session, SessionHandlers};
use crate::engine::session_event::{ConnectionState, GatheringState, SessionEvent};
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use pushtalk_core::{AudioPacket, ConnectionId, IceCandidate, SdpKind, SessionDescription};
use std::sync::Arc;
use std::sync::atomic::{AtomicU16, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MediaEngine};
use webrtc::data_channel::RTCDataChannel;
use webrtc::data_channel::data_channel_message::DataChannelMessage;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_gatherer_state::RTCIceGathererState;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::rtp_codec::{
    RTCRtpCodecCapability, RTCRtpCodecParameters, RTPCodecType,
};
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::track::track_local::track_local_static_rtp::TrackLocalStaticRTP;
use webrtc::track::track_local::{TrackLocal, TrackLocalWriter};
use webrtc::track::track_remote::TrackRemote;

const CONTROL_CHANNEL_LABEL: &str = "channel";

/// Движок на базе webrtc-rs.
pub struct WebRtcEngine {
    config: EngineConfig,
}

impl WebRtcEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    fn codec_capability(&self) -> RTCRtpCodecCapability {
        let audio = &self.config.audio;
        RTCRtpCodecCapability {
            mime_type: MIME_TYPE_OPUS.to_owned(),
            clock_rate: audio.clock_rate,
            channels: audio.channels,
            sdp_fmtp_line: audio.fmtp.clone(),
            rtcp_feedback: vec![],
        }
    }

    fn ice_servers(&self) -> Vec<RTCIceServer> {
        self.config
            .ice_servers
            .iter()
            .map(|server| RTCIceServer {
                urls: server.urls.clone(),
                username: server.username.clone().unwrap_or_default(),
                credential: server.credential.clone().unwrap_or_default(),
                ..Default::default()
            })
            .collect()
    }
}

#[async_trait]
impl Engine for WebRtcEngine {
    async fn open_session(
        &self,
        id: ConnectionId,
        handlers: SessionHandlers,
    ) -> Result<Arc<dyn Session>> {
        // 1. Только Opus: сервер ничего не перекодирует, клиенты должны договориться об одном кодеке
        let capability = self.codec_capability();
        let mut m = MediaEngine::default();
        m.register_codec(
            RTCRtpCodecParameters {
                capability: capability.clone(),
                payload_type: self.config.audio.payload_type,
                ..Default::default()
            },
            RTPCodecType::Audio,
        )?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: self.ice_servers(),
            ..Default::default()
        };

        let peer_connection = Arc::new(
            api.new_peer_connection(rtc_config)
                .await
                .context("Failed to create peer connection")?,
        );

        // 2. Исходящий аудио-трек: сюда пишутся пакеты других участников
        let audio_track = Arc::new(TrackLocalStaticRTP::new(
            capability,
            "audio".to_owned(),
            format!("pushtalk-{}", id),
        ));
        let rtp_sender = peer_connection
            .add_track(Arc::clone(&audio_track) as Arc<dyn TrackLocal + Send + Sync>)
            .await
            .context("Failed to add audio track")?;

        // RTCP нужно вычитывать, иначе интерцепторы не работают
        tokio::spawn(async move {
            let mut rtcp_buf = vec![0u8; 1500];
            while let Ok((_, _)) = rtp_sender.read(&mut rtcp_buf).await {}
        });

        register_state_handlers(&peer_connection, &id, &handlers.events);
        register_track_handler(&peer_connection, &id, &handlers.media);

        // 3. Control-канал создает сервер, так как offer тоже создает сервер
        let control = peer_connection
            .create_data_channel(CONTROL_CHANNEL_LABEL, None)
            .await
            .context("Failed to create control channel")?;
        register_control_handlers(&control, &id, &handlers.events);

        Ok(Arc::new(WebRtcSession {
            id,
            peer_connection,
            control,
            audio_track,
            sequence_number: AtomicU16::new(0),
        }))
    }
}

fn register_state_handlers(
    peer_connection: &RTCPeerConnection,
    id: &ConnectionId,
    events: &mpsc::Sender<SessionEvent>,
) {
    let state_tx = events.clone();
    let uid_state = id.clone();
    peer_connection.on_peer_connection_state_change(Box::new(
        move |s: RTCPeerConnectionState| {
            let tx = state_tx.clone();
            let uid = uid_state.clone();

            Box::pin(async move {
                info!("Peer connection state changed for {}: {}", uid, s);
                let state = match s {
                    RTCPeerConnectionState::New => ConnectionState::New,
                    RTCPeerConnectionState::Connecting => ConnectionState::Connecting,
                    RTCPeerConnectionState::Connected => ConnectionState::Connected,
                    RTCPeerConnectionState::Disconnected => ConnectionState::Disconnected,
                    RTCPeerConnectionState::Failed => ConnectionState::Failed,
                    RTCPeerConnectionState::Closed => ConnectionState::Closed,
                    _ => return,
                };
                let _ = tx.send(SessionEvent::ConnectionStateChanged(state)).await;
            })
        },
    ));

    let ice_tx = events.clone();
    peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
        let tx = ice_tx.clone();

        Box::pin(async move {
            let Some(candidate) = c else { return };
            let Ok(init) = candidate.to_json() else {
                return;
            };
            let candidate = IceCandidate {
                candidate: init.candidate,
                sdp_mid: init.sdp_mid,
                sdp_mline_index: init.sdp_mline_index,
                username_fragment: init.username_fragment,
            };
            let _ = tx.send(SessionEvent::CandidateDiscovered(candidate)).await;
        })
    }));

    let gathering_tx = events.clone();
    let uid_gathering = id.clone();
    peer_connection.on_ice_gathering_state_change(Box::new(move |s: RTCIceGathererState| {
        let tx = gathering_tx.clone();
        let uid = uid_gathering.clone();

        Box::pin(async move {
            debug!("ICE gathering state for {}: {}", uid, s);
            let state = match s {
                RTCIceGathererState::New => GatheringState::New,
                RTCIceGathererState::Gathering => GatheringState::Gathering,
                RTCIceGathererState::Complete => GatheringState::Complete,
                _ => return,
            };
            let _ = tx.send(SessionEvent::GatheringStateChanged(state)).await;
        })
    }));
}

fn register_track_handler(
    peer_connection: &RTCPeerConnection,
    id: &ConnectionId,
    media: &Arc<dyn MediaSink>,
) {
    let sink = Arc::clone(media);
    let uid_track = id.clone();
    peer_connection.on_track(Box::new(
        move |track: Arc<TrackRemote>,
              _receiver: Arc<RTCRtpReceiver>,
              _transceiver: Arc<RTCRtpTransceiver>| {
            let sink = Arc::clone(&sink);
            let uid = uid_track.clone();

            Box::pin(async move {
                if track.kind() != RTPCodecType::Audio {
                    warn!("Ignoring non-audio track from {}", uid);
                    return;
                }
                info!("Audio track from {}: ssrc={}", uid, track.ssrc());

                tokio::spawn(async move {
                    while let Ok((pkt, _)) = track.read_rtp().await {
                        let packet = AudioPacket {
                            payload: pkt.payload,
                            timestamp: pkt.header.timestamp,
                            marker: pkt.header.marker,
                            payload_type: pkt.header.payload_type,
                        };
                        sink.forward(&uid, packet).await;
                    }
                    debug!("Audio track from {} ended", uid);
                });
            })
        },
    ));
}

fn register_control_handlers(
    control: &Arc<RTCDataChannel>,
    id: &ConnectionId,
    events: &mpsc::Sender<SessionEvent>,
) {
    let tx_open = events.clone();
    let uid_open = id.clone();
    control.on_open(Box::new(move || {
        let tx = tx_open.clone();
        let uid = uid_open.clone();

        Box::pin(async move {
            info!("Control channel open for {}", uid);
            let _ = tx.send(SessionEvent::ControlOpened).await;
        })
    }));

    let tx_close = events.clone();
    control.on_close(Box::new(move || {
        let tx = tx_close.clone();
        Box::pin(async move {
            let _ = tx.send(SessionEvent::ControlClosed).await;
        })
    }));

    let tx_msg = events.clone();
    let uid_msg = id.clone();
    control.on_message(Box::new(move |msg: DataChannelMessage| {
        let tx = tx_msg.clone();
        let uid = uid_msg.clone();

        Box::pin(async move {
            match String::from_utf8(msg.data.to_vec()) {
                Ok(text) => {
                    let _ = tx.send(SessionEvent::ControlMessage(text)).await;
                }
                Err(e) => warn!("Non UTF-8 control message from {}: {}", uid, e),
            }
        })
    }));
}

pub struct WebRtcSession {
    id: ConnectionId,
    peer_connection: Arc<RTCPeerConnection>,
    control: Arc<RTCDataChannel>,
    audio_track: Arc<TrackLocalStaticRTP>,
    sequence_number: AtomicU16,
}

#[async_trait]
impl Session for WebRtcSession {
    async fn create_offer(&self) -> Result<SessionDescription> {
        let offer = self.peer_connection.create_offer(None).await?;
        self.peer_connection
            .set_local_description(offer.clone())
            .await?;
        Ok(SessionDescription::offer(offer.sdp))
    }

    async fn local_description(&self) -> Result<Option<SessionDescription>> {
        Ok(self
            .peer_connection
            .local_description()
            .await
            .map(|desc| SessionDescription::offer(desc.sdp)))
    }

    async fn set_remote_description(&self, description: SessionDescription) -> Result<()> {
        let desc = match description.kind {
            SdpKind::Answer => RTCSessionDescription::answer(description.sdp)?,
            SdpKind::Pranswer => RTCSessionDescription::pranswer(description.sdp)?,
            SdpKind::Offer => RTCSessionDescription::offer(description.sdp)?,
            SdpKind::Rollback => bail!("rollback is not supported"),
        };
        self.peer_connection.set_remote_description(desc).await?;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_mline_index,
            username_fragment: candidate.username_fragment,
        };
        self.peer_connection.add_ice_candidate(init).await?;
        Ok(())
    }

    async fn send_text(&self, text: String) -> Result<()> {
        self.control
            .send_text(text)
            .await
            .with_context(|| format!("Failed to send control message to {}", self.id))?;
        Ok(())
    }

    async fn write_audio(&self, packet: &AudioPacket) -> Result<()> {
        let rtp = webrtc::rtp::packet::Packet {
            header: webrtc::rtp::header::Header {
                version: 2,
                marker: packet.marker,
                payload_type: packet.payload_type,
                sequence_number: self.sequence_number.fetch_add(1, Ordering::Relaxed),
                timestamp: packet.timestamp,
                ..Default::default()
            },
            payload: packet.payload.clone(),
        };
        self.audio_track.write_rtp(&rtp).await?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.peer_connection.close().await?;
        Ok(())
    }
}
