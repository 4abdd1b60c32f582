//! JSON wire protocol for the live streaming endpoint.
//!
//! Outbound: one setup message at handshake, then realtime media frames.
//! Inbound: server messages whose fields may co-occur arbitrarily within a
//! single message (transcription deltas, turn boundary, audio chunks).

use crate::config::LiveConfig;
use crate::defaults;
use serde::{Deserialize, Serialize};

// ── Outbound ─────────────────────────────────────────────────────────────

/// Handshake message sent once after the socket opens.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SetupMessage {
    pub setup: Setup,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Setup {
    pub model: String,
    pub generation_config: GenerationConfig,
    pub input_audio_transcription: TranscriptionConfig,
    pub output_audio_transcription: TranscriptionConfig,
}

/// Empty marker object enabling transcription for one direction.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct TranscriptionConfig {}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_modalities: Vec<Modality>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speech_config: Option<SpeechConfig>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum Modality {
    #[serde(rename = "AUDIO")]
    Audio,
    #[serde(rename = "TEXT")]
    Text,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SpeechConfig {
    pub voice_config: VoiceConfig,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VoiceConfig {
    pub prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PrebuiltVoiceConfig {
    pub voice_name: String,
}

impl SetupMessage {
    /// Builds the handshake message for a session config.
    pub fn from_config(config: &LiveConfig) -> Self {
        let speech_config = config.voice.as_ref().map(|voice| SpeechConfig {
            voice_config: VoiceConfig {
                prebuilt_voice_config: PrebuiltVoiceConfig {
                    voice_name: voice.clone(),
                },
            },
        });

        Self {
            setup: Setup {
                model: config.qualified_model(),
                generation_config: GenerationConfig {
                    response_modalities: vec![Modality::Audio],
                    speech_config,
                },
                input_audio_transcription: TranscriptionConfig {},
                output_audio_transcription: TranscriptionConfig {},
            },
        }
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// A realtime media frame: base64 PCM plus its MIME type.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeInputMessage {
    pub realtime_input: RealtimeInput,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeInput {
    pub media: MediaBlob,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MediaBlob {
    pub data: String,
    pub mime_type: String,
}

impl RealtimeInputMessage {
    /// Wraps already-encoded audio in a media frame at the input rate.
    pub fn media(data: String) -> Self {
        Self {
            realtime_input: RealtimeInput {
                media: MediaBlob {
                    data,
                    mime_type: defaults::INPUT_MIME_TYPE.to_string(),
                },
            },
        }
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// ── Inbound ──────────────────────────────────────────────────────────────

/// One message received from the live endpoint.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerMessage {
    pub setup_complete: Option<SetupComplete>,
    pub server_content: Option<ServerContent>,
}

/// Handshake acknowledgment (an empty object on the wire).
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct SetupComplete {}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerContent {
    pub input_transcription: Option<TranscriptionText>,
    pub output_transcription: Option<TranscriptionText>,
    pub turn_complete: bool,
    pub model_turn: Option<ModelTurn>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct TranscriptionText {
    pub text: String,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelTurn {
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Part {
    pub inline_data: Option<InlineData>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct InlineData {
    pub data: String,
    pub mime_type: Option<String>,
}

impl ServerMessage {
    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Base64 audio payload from the first model-turn part, if any.
    pub fn audio_data(&self) -> Option<&str> {
        self.server_content
            .as_ref()?
            .model_turn
            .as_ref()?
            .parts
            .first()?
            .inline_data
            .as_ref()
            .map(|d| d.data.as_str())
    }

    /// True when this message ends the current turn.
    pub fn is_turn_complete(&self) -> bool {
        self.server_content
            .as_ref()
            .is_some_and(|c| c.turn_complete)
    }
}

// ── Event stream ─────────────────────────────────────────────────────────

/// Tagged inbound event stream.
///
/// The transport folds its callback surface into this union so one dispatch
/// loop in the session controller can consume everything in arrival order.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Remote handshake acknowledged; the session is live.
    Opened,
    /// A server message arrived.
    Message(ServerMessage),
    /// Transport-level failure. Fatal for the session.
    Errored(String),
    /// The remote side closed the session.
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_message_shape() {
        let config = LiveConfig::new("key")
            .with_model("live-model")
            .with_voice("Zephyr");
        let json = SetupMessage::from_config(&config).to_json().expect("serialize");
        let value: serde_json::Value = serde_json::from_str(&json).expect("parse back");

        assert_eq!(value["setup"]["model"], "models/live-model");
        assert_eq!(
            value["setup"]["generationConfig"]["responseModalities"][0],
            "AUDIO"
        );
        assert_eq!(
            value["setup"]["generationConfig"]["speechConfig"]["voiceConfig"]
                ["prebuiltVoiceConfig"]["voiceName"],
            "Zephyr"
        );
        assert!(value["setup"]["inputAudioTranscription"].is_object());
        assert!(value["setup"]["outputAudioTranscription"].is_object());
    }

    #[test]
    fn test_setup_message_without_voice_omits_speech_config() {
        let mut config = LiveConfig::new("key");
        config.voice = None;
        let json = SetupMessage::from_config(&config).to_json().expect("serialize");
        assert!(!json.contains("speechConfig"));
    }

    #[test]
    fn test_media_message_shape() {
        let json = RealtimeInputMessage::media("QUJD".to_string())
            .to_json()
            .expect("serialize");
        assert_eq!(
            json,
            r#"{"realtimeInput":{"media":{"data":"QUJD","mimeType":"audio/pcm;rate=16000"}}}"#
        );
    }

    #[test]
    fn test_parse_setup_complete() {
        let msg = ServerMessage::from_json(r#"{"setupComplete": {}}"#).expect("parse");
        assert!(msg.setup_complete.is_some());
        assert!(msg.server_content.is_none());
    }

    #[test]
    fn test_parse_transcription_only() {
        let msg = ServerMessage::from_json(
            r#"{"serverContent":{"inputTranscription":{"text":"hel"}}}"#,
        )
        .expect("parse");

        let content = msg.server_content.expect("content");
        assert_eq!(content.input_transcription.expect("input").text, "hel");
        assert!(content.output_transcription.is_none());
        assert!(!content.turn_complete);
        assert!(content.model_turn.is_none());
    }

    #[test]
    fn test_parse_combined_message() {
        // Transcription, audio, and turn boundary may all arrive at once.
        let msg = ServerMessage::from_json(
            r#"{
                "serverContent": {
                    "outputTranscription": {"text": "hi there"},
                    "turnComplete": true,
                    "modelTurn": {
                        "parts": [
                            {"inlineData": {"mimeType": "audio/pcm;rate=24000", "data": "AAAA"}}
                        ]
                    }
                }
            }"#,
        )
        .expect("parse");

        assert!(msg.is_turn_complete());
        assert_eq!(msg.audio_data(), Some("AAAA"));
        let content = msg.server_content.expect("content");
        assert_eq!(
            content.output_transcription.expect("output").text,
            "hi there"
        );
    }

    #[test]
    fn test_parse_unknown_fields_ignored() {
        let msg = ServerMessage::from_json(
            r#"{"serverContent":{"turnComplete":true},"usageMetadata":{"tokens":12}}"#,
        )
        .expect("parse");
        assert!(msg.is_turn_complete());
    }

    #[test]
    fn test_audio_data_absent_without_parts() {
        let msg = ServerMessage::from_json(r#"{"serverContent":{"modelTurn":{"parts":[]}}}"#)
            .expect("parse");
        assert_eq!(msg.audio_data(), None);

        let msg = ServerMessage::from_json(r#"{"serverContent":{}}"#).expect("parse");
        assert_eq!(msg.audio_data(), None);
    }
}
