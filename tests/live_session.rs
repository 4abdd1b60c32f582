//! End-to-end session tests over the public API with mock devices and a
//! mock transport: one full conversation, then teardown.

use std::sync::atomic::Ordering;
use std::time::Duration;
use voxline::audio::output::MockSink;
use voxline::transport::protocol::{
    InlineData, ModelTurn, Part, ServerContent, ServerMessage, SessionEvent, TranscriptionText,
};
use voxline::{
    ConnectionStatus, LiveConfig, MockAudioSource, MockEngine, MockTransport, SessionController,
    Speaker, encode_frame,
};

fn message(content: ServerContent) -> SessionEvent {
    SessionEvent::Message(ServerMessage {
        setup_complete: None,
        server_content: Some(content),
    })
}

#[tokio::test]
async fn full_conversation_round_trip() {
    let transport = MockTransport::new();

    let source = MockAudioSource::new().with_repeating(vec![0.05; 4096]);
    let mic_stopped = source.stopped_handle();

    let sink = MockSink::new();
    let played = sink.played_handle();

    let engine = MockEngine::new()
        .with_input(Box::new(source))
        .with_sink(Box::new(sink));

    let controller = SessionController::new(
        LiveConfig::new("test-key"),
        Box::new(transport.clone()),
        Box::new(engine),
    );

    controller.connect().await.expect("connect");
    assert_eq!(controller.status(), ConnectionStatus::Connected);

    // Outbound: captured frames flow to the transport while connected.
    tokio::time::sleep(Duration::from_millis(120)).await;
    assert!(transport.sent_count() > 0, "capture must feed the transport");

    // Inbound: a complete turn. User transcript deltas, model reply with
    // audio, then the turn boundary. All fields may co-occur per message.
    transport.inject(message(ServerContent {
        input_transcription: Some(TranscriptionText {
            text: "what time ".to_string(),
        }),
        ..Default::default()
    }));
    transport.inject(message(ServerContent {
        input_transcription: Some(TranscriptionText {
            text: "is it".to_string(),
        }),
        ..Default::default()
    }));
    transport.inject(message(ServerContent {
        output_transcription: Some(TranscriptionText {
            text: "It is noon.".to_string(),
        }),
        model_turn: Some(ModelTurn {
            parts: vec![Part {
                inline_data: Some(InlineData {
                    data: encode_frame(&vec![0.2; 2400]),
                    mime_type: Some("audio/pcm;rate=24000".to_string()),
                }),
            }],
        }),
        turn_complete: true,
        ..Default::default()
    }));
    tokio::time::sleep(Duration::from_millis(80)).await;

    let history = controller.transcript();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].speaker, Speaker::User);
    assert_eq!(history[0].text, "what time is it");
    assert_eq!(history[1].speaker, Speaker::Model);
    assert_eq!(history[1].text, "It is noon.");

    {
        let played = played.lock().unwrap();
        assert_eq!(played.len(), 1, "reply audio must be scheduled");
        assert_eq!(played[0].1, Duration::from_millis(100));
    }

    controller.disconnect().await;
    assert_eq!(controller.status(), ConnectionStatus::Disconnected);
    assert!(mic_stopped.load(Ordering::SeqCst), "mic released on hangup");

    // History survives the hangup for the UI to render.
    assert_eq!(controller.transcript().len(), 2);
}

#[tokio::test]
async fn session_survives_decode_errors_but_not_transport_errors() {
    let transport = MockTransport::new();
    let controller = SessionController::new(
        LiveConfig::new("test-key"),
        Box::new(transport.clone()),
        Box::new(MockEngine::new()),
    );

    controller.connect().await.expect("connect");

    // Malformed audio: dropped, session stays up.
    transport.inject(message(ServerContent {
        model_turn: Some(ModelTurn {
            parts: vec![Part {
                inline_data: Some(InlineData {
                    data: "***".to_string(),
                    mime_type: None,
                }),
            }],
        }),
        ..Default::default()
    }));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(controller.status(), ConnectionStatus::Connected);

    // Transport failure: fatal, no automatic reconnect.
    transport.inject(SessionEvent::Errored("connection reset".to_string()));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(controller.status(), ConnectionStatus::Error);
}
