//! End-to-end checks of the engine over whole conversations.

use async_trait::async_trait;
use dialogcue_engine::config::EngineConfig;
use dialogcue_engine::error::{Error, InputError, TtsError};
use dialogcue_engine::pipeline::Engine;
use dialogcue_engine::synth::{Synthesis, SynthesisRequest, TtsProbe};
use dialogcue_engine::tokenizer::{plain_text, tokenize};
use dialogcue_engine::types::{AnimationState, DialogueInput, DurationSource, EmotionKind, Token};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn english_engine() -> Engine {
    let mut config = EngineConfig::default();
    config.speech.words_per_second = BTreeMap::from([("en".to_string(), 2.5)]);
    config.speech.min_floor_sec = 0.3;
    Engine::new(config).unwrap()
}

fn assert_close(a: f64, b: f64) {
    assert!((a - b).abs() < 1e-9, "{a} != {b}");
}

/// Reports one second per word; hangs forever on "wait".
struct WordProbe;

#[async_trait]
impl TtsProbe for WordProbe {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<Synthesis, TtsError> {
        if request.text.contains("wait") {
            std::future::pending::<()>().await;
        }

        if request.language_code == "xx" {
            return Err(TtsError::Unavailable("unsupported language".into()));
        }

        Ok(Synthesis {
            duration_sec: request.text.split_whitespace().count() as f64,
            artifact: format!("{}_{}.wav", request.speaker_id, request.segment).into(),
        })
    }
}

#[test]
fn hi_laugh_there_scenario() {
    let engine = english_engine();

    assert_eq!(
        engine.tokenize("Hi [laugh] there"),
        vec![
            Token::text("Hi "),
            Token::event(EmotionKind::Laugh, "laugh"),
            Token::text(" there"),
        ]
    );

    let timeline = engine
        .build_timeline(&[DialogueInput::new("host", "Hi [laugh] there", "en")])
        .unwrap();

    match timeline.records() {
        [hi, shake, there] => {
            assert_eq!((hi.state.clone(), hi.subtitle_text.as_str()), (AnimationState::Speaking, "Hi "));
            assert_close(hi.start, 0.0);
            assert_close(hi.end, 0.4);

            assert_eq!(shake.state.name(), "shake");
            assert_close(shake.start, 0.4);
            assert_close(shake.end, 1.0);

            assert_eq!(there.subtitle_text, " there");
            assert_close(there.start, 1.0);
            assert_close(there.end, 1.4);
        }
        other => panic!("expected 3 records, got {other:?}"),
    }

    assert_close(timeline.total_duration(), 1.4);
}

#[test]
fn empty_conversation_is_fatal() {
    let err = english_engine().build_timeline(&[]).unwrap_err();
    assert!(matches!(err, Error::Input(InputError::EmptyConversation)));
}

#[test]
fn back_to_back_markers_keep_laugh_first() {
    let timeline = english_engine()
        .build_timeline(&[DialogueInput::new("host", "[laugh][surprise]", "en")])
        .unwrap();

    let states: Vec<_> = timeline.records().iter().map(|r| r.state.name()).collect();
    assert_eq!(states, ["shake", "jolt"]);
    assert_close(timeline.records()[0].end, timeline.records()[1].start);
}

#[test]
fn conversation_covers_zero_to_total_without_gaps() {
    let dialogues = [
        DialogueInput::new("host", "Hey everyone! [laugh] Hahaha, welcome back!", "en"),
        DialogueInput::new("host", "Halo semuanya! [laugh] Hahaha", "en-US"),
        DialogueInput::new("maya", "Hello! [excited] Wohoo, I'm so happy to be here!", "en"),
        DialogueInput::new("maya", "[surprise] Wow! [sad] :( [confused]", "en"),
    ];

    let engine = english_engine();
    let timeline = engine.build_timeline(&dialogues).unwrap();
    let records = timeline.records();

    assert_close(records[0].start, 0.0);
    for pair in records.windows(2) {
        assert_close(pair[0].end, pair[1].start);
    }

    let expected: f64 = dialogues
        .iter()
        .flat_map(|d| engine.tokenize(&d.raw_text))
        .map(|token| match token {
            Token::Text { content } => {
                (content.split_whitespace().count() as f64 / 2.5).max(0.3)
            }
            Token::Event { kind, .. } => engine.map_event(kind).duration_sec,
        })
        .sum();

    assert_close(timeline.total_duration(), expected);
}

#[test]
fn single_dialogue_ends_at_sum_of_token_durations() {
    let engine = english_engine();
    let text = "One two three [angry] four five [laugh]";

    let timeline = engine
        .build_timeline(&[DialogueInput::new("host", text, "en")])
        .unwrap();

    // 3 words 1.2s + tremble 0.5s + 2 words 0.8s + shake 0.6s
    assert_close(timeline.total_duration(), 1.2 + 0.5 + 0.8 + 0.6);
}

#[test]
fn subtitles_stay_within_speaking_time() {
    let engine = english_engine();
    let production = engine
        .produce_offline(&[
            DialogueInput::new(
                "host",
                "So, Chloe, let's start with the first myth that a lot of people believe: \
                 'You have to be fluent in English before you can start speaking.' [laugh] Right?",
                "en",
            ),
            DialogueInput::new("maya", "[laugh] Hahaha, that's such a common myth!", "en"),
        ])
        .unwrap();

    let covered: f64 = production.subtitles.iter().map(|s| s.duration()).sum();
    assert!(covered <= production.timeline.speaking_duration() + 1e-9);

    for pair in production.subtitles.windows(2) {
        assert!(pair[0].end <= pair[1].start + 1e-9);
    }

    for span in &production.subtitles {
        let inside = production
            .timeline
            .records()
            .iter()
            .filter(|r| r.state == AnimationState::Speaking)
            .any(|r| span.start >= r.start - 1e-9 && span.start < r.end);
        assert!(inside, "span {span:?} starts outside speaking records");
    }
}

#[test]
fn tokenizer_round_trips_stripped_text() {
    let text = "I completely agree. [sad] :( There were times [laugh]";
    assert_eq!(plain_text(&tokenize(text)), "I completely agree.  :( There were times ");
}

#[tokio::test]
async fn probe_durations_are_authoritative() {
    let engine = english_engine();

    let production = engine
        .produce(
            &[DialogueInput::new("host", "Hi there [laugh] friend", "en")],
            Some(&WordProbe),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let records = production.timeline.records();

    assert_close(records[0].end, 2.0);
    assert_close(records[1].end, 2.6);
    assert_close(records[2].end, 3.6);
    assert_eq!(records[0].audio.as_ref().map(|a| a.as_str()), Some("host_0:0.wav"));
    assert!(production.estimates.iter().all(|e| e.source == DurationSource::Synthesized));
}

#[tokio::test]
async fn probe_failure_never_blocks_the_timeline() {
    let mut config = EngineConfig::default();
    config.speech.words_per_second.insert("xx".into(), 1.0);
    let engine = Engine::new(config).unwrap();

    let production = engine
        .produce(
            &[
                DialogueInput::new("host", "one two", "xx"),
                DialogueInput::new("maya", "three", "en"),
            ],
            Some(&WordProbe),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(production.fallback_count(), 1);
    assert_close(production.timeline.records()[0].end, 2.0);
    assert!(production.timeline.records()[0].audio.is_none());
    assert_close(production.timeline.total_duration(), 3.0);
}

#[tokio::test(start_paused = true)]
async fn cancellation_returns_no_timeline() {
    let engine = english_engine();
    let cancel = CancellationToken::new();
    let dialogues = [DialogueInput::new("host", "please wait", "en")];

    let (result, ()) = tokio::join!(engine.produce(&dialogues, Some(&WordProbe), &cancel), async {
        tokio::time::sleep(Duration::from_secs(1)).await;
        cancel.cancel();
    });

    assert!(matches!(result, Err(Error::Cancelled)));
}

#[tokio::test(start_paused = true)]
async fn hanging_probe_times_out_to_heuristic() {
    let engine = english_engine();

    let production = engine
        .produce(
            &[DialogueInput::new("host", "please wait", "en")],
            Some(&WordProbe),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(production.fallback_count(), 1);
    assert_close(production.timeline.total_duration(), 0.8);
}

#[test]
fn unrepresentable_probe_timeout_is_rejected_at_startup() {
    let config = EngineConfig {
        synthesis: dialogcue_engine::synth::SynthesisOptions {
            probe_timeout_sec: 1e30,
            ..Default::default()
        },
        ..EngineConfig::default()
    };

    assert!(matches!(Engine::new(config), Err(Error::Config(_))));
}
