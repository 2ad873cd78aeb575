//! JSON shapes the page's renderers depend on.
//!
//! Renderers read these types from JSON, so their field names and tags are
//! a contract. These tests pin the shapes that the front end matches on.

#![allow(clippy::unwrap_used)]

use omniscience_types::{EngagementAction, EngagementState, LevelSignal, RawSignal, SignalKind};
use serde_json::{Value, json};

#[test]
fn initial_state_shape() {
    let value = serde_json::to_value(EngagementState::INITIAL).unwrap();
    assert_eq!(
        value,
        json!({
            "omniscience": 0.0,
            "distortion": 0.0,
            "interactions": 0,
            "awakening": false,
            "madness": 0.0,
        })
    );
}

#[test]
fn actions_are_tagged_with_amount() {
    let value = serde_json::to_value(EngagementAction::IncreaseOmniscience(2.5)).unwrap();
    assert_eq!(value, json!({ "type": "increase_omniscience", "amount": 2.5 }));

    let value = serde_json::to_value(EngagementAction::ForceAwaken).unwrap();
    assert_eq!(value, json!({ "type": "force_awaken" }));
}

#[test]
fn actions_from_renderers_parse() {
    let action: EngagementAction =
        serde_json::from_str(r#"{"type":"increase_madness","amount":1}"#).unwrap();
    assert_eq!(action, EngagementAction::IncreaseMadness(1.0));

    let action: EngagementAction = serde_json::from_str(r#"{"type":"register_interaction"}"#).unwrap();
    assert_eq!(action, EngagementAction::RegisterInteraction);

    assert!(serde_json::from_str::<EngagementAction>(r#"{"type":"levitate"}"#).is_err());
}

#[test]
fn raw_signal_shape() {
    let value = serde_json::to_value(RawSignal::click(3.0, 4.0)).unwrap();
    assert_eq!(value["kind"], Value::from("Click"));
    assert_eq!(value["pointer"], json!([3.0, 4.0]));
    assert!(value["scroll_depth"].is_null());

    let parsed: RawSignal = serde_json::from_value(json!({
        "kind": "Scroll",
        "pointer": null,
        "scroll_depth": 42.0,
    }))
    .unwrap();
    assert_eq!(parsed, RawSignal::scroll(42.0));
    assert_eq!(parsed.kind, SignalKind::Scroll);
}

#[test]
fn madness_warning_carries_coherence() {
    let value = serde_json::to_value(LevelSignal::MadnessWarning { coherence: 15.0 }).unwrap();
    assert_eq!(value, json!({ "MadnessWarning": { "coherence": 15.0 } }));
    assert_eq!(
        serde_json::to_value(LevelSignal::DistortionWarning).unwrap(),
        json!("DistortionWarning")
    );
}
