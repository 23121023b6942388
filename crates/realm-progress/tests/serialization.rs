//! Integration tests for the JSON shapes `realm-progress` hands to clients.

// Integration tests use unwrap extensively for clarity -- panicking on
// failure is the correct behavior in test code.
#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use realm_progress::{Progress, StoryBook};
use realm_types::ProgressEventKind;
use serde_json::json;

const STORY: &str = r"
messages:
  - key: hello
    title: Hello
    text: Welcome to the realm.
    conditions:
      - { type: enterArea, target: start }
quests:
  - key: tinker
    title: The tinker
    text: Fix the old machine.
    stages:
      - key: requirements
        text: Reach the workshop
        conditions:
          - { type: enterArea, target: workshop, text: Enter the workshop }
      - key: repair
        text: Repair the machine
        conditions:
          - { type: configure, target: Machine, text: Configure the machine }
          - { type: option, target: calibrate, text: Calibrate it }
";

#[test]
fn quest_log_update_lists_only_shown_stages() {
    let mut progress = Progress::new(&StoryBook::from_yaml_str(STORY).unwrap());
    let out = progress.handle_event(ProgressEventKind::EnterArea, "workshop");
    let value = serde_json::to_value(&out[0]).unwrap();
    assert_eq!(
        value,
        json!({
            "type": "logUpdate",
            "item": {
                "type": "quest",
                "key": "tinker",
                "title": "The tinker",
                "text": "Fix the old machine.",
                "completed": false,
                "stages": [
                    {
                        "key": "requirements",
                        "text": "Reach the workshop",
                        "conditions": [{ "text": "Enter the workshop", "done": true }]
                    },
                    {
                        "key": "repair",
                        "text": "Repair the machine",
                        "conditions": [
                            { "text": "Configure the machine", "done": false },
                            { "text": "Calibrate it", "done": false }
                        ]
                    }
                ]
            }
        })
    );
}

#[test]
fn message_serializes_with_type_tag_once_visible() {
    let mut progress = Progress::new(&StoryBook::from_yaml_str(STORY).unwrap());
    let initial = serde_json::to_value(progress.log_data()).unwrap();
    assert_eq!(initial["messages"], json!([]));

    let out = progress.handle_event(ProgressEventKind::EnterArea, "start");
    let dialog = serde_json::to_value(&out[0]).unwrap();
    assert_eq!(
        dialog,
        json!({ "type": "dialog", "title": "Hello", "text": "Welcome to the realm." })
    );

    let log = serde_json::to_value(progress.log_data()).unwrap();
    assert_eq!(
        log["messages"],
        json!([{ "type": "message", "key": "hello", "title": "Hello", "text": "Welcome to the realm." }])
    );
}
