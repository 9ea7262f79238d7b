//! SOP document parsing and round-trip tests.

use stepframe::SopDocument;

const FULL_DOCUMENT: &str = r#"{
    "title": "Invite a teammate to the workspace",
    "emoji_icon": "👥",
    "summary": "How an admin invites a new teammate and assigns a role.",
    "estimated_time_minutes": 3,
    "tools_required": ["Admin account"],
    "steps": [
        {
            "title": "Open workspace settings",
            "instruction": "Click the gear icon in the sidebar.",
            "timestamp_seconds": 4.0,
            "visual_proof": "Settings panel header is visible"
        },
        {
            "title": "Choose Members",
            "instruction": "Select the Members tab.",
            "warning": "Requires the admin role.",
            "timestamp_seconds": 11.5
        },
        {
            "title": "Send the invite",
            "instruction": "Enter the email address and press Invite."
        }
    ],
    "troubleshooting_tips": [
        "If the Invite button is greyed out, check the seat limit."
    ]
}"#;

#[test]
fn parses_a_full_document() {
    let document = SopDocument::from_json(FULL_DOCUMENT).expect("valid document");
    assert_eq!(document.title, "Invite a teammate to the workspace");
    assert_eq!(document.estimated_time_minutes, 3);
    assert_eq!(document.steps.len(), 3);
    assert_eq!(document.steps[1].warning.as_deref(), Some("Requires the admin role."));
    assert_eq!(document.steps[2].timestamp_seconds, None);
    assert_eq!(document.troubleshooting_tips.len(), 1);
}

#[test]
fn timestamped_steps_skip_untimed_ones() {
    let document = SopDocument::from_json(FULL_DOCUMENT).expect("valid document");
    let timestamped: Vec<_> = document.timestamped_steps().collect();
    assert_eq!(timestamped.len(), 2);
    assert_eq!(timestamped[0].2, 4.0);
    assert_eq!(timestamped[1].0, 1);
}

#[test]
fn round_trips_through_pretty_json() {
    let document = SopDocument::from_json(FULL_DOCUMENT).expect("valid document");
    let json = document.to_json_pretty().expect("serialise");
    let reparsed = SopDocument::from_json(&json).expect("reparse");
    assert_eq!(document, reparsed);
}

#[test]
fn absent_warning_is_not_serialised() {
    let document = SopDocument::from_json(FULL_DOCUMENT).expect("valid document");
    let json = document.to_json_pretty().expect("serialise");
    // Only the one step that carries a warning should emit the key.
    assert_eq!(json.matches("\"warning\"").count(), 1);
}

#[test]
fn missing_optional_fields_default() {
    let document = SopDocument::from_json(
        r#"{"title": "Bare minimum", "steps": [{"title": "A", "instruction": "do it"}]}"#,
    )
    .expect("valid document");
    assert!(document.tools_required.is_empty());
    assert!(document.troubleshooting_tips.is_empty());
    assert_eq!(document.emoji_icon, "");
    assert_eq!(document.estimated_time_minutes, 0);
}

#[test]
fn malformed_json_is_an_error() {
    assert!(SopDocument::from_json("{not json").is_err());
}
