//! Wizard message rendering.

use serde_json::{Value, json};
use std::collections::HashMap;
use vc_control_core::{GuildSettings, RoleId};
use vc_control_discord::{message_form, wizard_view};
use vc_control_workflow::{
    ComponentId, GREETING_FIELD, MESSAGE_FIELD, SessionId, Started, Widget, WizardKind,
};

const ALL_KINDS: [WizardKind; 6] = [
    WizardKind::SetupVerification,
    WizardKind::VerifyUsers,
    WizardKind::UnverifyUsers,
    WizardKind::ThreadBroadcast,
    WizardKind::SetupRaid,
    WizardKind::StartRaid,
];

fn started(kind: WizardKind, settings: Value) -> Started {
    Started {
        id: SessionId::new(),
        kind,
        settings: GuildSettings::from_value(&settings),
    }
}

fn configured() -> Value {
    json!({
        "verified_roles": [20, 21],
        "allowed_roles": [10],
        "guest_role": 30,
        "log_channel": 40,
    })
}

/// Every `custom_id` anywhere in a serialized payload.
fn custom_ids(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, inner) in map {
                match (key.as_str(), inner) {
                    ("custom_id", Value::String(id)) => out.push(id.clone()),
                    _ => custom_ids(inner, out),
                }
            }
        }
        Value::Array(items) => items.iter().for_each(|item| custom_ids(item, out)),
        _ => {}
    }
}

fn rows(started: &Started) -> Vec<Value> {
    wizard_view(started, &HashMap::new())
        .components
        .iter()
        .map(|row| serde_json::to_value(row).expect("serializable"))
        .collect()
}

fn widgets(started: &Started) -> Vec<Widget> {
    let mut ids = Vec::new();
    for row in rows(started) {
        custom_ids(&row, &mut ids);
    }
    ids.iter()
        .map(|id| {
            assert!(id.len() <= 100, "custom id too long: {id}");
            let parsed: ComponentId = id.parse().expect("routable custom id");
            assert_eq!(parsed.session, started.id);
            parsed.widget
        })
        .collect()
}

#[test]
fn test_every_wizard_fits_five_rows_and_routes_to_its_session() {
    for kind in ALL_KINDS {
        let started = started(kind, configured());
        let view = wizard_view(&started, &HashMap::new());
        assert!(view.components.len() <= 5, "{kind} has too many rows");
        assert!(!view.content.is_empty());

        let widgets = widgets(&started);
        assert!(widgets.contains(&Widget::Confirm), "{kind} lacks confirm");
        assert!(widgets.contains(&Widget::Cancel), "{kind} lacks cancel");
    }
}

#[test]
fn test_setup_verification_widgets() {
    let started = started(WizardKind::SetupVerification, json!({}));
    assert_eq!(
        widgets(&started),
        [
            Widget::VerifiedRoles,
            Widget::AllowedRoles,
            Widget::GuestRole,
            Widget::LogChannel,
            Widget::Confirm,
            Widget::Cancel,
        ]
    );
}

#[test]
fn test_verify_offers_guest_toggle_when_configured() {
    let started = started(WizardKind::VerifyUsers, configured());
    assert_eq!(
        widgets(&started),
        [
            Widget::Targets,
            Widget::Roles,
            Widget::GuestToggle,
            Widget::Confirm,
            Widget::Cancel,
        ]
    );
}

#[test]
fn test_unverify_omits_guest_toggle_without_guest_role() {
    let started = started(
        WizardKind::UnverifyUsers,
        json!({"verified_roles": [20], "allowed_roles": [10]}),
    );
    let view = wizard_view(&started, &HashMap::new());
    assert_eq!(view.components.len(), 3);
    assert!(!widgets(&started).contains(&Widget::GuestToggle));
}

#[test]
fn test_role_options_use_names_and_fall_back_to_ids() {
    let started = started(WizardKind::VerifyUsers, configured());
    let names = HashMap::from([(RoleId(20), "Verified".to_string())]);
    let view = wizard_view(&started, &names);
    let roles_row = serde_json::to_value(&view.components[1]).expect("serializable");
    let text = roles_row.to_string();

    assert!(text.contains("\"Verified\""));
    assert!(text.contains("Assign Verified"));
    assert!(text.contains("\"21\""));
}

#[test]
fn test_role_picker_caps_options_at_discord_limit() {
    let verified: Vec<u64> = (100..130).collect();
    let started = started(
        WizardKind::VerifyUsers,
        json!({ "verified_roles": verified, "guest_role": 30 }),
    );
    let view = wizard_view(&started, &HashMap::new());
    let roles_row = serde_json::to_value(&view.components[1]).expect("serializable");
    let menu = &roles_row["components"][0];

    let options = menu["options"].as_array().expect("string select options");
    assert_eq!(options.len(), 25);
    assert_eq!(menu["max_values"], json!(25));
    assert_eq!(menu["min_values"], json!(1));
}

#[test]
fn test_thread_broadcast_has_compose_button() {
    let started = started(WizardKind::ThreadBroadcast, json!({}));
    assert_eq!(
        widgets(&started),
        [
            Widget::RecipientRoles,
            Widget::Channel,
            Widget::MentionRoles,
            Widget::Compose,
            Widget::Confirm,
            Widget::Cancel,
        ]
    );
}

#[test]
fn test_start_raid_widgets() {
    let started = started(WizardKind::StartRaid, json!({}));
    assert_eq!(
        widgets(&started),
        [
            Widget::Channels,
            Widget::Leads,
            Widget::Backups,
            Widget::Scouts,
            Widget::Confirm,
            Widget::Cancel,
        ]
    );
}

#[test]
fn test_message_form_routes_to_session() {
    let session = SessionId::new();
    let modal = serde_json::to_value(message_form(session)).expect("serializable");

    let form: ComponentId = modal["custom_id"]
        .as_str()
        .expect("modal custom id")
        .parse()
        .expect("routable custom id");
    assert_eq!(form, ComponentId::new(session, Widget::MessageForm));

    let mut fields = Vec::new();
    custom_ids(&modal["components"], &mut fields);
    assert_eq!(fields, [GREETING_FIELD, MESSAGE_FIELD]);
    assert_eq!(modal["title"], "Thread Message Configuration");
}
