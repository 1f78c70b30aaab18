//! Draft rules for each wizard and widget decoding.

use serde_json::json;
use vc_control_core::{ChannelId, GuildSettings, RoleId, UserId, VerificationSettings};
use vc_control_error::WorkflowErrorKind;
use vc_control_workflow::{
    Ack, Actor, ComponentId, GREETING_FIELD, MESSAGE_FIELD, RoleChangeSelection,
    RoleChangeWizard, RoleDirection, Selection, SessionId, SetupVerificationSelection,
    SetupVerificationWizard, StartRaidSelection, ThreadBroadcastSelection, ThreadBroadcastWizard,
    Widget, WidgetValues, Wizard, WizardKind, decode_selection,
};

fn verification_settings() -> GuildSettings {
    GuildSettings::from_value(&json!({
        "allowed_roles": [10],
        "verified_roles": [20, 21],
        "guest_role": 30,
        "log_channel": 40,
    }))
}

#[test]
fn test_setup_verification_requires_every_slot() {
    let mut wizard = SetupVerificationWizard::new();
    wizard
        .apply(SetupVerificationSelection::VerifiedRoles(vec![RoleId(20)]))
        .expect("apply");
    wizard
        .apply(SetupVerificationSelection::GuestRole(Some(RoleId(30))))
        .expect("apply");

    assert_eq!(
        wizard.seal().expect_err("incomplete"),
        vec!["allowed_roles", "log_channel"]
    );

    wizard
        .apply(SetupVerificationSelection::AllowedRoles(vec![RoleId(10)]))
        .expect("apply");
    wizard
        .apply(SetupVerificationSelection::LogChannel(Some(ChannelId(40))))
        .expect("apply");

    assert_eq!(
        wizard.seal().expect("complete"),
        VerificationSettings::new(vec![RoleId(20)], vec![RoleId(10)], RoleId(30), ChannelId(40))
    );
}

#[test]
fn test_clearing_a_single_select_empties_the_slot() {
    let mut wizard = SetupVerificationWizard::new();
    for selection in [
        SetupVerificationSelection::VerifiedRoles(vec![RoleId(20)]),
        SetupVerificationSelection::AllowedRoles(vec![RoleId(10)]),
        SetupVerificationSelection::GuestRole(Some(RoleId(30))),
        SetupVerificationSelection::LogChannel(Some(ChannelId(40))),
        SetupVerificationSelection::GuestRole(None),
    ] {
        wizard.apply(selection).expect("apply");
    }
    assert_eq!(wizard.seal().expect_err("guest cleared"), vec!["guest_role"]);
}

#[test]
fn test_verify_keeps_only_configured_roles() {
    let mut wizard = RoleChangeWizard::verify(verification_settings());
    wizard
        .apply(RoleChangeSelection::Targets(vec![UserId(5)]))
        .expect("apply");
    wizard
        .apply(RoleChangeSelection::Roles(vec![RoleId(20), RoleId(99)]))
        .expect("apply");

    let commit = wizard.seal().expect("complete");
    assert_eq!(commit.direction, RoleDirection::Grant);
    assert_eq!(commit.roles, vec![RoleId(20)]);
    assert_eq!(commit.guest_role, None, "toggle off");
    assert_eq!(commit.log_channel, Some(ChannelId(40)));
}

#[test]
fn test_verify_with_only_foreign_roles_is_incomplete() {
    let mut wizard = RoleChangeWizard::verify(verification_settings());
    wizard
        .apply(RoleChangeSelection::Targets(vec![UserId(5)]))
        .expect("apply");
    wizard
        .apply(RoleChangeSelection::Roles(vec![RoleId(99)]))
        .expect("apply");

    assert_eq!(wizard.seal().expect_err("no roles"), vec!["roles"]);
    assert_eq!(
        WizardKind::VerifyUsers.incomplete_notice(),
        "Select users and roles first."
    );
}

#[test]
fn test_unverify_carries_guest_role_when_toggled() {
    let mut wizard = RoleChangeWizard::unverify(verification_settings());
    assert_eq!(wizard.kind(), WizardKind::UnverifyUsers);
    for selection in [
        RoleChangeSelection::Targets(vec![UserId(5), UserId(6)]),
        RoleChangeSelection::Roles(vec![RoleId(21)]),
        RoleChangeSelection::GuestToggle(true),
    ] {
        wizard.apply(selection).expect("apply");
    }

    let commit = wizard.seal().expect("complete");
    assert_eq!(commit.direction, RoleDirection::Revoke);
    assert_eq!(commit.guest_role, Some(RoleId(30)));
    assert_eq!(commit.targets, vec![UserId(5), UserId(6)]);
}

#[test]
fn test_role_change_authorization_uses_allowed_roles() {
    let wizard = RoleChangeWizard::verify(verification_settings());

    assert!(wizard.authorize(&Actor::new(UserId(1), [RoleId(10)])).is_ok());
    let err = wizard
        .authorize(&Actor::new(UserId(1), [RoleId(20), RoleId(30)]))
        .expect_err("no allowed role");
    assert_eq!(err.kind, WorkflowErrorKind::NotPermitted);
    assert_eq!(err.notice(), "You are not allowed to use this command.");
}

#[test]
fn test_thread_broadcast_echoes_each_selection() {
    let mut wizard = ThreadBroadcastWizard::new();

    let ack = wizard
        .apply(ThreadBroadcastSelection::RecipientRoles(vec![RoleId(1), RoleId(2)]))
        .expect("apply");
    assert_eq!(
        ack,
        Ack::Notice("✅ Selected 2 recipient role(s): <@&1>, <@&2>".to_string())
    );

    let ack = wizard
        .apply(ThreadBroadcastSelection::Channel(Some(ChannelId(3))))
        .expect("apply");
    assert_eq!(ack, Ack::Notice("✅ Selected channel: <#3>".to_string()));
}

#[test]
fn test_thread_broadcast_message_limits() {
    let mut wizard = ThreadBroadcastWizard::new();

    let err = wizard
        .apply(ThreadBroadcastSelection::Message {
            greeting: "h".repeat(101),
            body: "body".to_string(),
        })
        .expect_err("greeting too long");
    assert!(matches!(err.kind, WorkflowErrorKind::InvalidSelection(_)));

    let err = wizard
        .apply(ThreadBroadcastSelection::Message {
            greeting: "Hello".to_string(),
            body: "b".repeat(1001),
        })
        .expect_err("body too long");
    assert!(matches!(err.kind, WorkflowErrorKind::InvalidSelection(_)));

    wizard
        .apply(ThreadBroadcastSelection::Message {
            greeting: "h".repeat(100),
            body: "b".repeat(1000),
        })
        .expect("limits are inclusive");
}

#[test]
fn test_thread_broadcast_seal_lists_missing_slots() {
    let mut wizard = ThreadBroadcastWizard::new();
    wizard
        .apply(ThreadBroadcastSelection::Message {
            greeting: "Hello".to_string(),
            body: "   ".to_string(),
        })
        .expect("apply");

    assert_eq!(
        wizard.seal().expect_err("incomplete"),
        vec!["recipient_roles", "channel", "mention_roles", "message"]
    );

    for selection in [
        ThreadBroadcastSelection::RecipientRoles(vec![RoleId(1)]),
        ThreadBroadcastSelection::Channel(Some(ChannelId(3))),
        ThreadBroadcastSelection::MentionRoles(vec![RoleId(4)]),
        ThreadBroadcastSelection::Message {
            greeting: "Hello".to_string(),
            body: "Raid tonight".to_string(),
        },
    ] {
        wizard.apply(selection).expect("apply");
    }
    let commit = wizard.seal().expect("complete");
    assert_eq!(commit.compose(UserId(5)), "Hello <@5>\nRaid tonight\n<@&4>\n");
}

#[test]
fn test_decode_routes_widgets_by_wizard_kind() {
    let selection = decode_selection(
        WizardKind::VerifyUsers,
        Widget::Roles,
        WidgetValues::Strings(vec!["20".to_string(), "bogus".to_string()]),
    )
    .expect("decodes");
    assert_eq!(
        selection,
        Selection::RoleChange(RoleChangeSelection::Roles(vec![RoleId(20)]))
    );

    let selection = decode_selection(
        WizardKind::UnverifyUsers,
        Widget::GuestToggle,
        WidgetValues::Strings(Vec::new()),
    )
    .expect("decodes");
    assert_eq!(
        selection,
        Selection::RoleChange(RoleChangeSelection::GuestToggle(false))
    );

    let selection = decode_selection(
        WizardKind::StartRaid,
        Widget::Leads,
        WidgetValues::Users(vec![UserId(2)]),
    )
    .expect("decodes");
    assert_eq!(
        selection,
        Selection::StartRaid(StartRaidSelection::Leads(vec![UserId(2)]))
    );

    let err = decode_selection(
        WizardKind::SetupRaid,
        Widget::Leads,
        WidgetValues::Users(vec![UserId(2)]),
    )
    .expect_err("widget belongs to another wizard");
    assert!(matches!(err.kind, WorkflowErrorKind::InvalidSelection(_)));
}

#[test]
fn test_decode_message_form_fields() {
    let selection = decode_selection(
        WizardKind::ThreadBroadcast,
        Widget::MessageForm,
        WidgetValues::Form(vec![
            (MESSAGE_FIELD.to_string(), "Raid tonight".to_string()),
            (GREETING_FIELD.to_string(), "Hello".to_string()),
        ]),
    )
    .expect("decodes");
    assert_eq!(
        selection,
        Selection::ThreadBroadcast(ThreadBroadcastSelection::Message {
            greeting: "Hello".to_string(),
            body: "Raid tonight".to_string(),
        })
    );
}

#[test]
fn test_component_id_format() {
    let session = SessionId::new();
    let id = ComponentId::new(session, Widget::GuestToggle);
    let rendered = id.to_string();

    assert!(rendered.starts_with("wiz:"));
    assert!(rendered.ends_with(":guest_toggle"));
    assert!(rendered.len() <= 100, "custom ids are capped at 100 characters");

    let parsed: ComponentId = rendered.parse().expect("parses");
    assert_eq!(parsed.session, session);
    assert_eq!(parsed.widget, Widget::GuestToggle);

    for bad in ["wiz:not-a-uuid:confirm", "wiz", "other:x:y"] {
        let err = bad.parse::<ComponentId>().expect_err("rejected");
        assert!(matches!(err.kind, WorkflowErrorKind::UnknownSession(_)));
    }
    let unknown_widget = format!("wiz:{}:launch", session.0.simple());
    assert!(unknown_widget.parse::<ComponentId>().is_err());
}
