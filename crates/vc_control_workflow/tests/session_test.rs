//! State machine tests shared by every wizard.

use std::time::Duration;
use vc_control_core::{ChannelId, GuildId, RaidSettings, RoleId, UserId};
use vc_control_error::WorkflowErrorKind;
use vc_control_workflow::{
    Actor, Session, SessionRegistry, SessionState, SetupRaidSelection, SetupRaidWizard,
    StartRaidSelection, StartRaidWizard, Wizard, WizardKind,
};

const INVOKER: UserId = UserId(7);
const GUILD: GuildId = GuildId(1);

fn invoker() -> Actor {
    Actor::new(INVOKER, [])
}

fn filled_raid_setup() -> Session<SetupRaidWizard> {
    let mut session = Session::new(INVOKER, GUILD, SetupRaidWizard::new());
    for selection in [
        SetupRaidSelection::Channel(Some(ChannelId(50))),
        SetupRaidSelection::LeadRole(Some(RoleId(51))),
        SetupRaidSelection::BackupRole(Some(RoleId(52))),
        SetupRaidSelection::ScoutRole(Some(RoleId(53))),
    ] {
        session.select(selection).expect("selection accepted");
    }
    session
}

#[tokio::test]
async fn test_confirm_by_other_user_is_rejected_and_session_stays_live() {
    let mut session = filled_raid_setup();
    let stranger = Actor::new(UserId(8), [RoleId(10)]);

    let err = session.confirm(&stranger).expect_err("not the invoker");

    assert_eq!(err.kind, WorkflowErrorKind::NotInvoker { actor: 8 });
    assert_eq!(err.notice(), "This setup is not for you.");
    assert_eq!(session.state(), SessionState::Selecting);
    assert!(session.wizard().seal().is_ok(), "draft untouched");
}

#[tokio::test]
async fn test_incomplete_confirm_names_missing_slots() {
    let mut session = Session::new(INVOKER, GUILD, SetupRaidWizard::new());
    session
        .select(SetupRaidSelection::LeadRole(Some(RoleId(51))))
        .expect("selection accepted");

    let err = session.confirm(&invoker()).expect_err("incomplete");

    match &err.kind {
        WorkflowErrorKind::Incomplete { missing, .. } => assert_eq!(
            missing,
            &vec!["raid_channel", "raid_backup_role", "raid_scout_role"]
        ),
        other => panic!("unexpected rejection: {other:?}"),
    }
    assert_eq!(err.notice(), "❌ Please complete all selections.");
    assert_eq!(session.state(), SessionState::Selecting);
}

#[tokio::test]
async fn test_selection_overwrites_and_confirm_commits_once() {
    let mut session = filled_raid_setup();
    session
        .select(SetupRaidSelection::Channel(Some(ChannelId(60))))
        .expect("reselect");

    let settings = session.confirm(&invoker()).expect("complete draft");
    assert_eq!(
        settings,
        RaidSettings::default()
            .with_channel(ChannelId(60))
            .with_lead_role(RoleId(51))
            .with_backup_role(RoleId(52))
            .with_scout_role(RoleId(53))
    );
    assert_eq!(session.state(), SessionState::Committed);

    let again = session.confirm(&invoker()).expect_err("already committed");
    assert!(matches!(again.kind, WorkflowErrorKind::SessionClosed(_)));
    assert!(
        session
            .select(SetupRaidSelection::Channel(None))
            .is_err()
    );
}

#[tokio::test]
async fn test_selections_are_passive_but_cancel_is_invoker_locked() {
    let mut session = Session::new(INVOKER, GUILD, StartRaidWizard::new());
    session
        .select(StartRaidSelection::Leads(vec![UserId(2)]))
        .expect("anyone may select");

    let err = session.cancel(UserId(8)).expect_err("not the invoker");
    assert!(matches!(err.kind, WorkflowErrorKind::NotInvoker { .. }));
    assert_eq!(session.state(), SessionState::Selecting);

    session.cancel(INVOKER).expect("invoker cancels");
    assert_eq!(session.state(), SessionState::Cancelled);
    assert!(session.confirm(&invoker()).is_err());
}

#[tokio::test(start_paused = true)]
async fn test_inactivity_window_times_out_session() {
    let mut session = filled_raid_setup();
    assert_eq!(session.kind().timeout(), Duration::from_secs(180));

    tokio::time::advance(Duration::from_secs(179)).await;
    assert_eq!(session.state(), SessionState::Selecting);

    tokio::time::advance(Duration::from_secs(1)).await;
    assert_eq!(session.state(), SessionState::TimedOut);

    let err = session.confirm(&invoker()).expect_err("timed out");
    assert_eq!(
        err.notice(),
        "This session has expired. Run the command again."
    );
}

#[tokio::test(start_paused = true)]
async fn test_accepted_selection_restarts_window() {
    let mut session = Session::new(INVOKER, GUILD, StartRaidWizard::new());
    assert_eq!(WizardKind::StartRaid.timeout(), Duration::from_secs(300));

    tokio::time::advance(Duration::from_secs(250)).await;
    session
        .select(StartRaidSelection::Channels(vec![ChannelId(1)]))
        .expect("still live");
    tokio::time::advance(Duration::from_secs(250)).await;
    session
        .select(StartRaidSelection::Leads(vec![UserId(2)]))
        .expect("window restarted");

    let roster = session.confirm(&invoker()).expect("complete");
    assert_eq!(roster.channels, vec![ChannelId(1)]);
}

#[tokio::test(start_paused = true)]
async fn test_registry_sweeps_idle_sessions() {
    let registry = SessionRegistry::new();
    let idle = registry.open(filled_raid_setup()).await;
    tokio::time::advance(Duration::from_secs(120)).await;
    let fresh = registry
        .open(Session::new(INVOKER, GUILD, StartRaidWizard::new()))
        .await;

    tokio::time::advance(Duration::from_secs(60)).await;
    assert_eq!(registry.sweep().await, 1);
    assert_eq!(registry.len().await, 1);
    assert!(registry.kind(idle).await.is_err());
    assert_eq!(registry.kind(fresh).await.expect("live"), WizardKind::StartRaid);
}

#[tokio::test]
async fn test_registry_confirm_consumes_session() {
    let registry = SessionRegistry::new();
    let id = registry.open(filled_raid_setup()).await;

    let wrong = registry
        .confirm(id, &Actor::new(UserId(8), []))
        .await
        .expect_err("not the invoker");
    assert!(matches!(wrong.kind, WorkflowErrorKind::NotInvoker { .. }));
    assert_eq!(registry.len().await, 1);

    let sealed = registry.confirm(id, &invoker()).await.expect("commits");
    assert_eq!(sealed.kind, WizardKind::SetupRaid);
    assert_eq!(sealed.guild, GUILD);
    assert!(registry.is_empty().await);

    let second = registry
        .confirm(id, &invoker())
        .await
        .expect_err("double commit");
    assert!(matches!(second.kind, WorkflowErrorKind::UnknownSession(_)));
}

#[tokio::test]
async fn test_concurrent_confirms_commit_exactly_once() {
    let registry = std::sync::Arc::new(SessionRegistry::new());
    let id = registry.open(filled_raid_setup()).await;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let registry = registry.clone();
            tokio::spawn(async move { registry.confirm(id, &invoker()).await.is_ok() })
        })
        .collect();

    let mut committed = 0;
    for handle in handles {
        if handle.await.expect("task completes") {
            committed += 1;
        }
    }
    assert_eq!(committed, 1);
}
