use super::*;

fn url() -> ArtifactUrl {
    ArtifactUrl::parse("artifact://backdrop/0-0123456789abcdef").unwrap()
}

fn failed() -> ExportState {
    ExportState::Failed {
        kind: ErrorKind::MediaLoad,
        reason: "x".to_string(),
    }
}

#[test]
fn happy_path_transitions_are_legal() {
    let path = [
        ExportState::Idle,
        ExportState::Loading,
        ExportState::LoadingBackground,
        ExportState::Exporting(0),
        ExportState::Exporting(10),
        ExportState::Exporting(10),
        ExportState::Exporting(100),
        ExportState::Complete(url()),
    ];
    for w in path.windows(2) {
        assert!(w[0].can_transition_to(&w[1]), "{:?} -> {:?}", w[0], w[1]);
    }
}

#[test]
fn skipping_stages_or_going_back_is_illegal() {
    assert!(!ExportState::Idle.can_transition_to(&ExportState::LoadingBackground));
    assert!(!ExportState::Loading.can_transition_to(&ExportState::Exporting(0)));
    assert!(!ExportState::Exporting(50).can_transition_to(&ExportState::Exporting(40)));
    assert!(!ExportState::LoadingBackground.can_transition_to(&ExportState::Complete(url())));
    assert!(!ExportState::Idle.can_transition_to(&ExportState::Idle));
}

#[test]
fn any_live_state_can_fail_but_terminal_states_stay_put() {
    for s in [
        ExportState::Idle,
        ExportState::Loading,
        ExportState::LoadingBackground,
        ExportState::Exporting(30),
    ] {
        assert!(!s.is_terminal());
        assert!(s.can_transition_to(&failed()));
    }
    for s in [ExportState::Complete(url()), failed()] {
        assert!(s.is_terminal());
        assert!(!s.can_transition_to(&failed()));
        assert!(!s.can_transition_to(&ExportState::Loading));
    }
}
