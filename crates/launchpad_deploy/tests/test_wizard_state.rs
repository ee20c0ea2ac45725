use launchpad_deploy::fields::{FieldUpdate, NetworkMode, Variant};
use launchpad_deploy::state::{WizardPhase, WizardState};
use launchpad_deploy::step_graph::{self, Step};

fn key() -> String {
    format!("0x{}", "11".repeat(32))
}

fn fill_shared(state: &mut WizardState) {
    state.set_field(FieldUpdate::PrivateKey(key()));
    state.set_field(FieldUpdate::AwsCredential("cred-1".into()));
    state.set_field(FieldUpdate::AwsRegion("ap-northeast-2".into()));
    state.set_field(FieldUpdate::DatabaseUsername("drb".into()));
    state.set_field(FieldUpdate::DatabasePassword("GoodPass123".into()));
}

fn fill_regular(state: &mut WizardState) {
    fill_shared(state);
    state.set_field(FieldUpdate::LeaderIp("10.0.0.5".into()));
    state.set_field(FieldUpdate::LeaderPort("61280".into()));
    state.set_field(FieldUpdate::LeaderAddress(format!("0x{}", "ab".repeat(20))));
    state.set_field(FieldUpdate::KeyPairName("ops-key".into()));
}

/// Advance until blocked, returning every step visited.
fn walk_forward(state: &mut WizardState) -> Vec<Step> {
    let mut visited = vec![state.step];
    while state.advance_step() {
        visited.push(state.step);
    }
    visited
}

#[test]
fn leader_walk_ends_at_database_without_repeats() {
    let mut state = WizardState::new();
    fill_shared(&mut state);
    let visited = walk_forward(&mut state);
    assert_eq!(
        visited,
        vec![Step::Mode, Step::Info, Step::Network, Step::Config, Step::Aws, Step::Database]
    );
    assert_eq!(state.step, Step::Database);
}

#[test]
fn regular_walk_ends_at_database_without_repeats() {
    let mut state = WizardState::new();
    assert!(state.set_variant(Variant::Regular));
    fill_regular(&mut state);
    let visited = walk_forward(&mut state);
    assert_eq!(visited, step_graph::steps(Variant::Regular));
    assert_eq!(visited.last(), Some(&Step::Database));

    let mut unique = visited.clone();
    unique.sort_by_key(|s| s.key());
    unique.dedup();
    assert_eq!(unique.len(), visited.len());
}

#[test]
fn walk_stops_at_first_invalid_step() {
    let mut state = WizardState::new();
    let visited = walk_forward(&mut state);
    assert_eq!(visited.last(), Some(&Step::Config));
    assert!(!state.can_advance());
    assert!(state.current_errors().iter().any(|e| e.field == "privateKey"));
}

#[test]
fn back_after_next_restores_step_and_keeps_data() {
    let mut state = WizardState::new();
    fill_shared(&mut state);
    state.advance_step();
    state.advance_step();
    state.advance_step();
    assert_eq!(state.step, Step::Config);

    let before = state.fields.clone();
    assert!(state.advance_step());
    assert!(state.go_back());
    assert_eq!(state.step, Step::Config);
    assert_eq!(state.fields, before);
}

#[test]
fn back_from_mode_is_noop() {
    let mut state = WizardState::new();
    assert!(!state.go_back());
    assert_eq!(state.step, Step::Mode);
}

#[test]
fn custom_network_gates_on_rpc_and_chain_id() {
    let mut state = WizardState::new();
    state.advance_step();
    state.advance_step();
    assert_eq!(state.step, Step::Network);

    state.set_field(FieldUpdate::NetworkMode(NetworkMode::Custom));
    assert!(!state.can_advance());
    state.set_field(FieldUpdate::RpcUrl("http://localhost:8545".into()));
    assert!(!state.can_advance());
    state.set_field(FieldUpdate::ChainId("abc".into()));
    assert!(!state.can_advance());
    state.set_field(FieldUpdate::ChainId("31337".into()));
    assert!(state.can_advance());
}

#[test]
fn switching_variant_resets_exclusive_fields() {
    let mut state = WizardState::new();
    state.set_variant(Variant::Regular);
    state.set_field(FieldUpdate::LeaderIp("10.0.0.5".into()));
    state.set_field(FieldUpdate::PrivateKey(key()));

    state.set_variant(Variant::Leader);
    assert!(state.fields.leader_connection.leader_ip.is_empty());
    assert_eq!(state.fields.config.private_key, key());
}

#[test]
fn submit_lifecycle_success() {
    let mut state = WizardState::new();
    fill_shared(&mut state);
    walk_forward(&mut state);

    assert!(state.begin_submit());
    assert_eq!(state.step, Step::Deploying);
    assert_eq!(state.phase, WizardPhase::Validating);
    assert!(state.is_busy());
    assert!(!state.begin_submit());
    assert!(!state.go_back());
    assert!(!state.set_field(FieldUpdate::DatabaseUsername("other".into())));

    state.mark_submitting();
    assert_eq!(state.phase, WizardPhase::Submitting);
    state.complete_submit();
    assert_eq!(state.step, Step::Success);
    assert_eq!(state.phase, WizardPhase::Success);
}

#[test]
fn submit_failure_then_retry_keeps_fields() {
    let mut state = WizardState::new();
    fill_shared(&mut state);
    walk_forward(&mut state);
    let fields = state.fields.clone();

    state.begin_submit();
    state.fail_submit("Stack is not running");
    assert_eq!(state.step, Step::Error);
    assert_eq!(state.transient_error.as_deref(), Some("Stack is not running"));

    assert!(state.go_back());
    assert_eq!(state.step, Step::Database);
    assert_eq!(state.phase, WizardPhase::Idle);
    assert!(state.transient_error.is_none());
    assert_eq!(state.fields, fields);
}

#[test]
fn reset_returns_to_defaults() {
    let mut state = WizardState::new();
    state.set_variant(Variant::Regular);
    fill_regular(&mut state);
    walk_forward(&mut state);
    state.reset();
    assert_eq!(state, WizardState::new());
}

#[test]
fn step_index_and_count() {
    let mut state = WizardState::new();
    assert_eq!(state.step_index(), 0);
    assert_eq!(state.step_count(), 6);
    state.set_variant(Variant::Regular);
    assert_eq!(state.step_count(), 8);
    state.advance_step();
    assert_eq!(state.step_index(), 1);
}

#[test]
fn step_always_in_variant_graph() {
    let mut state = WizardState::new();
    state.set_variant(Variant::Regular);
    fill_regular(&mut state);
    loop {
        assert!(step_graph::contains(state.variant, state.step));
        if !state.advance_step() {
            break;
        }
    }
    while state.go_back() {
        assert!(step_graph::contains(state.variant, state.step));
    }
    assert_eq!(state.step, Step::Mode);
}
