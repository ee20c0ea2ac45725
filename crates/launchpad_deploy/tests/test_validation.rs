use launchpad_deploy::fields::{FieldUpdate, NetworkMode, WizardFields};
use launchpad_deploy::step_graph::Step;
use launchpad_deploy::validation::{can_advance, field_errors, validate_password};

fn with(updates: Vec<FieldUpdate>) -> WizardFields {
    let mut fields = WizardFields::default();
    for update in updates {
        fields.apply(update);
    }
    fields
}

#[test]
fn database_password_policy() {
    let base = || vec![FieldUpdate::DatabaseUsername("drb".into())];

    let mut short = base();
    short.push(FieldUpdate::DatabasePassword("abc".into()));
    assert!(!can_advance(Step::Database, &with(short)));

    let mut reserved = base();
    reserved.push(FieldUpdate::DatabasePassword("good pass".into()));
    assert!(!can_advance(Step::Database, &with(reserved)));

    let mut good = base();
    good.push(FieldUpdate::DatabasePassword("GoodPass123".into()));
    assert!(can_advance(Step::Database, &with(good)));
}

#[test]
fn database_requires_username() {
    let fields = with(vec![FieldUpdate::DatabasePassword("GoodPass123".into())]);
    let errors = field_errors(Step::Database, &fields);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field, "databaseUsername");
}

#[test]
fn password_messages_name_the_problem() {
    assert!(validate_password("abc").unwrap_err().contains("at least 8"));
    assert!(validate_password("abcdefgh@").unwrap_err().contains("'@'"));
    assert!(validate_password("abcd efgh").unwrap_err().contains("space"));
}

#[test]
fn config_accepts_key_with_or_without_prefix() {
    let bare = with(vec![FieldUpdate::PrivateKey("ab".repeat(32))]);
    assert!(can_advance(Step::Config, &bare));

    let prefixed = with(vec![FieldUpdate::PrivateKey(format!("0x{}", "ab".repeat(32)))]);
    assert!(can_advance(Step::Config, &prefixed));

    let short = with(vec![FieldUpdate::PrivateKey("ab".repeat(31))]);
    assert!(!can_advance(Step::Config, &short));
}

#[test]
fn config_requires_node_port() {
    let fields = with(vec![
        FieldUpdate::PrivateKey("ab".repeat(32)),
        FieldUpdate::NodePort(String::new()),
    ]);
    let errors = field_errors(Step::Config, &fields);
    assert_eq!(errors[0].field, "nodePort");
}

#[test]
fn leader_connection_checks_every_field() {
    let fields = with(vec![
        FieldUpdate::LeaderIp("10.0.0.5".into()),
        FieldUpdate::LeaderPort("0".into()),
        FieldUpdate::LeaderAddress("0x1234".into()),
    ]);
    let mut names: Vec<_> = field_errors(Step::LeaderConnection, &fields)
        .into_iter()
        .map(|e| e.field)
        .collect();
    names.sort();
    assert_eq!(names, vec!["leaderAddress", "leaderPort"]);

    let fixed = with(vec![
        FieldUpdate::LeaderIp("10.0.0.5".into()),
        FieldUpdate::LeaderPort("61280".into()),
        FieldUpdate::LeaderAddress(format!("0x{}", "Ab".repeat(20))),
    ]);
    assert!(can_advance(Step::LeaderConnection, &fixed));
}

#[test]
fn ec2_and_aws_require_values() {
    let fields = WizardFields::default();
    assert!(!can_advance(Step::Ec2, &fields));
    assert!(!can_advance(Step::Aws, &fields));

    let filled = with(vec![
        FieldUpdate::KeyPairName("ops".into()),
        FieldUpdate::AwsCredential("cred".into()),
        FieldUpdate::AwsRegion("us-east-1".into()),
    ]);
    assert!(can_advance(Step::Ec2, &filled));
    assert!(can_advance(Step::Aws, &filled));
}

#[test]
fn custom_network_requires_http_url() {
    let scheme_less = with(vec![
        FieldUpdate::NetworkMode(NetworkMode::Custom),
        FieldUpdate::RpcUrl("localhost:8545".into()),
        FieldUpdate::ChainId("31337".into()),
    ]);
    let errors = field_errors(Step::Network, &scheme_less);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field, "rpcUrl");
    assert!(errors[0].message.contains("http(s)"));

    let good = with(vec![
        FieldUpdate::NetworkMode(NetworkMode::Custom),
        FieldUpdate::RpcUrl(" http://localhost:8545 ".into()),
        FieldUpdate::ChainId("31337".into()),
    ]);
    assert!(can_advance(Step::Network, &good));
}

#[test]
fn deployed_network_must_be_known() {
    assert!(can_advance(Step::Network, &WizardFields::default()));

    let unknown = with(vec![FieldUpdate::DeployedNetwork("atlantis".into())]);
    let errors = field_errors(Step::Network, &unknown);
    assert_eq!(errors[0].field, "deployedNetwork");

    let sepolia = with(vec![FieldUpdate::DeployedNetwork("sepolia".into())]);
    assert!(can_advance(Step::Network, &sepolia));
}
