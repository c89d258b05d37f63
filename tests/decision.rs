//! Routing decision properties against the in-memory backend.
//!
//! Run with: cargo test --test decision

use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use lcrd::reference::{
    MemoryReferenceData, Operator, OperatorId, OperatorStatus, PrefixRule, ReferenceSeed,
};
use lcrd::router::{
    normalize_msisdn, DecisionComposer, NoRouteReason, Outcome, RoutingError, RoutingRequest,
};

fn operator(id: i64, connector: &str, price: Decimal, health: u8) -> Operator {
    Operator {
        id: OperatorId(id),
        name: connector.to_uppercase(),
        country: "UZ".to_string(),
        mcc: "434".to_string(),
        mnc: format!("{:02}", id),
        connector_id: connector.to_string(),
        status: OperatorStatus::Active,
        price_per_sms: price,
        currency: "USD".to_string(),
        health_score: health,
        priority: 0,
    }
}

fn rule(country_code: &str, prefix: &str, op: i64) -> PrefixRule {
    PrefixRule {
        country_code: country_code.to_string(),
        prefix: prefix.to_string(),
        operator_id: OperatorId(op),
        mcc: "434".to_string(),
        mnc: String::new(),
    }
}

fn composer(operators: Vec<Operator>, prefixes: Vec<PrefixRule>) -> (DecisionComposer, Arc<MemoryReferenceData>) {
    let data = Arc::new(MemoryReferenceData::from_seed(ReferenceSeed { operators, prefixes }).unwrap());
    (DecisionComposer::new(data.clone()), data)
}

fn request(destination: &str) -> RoutingRequest {
    RoutingRequest::new(destination, "acct-1", 1)
}

#[tokio::test]
async fn test_longest_prefix_selects_more_specific_rule() {
    let (composer, _) = composer(
        vec![operator(1, "smpp-a", dec!(0.01), 80), operator(2, "smpp-b", dec!(0.02), 80)],
        vec![rule("998", "9", 1), rule("998", "90", 2)],
    );

    let decision = composer.decide(&request("+998901234567")).await.unwrap();
    assert_eq!(decision.primary_connector_id, "smpp-b");
    assert_eq!(decision.outcome, Outcome::Success);
}

#[tokio::test]
async fn test_inactive_operator_is_excluded() {
    let mut b = operator(2, "smpp-b", dec!(0.02), 80);
    b.status = OperatorStatus::Suspended;
    let (composer, _) = composer(
        vec![operator(1, "smpp-a", dec!(0.01), 80), b],
        vec![rule("998", "90", 2)],
    );

    let err = composer.decide(&request("998901234567")).await.unwrap_err();
    assert!(matches!(err, RoutingError::NoRoute(_)));
}

#[tokio::test]
async fn test_backup_ordering() {
    let (composer, _) = composer(
        vec![
            operator(1, "smpp-a", dec!(10), 80),
            operator(2, "smpp-b", dec!(8), 50),
            operator(3, "smpp-c", dec!(8), 90),
        ],
        vec![rule("998", "90", 1)],
    );

    let decision = composer.decide(&request("998901234567")).await.unwrap();
    assert_eq!(decision.primary_connector_id, "smpp-a");
    assert_eq!(decision.backup_connector_ids, vec!["smpp-c", "smpp-b"]);
}

#[tokio::test]
async fn test_backup_cap() {
    let mut operators = vec![operator(1, "smpp-primary", dec!(0.05), 80)];
    for id in 2..=6 {
        operators.push(operator(id, &format!("smpp-{}", id), Decimal::new(id, 3), 80));
    }
    let (composer, _) = composer(operators, vec![rule("998", "90", 1)]);

    let decision = composer.decide(&request("998901234567")).await.unwrap();
    assert_eq!(decision.backup_connector_ids.len(), 3);
    assert!(!decision
        .backup_connector_ids
        .contains(&"smpp-primary".to_string()));
}

#[tokio::test]
async fn test_backups_are_not_geography_filtered() {
    let mut foreign = operator(9, "smpp-mz", dec!(0.001), 80);
    foreign.country = "MZ".to_string();
    let (composer, _) = composer(
        vec![operator(1, "smpp-a", dec!(0.05), 80), foreign],
        vec![rule("998", "90", 1), rule("258", "84", 9)],
    );

    let decision = composer.decide(&request("998901234567")).await.unwrap();
    assert_eq!(decision.backup_connector_ids, vec!["smpp-mz"]);
}

#[tokio::test]
async fn test_equal_length_tie_break() {
    let mut low = operator(5, "smpp-low", dec!(0.01), 80);
    low.priority = 1;
    let mut high = operator(7, "smpp-high", dec!(0.01), 80);
    high.priority = 0;
    let same = operator(6, "smpp-same", dec!(0.01), 80);

    // Same key, different priority: priority 0 wins
    let (composer_a, _) = composer(
        vec![low.clone(), high.clone()],
        vec![rule("998", "90", 5), rule("+998", "90", 7)],
    );
    let decision = composer_a.decide(&request("998901234567")).await.unwrap();
    assert_eq!(decision.primary_connector_id, "smpp-high");

    // Same key, same priority: lower id wins
    let (composer_b, _) = composer(
        vec![high, same],
        vec![rule("998", "90", 7), rule("998", "90", 6)],
    );
    let decision = composer_b.decide(&request("998901234567")).await.unwrap();
    assert_eq!(decision.primary_connector_id, "smpp-same");
}

#[tokio::test]
async fn test_decisions_are_deterministic() {
    let (composer, _) = composer(
        vec![
            operator(1, "smpp-a", dec!(0.01), 80),
            operator(2, "smpp-b", dec!(0.01), 80),
            operator(3, "smpp-c", dec!(0.01), 80),
            operator(4, "smpp-d", dec!(0.01), 80),
        ],
        vec![rule("998", "90", 1)],
    );

    let first = composer.decide(&request("998901234567")).await.unwrap();
    for _ in 0..10 {
        assert_eq!(composer.decide(&request("998901234567")).await.unwrap(), first);
    }
    assert_eq!(first.backup_connector_ids, vec!["smpp-b", "smpp-c", "smpp-d"]);
}

#[tokio::test]
async fn test_reload_changes_next_decision() {
    let (composer, data) = composer(
        vec![operator(1, "smpp-a", dec!(0.01), 80), operator(2, "smpp-b", dec!(0.02), 80)],
        vec![rule("998", "90", 1)],
    );
    assert_eq!(
        composer.decide(&request("998901234567")).await.unwrap().primary_connector_id,
        "smpp-a"
    );

    let mut seed = data.export().unwrap();
    seed.prefixes.push(rule("998", "901", 2));
    data.replace(seed).unwrap();

    assert_eq!(
        composer.decide(&request("998901234567")).await.unwrap().primary_connector_id,
        "smpp-b"
    );
}

#[tokio::test]
async fn test_no_route_names_normalized_destination() {
    let (composer, _) = composer(vec![operator(1, "smpp-a", dec!(0.01), 80)], vec![rule("998", "90", 1)]);

    match composer.decide(&request("+258 84-123-4567")).await.unwrap_err() {
        RoutingError::NoRoute(NoRouteReason::NoMatchingPrefix { destination }) => {
            assert_eq!(destination, "258841234567");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_normalization_is_idempotent() {
    for raw in [
        "+998 90 123-45-67",
        "998901234567",
        "++998901234567",
        " +258-84-123 4567 ",
        "",
        "+",
    ] {
        let once = normalize_msisdn(raw);
        assert_eq!(normalize_msisdn(&once), once, "{:?}", raw);
        assert!(!once.contains(' ') && !once.contains('-') && !once.starts_with('+'));
    }
    assert_eq!(normalize_msisdn("+998 90 123-45-67"), "998901234567");
}
