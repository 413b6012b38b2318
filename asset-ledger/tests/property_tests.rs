//! Property-based tests for ledger invariants
//!
//! These tests use proptest to verify critical invariants:
//! - Money conservation: total supply == Σ(balances)
//! - Owner balance only grows through `fund`
//! - Failed invocations leave state untouched
//! - Split funding equals single funding

use asset_ledger::{AccountId, Amount, Error, InMemoryContext, Ledger};
use proptest::prelude::*;
use std::collections::HashMap;

const ACCOUNTS: usize = 5; // index 0 is the owner

#[derive(Debug, Clone)]
enum Op {
    Fund { caller: usize, target: usize, amount: Amount },
    Transfer { caller: usize, recipient: usize, amount: Amount },
}

fn account(index: usize) -> AccountId {
    if index == 0 {
        AccountId::new("owner")
    } else {
        AccountId::new(format!("account-{index}"))
    }
}

/// Strategy for generating amounts, biased towards small values so
/// transfers regularly succeed
fn amount_strategy() -> impl Strategy<Value = Amount> {
    prop_oneof![
        3 => 0u128..200,
        1 => 0u128..1_000_000,
    ]
}

/// Strategy for generating operations (funding is mostly done by the owner)
fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (prop_oneof![4 => Just(0usize), 1 => 1..ACCOUNTS], 0..ACCOUNTS, amount_strategy())
            .prop_map(|(caller, target, amount)| Op::Fund { caller, target, amount }),
        (0..ACCOUNTS, 0..ACCOUNTS, amount_strategy())
            .prop_map(|(caller, recipient, amount)| Op::Transfer { caller, recipient, amount }),
    ]
}

fn create_test_ledger() -> Ledger {
    Ledger::new("CLR", "Asset Token", account(0))
}

fn balances(ledger: &Ledger) -> Vec<Amount> {
    (0..ACCOUNTS).map(|i| ledger.balance_of(&account(i))).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: ledger matches a simple balance model after any operation sequence
    #[test]
    fn prop_ledger_matches_model(ops in prop::collection::vec(op_strategy(), 1..60)) {
        let context = InMemoryContext::new();
        let mut ledger = create_test_ledger();
        let mut model: HashMap<usize, Amount> = HashMap::new();
        let mut supply: Amount = 0;
        let mut owner_funded: Amount = 0;
        let mut expected_events = 0u64;

        for op in ops {
            match op {
                Op::Fund { caller, target, amount } => {
                    let result = ledger.fund(&account(caller), &account(target), amount);
                    if caller == 0 {
                        prop_assert!(result.is_ok());
                        *model.entry(target).or_default() += amount;
                        supply += amount;
                        if target == 0 {
                            owner_funded += amount;
                        }
                    } else {
                        prop_assert!(matches!(result, Err(Error::Unauthorized)));
                    }
                }
                Op::Transfer { caller, recipient, amount } => {
                    let result = ledger.transfer(&context, &account(caller), &account(recipient), amount);
                    let available = model.get(&caller).copied().unwrap_or(0);
                    if caller == 0 {
                        prop_assert!(matches!(result, Err(Error::OwnerCannotTransfer)));
                    } else if recipient == 0 {
                        prop_assert!(matches!(result, Err(Error::OwnerCannotReceive)));
                    } else if available < amount {
                        prop_assert!(
                            matches!(result, Err(Error::InsufficientBalance { .. })),
                            "expected insufficient balance"
                        );
                    } else {
                        prop_assert!(result.is_ok());
                        *model.entry(caller).or_default() -= amount;
                        *model.entry(recipient).or_default() += amount;
                        expected_events += 1;
                    }
                }
            }

            // Failed calls leave the model, and therefore the ledger, unchanged
            let model_view: Vec<Amount> =
                (0..ACCOUNTS).map(|i| model.get(&i).copied().unwrap_or(0)).collect();
            prop_assert_eq!(balances(&ledger), model_view);

            prop_assert!(ledger.check_supply_invariant());
            prop_assert_eq!(ledger.total_supply(), supply);
            prop_assert_eq!(ledger.balance_of(&account(0)), owner_funded);
            prop_assert_eq!(ledger.sink().len(), expected_events);
        }
    }

    /// Property: funding v1 then v2 equals funding v1 + v2 once
    #[test]
    fn prop_split_funding_equals_single(v1 in 0u128..u64::MAX as u128, v2 in 0u128..u64::MAX as u128) {
        let owner = account(0);
        let target = account(1);

        let mut split = create_test_ledger();
        split.fund(&owner, &target, v1).unwrap();
        split.fund(&owner, &target, v2).unwrap();

        let mut single = create_test_ledger();
        single.fund(&owner, &target, v1 + v2).unwrap();

        prop_assert_eq!(split.balance_of(&target), single.balance_of(&target));
        prop_assert_eq!(split.total_supply(), single.total_supply());
    }

    /// Property: a solvent transfer moves exactly `v` and appends one event
    #[test]
    fn prop_transfer_moves_exact_value(
        (funded, v) in (0u128..10_000).prop_flat_map(|funded| (Just(funded), 0..=funded))
    ) {
        let context = InMemoryContext::new();
        let mut ledger = create_test_ledger();
        let (sender, recipient) = (account(1), account(2));
        ledger.fund(&account(0), &sender, funded).unwrap();

        let receipt = ledger.transfer(&context, &sender, &recipient, v).unwrap();

        prop_assert_eq!(ledger.balance_of(&sender), funded - v);
        prop_assert_eq!(ledger.balance_of(&recipient), v);
        prop_assert_eq!(ledger.total_supply(), funded);

        let events = ledger.events(0, None);
        prop_assert_eq!(events.len(), 1);
        prop_assert_eq!(&events[0].event, &receipt.event);
        prop_assert_eq!(receipt.event.value, v);
    }

    /// Property: exceeding the balance by any margin is rejected without effect
    #[test]
    fn prop_overdraft_rejected(funded in 0u128..10_000, excess in 1u128..10_000) {
        let context = InMemoryContext::new();
        let mut ledger = create_test_ledger();
        let (sender, recipient) = (account(1), account(2));
        ledger.fund(&account(0), &sender, funded).unwrap();

        let result = ledger.transfer(&context, &sender, &recipient, funded + excess);

        prop_assert!(
            matches!(result, Err(Error::InsufficientBalance { .. })),
            "expected insufficient balance"
        );
        prop_assert_eq!(ledger.balance_of(&sender), funded);
        prop_assert_eq!(ledger.balance_of(&recipient), 0);
        prop_assert_eq!(ledger.total_supply(), funded);
        prop_assert!(ledger.events(0, None).is_empty());
    }
}
