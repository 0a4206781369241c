mod common;

use common::date;
use fintrack_core::shared::{
    compute_all_ledgers, compute_ledger, counterparties, global_pending_net, Direction,
};
use fintrack_core::Transaction;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// A 50/50 expense the user paid plus its auto-generated reimbursement income.
fn split_pair(id: &str, who: &str, amount: Decimal, reimbursed: bool) -> [Transaction; 2] {
    let reimbursement_id = format!("{id}-reimbursement");
    [
        Transaction::expense(id, date(2024, 5, 10), amount)
            .with_description(id)
            .shared_with(who, false)
            .linked_to(reimbursement_id.clone()),
        Transaction::income(reimbursement_id, date(2024, 5, 10), amount / Decimal::TWO)
            .shared_with(who, false)
            .linked_to(id)
            .paid(reimbursed),
    ]
}

#[test]
fn split_expense_with_unpaid_reimbursement() {
    let records = split_pair("dinner", "Alex", dec!(200), false).to_vec();

    let balance = compute_ledger(&records, "Alex");
    assert_eq!(balance.pending_owed_to_user, dec!(100));
    assert_eq!(balance.pending_user_owes, dec!(0));
    assert_eq!(balance.total_owed_to_user, dec!(100));
    assert_eq!(balance.net_balance, dec!(100));
    assert_eq!(balance.entries.len(), 1, "reimbursement must not add a second debt");
    assert_eq!(balance.entries[0].direction, Direction::OwedToUser);
}

#[test]
fn link_on_the_expense_alone_pairs_the_reimbursement() {
    let records = vec![
        Transaction::expense("e", date(2024, 5, 10), dec!(200))
            .shared_with("Alex", false)
            .linked_to("r"),
        Transaction::income("r", date(2024, 5, 10), dec!(100))
            .shared_with("Alex", false)
            .paid(false),
    ];

    let balance = compute_ledger(&records, "Alex");
    assert_eq!(balance.pending_owed_to_user, dec!(100));
    assert_eq!(balance.entries.len(), 1);
    assert_eq!(balance.entries[0].settlement_id.as_deref(), Some("r"));
    assert_eq!(global_pending_net(&records), dec!(100));
}

#[test]
fn full_debt_expense_counts_entirely_against_user() {
    let records = vec![Transaction::expense("tickets", date(2024, 5, 3), dec!(150))
        .shared_with("Alex", true)
        .paid(false)];

    let balance = compute_ledger(&records, "Alex");
    assert_eq!(balance.pending_user_owes, dec!(150));
    assert_eq!(balance.pending_owed_to_user, dec!(0));
    assert_eq!(balance.net_balance, dec!(-150));
}

#[test]
fn settlement_moves_amounts_out_of_pending() {
    let mut records = split_pair("groceries", "Alex", dec!(90), true).to_vec();
    records.push(
        Transaction::expense("taxi", date(2024, 5, 4), dec!(30))
            .shared_with("Alex", true)
            .paid(true),
    );

    let balance = compute_ledger(&records, "Alex");
    assert_eq!(balance.settled_owed_to_user, dec!(45));
    assert_eq!(balance.settled_user_owes, dec!(30));
    assert_eq!(balance.total_owed_to_user, dec!(45));
    assert_eq!(balance.total_user_owes, dec!(30));
    assert_eq!(balance.pending_owed_to_user, dec!(0));
    assert_eq!(balance.pending_user_owes, dec!(0));
    assert!(balance.is_even());
}

#[test]
fn other_counterparties_and_private_records_are_ignored() {
    let mut records = split_pair("cinema", "Jordan", dec!(40), false).to_vec();
    records.push(Transaction::expense("rent", date(2024, 5, 1), dec!(1000)));
    records.push(
        Transaction::expense("gift", date(2024, 5, 2), dec!(60)).shared_with("Alex", true),
    );

    let alex = compute_ledger(&records, "Alex");
    assert_eq!(alex.entries.len(), 1);
    assert_eq!(alex.net_balance, dec!(-60));

    let nobody = compute_ledger(&records, "Taylor");
    assert!(nobody.entries.is_empty());
    assert_eq!(nobody.net_balance, dec!(0));
}

#[test]
fn per_counterparty_nets_sum_to_global_net() {
    let mut records = Vec::new();
    records.extend(split_pair("dinner", "Alex", dec!(120), false));
    records.extend(split_pair("hotel", "Jordan", dec!(300), true));
    records.extend(split_pair("bbq", "Jordan", dec!(70), false));
    records.push(
        Transaction::expense("concert", date(2024, 5, 8), dec!(85))
            .shared_with("Alex", true)
            .paid(false),
    );
    records.push(
        Transaction::expense("orphan", date(2024, 5, 9), dec!(16))
            .shared_with("Sam", false)
            .linked_to("deleted-income"),
    );

    assert_eq!(counterparties(&records), vec!["Alex", "Jordan", "Sam"]);
    let per_counterparty: Decimal = compute_all_ledgers(&records)
        .iter()
        .map(|balance| balance.net_balance)
        .sum();
    assert_eq!(per_counterparty, global_pending_net(&records));
    // Alex: 60 - 85, Jordan: 35, Sam: 8
    assert_eq!(per_counterparty, dec!(18));
}
