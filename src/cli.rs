//! Read-only reports over a snapshot file, backing the `fintrack_cli` binary.

use std::fmt::Write as _;
use std::path::Path;

use chrono::NaiveDate;
use colored::Colorize;
use rust_decimal::Decimal;

use crate::config::Config;
use crate::domain::{parse_date, CalendarPeriod, Transaction, TransactionType};
use crate::errors::{CliError, EngineError};
use crate::installments::{group_installments_with_shared, InstallmentGroup};
use crate::recurring::{month_view, occurrence_timeline};
use crate::shared::{compute_all_ledgers, compute_ledger, global_pending_net, Balance, Direction};
use crate::utils::persistence::load_snapshot_from_file;

pub const USAGE: &str = "fintrack_cli <command> <snapshot.json> [args]\n\
  month <snapshot> <year> <month>\n\
  timeline <snapshot> <series-id> [count] [--today YYYY-MM-DD]\n\
  installments <snapshot>\n\
  ledger <snapshot> [counterparty]";

/// Runs one command and returns the rendered report.
///
/// `today` is only consulted by `timeline`, and `--today` overrides it.
pub fn run(args: &[String], today: NaiveDate, config: &Config) -> Result<String, CliError> {
    let (command, rest) = args
        .split_first()
        .ok_or_else(|| CliError::Usage(USAGE.into()))?;
    let (snapshot, rest) = rest
        .split_first()
        .ok_or_else(|| CliError::Usage(USAGE.into()))?;
    let records = load_snapshot_from_file(Path::new(snapshot))?;

    match command.as_str() {
        "month" => {
            let [year, month] = rest else {
                return Err(CliError::Usage(USAGE.into()));
            };
            let period = CalendarPeriod::new(parse_number(year)?, parse_number(month)?)?;
            Ok(render_month(&records, period, config))
        }
        "timeline" => {
            let (series_id, options) = rest
                .split_first()
                .ok_or_else(|| CliError::Usage(USAGE.into()))?;
            let (count, today) = timeline_options(options, today, config)?;
            let template = records
                .iter()
                .find(|record| record.id == *series_id)
                .ok_or_else(|| EngineError::InvalidReference(series_id.clone()))?;
            if !template.is_series_template() {
                return Err(EngineError::NotRecurring(series_id.clone()).into());
            }
            Ok(render_timeline(&records, template, count, today, config))
        }
        "installments" => Ok(render_installments(&records, config)),
        "ledger" => match rest {
            [] => Ok(render_all_ledgers(&records, config)),
            [counterparty] => Ok(render_ledger(&compute_ledger(&records, counterparty), config)),
            _ => Err(CliError::Usage(USAGE.into())),
        },
        other => Err(CliError::Usage(format!(
            "unknown command `{}`\n{}",
            other, USAGE
        ))),
    }
}

fn parse_number<T: std::str::FromStr>(raw: &str) -> Result<T, CliError> {
    raw.parse()
        .map_err(|_| CliError::Usage(format!("expected a number, got `{}`", raw)))
}

fn timeline_options(
    options: &[String],
    mut today: NaiveDate,
    config: &Config,
) -> Result<(usize, NaiveDate), CliError> {
    let mut count = config.timeline_horizon;
    let mut iter = options.iter();
    while let Some(option) = iter.next() {
        if option == "--today" {
            let raw = iter
                .next()
                .ok_or_else(|| CliError::Usage("--today needs a date".into()))?;
            today = parse_date(raw)
                .ok_or_else(|| CliError::Usage(format!("invalid date `{}`", raw)))?;
        } else {
            count = parse_number(option)?;
        }
    }
    Ok((count, today))
}

fn money(amount: Decimal, config: &Config) -> String {
    format!("{} {:.2}", config.currency, amount)
}

fn label(record: &Transaction) -> &str {
    if record.description.trim().is_empty() {
        &record.id
    } else {
        &record.description
    }
}

fn render_month(records: &[Transaction], period: CalendarPeriod, config: &Config) -> String {
    let entries = month_view(records, period);
    let mut out = String::new();
    let _ = writeln!(out, "{}", format!("Transactions for {}", period).bold());

    let mut income = Decimal::ZERO;
    let mut expense = Decimal::ZERO;
    for entry in &entries {
        let record = &entry.transaction;
        match record.kind {
            TransactionType::Income => income += record.amount,
            TransactionType::Expense => expense += record.amount,
        }
        let marker = if entry.is_virtual {
            " [projected]"
        } else if entry.is_modified {
            " [edited]"
        } else {
            ""
        };
        let _ = writeln!(
            out,
            "  {}  {:<28} {:>8} {:>14}{}",
            entry.date,
            label(record),
            record.kind.label(),
            money(record.amount, config),
            marker
        );
    }
    if entries.is_empty() {
        let _ = writeln!(out, "  (no transactions)");
    }
    let _ = writeln!(
        out,
        "Income {}  Expenses {}  Net {}",
        money(income, config).green(),
        money(expense, config).red(),
        money(income - expense, config)
    );
    out
}

fn render_timeline(
    records: &[Transaction],
    template: &Transaction,
    count: usize,
    today: NaiveDate,
    config: &Config,
) -> String {
    let timeline = occurrence_timeline(template, records, count, today);
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}",
        format!("Occurrences of {} from {}", label(template), today).bold()
    );
    for occurrence in &timeline {
        let state = if occurrence.is_modified {
            "edited"
        } else if occurrence.is_virtual {
            "projected"
        } else {
            "stored"
        };
        let _ = writeln!(
            out,
            "  #{:<3} {}  {:>14}  {}",
            occurrence.occurrence_number,
            occurrence.date,
            money(occurrence.transaction.amount, config),
            state
        );
    }
    out
}

fn render_group(out: &mut String, group: &InstallmentGroup, config: &Config) {
    let span = match (group.start_date, group.end_date) {
        (Some(start), Some(end)) => format!("{} .. {}", start, end),
        _ => "undated".to_string(),
    };
    let _ = writeln!(
        out,
        "  {:<28} {}/{} paid  {} of {}  {}",
        group.description,
        group.paid_count,
        group.parcels.len(),
        money(group.paid_amount, config),
        money(group.total_amount, config),
        span
    );
}

fn render_installments(records: &[Transaction], config: &Config) -> String {
    let overview = group_installments_with_shared(records);
    let mut out = String::new();
    let _ = writeln!(out, "{}", "Installment purchases".bold());
    for group in &overview.groups {
        render_group(&mut out, group, config);
    }
    if overview.groups.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    if !overview.shared.is_empty() {
        let _ = writeln!(out, "{}", "Shared reimbursements".bold());
        for group in &overview.shared {
            render_group(&mut out, group, config);
        }
    }
    out
}

fn render_ledger(balance: &Balance, config: &Config) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", format!("Balance with {}", balance.counterparty).bold());
    for entry in &balance.entries {
        let direction = match entry.direction {
            Direction::OwedToUser => "owes you",
            Direction::UserOwes => "you owe",
        };
        let state = if entry.settled { "settled" } else { "pending" };
        let _ = writeln!(
            out,
            "  {:<28} {:<9} {:>14}  {}",
            if entry.description.is_empty() {
                entry.transaction_id.as_str()
            } else {
                entry.description.as_str()
            },
            direction,
            money(entry.amount, config),
            state
        );
    }
    let _ = writeln!(
        out,
        "Pending owed to you {}  Pending you owe {}",
        money(balance.pending_owed_to_user, config),
        money(balance.pending_user_owes, config)
    );
    let _ = writeln!(out, "Net {}", colored_net(balance.net_balance, config));
    out
}

fn render_all_ledgers(records: &[Transaction], config: &Config) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", "Shared balances".bold());
    for balance in compute_all_ledgers(records) {
        let _ = writeln!(
            out,
            "  {:<20} {}",
            balance.counterparty,
            colored_net(balance.net_balance, config)
        );
    }
    let _ = writeln!(
        out,
        "Overall {}",
        colored_net(global_pending_net(records), config)
    );
    out
}

fn colored_net(net: Decimal, config: &Config) -> String {
    let text = money(net, config);
    if net.is_sign_negative() && !net.is_zero() {
        text.red().to_string()
    } else if net.is_zero() {
        text
    } else {
        text.green().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Frequency;
    use crate::utils::persistence::save_snapshot_to_file;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|item| item.to_string()).collect()
    }

    #[test]
    fn month_report_marks_projected_rows() {
        colored::control::set_override(false);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        let records = vec![Transaction::expense("rent", date(2024, 1, 5), dec!(900))
            .with_description("Rent")
            .recurring(Frequency::Monthly)];
        save_snapshot_to_file(&records, &path).unwrap();

        let out = run(
            &args(&["month", path.to_str().unwrap(), "2024", "3"]),
            date(2024, 3, 1),
            &Config::default(),
        )
        .unwrap();
        assert!(out.contains("Transactions for 2024-03"));
        assert!(out.contains("Rent"));
        assert!(out.contains("[projected]"));
        assert!(out.contains("USD 900.00"));
    }

    #[test]
    fn unknown_command_is_a_usage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        save_snapshot_to_file(&[], &path).unwrap();
        let result = run(
            &args(&["bogus", path.to_str().unwrap()]),
            date(2024, 1, 1),
            &Config::default(),
        );
        assert!(matches!(result, Err(CliError::Usage(_))));
    }

    #[test]
    fn timeline_options_parse_count_and_today() {
        let (count, today) = timeline_options(
            &args(&["5", "--today", "2024-07-01"]),
            date(2020, 1, 1),
            &Config::default(),
        )
        .unwrap();
        assert_eq!(count, 5);
        assert_eq!(today, date(2024, 7, 1));
    }
}
