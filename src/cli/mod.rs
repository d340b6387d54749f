//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the service layer. Every command
//! prints its result as pretty JSON on stdout.

pub mod alerts;
pub mod budget;
pub mod category;
pub mod data;
pub mod expense;
pub mod income;
pub mod notify;

pub use alerts::{handle_alerts_command, AlertsCommands};
pub use budget::{handle_budget_command, BudgetCommands};
pub use category::{handle_category_command, CategoryCommands};
pub use data::{handle_data_command, DataCommands};
pub use expense::{handle_expense_command, ExpenseCommands};
pub use income::{handle_income_command, IncomeCommands};
pub use notify::{cli_scheduler, handle_notify_command, NotifyCommands};

use chrono::{Datelike, Local, NaiveDate};
use serde::Serialize;

use crate::error::{LedgerError, LedgerResult};
use crate::models::Money;

/// Print a value as pretty JSON on stdout
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> LedgerResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Parse a user-entered amount such as "12.50"
pub fn parse_money(s: &str) -> LedgerResult<Money> {
    Money::parse(s).map_err(|e| LedgerError::Validation(e.to_string()))
}

/// Parse a `YYYY-MM-DD` date, defaulting to today
pub fn parse_date(s: Option<&str>) -> LedgerResult<NaiveDate> {
    match s {
        None => Ok(Local::now().date_naive()),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            LedgerError::Validation(format!("Invalid date '{}': expected YYYY-MM-DD", s))
        }),
    }
}

/// Parse a `YYYY-MM` month into a month index (0-11) and year
pub fn parse_month(s: &str) -> LedgerResult<(u32, i32)> {
    let invalid = || LedgerError::Validation(format!("Invalid month '{}': expected YYYY-MM", s));

    let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&month) {
        return Err(invalid());
    }
    Ok((month - 1, year))
}

/// Month index (0-11) and year of today
pub fn current_month() -> (u32, i32) {
    let today = Local::now().date_naive();
    (today.month0(), today.year())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_month() {
        assert_eq!(parse_month("2025-01").unwrap(), (0, 2025));
        assert_eq!(parse_month("2025-12").unwrap(), (11, 2025));
        assert!(parse_month("2025-13").is_err());
        assert!(parse_month("2025").is_err());
        assert!(parse_month("jan-2025").is_err());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date(Some("2025-02-28")).unwrap(),
            NaiveDate::from_ymd_opt(2025, 2, 28).unwrap()
        );
        assert!(parse_date(Some("2025-02-30")).unwrap_err().is_validation());
        assert!(parse_date(None).is_ok());
    }

    #[test]
    fn test_parse_money() {
        assert_eq!(parse_money("12.50").unwrap().cents(), 1250);
        assert!(parse_money("twelve").unwrap_err().is_validation());
    }
}
