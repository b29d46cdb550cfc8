//! Ledger summaries for the finance and admin dashboards.

use std::collections::BTreeMap;

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::models::Transaction;

/// Transactions shown on the finance page.
const RECENT_TRANSACTIONS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyRevenue {
    pub year: i32,
    /// 1-12
    pub month: u32,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinanceOverview {
    /// Most recent first
    pub transactions: Vec<Transaction>,
    /// Inbound amounts per calendar month, oldest first
    pub revenue_by_month: Vec<MonthlyRevenue>,
}

/// Headline figures for the admin landing page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminStats {
    pub active_enrolled: usize,
    pub total_revenue: f64,
    /// Total of approved scholarship awards
    pub scholarship_burn: f64,
}

/// Sum of inbound amounts.
pub fn total_revenue(transactions: &[Transaction]) -> f64 {
    transactions
        .iter()
        .filter(|tx| tx.is_inbound())
        .map(|tx| tx.amount)
        .sum()
}

/// `transactions` may come in any order.
pub fn summarize_finances(transactions: &[Transaction]) -> FinanceOverview {
    let mut by_month: BTreeMap<(i32, u32), f64> = BTreeMap::new();
    for tx in transactions.iter().filter(|tx| tx.is_inbound()) {
        *by_month.entry((tx.date.year(), tx.date.month())).or_default() += tx.amount;
    }

    let mut recent = transactions.to_vec();
    recent.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
    recent.truncate(RECENT_TRANSACTIONS);

    FinanceOverview {
        transactions: recent,
        revenue_by_month: by_month
            .into_iter()
            .map(|((year, month), amount)| MonthlyRevenue { year, month, amount })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewTransaction, TransactionDirection, TransactionId};
    use chrono::{Duration, TimeZone, Utc};

    fn tx(id: i64, amount: f64, direction: TransactionDirection, date: chrono::DateTime<Utc>) -> Transaction {
        let new = NewTransaction {
            description: format!("Entry {}", id),
            amount,
            direction,
            date: Some(date),
        };
        Transaction::from_new(TransactionId::new(id), new, date)
    }

    #[test]
    fn test_outbound_is_not_revenue() {
        let now = Utc::now();
        let ledger = vec![
            tx(1, 100.0, TransactionDirection::Inbound, now),
            tx(2, 40.0, TransactionDirection::Outbound, now),
            tx(3, 25.5, TransactionDirection::Inbound, now),
        ];
        assert_eq!(total_revenue(&ledger), 125.5);
    }

    #[test]
    fn test_monthly_revenue_separates_years() {
        let jan_2025 = Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap();
        let jan_2026 = Utc.with_ymd_and_hms(2026, 1, 3, 12, 0, 0).unwrap();
        let ledger = vec![
            tx(1, 10.0, TransactionDirection::Inbound, jan_2026),
            tx(2, 5.0, TransactionDirection::Inbound, jan_2025),
            tx(3, 7.0, TransactionDirection::Inbound, jan_2026 + Duration::days(2)),
            tx(4, 99.0, TransactionDirection::Outbound, jan_2026),
        ];

        let months = summarize_finances(&ledger).revenue_by_month;
        assert_eq!(
            months,
            vec![
                MonthlyRevenue {
                    year: 2025,
                    month: 1,
                    amount: 5.0
                },
                MonthlyRevenue {
                    year: 2026,
                    month: 1,
                    amount: 17.0
                },
            ]
        );
    }

    #[test]
    fn test_only_the_ten_latest_transactions_are_listed() {
        let start = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
        let ledger: Vec<Transaction> = (1..=12)
            .map(|i| tx(i, 1.0, TransactionDirection::Inbound, start + Duration::hours(i)))
            .collect();

        let recent = summarize_finances(&ledger).transactions;
        assert_eq!(recent.len(), 10);
        assert_eq!(recent.first().map(|t| t.id.value()), Some(12));
        assert_eq!(recent.last().map(|t| t.id.value()), Some(3));
    }
}
