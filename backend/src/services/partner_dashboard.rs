//! Referral analytics for a partner's dashboard.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{Partner, Referral};

/// How many conversions the dashboard lists.
const RECENT_CONVERSIONS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRevenue {
    pub date: NaiveDate,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartnerDashboard {
    pub referral_code: String,
    pub total_revenue: f64,
    pub active_referrals: usize,
    /// Revenue per UTC day, oldest first
    pub revenue_chart: Vec<DailyRevenue>,
    /// Newest referrals first
    pub recent_conversions: Vec<Referral>,
}

/// `referrals` may come in any order.
pub fn compute_partner_dashboard(partner: &Partner, referrals: &[Referral]) -> PartnerDashboard {
    let mut by_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for referral in referrals {
        *by_day.entry(referral.created_at.date_naive()).or_default() += referral.revenue;
    }

    let mut newest: Vec<Referral> = referrals.to_vec();
    newest.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    newest.truncate(RECENT_CONVERSIONS);

    PartnerDashboard {
        referral_code: partner.referral_code.clone(),
        total_revenue: referrals.iter().map(|r| r.revenue).sum(),
        active_referrals: referrals.len(),
        revenue_chart: by_day
            .into_iter()
            .map(|(date, revenue)| DailyRevenue { date, revenue })
            .collect(),
        recent_conversions: newest,
    }
}
