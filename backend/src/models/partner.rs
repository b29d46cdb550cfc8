//! Partner and affiliate programme records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{PartnerId, ReferralId};

/// Commission every new application starts with.
pub const DEFAULT_COMMISSION_RATE: f64 = 0.2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartnerRole {
    #[default]
    Partner,
    Affiliate,
}

/// A partner or affiliate, from application through approval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Partner {
    pub id: PartnerId,
    pub name: String,
    pub email: String,
    pub role: PartnerRole,
    pub platform: Option<String>,
    pub audience_size: Option<String>,
    pub strategy: Option<String>,
    /// Fraction of referred revenue paid out (0.0-1.0)
    pub commission_rate: f64,
    /// Partners only; set on review
    pub revenue_share: Option<f64>,
    /// Partners only; set on review
    pub tier: Option<String>,
    /// Approved partners and active affiliates
    pub is_approved: bool,
    pub referral_code: String,
    pub applied_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPartnerApplication {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: PartnerRole,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub audience_size: Option<String>,
    #[serde(default)]
    pub strategy: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Approved,
    Rejected,
}

/// Admin decision on an application.
///
/// `revenue_share` and `tier` only apply to partners, `commission_rate` only
/// to affiliates; the others are ignored for the record's role.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationReview {
    pub status: Option<ApplicationStatus>,
    pub revenue_share: Option<f64>,
    pub tier: Option<String>,
    pub commission_rate: Option<f64>,
}

impl ApplicationReview {
    /// First rate that is not a fraction in 0..=1, with its field name.
    pub fn invalid_rate(&self) -> Option<(&'static str, f64)> {
        [
            ("revenue_share", self.revenue_share),
            ("commission_rate", self.commission_rate),
        ]
        .into_iter()
        .find_map(|(field, rate)| rate.filter(|r| !(0.0..=1.0).contains(r)).map(|r| (field, r)))
    }
}

/// Referral code handed out with an application.
pub fn referral_code_for(id: PartnerId) -> String {
    format!("rp-{:06}", id.value())
}

impl Partner {
    /// New applications wait for review at the default commission.
    pub fn from_new(id: PartnerId, new: NewPartnerApplication, applied_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: new.name,
            email: new.email,
            role: new.role,
            platform: new.platform,
            audience_size: new.audience_size,
            strategy: new.strategy,
            commission_rate: DEFAULT_COMMISSION_RATE,
            revenue_share: None,
            tier: None,
            is_approved: false,
            referral_code: referral_code_for(id),
            applied_at,
        }
    }

    pub fn apply(&mut self, review: &ApplicationReview) {
        if let Some(status) = review.status {
            self.is_approved = status == ApplicationStatus::Approved;
        }
        match self.role {
            PartnerRole::Partner => {
                if let Some(share) = review.revenue_share {
                    self.revenue_share = Some(share);
                }
                if let Some(tier) = &review.tier {
                    self.tier = Some(tier.clone());
                }
            }
            PartnerRole::Affiliate => {
                if let Some(rate) = review.commission_rate {
                    self.commission_rate = rate;
                }
            }
        }
    }
}

/// A user who signed up through a partner's referral code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Referral {
    pub id: ReferralId,
    pub partner_id: PartnerId,
    pub name: String,
    pub email: String,
    /// Revenue attributed to the partner for this sign-up
    pub revenue: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewReferral {
    pub referral_code: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub revenue: f64,
}

impl Referral {
    pub fn from_new(id: ReferralId, partner_id: PartnerId, new: NewReferral, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            partner_id,
            name: new.name,
            email: new.email,
            revenue: new.revenue,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn application(role: &str) -> NewPartnerApplication {
        serde_json::from_str(&format!(
            r#"{{"name": "Rae", "email": "rae@example.com", "role": "{}", "platform": "YouTube"}}"#,
            role
        ))
        .unwrap()
    }

    #[test]
    fn test_new_application_waits_for_review() {
        let partner = Partner::from_new(PartnerId::new(42), application("partner"), Utc::now());
        assert!(!partner.is_approved);
        assert_eq!(partner.commission_rate, DEFAULT_COMMISSION_RATE);
        assert_eq!(partner.referral_code, "rp-000042");
        assert_eq!(partner.platform.as_deref(), Some("YouTube"));
    }

    #[test]
    fn test_review_only_touches_fields_of_the_role() {
        let review = ApplicationReview {
            status: Some(ApplicationStatus::Approved),
            revenue_share: Some(0.35),
            tier: Some("Gold".to_string()),
            commission_rate: Some(0.3),
        };

        let mut partner = Partner::from_new(PartnerId::new(1), application("partner"), Utc::now());
        partner.apply(&review);
        assert!(partner.is_approved);
        assert_eq!(partner.revenue_share, Some(0.35));
        assert_eq!(partner.tier.as_deref(), Some("Gold"));
        assert_eq!(partner.commission_rate, DEFAULT_COMMISSION_RATE);

        let mut affiliate = Partner::from_new(PartnerId::new(2), application("affiliate"), Utc::now());
        affiliate.apply(&review);
        assert!(affiliate.is_approved);
        assert_eq!(affiliate.commission_rate, 0.3);
        assert!(affiliate.revenue_share.is_none());
        assert!(affiliate.tier.is_none());
    }

    #[test]
    fn test_rates_must_be_fractions() {
        let review = ApplicationReview {
            commission_rate: Some(20.0),
            ..Default::default()
        };
        assert_eq!(review.invalid_rate(), Some(("commission_rate", 20.0)));
        assert_eq!(ApplicationReview::default().invalid_rate(), None);
    }
}
