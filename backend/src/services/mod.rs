//! Application services that sit beside the repository layer.
//!
//! Storage-backed operations live in [`crate::db::services`]; this module
//! holds the pure dashboard computations and the access-grant integration.

pub mod access_grant;
pub mod faculty_stats;
pub mod finance;
pub mod partner_dashboard;
#[cfg(feature = "access-grant")]
pub mod platform_client;
pub mod session;

pub use access_grant::{AccessGrantClient, AccessGrantError, AccessGranter};
pub use faculty_stats::{compute_faculty_stats, FacultyStats};
pub use finance::{summarize_finances, total_revenue, AdminStats, FinanceOverview, MonthlyRevenue};
pub use partner_dashboard::{compute_partner_dashboard, DailyRevenue, PartnerDashboard};
#[cfg(feature = "access-grant")]
pub use platform_client::HttpPlatformClient;
pub use session::{
    extract_csrf_token, init_session_cache, session_cache, AccessSession, SessionAuthenticator,
    SessionCache, SessionError,
};
