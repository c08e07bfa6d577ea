//! Normalized view of the user's financial profile.
//!
//! The backend's field names drifted between releases (`monthly_income` vs
//! `monthly_salary`, `notification_channel` vs `notify_channel`, ...). The
//! decoder in [`decode`] absorbs that variance into one stable shape so the
//! rest of the client never sees a missing field.

mod decode;
mod sync;

pub use decode::{WireRevision, decode_profile};
pub use sync::ProfileSync;

use serde::{Deserialize, Serialize};
use serde_json::json;
use strum::{Display, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum NotifyChannel {
    None,
    Email,
    App,
    Tg,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum NotifyFrequency {
    Daily,
    Weekly,
    Monthly,
}

/// One cooling-off rule for a price bracket. `max_amount == None` means
/// unbounded. The client performs no contiguity or overlap validation; the
/// backend decides how ranges are applied. Array order is preserved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoolingRange {
    pub min_amount: f64,
    pub max_amount: Option<f64>,
    pub days: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub nickname: String,
    pub email: String,
    pub monthly_income: Option<f64>,
    /// Monthly discretionary/savings budget.
    pub monthly_budget: Option<f64>,
    pub current_savings: Option<f64>,
    pub use_savings: bool,
    pub notify_channel: NotifyChannel,
    pub notify_frequency: NotifyFrequency,
    pub cooling_ranges: Vec<CoolingRange>,
    pub blacklist: Vec<String>,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            nickname: String::new(),
            email: String::new(),
            monthly_income: None,
            monthly_budget: None,
            current_savings: None,
            use_savings: true,
            notify_channel: NotifyChannel::None,
            notify_frequency: NotifyFrequency::Weekly,
            cooling_ranges: Vec::new(),
            blacklist: Vec::new(),
        }
    }
}

/// Full save payload in the current field family. Blank optionals are sent
/// as explicit `null` — the backend contract requires nulls to clear a value,
/// omitted fields would leave it untouched.
pub fn save_payload(profile: &UserProfile) -> serde_json::Value {
    json!({
        "nickname": profile.nickname,
        "email": profile.email,
        "monthly_salary": profile.monthly_income,
        "monthly_savings": profile.monthly_budget,
        "current_savings": profile.current_savings,
        "use_savings": profile.use_savings,
        "notify_channel": profile.notify_channel,
        "notify_frequency": profile.notify_frequency,
        "cooling_ranges": profile.cooling_ranges,
        "blacklist": profile.blacklist,
    })
}
