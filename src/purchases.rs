use crate::api::ApiClient;
use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum PurchaseStatus {
    Pending,
    Completed,
    Cancelled,
}

/// A purchase the user recorded in a chat, with the backend's cooling-off
/// verdict attached.
#[derive(Debug, Clone, Deserialize)]
pub struct Purchase {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub category: String,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    pub status: PurchaseStatus,
    pub cooling_days: u32,
    #[serde(default)]
    pub available_date: Option<String>,
    #[serde(default)]
    pub notify_excluded: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewPurchase {
    pub name: String,
    pub price: f64,
    pub category: String,
    pub picture: Option<String>,
    pub url: Option<String>,
}

/// Backend verdict for a hypothetical purchase: cooling days from the
/// profile's ranges plus days needed to save up, with a human-readable
/// recommendation.
#[derive(Debug, Clone, Deserialize)]
pub struct PurchaseAnalysis {
    pub is_blacklisted: bool,
    pub cooling_days: u32,
    pub savings_days: u32,
    pub total_days: u32,
    #[serde(default)]
    pub available_date: Option<String>,
    pub recommendation: String,
}

#[derive(Debug, Clone, Serialize)]
struct AnalyzeRequest<'a> {
    price: f64,
    category: &'a str,
}

#[derive(Debug, Clone, Serialize)]
struct StatusUpdateRequest {
    status: Option<PurchaseStatus>,
    notify_excluded: Option<bool>,
}

pub async fn analyze(
    api: &ApiClient,
    price: f64,
    category: &str,
) -> Result<PurchaseAnalysis, ApiError> {
    api.post_json("/purchases/analyze", &AnalyzeRequest { price, category })
        .await
}

pub async fn create_for_chat(
    api: &ApiClient,
    chat_id: &str,
    purchase: &NewPurchase,
) -> Result<Purchase, ApiError> {
    api.post_json(&format!("/purchases/chat/{chat_id}"), purchase)
        .await
}

pub async fn list_for_chat(api: &ApiClient, chat_id: &str) -> Result<Vec<Purchase>, ApiError> {
    api.get_json(&format!("/purchases/chat/{chat_id}")).await
}

/// Update status and/or notification exclusion. Untouched fields are sent as
/// `null`, which the backend treats as "leave as is".
pub async fn update_status(
    api: &ApiClient,
    purchase_id: &str,
    status: Option<PurchaseStatus>,
    notify_excluded: Option<bool>,
) -> Result<Purchase, ApiError> {
    api.patch_json(
        &format!("/purchases/{purchase_id}"),
        &StatusUpdateRequest {
            status,
            notify_excluded,
        },
    )
    .await
}
