use crate::api::ApiClient;
use crate::error::ApiError;
use serde_json::{Value, json};

const TARIFFS_PATH: &str = "/payment/tariffs";
const CREATE_PAYMENT_PATH: &str = "/payment/yookassa/create";

#[derive(Debug, Clone, PartialEq)]
pub struct Tariff {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub price: f64,
    pub currency: String,
    pub period: String,
    pub limitations: Vec<String>,
    pub is_available: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TariffCatalog {
    pub tariffs: Vec<Tariff>,
    pub can_purchase: bool,
    pub disabled_reason: Option<String>,
}

pub async fn list_tariffs(api: &ApiClient) -> Result<TariffCatalog, ApiError> {
    let raw: Value = api.get_json(TARIFFS_PATH).await?;
    Ok(normalize_catalog(&raw))
}

/// Create a YooKassa payment for a tariff and return the confirmation URL
/// the user must open to complete it.
pub async fn create_payment(api: &ApiClient, tariff_id: &str) -> Result<String, ApiError> {
    let raw: Value = api
        .post_json(CREATE_PAYMENT_PATH, &json!({"tariff_id": tariff_id}))
        .await?;
    extract_confirmation_url(&raw).ok_or_else(|| ApiError {
        message: "backend returned no confirmation url".to_string(),
        code: "BAD_RESPONSE".to_string(),
        status: None,
    })
}

/// The tariff payload has drifted across releases; absorb the known shapes
/// so the caller always sees the same catalog.
fn normalize_catalog(raw: &Value) -> TariffCatalog {
    let items = ["tariffs", "items", "plans"]
        .iter()
        .find_map(|key| raw.get(*key).and_then(Value::as_array))
        .cloned()
        .unwrap_or_default();

    let tariffs = items
        .iter()
        .enumerate()
        .map(|(index, item)| normalize_tariff(item, index))
        .collect();

    let can_purchase = ["can_purchase", "is_available", "available"]
        .iter()
        .find_map(|key| raw.get(*key).and_then(Value::as_bool))
        .unwrap_or(true);
    let disabled_reason = ["disabled_reason", "reason"]
        .iter()
        .find_map(|key| raw.get(*key).and_then(Value::as_str))
        .map(str::to_string);

    TariffCatalog {
        tariffs,
        can_purchase,
        disabled_reason,
    }
}

fn normalize_tariff(item: &Value, index: usize) -> Tariff {
    let text = |keys: &[&str]| {
        keys.iter()
            .find_map(|key| item.get(*key).and_then(Value::as_str))
            .map(str::to_string)
    };
    let id = ["id", "code"]
        .iter()
        .find_map(|key| {
            item.get(*key).and_then(|value| match value {
                Value::String(text) => Some(text.clone()),
                Value::Number(number) => Some(number.to_string()),
                _ => None,
            })
        })
        .unwrap_or_else(|| format!("tariff-{index}"));

    let limitations = ["limitations", "limits", "features"]
        .iter()
        .find_map(|key| item.get(*key).and_then(Value::as_array))
        .map(|entries| entries.iter().map(normalize_limitation).collect())
        .unwrap_or_default();

    Tariff {
        id,
        title: text(&["title", "name"]).unwrap_or_else(|| "Plan".to_string()),
        description: text(&["description"]),
        price: ["price", "amount", "cost"]
            .iter()
            .find_map(|key| item.get(*key).and_then(Value::as_f64))
            .unwrap_or(0.0),
        currency: text(&["currency"]).unwrap_or_else(|| "RUB".to_string()),
        period: text(&["period", "billing_period"]).unwrap_or_else(|| "month".to_string()),
        limitations,
        is_available: ["is_available", "available"]
            .iter()
            .find_map(|key| item.get(*key).and_then(Value::as_bool))
            .unwrap_or(true),
    }
}

/// Limitations arrive as plain strings, numbers, or labeled objects.
fn normalize_limitation(item: &Value) -> String {
    match item {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Object(map) => {
            let label = ["title", "name"]
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_str))
                .unwrap_or("Limit");
            if let Some(value) = map.get("value") {
                let value = match value {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                };
                format!("{label}: {value}")
            } else {
                map.get("description")
                    .and_then(Value::as_str)
                    .unwrap_or(label)
                    .to_string()
            }
        }
        other => other.to_string(),
    }
}

fn extract_confirmation_url(raw: &Value) -> Option<String> {
    raw.get("confirmation_url")
        .and_then(Value::as_str)
        .or_else(|| {
            raw.get("confirmation")
                .and_then(|confirmation| confirmation.get("confirmation_url"))
                .and_then(Value::as_str)
        })
        .or_else(|| raw.get("payment_url").and_then(Value::as_str))
        .or_else(|| raw.get("url").and_then(Value::as_str))
        .map(str::to_string)
}
