use super::{CoolingRange, NotifyChannel, NotifyFrequency, UserProfile};
use crate::error::DecodeError;
use serde_json::{Map, Value};

/// Which field family a profile payload speaks.
///
/// The backend renamed its profile fields between releases. The revision only
/// changes one default: an absent notification channel means `app` on current
/// payloads and `none` on legacy ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireRevision {
    /// `monthly_income` / `monthly_free_budget` / `notification_*` /
    /// `cooldown_rules` / `blacklist_categories`.
    Legacy,
    /// `monthly_salary` / `monthly_savings` / `notify_*` / `cooling_ranges` /
    /// `blacklist`.
    Current,
}

const CURRENT_MARKERS: [&str; 6] = [
    "notify_channel",
    "notify_frequency",
    "cooling_ranges",
    "monthly_salary",
    "monthly_savings",
    "blacklist",
];

fn detect_revision(obj: &Map<String, Value>) -> WireRevision {
    if CURRENT_MARKERS.iter().any(|key| obj.contains_key(*key)) {
        WireRevision::Current
    } else {
        WireRevision::Legacy
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// First present alias wins. `null` and empty strings count as absent.
fn string_field(
    obj: &Map<String, Value>,
    aliases: &[&'static str],
) -> Result<Option<String>, DecodeError> {
    for &field in aliases {
        match obj.get(field) {
            None | Some(Value::Null) => continue,
            Some(Value::String(text)) => {
                if text.is_empty() {
                    continue;
                }
                return Ok(Some(text.clone()));
            }
            Some(other) => {
                return Err(DecodeError::FieldType {
                    field,
                    expected: "string",
                    found: type_name(other).to_string(),
                });
            }
        }
    }
    Ok(None)
}

/// Numbers or numeric strings; anything else is a type error.
fn number_field(
    obj: &Map<String, Value>,
    aliases: &[&'static str],
) -> Result<Option<f64>, DecodeError> {
    for &field in aliases {
        match obj.get(field) {
            None | Some(Value::Null) => continue,
            Some(value) => {
                return number_value(value, field).map(Some);
            }
        }
    }
    Ok(None)
}

fn number_value(value: &Value, field: &'static str) -> Result<f64, DecodeError> {
    match value {
        Value::Number(number) => number.as_f64().ok_or(DecodeError::FieldType {
            field,
            expected: "number",
            found: "number".to_string(),
        }),
        Value::String(text) => text.trim().parse::<f64>().map_err(|_| DecodeError::FieldType {
            field,
            expected: "number",
            found: format!("string {text:?}"),
        }),
        other => Err(DecodeError::FieldType {
            field,
            expected: "number",
            found: type_name(other).to_string(),
        }),
    }
}

fn bool_field(obj: &Map<String, Value>, field: &'static str) -> Result<Option<bool>, DecodeError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(value)) => Ok(Some(*value)),
        Some(other) => Err(DecodeError::FieldType {
            field,
            expected: "bool",
            found: type_name(other).to_string(),
        }),
    }
}

fn days_value(value: &Value, field: &'static str) -> Result<u32, DecodeError> {
    let days = number_value(value, field)?;
    if !days.is_finite() || days < 0.0 || days > f64::from(u32::MAX) {
        return Err(DecodeError::FieldType {
            field,
            expected: "non-negative day count",
            found: days.to_string(),
        });
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let days = days as u32;
    Ok(days)
}

fn parse_channel(raw: &str) -> Result<NotifyChannel, DecodeError> {
    raw.parse().map_err(|_| DecodeError::UnknownVariant {
        field: "notify_channel",
        value: raw.to_string(),
    })
}

fn parse_frequency(raw: &str) -> Result<NotifyFrequency, DecodeError> {
    raw.parse().map_err(|_| DecodeError::UnknownVariant {
        field: "notify_frequency",
        value: raw.to_string(),
    })
}

fn decode_range_object(item: &Value) -> Result<CoolingRange, DecodeError> {
    let obj = item.as_object().ok_or(DecodeError::FieldType {
        field: "cooling_ranges",
        expected: "range object",
        found: type_name(item).to_string(),
    })?;

    let min_amount = match obj.get("min_amount") {
        None | Some(Value::Null) => 0.0,
        Some(value) => number_value(value, "min_amount")?,
    };
    let max_amount = match obj.get("max_amount") {
        None | Some(Value::Null) => None,
        Some(value) => Some(number_value(value, "max_amount")?),
    };
    let days = match obj.get("days") {
        None | Some(Value::Null) => {
            return Err(DecodeError::FieldType {
                field: "days",
                expected: "number",
                found: "null".to_string(),
            });
        }
        Some(value) => days_value(value, "days")?,
    };

    Ok(CoolingRange {
        min_amount,
        max_amount,
        days,
    })
}

/// Map form served by older backends: `{"0-5000": 1, "20000+": 7}`. A key is
/// `min-max` or `min+`/`min-` for an unbounded bracket. Maps carry no order,
/// so entries are sorted by lower bound.
fn decode_range_map(map: &Map<String, Value>) -> Result<Vec<CoolingRange>, DecodeError> {
    let mut ranges = Vec::with_capacity(map.len());
    for (key, value) in map {
        let days = days_value(value, "cooling_ranges")?;
        let range = parse_range_key(key).ok_or_else(|| DecodeError::UnknownVariant {
            field: "cooling_ranges",
            value: key.clone(),
        })?;
        ranges.push(CoolingRange {
            min_amount: range.0,
            max_amount: range.1,
            days,
        });
    }
    ranges.sort_by(|a, b| a.min_amount.total_cmp(&b.min_amount));
    Ok(ranges)
}

fn parse_range_key(key: &str) -> Option<(f64, Option<f64>)> {
    let trimmed = key.trim();
    if let Some(min) = trimmed.strip_suffix('+').or_else(|| trimmed.strip_suffix('-')) {
        return min.trim().parse::<f64>().ok().map(|min| (min, None));
    }
    let (min, max) = trimmed.split_once('-')?;
    let min = min.trim().parse::<f64>().ok()?;
    let max = max.trim().parse::<f64>().ok()?;
    Some((min, Some(max)))
}

fn ranges_field(obj: &Map<String, Value>) -> Result<Vec<CoolingRange>, DecodeError> {
    for field in ["cooldown_rules", "cooling_ranges"] {
        match obj.get(field) {
            None | Some(Value::Null) => continue,
            Some(Value::Array(items)) => {
                return items.iter().map(decode_range_object).collect();
            }
            Some(Value::Object(map)) => return decode_range_map(map),
            Some(other) => {
                return Err(DecodeError::FieldType {
                    field: "cooling_ranges",
                    expected: "array or map",
                    found: type_name(other).to_string(),
                });
            }
        }
    }
    Ok(Vec::new())
}

fn blacklist_field(obj: &Map<String, Value>) -> Result<Vec<String>, DecodeError> {
    for field in ["blacklist_categories", "blacklist"] {
        match obj.get(field) {
            None | Some(Value::Null) => continue,
            Some(Value::Array(items)) => {
                return items
                    .iter()
                    .map(|item| match item {
                        Value::String(text) => Ok(text.clone()),
                        other => Err(DecodeError::FieldType {
                            field: "blacklist",
                            expected: "string",
                            found: type_name(other).to_string(),
                        }),
                    })
                    .collect();
            }
            Some(other) => {
                return Err(DecodeError::FieldType {
                    field: "blacklist",
                    expected: "array",
                    found: type_name(other).to_string(),
                });
            }
        }
    }
    Ok(Vec::new())
}

/// Pure decoder from a raw backend profile payload to the normalized model.
///
/// Every accepted alias per field is enumerated here; missing optional fields
/// default so the caller never observes an absent value. Wrong types and
/// unknown enum words fail loudly instead of guessing.
pub fn decode_profile(value: &Value) -> Result<UserProfile, DecodeError> {
    let obj = value.as_object().ok_or(DecodeError::NotAnObject)?;
    let revision = detect_revision(obj);

    let notify_channel = match string_field(obj, &["notification_channel", "notify_channel"])? {
        Some(raw) => parse_channel(&raw)?,
        None => match revision {
            WireRevision::Current => NotifyChannel::App,
            WireRevision::Legacy => NotifyChannel::None,
        },
    };
    let notify_frequency =
        match string_field(obj, &["notification_frequency", "notify_frequency"])? {
            Some(raw) => parse_frequency(&raw)?,
            None => NotifyFrequency::Weekly,
        };

    Ok(UserProfile {
        nickname: string_field(obj, &["nickname"])?.unwrap_or_default(),
        email: string_field(obj, &["email"])?.unwrap_or_default(),
        monthly_income: number_field(obj, &["monthly_income", "monthly_salary"])?,
        monthly_budget: number_field(obj, &["monthly_free_budget", "monthly_savings"])?,
        current_savings: number_field(obj, &["current_savings"])?,
        use_savings: bool_field(obj, "use_savings")?.unwrap_or(true),
        notify_channel,
        notify_frequency,
        cooling_ranges: ranges_field(obj)?,
        blacklist: blacklist_field(obj)?,
    })
}
