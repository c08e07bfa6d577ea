use crate::app::App;
use crate::profile::{CoolingRange, UserProfile};
use crate::ui::style;
use anyhow::{Context, Result, anyhow, ensure};

pub struct SetArgs {
    pub nickname: Option<String>,
    pub income: Option<String>,
    pub budget: Option<String>,
    pub savings: Option<String>,
    pub use_savings: Option<bool>,
    pub notify_channel: Option<String>,
    pub notify_frequency: Option<String>,
    pub block: Vec<String>,
    pub unblock: Vec<String>,
    pub ranges: Vec<String>,
}

pub async fn show(app: &App) -> Result<()> {
    super::ensure_signed_in(app)?;
    let Some(profile) = app.profile.refresh().await else {
        anyhow::bail!("could not load the profile; is the backend up?");
    };

    println!("{}", style::header("Profile"));
    println!("  nickname:      {}", display_text(&profile.nickname));
    println!("  email:         {}", display_text(&profile.email));
    println!("  income:        {}", display_amount(profile.monthly_income));
    println!("  budget:        {}", display_amount(profile.monthly_budget));
    println!("  savings:       {}", display_amount(profile.current_savings));
    println!("  use savings:   {}", profile.use_savings);
    println!(
        "  notifications: {} / {}",
        profile.notify_channel, profile.notify_frequency
    );

    println!("{}", style::header("Cooling ranges"));
    if profile.cooling_ranges.is_empty() {
        println!("  {}", style::dim("none (the backend applies its defaults)"));
    }
    for range in &profile.cooling_ranges {
        println!("  {}", display_range(range));
    }

    println!("{}", style::header("Blacklist"));
    if profile.blacklist.is_empty() {
        println!("  {}", style::dim("empty"));
    } else {
        println!("  {}", profile.blacklist.join(", "));
    }
    Ok(())
}

pub async fn set(app: &App, args: SetArgs) -> Result<()> {
    super::ensure_signed_in(app)?;
    let Some(current) = app.profile.refresh().await else {
        anyhow::bail!("could not load the profile to update; is the backend up?");
    };

    let mut profile: UserProfile = (*current).clone();
    if let Some(nickname) = args.nickname {
        profile.nickname = nickname;
    }
    if let Some(raw) = args.income {
        profile.monthly_income = parse_amount(&raw)?;
    }
    if let Some(raw) = args.budget {
        profile.monthly_budget = parse_amount(&raw)?;
    }
    if let Some(raw) = args.savings {
        profile.current_savings = parse_amount(&raw)?;
    }
    if let Some(use_savings) = args.use_savings {
        profile.use_savings = use_savings;
    }
    if let Some(raw) = args.notify_channel {
        profile.notify_channel = raw
            .parse()
            .map_err(|_| anyhow!("unknown channel {raw:?} (expected none, email, app or tg)"))?;
    }
    if let Some(raw) = args.notify_frequency {
        profile.notify_frequency = raw
            .parse()
            .map_err(|_| anyhow!("unknown frequency {raw:?} (expected daily, weekly or monthly)"))?;
    }
    if !args.ranges.is_empty() {
        profile.cooling_ranges = args
            .ranges
            .iter()
            .map(|raw| parse_range(raw))
            .collect::<Result<Vec<_>>>()?;
    }
    for category in args.block {
        let category = category.trim().to_string();
        if !category.is_empty() && !profile.blacklist.contains(&category) {
            profile.blacklist.push(category);
        }
    }
    for category in &args.unblock {
        profile.blacklist.retain(|existing| existing != category);
    }

    app.profile.save(&profile).await?;
    println!("{}", style::success("Profile saved."));
    Ok(())
}

fn display_text(text: &str) -> String {
    if text.is_empty() {
        style::dim("not set")
    } else {
        style::value(text)
    }
}

fn display_amount(amount: Option<f64>) -> String {
    match amount {
        Some(amount) => style::value(amount),
        None => style::dim("not set"),
    }
}

fn display_range(range: &CoolingRange) -> String {
    let bracket = match range.max_amount {
        Some(max) => format!("{}..{}", range.min_amount, max),
        None => format!("{}+", range.min_amount),
    };
    format!("{bracket}: {} day(s)", range.days)
}

/// `none` (and friends) clears the value; anything else must be a number.
fn parse_amount(raw: &str) -> Result<Option<f64>> {
    let trimmed = raw.trim();
    if trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("none")
        || trimmed.eq_ignore_ascii_case("null")
    {
        return Ok(None);
    }
    trimmed
        .parse::<f64>()
        .map(Some)
        .with_context(|| format!("not a number: {trimmed:?}"))
}

/// `MIN:MAX:DAYS`, with an empty `MAX` meaning unbounded.
fn parse_range(raw: &str) -> Result<CoolingRange> {
    let parts: Vec<&str> = raw.split(':').collect();
    ensure!(parts.len() == 3, "range must be MIN:MAX:DAYS, got {raw:?}");

    let min_amount = parts[0]
        .trim()
        .parse::<f64>()
        .with_context(|| format!("bad range minimum in {raw:?}"))?;
    let max_amount = if parts[1].trim().is_empty() {
        None
    } else {
        Some(
            parts[1]
                .trim()
                .parse::<f64>()
                .with_context(|| format!("bad range maximum in {raw:?}"))?,
        )
    };
    let days = parts[2]
        .trim()
        .parse::<u32>()
        .with_context(|| format!("bad day count in {raw:?}"))?;

    Ok(CoolingRange {
        min_amount,
        max_amount,
        days,
    })
}
