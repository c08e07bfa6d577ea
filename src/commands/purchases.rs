use crate::app::App;
use crate::purchases;
use crate::ui::style;
use anyhow::Result;

pub async fn analyze(app: &App, price: f64, category: &str) -> Result<()> {
    super::ensure_signed_in(app)?;
    let verdict = purchases::analyze(&app.api, price, category).await?;

    if verdict.is_blacklisted {
        println!("{}", style::warn("This category is on your blacklist."));
    } else {
        println!(
            "Cooling-off {} day(s), saving up {} day(s), total {} day(s).",
            verdict.cooling_days, verdict.savings_days, verdict.total_days
        );
        if let Some(date) = &verdict.available_date {
            println!("Comfortable purchase date: {}", style::value(date));
        }
    }
    println!("{}", verdict.recommendation);
    Ok(())
}
