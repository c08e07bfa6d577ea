use crate::app::App;
use crate::payment;
use crate::ui::style;
use anyhow::Result;

pub async fn tariffs(app: &App) -> Result<()> {
    super::ensure_signed_in(app)?;
    let catalog = payment::list_tariffs(&app.api).await?;

    if !catalog.can_purchase {
        let reason = catalog
            .disabled_reason
            .clone()
            .unwrap_or_else(|| "Purchases are not available for this account.".to_string());
        println!("{}", style::warn(reason));
    }
    if catalog.tariffs.is_empty() {
        println!("{}", style::dim("No tariffs available."));
        return Ok(());
    }

    for tariff in &catalog.tariffs {
        println!(
            "{}  {}  {} {} / {}",
            style::value(&tariff.id),
            style::header(&tariff.title),
            tariff.price,
            tariff.currency,
            tariff.period
        );
        if let Some(description) = &tariff.description {
            println!("    {}", style::dim(description));
        }
        for limitation in &tariff.limitations {
            println!("    - {limitation}");
        }
        if !tariff.is_available {
            println!("    {}", style::dim("(currently unavailable)"));
        }
    }
    Ok(())
}

pub async fn buy(app: &App, tariff_id: &str) -> Result<()> {
    super::ensure_signed_in(app)?;
    let confirmation_url = payment::create_payment(&app.api, tariff_id).await?;
    println!("Open this link to complete the payment:");
    println!("  {}", style::url(confirmation_url));
    Ok(())
}
