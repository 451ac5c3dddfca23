//! ShipGlobal booking from the terminal.

use chrono::Local;
use seller_console::shipglobal::default_pickup;
use seller_console::{PickupAddressId, ShipGlobalOrder};

use super::{CommandError, Console};

/// Options for [`book`].
#[derive(Debug, Default)]
pub struct BookingOptions {
    /// Pickup address id; the account default when absent.
    pub pickup: Option<String>,
    /// Provider code from the rate list. Without one, rates are listed and
    /// nothing is booked.
    pub shipper: Option<String>,
    /// Park the created order as a draft.
    pub draft: bool,
}

/// Validate, quote and optionally book one order with ShipGlobal.
pub async fn book(console: &Console, id: &str, options: BookingOptions) -> Result<(), CommandError> {
    let (key, order) = console.require(id).await?;
    let form = ShipGlobalOrder::from_order(&order, Local::now().date_naive());
    let client = &console.shipglobal;

    let pickup = match options.pickup {
        Some(pickup) => PickupAddressId::new(pickup),
        None => {
            let addresses = client.pickup_addresses().await?;
            default_pickup(&addresses)
                .map(|address| address.address_id.clone())
                .ok_or(CommandError::NoPickupAddress)?
        }
    };

    client.validate_invoice(&form).await?;
    tracing::info!(order = %key, invoice = %form.vendor_invoice_no, "Invoice validated");

    let rates = client.shipper_rates(&form).await?;
    for rate in &rates {
        tracing::info!(
            shipper = %rate.provider_code,
            name = rate.display_name.as_deref().unwrap_or_default(),
            transit = rate.transit_time.as_deref().unwrap_or_default(),
            rate = ?rate.rate,
            "Rate"
        );
    }

    let Some(shipper) = options.shipper else {
        tracing::info!(order = %key, "No shipper chosen, nothing booked");
        return Ok(());
    };
    let order_id = client.add_order(&form, &pickup, &shipper).await?;
    tracing::info!(order = %key, shipglobal_order = %order_id, %pickup, "Order booked");

    if options.draft {
        client.create_draft(&order_id).await?;
        tracing::info!(shipglobal_order = %order_id, "Draft created");
    }
    Ok(())
}
