//! Per-order and aggregate profit.
//!
//! Profit is only defined once an order has shipped and its cost is known.
//! Every other order contributes zero; that is an exclusion policy, not an
//! error.
//!
//! ```text
//! gross      = floor(sum(line.price) * exchange_rate)
//! commission = floor(gross * commission_rate)
//! profit     = gross - commission - cost - shipping_price
//! ```
//!
//! `cost` and `shipping_price` are taken in whole units; non-numeric values
//! count as zero.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::order::Order;
use crate::types::{RawAmount, whole_units_or_zero};

/// Business parameters of the profit calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfitConfig {
    /// Marketplace currency to local currency (USD to INR).
    pub exchange_rate: Decimal,
    /// Share of the gross taken by the marketplace.
    pub commission_rate: Decimal,
}

impl ProfitConfig {
    pub const DEFAULT_EXCHANGE_RATE: Decimal = Decimal::from_parts(84, 0, 0, false, 0);
    pub const DEFAULT_COMMISSION_RATE: Decimal = Decimal::from_parts(15, 0, 0, false, 2);
}

impl Default for ProfitConfig {
    fn default() -> Self {
        Self {
            exchange_rate: Self::DEFAULT_EXCHANGE_RATE,
            commission_rate: Self::DEFAULT_COMMISSION_RATE,
        }
    }
}

/// The terms of one order's profit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfitBreakdown {
    pub gross: Decimal,
    pub commission: Decimal,
    pub cost: Decimal,
    pub shipping_price: Decimal,
    pub profit: Decimal,
}

/// Profit terms for a qualifying order, `None` for excluded orders.
#[must_use]
pub fn profit_breakdown(order: &Order, config: &ProfitConfig) -> Option<ProfitBreakdown> {
    if !order.is_shipped() || !order.cost.as_ref().is_some_and(RawAmount::is_set) {
        return None;
    }

    let gross = (order.line_price_sum() * config.exchange_rate).floor();
    let commission = (gross * config.commission_rate).floor();
    let cost = whole_units_or_zero(order.cost.as_ref());
    let shipping_price = whole_units_or_zero(order.shipping_price.as_ref());

    Some(ProfitBreakdown {
        gross,
        commission,
        cost,
        shipping_price,
        profit: gross - commission - cost - shipping_price,
    })
}

/// Profit of one order; zero unless it has shipped and has a cost.
#[must_use]
pub fn compute_order_profit(order: &Order, config: &ProfitConfig) -> Decimal {
    profit_breakdown(order, config).map_or(Decimal::ZERO, |b| b.profit)
}

/// Sum of [`compute_order_profit`] over `orders`.
#[must_use]
pub fn compute_aggregate_profit<'a>(
    orders: impl IntoIterator<Item = &'a Order>,
    config: &ProfitConfig,
) -> Decimal {
    orders
        .into_iter()
        .map(|order| compute_order_profit(order, config))
        .sum()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::codec::decode;
    use serde_json::{Value, json};

    fn order(value: Value) -> Order {
        decode(value).unwrap()
    }

    fn shipped(cost: Value, shipping_price: Value) -> Order {
        order(json!({
            "purchaseOrderId": "P1",
            "status": "shipped",
            "cost": cost,
            "shippingPrice": shipping_price,
            "orderLines": [
                {"lineNumber": 1, "price": 10.00},
                {"lineNumber": 2, "price": "5.00"}
            ]
        }))
    }

    #[test]
    fn test_default_config() {
        let config = ProfitConfig::default();
        assert_eq!(config.exchange_rate, Decimal::from(84));
        assert_eq!(config.commission_rate, Decimal::new(15, 2));
    }

    #[test]
    fn test_profit_arithmetic() {
        let breakdown = profit_breakdown(&shipped(json!(50), json!(20)), &ProfitConfig::default())
            .unwrap();
        assert_eq!(breakdown.gross, Decimal::from(1260));
        assert_eq!(breakdown.commission, Decimal::from(189));
        assert_eq!(breakdown.profit, Decimal::from(1001));
    }

    #[test]
    fn test_status_is_case_insensitive() {
        let mut o = shipped(json!(50), json!(20));
        o.status = Some("SHIPPED".to_string());
        assert_eq!(
            compute_order_profit(&o, &ProfitConfig::default()),
            Decimal::from(1001)
        );
    }

    #[test]
    fn test_excluded_orders_are_zero() {
        let config = ProfitConfig::default();

        let mut created = shipped(json!(50), json!(20));
        created.status = Some("created".to_string());
        assert_eq!(compute_order_profit(&created, &config), Decimal::ZERO);

        for cost in [Value::Null, json!(0), json!("")] {
            let o = shipped(cost.clone(), json!(20));
            assert_eq!(compute_order_profit(&o, &config), Decimal::ZERO, "cost {cost}");
        }

        let mut no_status = shipped(json!(50), json!(20));
        no_status.status = None;
        assert_eq!(compute_order_profit(&no_status, &config), Decimal::ZERO);
    }

    #[test]
    fn test_missing_shipping_price_counts_as_zero() {
        let config = ProfitConfig::default();
        assert_eq!(
            compute_order_profit(&shipped(json!(50), Value::Null), &config),
            Decimal::from(1021)
        );
        assert_eq!(
            compute_order_profit(&shipped(json!(50), json!("pending")), &config),
            Decimal::from(1021)
        );
    }

    #[test]
    fn test_non_numeric_cost_counts_as_zero() {
        // A cost that is set but not a number still qualifies the order.
        let o = shipped(json!("unknown"), json!(20));
        assert_eq!(
            compute_order_profit(&o, &ProfitConfig::default()),
            Decimal::from(1051)
        );
    }

    #[test]
    fn test_cost_is_whole_units() {
        let o = shipped(json!("50.9"), json!(20.5));
        assert_eq!(
            compute_order_profit(&o, &ProfitConfig::default()),
            Decimal::from(1001)
        );
    }

    #[test]
    fn test_gross_rounds_down() {
        let o = order(json!({
            "status": "Shipped",
            "cost": 1,
            "orderLines": [{"lineNumber": 1, "price": 0.99}]
        }));
        // 0.99 * 84 = 83.16 -> 83; commission floor(12.45) = 12.
        assert_eq!(
            compute_order_profit(&o, &ProfitConfig::default()),
            Decimal::from(70)
        );
    }

    #[test]
    fn test_custom_rates() {
        let config = ProfitConfig {
            exchange_rate: Decimal::from(100),
            commission_rate: Decimal::new(10, 2),
        };
        // gross 1500, commission 150.
        assert_eq!(
            compute_order_profit(&shipped(json!(50), json!(20)), &config),
            Decimal::from(1280)
        );
    }

    #[test]
    fn test_aggregate_skips_excluded_orders() {
        let config = ProfitConfig::default();
        let mut created = shipped(json!(50), json!(20));
        created.status = Some("created".to_string());
        let orders = [
            shipped(json!(50), json!(20)),
            created,
            shipped(json!(50), json!(20)),
        ];
        assert_eq!(
            compute_aggregate_profit(&orders, &config),
            Decimal::from(2002)
        );
        assert_eq!(
            compute_aggregate_profit(Vec::<Order>::new().iter(), &config),
            Decimal::ZERO
        );
    }
}
