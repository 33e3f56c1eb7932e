//! Sales report windowing and aggregation.
//!
//! Windows are resolved in a single fixed UTC+7 zone regardless of where the
//! request came from; aggregation is one pass over the already-fetched order
//! rows. Revenue is the sum of order `total_amount`, while per-product revenue
//! comes from item line totals.

use chrono::{DateTime, Datelike, Duration, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// All report dates are rendered and bucketed in this fixed offset.
pub const REPORT_UTC_OFFSET_SECS: i32 = 7 * 3600;

fn report_zone() -> FixedOffset {
    FixedOffset::east_opt(REPORT_UTC_OFFSET_SECS).expect("static utc offset")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportType {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

/// Resolve the `[start, end]` window for a report request. Explicit bounds
/// override the report type entirely; without either, there is nothing to
/// report on.
pub fn resolve_window(
    report_type: Option<ReportType>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<(DateTime<Utc>, DateTime<Utc>), WindowError> {
    if let (Some(start), Some(end)) = (start, end) {
        return Ok((start, end));
    }
    let Some(report_type) = report_type else {
        return Err(WindowError::MissingType);
    };

    let local = now.with_timezone(&report_zone());
    let midnight = |date: chrono::NaiveDate| {
        date.and_hms_opt(0, 0, 0)
            .expect("midnight exists")
            .and_local_timezone(report_zone())
            .single()
            .expect("fixed offset is unambiguous")
            .with_timezone(&Utc)
    };

    let start = match report_type {
        ReportType::Daily => midnight(local.date_naive()),
        ReportType::Weekly => {
            // num_days_from_monday is 6 for Sunday, matching the ISO week start.
            let back = local.weekday().num_days_from_monday() as i64;
            midnight(local.date_naive() - Duration::days(back))
        }
        ReportType::Monthly => midnight(
            local
                .date_naive()
                .with_day(1)
                .expect("first of month exists"),
        ),
        ReportType::Yearly => midnight(
            local
                .date_naive()
                .with_month(1)
                .and_then(|d| d.with_day(1))
                .expect("january first exists"),
        ),
    };
    Ok((start, now))
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum WindowError {
    #[error("report type or explicit start/end bounds are required")]
    MissingType,
}

/// One fetched order with its line items, the aggregator's input shape.
#[derive(Debug, Clone)]
pub struct OrderRecord {
    pub id: Uuid,
    pub order_number: String,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub status: String,
    pub total_amount: i64,
    pub ordered_at: DateTime<Utc>,
    pub items: Vec<ItemRecord>,
}

#[derive(Debug, Clone)]
pub struct ItemRecord {
    pub product_id: Uuid,
    pub product_title: String,
    pub quantity: i32,
    pub price: i64,
    pub total: i64,
}

#[derive(Debug, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_orders: u64,
    pub total_items: i64,
    pub total_revenue: i64,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRollup {
    pub customer_id: Uuid,
    pub name: String,
    pub total_spent: i64,
    pub orders: u64,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductRollup {
    pub product_id: Uuid,
    pub title: String,
    pub quantity: i64,
    pub revenue: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesReport {
    pub start: String,
    pub end: String,
    pub summary: Summary,
    pub customers: Vec<CustomerRollup>,
    pub products: Vec<ProductRollup>,
}

/// Single-pass rollup over orders already filtered to the window.
pub fn aggregate(
    orders: &[OrderRecord],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> SalesReport {
    let mut summary = Summary::default();
    let mut customers: Vec<CustomerRollup> = Vec::new();
    let mut products: Vec<ProductRollup> = Vec::new();

    for order in orders {
        summary.total_orders += 1;
        summary.total_revenue += order.total_amount;

        match customers
            .iter_mut()
            .find(|c| c.customer_id == order.customer_id)
        {
            Some(c) => {
                c.total_spent += order.total_amount;
                c.orders += 1;
            }
            None => customers.push(CustomerRollup {
                customer_id: order.customer_id,
                name: order.customer_name.clone(),
                total_spent: order.total_amount,
                orders: 1,
            }),
        }

        for item in &order.items {
            summary.total_items += item.quantity as i64;
            match products.iter_mut().find(|p| p.product_id == item.product_id) {
                Some(p) => {
                    p.quantity += item.quantity as i64;
                    p.revenue += item.total;
                }
                None => products.push(ProductRollup {
                    product_id: item.product_id,
                    title: item.product_title.clone(),
                    quantity: item.quantity as i64,
                    revenue: item.total,
                }),
            }
        }
    }

    let zone = report_zone();
    SalesReport {
        start: start.with_timezone(&zone).to_rfc3339(),
        end: end.with_timezone(&zone).to_rfc3339(),
        summary,
        customers,
        products,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn daily_window_starts_at_local_midnight() {
        // 2024-03-15 10:00 UTC is 17:00 in UTC+7; local midnight is 17:00 UTC
        // the previous day.
        let now = at(2024, 3, 15, 10, 0);
        let (start, end) = resolve_window(Some(ReportType::Daily), None, None, now).unwrap();
        assert_eq!(start, at(2024, 3, 14, 17, 0));
        assert_eq!(end, now);
    }

    #[test]
    fn weekly_window_starts_on_local_monday() {
        // 2024-03-15 is a Friday.
        let now = at(2024, 3, 15, 10, 0);
        let (start, _) = resolve_window(Some(ReportType::Weekly), None, None, now).unwrap();
        assert_eq!(start, at(2024, 3, 10, 17, 0)); // local Mon 2024-03-11 00:00
    }

    #[test]
    fn weekly_window_on_sunday_reaches_back_six_days() {
        // 2024-03-17 10:00 UTC is Sunday both in UTC and UTC+7.
        let now = at(2024, 3, 17, 10, 0);
        let (start, _) = resolve_window(Some(ReportType::Weekly), None, None, now).unwrap();
        assert_eq!(start, at(2024, 3, 10, 17, 0)); // previous local Monday
    }

    #[test]
    fn monthly_and_yearly_windows() {
        let now = at(2024, 3, 15, 10, 0);
        let (m, _) = resolve_window(Some(ReportType::Monthly), None, None, now).unwrap();
        assert_eq!(m, at(2024, 2, 29, 17, 0)); // local 2024-03-01 00:00
        let (y, _) = resolve_window(Some(ReportType::Yearly), None, None, now).unwrap();
        assert_eq!(y, at(2023, 12, 31, 17, 0)); // local 2024-01-01 00:00
    }

    #[test]
    fn explicit_bounds_override_the_type() {
        let now = at(2024, 3, 15, 10, 0);
        let s = at(2024, 1, 1, 0, 0);
        let e = at(2024, 2, 1, 0, 0);
        let (start, end) =
            resolve_window(Some(ReportType::Yearly), Some(s), Some(e), now).unwrap();
        assert_eq!((start, end), (s, e));
    }

    #[test]
    fn missing_type_and_bounds_is_an_error() {
        let now = at(2024, 3, 15, 10, 0);
        assert_eq!(
            resolve_window(None, None, None, now),
            Err(WindowError::MissingType)
        );
    }

    fn order(customer: u128, total: i64, items: Vec<ItemRecord>) -> OrderRecord {
        OrderRecord {
            id: Uuid::new_v4(),
            order_number: "ORD-00000001".into(),
            customer_id: Uuid::from_u128(customer),
            customer_name: format!("customer-{customer}"),
            status: "PENDING".into(),
            total_amount: total,
            ordered_at: at(2024, 3, 15, 9, 0),
            items,
        }
    }

    fn item(product: u128, qty: i32, total: i64) -> ItemRecord {
        ItemRecord {
            product_id: Uuid::from_u128(product),
            product_title: format!("product-{product}"),
            quantity: qty,
            price: total / qty as i64,
            total,
        }
    }

    #[test]
    fn two_orders_for_one_customer_roll_up_together() {
        let orders = vec![
            order(1, 100, vec![item(10, 2, 100)]),
            order(1, 50, vec![item(10, 1, 50)]),
        ];
        let report = aggregate(&orders, at(2024, 3, 15, 0, 0), at(2024, 3, 16, 0, 0));
        assert_eq!(report.summary.total_revenue, 150);
        assert_eq!(report.summary.total_orders, 2);
        assert_eq!(report.customers.len(), 1);
        assert_eq!(report.customers[0].total_spent, 150);
        assert_eq!(report.customers[0].orders, 2);
    }

    #[test]
    fn product_rollup_uses_item_totals_not_order_totals() {
        let orders = vec![order(
            1,
            999, // deliberately divergent from the item sum
            vec![item(10, 2, 100), item(11, 1, 50)],
        )];
        let report = aggregate(&orders, at(2024, 3, 15, 0, 0), at(2024, 3, 16, 0, 0));
        assert_eq!(report.summary.total_revenue, 999);
        assert_eq!(report.summary.total_items, 3);
        assert_eq!(report.products.len(), 2);
        assert_eq!(report.products[0].quantity, 2);
        assert_eq!(report.products[0].revenue, 100);
    }

    #[test]
    fn report_dates_render_in_the_fixed_zone() {
        let report = aggregate(&[], at(2024, 3, 14, 17, 0), at(2024, 3, 15, 10, 0));
        assert_eq!(report.start, "2024-03-15T00:00:00+07:00");
        assert!(report.end.ends_with("+07:00"));
    }
}
