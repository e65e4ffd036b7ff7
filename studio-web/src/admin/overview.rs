use rust_decimal::Decimal;

use crate::models::{Receipt, ReceiptStatus, Service};

pub const RECENT_RECEIPTS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DashboardStats {
    pub receipt_count: usize,
    pub total_revenue: Decimal,
    pub total_pending: Decimal,
    pub paid: usize,
    pub partial: usize,
    pub pending: usize,
    pub active_services: usize,
}

impl DashboardStats {
    pub fn compute(receipts: &[Receipt], services: &[Service]) -> Self {
        let count = |status| receipts.iter().filter(|r| r.status == status).count();

        Self {
            receipt_count: receipts.len(),
            total_revenue: receipts.iter().map(|r| r.total).sum(),
            total_pending: receipts.iter().map(|r| r.balance_due).sum(),
            paid: count(ReceiptStatus::Paid),
            partial: count(ReceiptStatus::Partial),
            pending: count(ReceiptStatus::Pending),
            active_services: services.iter().filter(|s| s.is_active).count(),
        }
    }
}

/// The last receipts in fetch order, newest first.
pub fn recent_receipts(receipts: &[Receipt], limit: usize) -> Vec<Receipt> {
    receipts.iter().rev().take(limit).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::service::default_catalog;
    use serde_json::json;

    fn receipt(id: &str, total: i64, balance: i64, status: &str) -> Receipt {
        serde_json::from_value(json!({
            "id": id, "receiptNumber": format!("MFW{id}"), "items": [],
            "subtotal": total, "tax": 0, "total": total,
            "balanceDue": balance, "status": status
        }))
        .unwrap()
    }

    #[test]
    fn sums_revenue_and_counts_statuses() {
        let receipts = vec![
            receipt("1", 1000, 0, "paid"),
            receipt("2", 500, 250, "partial"),
            receipt("3", 300, 300, "pending"),
        ];
        let mut services = default_catalog();
        services[0].is_active = false;

        let stats = DashboardStats::compute(&receipts, &services);

        assert_eq!(stats.receipt_count, 3);
        assert_eq!(stats.total_revenue, Decimal::from(1800));
        assert_eq!(stats.total_pending, Decimal::from(550));
        assert_eq!((stats.paid, stats.partial, stats.pending), (1, 1, 1));
        assert_eq!(stats.active_services, 19);
    }

    #[test]
    fn recent_receipts_are_newest_first() {
        let receipts: Vec<_> = (1..=7).map(|i| receipt(&i.to_string(), 10, 10, "pending")).collect();

        let recent = recent_receipts(&receipts, RECENT_RECEIPTS);

        let ids: Vec<_> = recent.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["7", "6", "5", "4", "3"]);
    }
}
