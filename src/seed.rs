//! Demo data for exploring a freshly migrated store.

use serde_json::json;
use std::sync::Arc;
use tracing::info;

use crate::config::AppConfig;
use crate::errors::ServiceError;
use crate::repositories::{InvoiceRepository, NewInvoice, StatusPolicy};
use sea_orm::DatabaseConnection;

struct DemoInvoice {
    invoice_id: &'static str,
    buyer: &'static str,
    total: f64,
    tax_total: f64,
}

const DEMO_INVOICES: [DemoInvoice; 2] = [
    DemoInvoice {
        invoice_id: "INV-2025-1001",
        buyer: "Client A",
        total: 116.0,
        tax_total: 16.0,
    },
    DemoInvoice {
        invoice_id: "INV-2025-1002",
        buyer: "Client B",
        total: 58.0,
        tax_total: 8.0,
    },
];

/// Inserts the demo invoices that are not already present and returns how
/// many were added.
///
/// Rows get the configured `seed_status`, checked against `allowed_statuses`.
pub async fn seed_demo_data(
    db: Arc<DatabaseConnection>,
    cfg: &AppConfig,
) -> Result<usize, ServiceError> {
    let status = cfg.seed_status.as_str();
    let invoices = InvoiceRepository::new(db).with_status_policy(StatusPolicy::from(cfg));
    let mut inserted = 0;

    for demo in &DEMO_INVOICES {
        if invoices.find_by_invoice_id(demo.invoice_id).await?.is_some() {
            info!(invoice_id = demo.invoice_id, "Demo invoice already present");
            continue;
        }

        let payload = json!({ "seller": "Demo Ltd", "buyer": demo.buyer }).to_string();
        invoices
            .create(
                NewInvoice::new(demo.invoice_id, status)
                    .with_payload(payload)
                    .with_totals(demo.total, demo.tax_total),
            )
            .await?;
        inserted += 1;
    }

    info!(inserted, "Seed data complete");
    Ok(inserted)
}
