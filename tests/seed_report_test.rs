mod common;

use assert_matches::assert_matches;
use chrono::NaiveDate;
use invoice_store::{
    config::AppConfig,
    reports,
    repositories::{InvoiceRepository, NewInvoice},
    seed, ServiceError,
};

fn seed_config() -> AppConfig {
    AppConfig::new("sqlite::memory:".to_string(), "test".to_string())
}

#[tokio::test]
async fn seeding_is_idempotent() {
    let db = common::migrated_db().await;

    assert_eq!(seed::seed_demo_data(db.clone(), &seed_config()).await.unwrap(), 2);
    assert_eq!(seed::seed_demo_data(db.clone(), &seed_config()).await.unwrap(), 0);

    let invoices = InvoiceRepository::new(db);
    let demo = invoices.get_by_invoice_id("INV-2025-1001").await.unwrap();
    assert_eq!(demo.status, "DRAFT");
    assert_eq!(demo.total, Some(116.0));
    assert_eq!(demo.tax_total, Some(16.0));

    let payload = demo.payload_json().unwrap().expect("payload stored");
    assert_eq!(payload["seller"], "Demo Ltd");
    assert_eq!(payload["buyer"], "Client A");
}

#[tokio::test]
async fn seeding_skips_existing_identifiers() {
    let db = common::migrated_db().await;
    let invoices = InvoiceRepository::new(db.clone());
    invoices
        .create(NewInvoice::new("INV-2025-1002", "SUBMITTED"))
        .await
        .unwrap();

    assert_eq!(seed::seed_demo_data(db, &seed_config()).await.unwrap(), 1);
    let kept = invoices.get_by_invoice_id("INV-2025-1002").await.unwrap();
    assert_eq!(kept.status, "SUBMITTED");
}

#[tokio::test]
async fn seeding_respects_allowed_statuses() {
    let db = common::migrated_db().await;
    let mut cfg = seed_config();
    cfg.allowed_statuses = vec!["PENDING".into()];

    assert_matches!(
        seed::seed_demo_data(db.clone(), &cfg).await,
        Err(ServiceError::ValidationError(_))
    );
    let invoices = InvoiceRepository::new(db.clone());
    assert!(invoices
        .find_by_invoice_id("INV-2025-1001")
        .await
        .unwrap()
        .is_none());

    cfg.seed_status = "PENDING".into();
    assert_eq!(seed::seed_demo_data(db, &cfg).await.unwrap(), 2);
    let demo = invoices.get_by_invoice_id("INV-2025-1001").await.unwrap();
    assert_eq!(demo.status, "PENDING");
}

#[tokio::test]
async fn summary_of_empty_store_is_zero() {
    let db = common::migrated_db().await;
    let summary = reports::invoice_summary(&db).await.unwrap();

    assert_eq!(summary.invoices_count, 0);
    assert_eq!(summary.total_sales, 0.0);
    assert_eq!(summary.total_tax, 0.0);
}

#[tokio::test]
async fn summary_counts_uncomputed_invoices_as_zero() {
    let db = common::migrated_db().await;
    seed::seed_demo_data(db.clone(), &seed_config()).await.unwrap();
    InvoiceRepository::new(db.clone())
        .create(NewInvoice::new("INV-OPEN", "draft"))
        .await
        .unwrap();

    let summary = reports::invoice_summary(&db).await.unwrap();
    assert_eq!(summary.invoices_count, 3);
    assert!((summary.total_sales - 174.0).abs() < 1e-9);
    assert!((summary.total_tax - 24.0).abs() < 1e-9);
}

#[tokio::test]
async fn summary_for_date_filters_on_created_at() {
    let db = common::migrated_db().await;
    let invoices = InvoiceRepository::new(db.clone());
    invoices
        .create(
            NewInvoice::new("INV-A", "draft")
                .with_totals(10.0, 1.0)
                .with_created_at("2024-01-01T09:00:00+00:00"),
        )
        .await
        .unwrap();
    invoices
        .create(
            NewInvoice::new("INV-B", "draft")
                .with_totals(20.0, 2.0)
                .with_created_at("2024-01-02T09:00:00+00:00"),
        )
        .await
        .unwrap();

    let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let summary = reports::invoice_summary_for(&db, day).await.unwrap();
    assert_eq!(summary.date, day);
    assert_eq!(summary.invoices_count, 1);
    assert!((summary.total_sales - 10.0).abs() < 1e-9);
    assert!((summary.total_tax - 1.0).abs() < 1e-9);
}
