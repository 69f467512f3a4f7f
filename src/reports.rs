use chrono::{NaiveDate, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, QueryFilter, QuerySelect,
};
use serde::Serialize;
use tracing::instrument;

use crate::entities::invoice::{Column, Entity as Invoice};
use crate::errors::ServiceError;

/// Sales summary over stored invoices
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceSummary {
    pub date: NaiveDate,
    pub total_sales: f64,
    pub total_tax: f64,
    pub invoices_count: u64,
}

#[derive(Debug, FromQueryResult)]
struct SummaryRow {
    total_sales: Option<f64>,
    total_tax: Option<f64>,
    invoices_count: i64,
}

/// Sums `total` and `tax_total` across every invoice. NULL amounts count
/// as zero; the invoice itself is still counted.
#[instrument(skip(db))]
pub async fn invoice_summary(db: &DatabaseConnection) -> Result<InvoiceSummary, ServiceError> {
    summarize(db, None).await
}

/// Like [`invoice_summary`], restricted to invoices whose `created_at`
/// starts with the given calendar date.
#[instrument(skip(db))]
pub async fn invoice_summary_for(
    db: &DatabaseConnection,
    date: NaiveDate,
) -> Result<InvoiceSummary, ServiceError> {
    summarize(db, Some(date)).await
}

async fn summarize(
    db: &DatabaseConnection,
    date: Option<NaiveDate>,
) -> Result<InvoiceSummary, ServiceError> {
    let mut query = Invoice::find()
        .select_only()
        .column_as(Expr::col(Column::Total).sum(), "total_sales")
        .column_as(Expr::col(Column::TaxTotal).sum(), "total_tax")
        .column_as(Expr::col(Column::Id).count(), "invoices_count");

    if let Some(date) = date {
        query = query.filter(Column::CreatedAt.starts_with(date.format("%Y-%m-%d").to_string()));
    }

    let row = query.into_model::<SummaryRow>().one(db).await?;

    Ok(match row {
        Some(row) => InvoiceSummary {
            date: date.unwrap_or_else(|| Utc::now().date_naive()),
            total_sales: row.total_sales.unwrap_or(0.0),
            total_tax: row.total_tax.unwrap_or(0.0),
            invoices_count: row.invoices_count.max(0) as u64,
        },
        None => InvoiceSummary {
            date: date.unwrap_or_else(|| Utc::now().date_naive()),
            total_sales: 0.0,
            total_tax: 0.0,
            invoices_count: 0,
        },
    })
}
