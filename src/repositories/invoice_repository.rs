use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use std::sync::Arc;
use tracing::{debug, info};

use crate::entities::invoice::{ActiveModel as InvoiceActiveModel, Column, Model as InvoiceModel};
use crate::entities::prelude::Invoice;
use crate::errors::ServiceError;
use crate::repositories::{BaseRepository, Repository, StatusPolicy};

/// Values for a new invoice row. Absent options are stored as NULL.
#[derive(Debug, Clone, PartialEq)]
pub struct NewInvoice {
    pub invoice_id: String,
    pub status: String,
    pub payload: Option<String>,
    pub authority_ref: Option<String>,
    pub total: Option<f64>,
    pub tax_total: Option<f64>,
    pub created_at: Option<String>,
}

impl NewInvoice {
    pub fn new(invoice_id: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            invoice_id: invoice_id.into(),
            status: status.into(),
            payload: None,
            authority_ref: None,
            total: None,
            tax_total: None,
            created_at: None,
        }
    }

    pub fn with_payload(mut self, payload: impl Into<String>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    pub fn with_totals(mut self, total: f64, tax_total: f64) -> Self {
        self.total = Some(total);
        self.tax_total = Some(tax_total);
        self
    }

    pub fn with_created_at(mut self, created_at: impl Into<String>) -> Self {
        self.created_at = Some(created_at.into());
        self
    }
}

/// Repository for invoice operations
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    base: BaseRepository,
    statuses: StatusPolicy,
}

impl InvoiceRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
            statuses: StatusPolicy::any(),
        }
    }

    pub fn with_status_policy(mut self, statuses: StatusPolicy) -> Self {
        self.statuses = statuses;
        self
    }

    /// Create a new invoice, stamping `created_at` with the current UTC time
    /// when the caller left it empty
    pub async fn create(&self, invoice: NewInvoice) -> Result<InvoiceModel, ServiceError> {
        self.statuses.check(&invoice.status)?;

        let created_at = invoice
            .created_at
            .unwrap_or_else(|| Utc::now().to_rfc3339());

        let model = InvoiceActiveModel {
            invoice_id: Set(invoice.invoice_id),
            payload: Set(invoice.payload),
            status: Set(invoice.status),
            authority_ref: Set(invoice.authority_ref),
            total: Set(invoice.total),
            tax_total: Set(invoice.tax_total),
            created_at: Set(Some(created_at)),
            ..Default::default()
        };

        let created = self.insert(model).await?;
        info!(invoice_id = %created.invoice_id, id = created.id, "Invoice created");
        Ok(created)
    }

    /// Insert an active model as-is. Columns left `NotSet` are omitted from
    /// the statement, so storage constraints decide the outcome.
    pub async fn insert(&self, invoice: InvoiceActiveModel) -> Result<InvoiceModel, ServiceError> {
        invoice
            .insert(self.get_db())
            .await
            .map_err(ServiceError::from_db)
    }

    /// Find an invoice by its business identifier.
    ///
    /// Before the unique index exists several rows may share an identifier;
    /// the oldest one wins.
    pub async fn find_by_invoice_id(
        &self,
        invoice_id: &str,
    ) -> Result<Option<InvoiceModel>, ServiceError> {
        Invoice::find()
            .filter(Column::InvoiceId.eq(invoice_id))
            .order_by_asc(Column::Id)
            .one(self.get_db())
            .await
            .map_err(ServiceError::from_db)
    }

    pub async fn get_by_invoice_id(&self, invoice_id: &str) -> Result<InvoiceModel, ServiceError> {
        self.find_by_invoice_id(invoice_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Invoice {} not found", invoice_id)))
    }

    /// Get all invoices with pagination, newest first. Pages start at 1.
    pub async fn list(
        &self,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<InvoiceModel>, u64), ServiceError> {
        if page == 0 || page_size == 0 {
            return Err(ServiceError::ValidationError(
                "page and page_size must be at least 1".into(),
            ));
        }

        let paginator = Invoice::find()
            .order_by_desc(Column::Id)
            .paginate(self.get_db(), page_size);

        let total = paginator.num_items().await?;
        let invoices = paginator.fetch_page(page - 1).await?;

        Ok((invoices, total))
    }

    pub async fn update_status(
        &self,
        invoice_id: &str,
        status: &str,
    ) -> Result<InvoiceModel, ServiceError> {
        self.statuses.check(status)?;

        let mut active_model: InvoiceActiveModel = self.get_by_invoice_id(invoice_id).await?.into();
        active_model.status = Set(status.to_string());

        let updated = active_model.update(self.get_db()).await?;
        debug!(invoice_id, status, "Invoice status updated");
        Ok(updated)
    }

    /// Record the reference issued by the tax authority
    pub async fn set_authority_ref(
        &self,
        invoice_id: &str,
        authority_ref: &str,
    ) -> Result<InvoiceModel, ServiceError> {
        let mut active_model: InvoiceActiveModel = self.get_by_invoice_id(invoice_id).await?.into();
        active_model.authority_ref = Set(Some(authority_ref.to_string()));

        Ok(active_model.update(self.get_db()).await?)
    }

    /// Store totals computed elsewhere; `None` clears a value back to NULL
    pub async fn set_totals(
        &self,
        invoice_id: &str,
        total: Option<f64>,
        tax_total: Option<f64>,
    ) -> Result<InvoiceModel, ServiceError> {
        let mut active_model: InvoiceActiveModel = self.get_by_invoice_id(invoice_id).await?.into();
        active_model.total = Set(total);
        active_model.tax_total = Set(tax_total);

        Ok(active_model.update(self.get_db()).await?)
    }

    /// Delete an invoice row. Items are never cascaded: with foreign keys
    /// enforced the delete fails while items remain, otherwise they are
    /// left orphaned.
    pub async fn delete(&self, invoice_id: &str) -> Result<(), ServiceError> {
        let result = Invoice::delete_many()
            .filter(Column::InvoiceId.eq(invoice_id))
            .exec(self.get_db())
            .await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Invoice {} not found",
                invoice_id
            )));
        }

        info!(invoice_id, "Invoice deleted");
        Ok(())
    }
}

impl Repository for InvoiceRepository {
    fn get_db(&self) -> &DatabaseConnection {
        self.base.get_db()
    }
}
