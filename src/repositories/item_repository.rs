use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, JoinType, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Set,
};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::entities::invoice::{self, Model as InvoiceModel};
use crate::entities::item::{ActiveModel as ItemActiveModel, Column, Model as ItemModel, Relation};
use crate::entities::prelude::{Invoice, Item};
use crate::errors::ServiceError;
use crate::repositories::{BaseRepository, Repository};

/// Values for a new line item.
#[derive(Debug, Clone, PartialEq)]
pub struct NewItem {
    pub invoice_id: String,
    pub item_name: Option<String>,
    pub qty: Option<i32>,
    pub rate: Option<f64>,
}

impl NewItem {
    pub fn new(
        invoice_id: impl Into<String>,
        item_name: impl Into<String>,
        qty: i32,
        rate: f64,
    ) -> Self {
        Self {
            invoice_id: invoice_id.into(),
            item_name: Some(item_name.into()),
            qty: Some(qty),
            rate: Some(rate),
        }
    }
}

/// Repository for invoice line items
#[derive(Debug, Clone)]
pub struct ItemRepository {
    base: BaseRepository,
}

impl ItemRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn add(&self, item: NewItem) -> Result<ItemModel, ServiceError> {
        let model = ItemActiveModel {
            invoice_id: Set(item.invoice_id),
            item_name: Set(item.item_name),
            qty: Set(item.qty),
            rate: Set(item.rate),
            ..Default::default()
        };

        let created = self.insert(model).await?;
        debug!(invoice_id = %created.invoice_id, id = created.id, "Item added");
        Ok(created)
    }

    /// Insert an active model as-is, leaving constraint checks to storage.
    pub async fn insert(&self, item: ItemActiveModel) -> Result<ItemModel, ServiceError> {
        item.insert(self.get_db())
            .await
            .map_err(ServiceError::from_db)
    }

    /// Items of one invoice in insertion order
    pub async fn for_invoice(&self, invoice_id: &str) -> Result<Vec<ItemModel>, ServiceError> {
        Item::find()
            .filter(Column::InvoiceId.eq(invoice_id))
            .order_by_asc(Column::Id)
            .all(self.get_db())
            .await
            .map_err(ServiceError::from_db)
    }

    /// Joins an invoice to its items on `invoice_id`.
    pub async fn with_invoice(
        &self,
        invoice_id: &str,
    ) -> Result<Option<(InvoiceModel, Vec<ItemModel>)>, ServiceError> {
        let mut rows = Invoice::find()
            .filter(invoice::Column::InvoiceId.eq(invoice_id))
            .order_by_asc(invoice::Column::Id)
            .find_with_related(Item)
            .all(self.get_db())
            .await?;

        if rows.is_empty() {
            return Ok(None);
        }
        let (invoice, mut items) = rows.swap_remove(0);
        items.sort_by_key(|item| item.id);
        Ok(Some((invoice, items)))
    }

    /// Items whose `invoice_id` matches no invoice.
    pub async fn orphans(&self) -> Result<Vec<ItemModel>, ServiceError> {
        let orphans = Item::find()
            .join(JoinType::LeftJoin, Relation::Invoice.def())
            .filter(invoice::Column::Id.is_null())
            .order_by_asc(Column::Id)
            .all(self.get_db())
            .await?;

        if !orphans.is_empty() {
            warn!(count = orphans.len(), "Found items referencing missing invoices");
        }
        Ok(orphans)
    }
}

impl Repository for ItemRepository {
    fn get_db(&self) -> &DatabaseConnection {
        self.base.get_db()
    }
}
