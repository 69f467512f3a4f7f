use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

// Invoice Model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "invoices")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Business identifier; items reference invoices through it.
    #[sea_orm(column_type = "Text")]
    pub invoice_id: String,
    /// Raw JSON document the invoice was built from.
    #[sea_orm(column_type = "Text", nullable)]
    pub payload: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub status: String,
    /// Issued by the tax authority once the invoice is accepted.
    #[sea_orm(column_type = "Text", nullable)]
    pub authority_ref: Option<String>,
    #[sea_orm(column_type = "Double", nullable)]
    pub total: Option<f64>,
    #[sea_orm(column_type = "Double", nullable)]
    pub tax_total: Option<f64>,
    #[sea_orm(column_type = "Text", nullable)]
    pub created_at: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::item::Entity")]
    Items,
}

impl Related<super::item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn has_authority_ref(&self) -> bool {
        self.authority_ref.is_some()
    }

    /// Parses the stored payload, if any.
    pub fn payload_json(&self) -> Result<Option<serde_json::Value>, serde_json::Error> {
        self.payload
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
    }
}
