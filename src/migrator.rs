use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_invoices_table::Migration),
            Box::new(m20240101_000002_create_items_table::Migration),
            Box::new(m20240101_000003_unique_invoice_business_id::Migration),
            Box::new(m20240101_000004_index_items_invoice_id::Migration),
        ]
    }
}

/// Number of migrations that make up the initial, weakly keyed schema.
pub const INITIAL_SCHEMA_STEPS: u32 = 2;

/// Name of the unique index added on `invoices.invoice_id`.
pub const INVOICE_ID_UNIQUE_INDEX: &str = "idx_invoices_invoice_id";

/// Name of the lookup index on `items.invoice_id`.
pub const ITEMS_INVOICE_ID_INDEX: &str = "idx_items_invoice_id";

#[derive(DeriveIden)]
pub enum Invoices {
    Table,
    Id,
    InvoiceId,
    Payload,
    Status,
    AuthorityRef,
    Total,
    TaxTotal,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum Items {
    Table,
    Id,
    InvoiceId,
    ItemName,
    Qty,
    Rate,
}

fn real() -> Alias {
    Alias::new("real")
}

// Migration implementations

mod m20240101_000001_create_invoices_table {

    use super::{real, Invoices};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_invoices_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Invoices::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Invoices::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Invoices::InvoiceId).text().not_null())
                        .col(ColumnDef::new(Invoices::Payload).text().null())
                        .col(ColumnDef::new(Invoices::Status).text().not_null())
                        .col(ColumnDef::new(Invoices::AuthorityRef).text().null())
                        .col(ColumnDef::new(Invoices::Total).custom(real()).null())
                        .col(ColumnDef::new(Invoices::TaxTotal).custom(real()).null())
                        .col(ColumnDef::new(Invoices::CreatedAt).text().null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Invoices::Table).if_exists().to_owned())
                .await
        }
    }
}

mod m20240101_000002_create_items_table {

    use super::{real, Invoices, Items};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_items_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // References the business identifier by value, with no cascade.
            manager
                .create_table(
                    Table::create()
                        .table(Items::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Items::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Items::InvoiceId).text().not_null())
                        .col(ColumnDef::new(Items::ItemName).text().null())
                        .col(ColumnDef::new(Items::Qty).integer().null())
                        .col(ColumnDef::new(Items::Rate).custom(real()).null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_items_invoice_id")
                                .from(Items::Table, Items::InvoiceId)
                                .to(Invoices::Table, Invoices::InvoiceId),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Items::Table).if_exists().to_owned())
                .await
        }
    }
}

mod m20240101_000003_unique_invoice_business_id {

    use super::{Invoices, INVOICE_ID_UNIQUE_INDEX};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_unique_invoice_business_id"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Gives items.invoice_id a uniquely indexed parent key so the
            // foreign key can be enforced. Fails if duplicates already exist.
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name(INVOICE_ID_UNIQUE_INDEX)
                        .table(Invoices::Table)
                        .col(Invoices::InvoiceId)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_index(
                    Index::drop()
                        .name(INVOICE_ID_UNIQUE_INDEX)
                        .table(Invoices::Table)
                        .to_owned(),
                )
                .await
        }
    }
}

mod m20240101_000004_index_items_invoice_id {

    use super::{Items, ITEMS_INVOICE_ID_INDEX};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_index_items_invoice_id"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name(ITEMS_INVOICE_ID_INDEX)
                        .table(Items::Table)
                        .col(Items::InvoiceId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_index(
                    Index::drop()
                        .name(ITEMS_INVOICE_ID_INDEX)
                        .table(Items::Table)
                        .to_owned(),
                )
                .await
        }
    }
}
