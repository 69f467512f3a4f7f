pub mod invoice;
pub mod item;

pub mod prelude {
    pub use super::invoice::Entity as Invoice;
    pub use super::item::Entity as Item;
}
