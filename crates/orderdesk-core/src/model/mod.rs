pub mod order;
pub mod order_item;
pub mod reference_entry;

pub use order::Order;
pub use order_item::OrderItem;
pub use reference_entry::ReferenceEntry;
