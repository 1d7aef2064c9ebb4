pub mod order_ops;
pub mod pricing_ops;
pub mod reference_ops;
pub mod store;

pub use order_ops::OrderPatch;
pub use reference_ops::ReferenceIndex;
pub use store::Store;
