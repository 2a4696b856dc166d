//! Domain records and their request payloads. Field names are camelCase on
//! the wire.

pub mod buyer;
pub mod order;
pub mod product;
pub mod seller;

pub use buyer::*;
pub use order::*;
pub use product::*;
pub use seller::*;
