//! API controllers, one endpoint per module.

pub mod borrow_quote;
pub mod loans;
pub mod pools;
pub mod prices;
pub mod version;
pub mod wallet;
