//! Domain layer: operations, transactions and their canonical encoding.

pub mod authority;
pub mod errors;
pub mod extension;
pub mod operations;
pub mod transaction;
