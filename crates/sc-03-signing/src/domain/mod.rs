//! Domain layer: keys, digests and signature arithmetic. No I/O.

pub mod digest;
pub mod ecdsa;
pub mod errors;
pub mod keys;
