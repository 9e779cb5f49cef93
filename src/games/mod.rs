//! Reference games.
//!
//! - `settlers`: compact four-seat settlement and trading game

pub mod settlers;
