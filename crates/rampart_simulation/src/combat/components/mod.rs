//! Combat components

pub mod ledger;
pub mod policy;
pub mod weapon;


// Re-export all components
pub use ledger::*;
pub use policy::*;
pub use weapon::*;
