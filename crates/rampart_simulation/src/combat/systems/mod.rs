//! Combat systems (grip, melee engine, damage pipeline)

pub mod damage;
pub mod grip;
pub mod melee;

// Tests (separate files with _tests suffix)
#[cfg(test)]
mod damage_tests;
#[cfg(test)]
mod melee_tests;

// Re-export all systems
pub use damage::*;
pub use grip::*;
pub use melee::*;
