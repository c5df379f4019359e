//! Surface construction
//!
//! The three stages after normalization:
//! - [`filter`]: moneyness band and minimum maturity predicates. Both return a
//!   new set, commute, and are idempotent.
//! - [`grid`]: exact-match aggregation onto a strike × maturity grid, averaging
//!   duplicates and leaving uncovered cells at `0.0`.
//! - [`emit`]: hands the grid (or raw points) to a sink and turns empty input
//!   into a no-data error instead of a render call.

pub mod emit;
pub mod filter;
pub mod grid;

pub use emit::*;
pub use filter::*;
pub use grid::*;
