//! Plain data types shared by the vista controller library and the console.
//!
//! Nothing in this crate performs I/O or owns async state.

mod domain;
pub use domain::*;

mod hr;
pub use hr::*;
