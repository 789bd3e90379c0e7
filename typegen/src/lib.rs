//! A compiler for a small interface definition language that describes the
//! in-memory data structures of a legacy operating system, used to generate
//! the C++ structs and big-endian decode/encode routines its emulator links
//! against.
//!
//! The pipeline: [`surface::lexer`] tokenizes, [`surface::parser`] builds
//! the surface AST, [`resolve`] walks `@include` dependencies, and
//! [`surface::elaboration`] checks each file into [`core`] declarations,
//! which [`pass::core_to_cpp`] emits as a header/source pair. [`Driver`]
//! orchestrates the stages and renders diagnostics.

pub mod core;
pub mod driver;
pub mod files;
pub mod pass;
pub mod reporting;
pub mod resolve;
pub mod source;
pub mod surface;

pub use driver::{Driver, Status};
