//! Passes from the checked core model to output surfaces.

pub mod core_to_cpp;
