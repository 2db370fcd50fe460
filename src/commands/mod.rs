//! Command implementations for the stencil CLI

pub mod helpers;
pub mod status;
pub mod sync;
