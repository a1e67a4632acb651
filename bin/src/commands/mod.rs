//! CLI command implementations.

pub(crate) mod history;
pub(crate) mod market;
pub(crate) mod reference;
