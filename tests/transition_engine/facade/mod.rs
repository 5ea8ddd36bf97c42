//! Builder, configuration, handles and wire adapters

pub mod wire;
