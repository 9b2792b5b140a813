// Domain layer: core models and ports (interfaces). No dependencies on the
// engine or on concrete adapters.

pub mod model;
pub mod ports;
