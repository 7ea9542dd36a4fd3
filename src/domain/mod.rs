// Domain layer: core models and ports (interfaces). No dependencies on
// adapters or the engine.

pub mod model;
pub mod ports;
