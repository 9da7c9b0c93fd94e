// Domain layer: build models and ports (fetching, converting, targets).

pub mod model;
pub mod ports;
