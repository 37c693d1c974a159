// Domain layer: DTOs mirroring the backend resources and the ports injected into the client.

pub mod model;
pub mod ports;
