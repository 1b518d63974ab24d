/// Ports of the hexagonal architecture. Only outbound (driven) ports exist;
/// the use cases in `application` are the inbound surface.
pub mod outbound;
