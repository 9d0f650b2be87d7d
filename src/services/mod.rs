/// Initial bracket construction for every format.
pub mod bracket;
/// OpenAPI documentation generation.
pub mod documentation;
/// Single-elimination winner propagation and reversal.
pub mod elimination;
/// Health check service.
pub mod health_service;
/// Direct result declaration and the shared commit path.
pub mod match_service;
/// Score report reconciliation.
pub mod reports;
/// Round robin schedule generation.
pub mod round_robin;
/// Bracket position arithmetic.
pub mod slots;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Storage reconnection supervisor.
pub mod storage_supervisor;
/// Swiss standings and pairing.
pub mod swiss;
/// Tournament lifecycle and round generation.
pub mod tournament_service;
