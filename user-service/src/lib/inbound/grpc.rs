pub mod auth_gate;
pub mod handlers;
pub mod session_server;

pub use auth_gate::AuthGateLayer;
pub use auth_gate::AuthenticatedUser;
pub use session_server::SessionGrpcService;
