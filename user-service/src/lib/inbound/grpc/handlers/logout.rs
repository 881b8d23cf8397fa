use std::sync::Arc;

use tonic::Status;

use crate::domain::session::ports::SessionServicePort;
use crate::inbound::grpc::auth_gate::AuthenticatedUser;
use crate::proto::LogoutResponse;

pub async fn logout<S: SessionServicePort>(
    service: Arc<S>,
    caller: AuthenticatedUser,
) -> Result<LogoutResponse, Status> {
    service.logout(&caller.user_id).await?;

    Ok(LogoutResponse { success: true })
}
