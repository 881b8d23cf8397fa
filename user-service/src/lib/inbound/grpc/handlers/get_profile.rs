use std::sync::Arc;

use tonic::Status;

use crate::domain::session::ports::SessionServicePort;
use crate::inbound::grpc::auth_gate::AuthenticatedUser;
use crate::proto::GetProfileResponse;

pub async fn get_profile<S: SessionServicePort>(
    service: Arc<S>,
    caller: AuthenticatedUser,
) -> Result<GetProfileResponse, Status> {
    let user = service.get_profile(&caller.user_id).await?;

    Ok(GetProfileResponse {
        user: Some(user.into()),
    })
}
