use std::sync::Arc;

use tonic::Status;

use crate::domain::session::ports::SessionServicePort;
use crate::proto::RefreshTokensRequest;
use crate::proto::RefreshTokensResponse;

pub async fn refresh_tokens<S: SessionServicePort>(
    service: Arc<S>,
    request: RefreshTokensRequest,
) -> Result<RefreshTokensResponse, Status> {
    if request.refresh_token.is_empty() {
        return Err(Status::invalid_argument("Refresh token is required"));
    }

    let tokens = service.refresh_tokens(&request.refresh_token).await?;

    Ok(RefreshTokensResponse {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
    })
}
