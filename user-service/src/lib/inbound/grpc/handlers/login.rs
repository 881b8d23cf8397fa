use std::sync::Arc;

use tonic::Status;

use crate::domain::session::errors::SessionError;
use crate::domain::session::ports::SessionServicePort;
use crate::domain::user::models::PhoneNumber;
use crate::proto::LoginRequest;
use crate::proto::LoginResponse;

pub async fn login<S: SessionServicePort>(
    service: Arc<S>,
    request: LoginRequest,
) -> Result<LoginResponse, Status> {
    // A malformed handle is reported like an unknown one
    let phone_number =
        PhoneNumber::new(request.phone_number).map_err(|_| SessionError::InvalidCredentials)?;

    let outcome = service.login(&phone_number, &request.password).await?;

    Ok(LoginResponse {
        user: Some(outcome.user.into()),
        access_token: outcome.tokens.access_token,
        refresh_token: outcome.tokens.refresh_token,
    })
}
