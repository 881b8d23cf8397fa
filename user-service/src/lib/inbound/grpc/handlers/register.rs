use std::sync::Arc;

use tonic::Status;

use crate::domain::session::ports::SessionServicePort;
use crate::domain::user::models::FirstName;
use crate::domain::user::models::PhoneNumber;
use crate::domain::user::models::RegisterCommand;
use crate::proto::RegisterRequest;
use crate::proto::RegisterResponse;

impl TryFrom<RegisterRequest> for RegisterCommand {
    type Error = Status;

    fn try_from(request: RegisterRequest) -> Result<Self, Self::Error> {
        let first_name = FirstName::new(request.first_name)
            .map_err(|e| Status::invalid_argument(format!("Invalid first name: {}", e)))?;
        let phone_number = PhoneNumber::new(request.phone_number)
            .map_err(|e| Status::invalid_argument(format!("Invalid phone number: {}", e)))?;

        Ok(RegisterCommand::new(first_name, phone_number, request.password))
    }
}

pub async fn register<S: SessionServicePort>(
    service: Arc<S>,
    request: RegisterRequest,
) -> Result<RegisterResponse, Status> {
    let command = RegisterCommand::try_from(request)?;

    let user = service.register(command).await?;

    Ok(RegisterResponse {
        user: Some(user.into()),
    })
}
