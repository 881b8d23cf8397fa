use std::sync::Arc;

use tonic::Status;

use crate::domain::session::ports::SessionServicePort;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::FirstName;
use crate::domain::user::models::LastName;
use crate::domain::user::models::PhoneNumber;
use crate::domain::user::models::UpdateProfileCommand;
use crate::inbound::grpc::auth_gate::AuthenticatedUser;
use crate::proto::UpdateProfileRequest;
use crate::proto::UpdateProfileResponse;

impl TryFrom<UpdateProfileRequest> for UpdateProfileCommand {
    type Error = Status;

    fn try_from(request: UpdateProfileRequest) -> Result<Self, Self::Error> {
        let invalid = |field: &str, e: String| {
            Status::invalid_argument(format!("Invalid {}: {}", field, e))
        };

        Ok(UpdateProfileCommand {
            first_name: request
                .first_name
                .map(FirstName::new)
                .transpose()
                .map_err(|e| invalid("first name", e.to_string()))?,
            last_name: request
                .last_name
                .map(|v| clearable(v, LastName::new))
                .transpose()
                .map_err(|e| invalid("last name", e.to_string()))?,
            email: request
                .email
                .map(|v| clearable(v, EmailAddress::new))
                .transpose()
                .map_err(|e| invalid("email", e.to_string()))?,
            phone_number: request
                .phone_number
                .map(PhoneNumber::new)
                .transpose()
                .map_err(|e| invalid("phone number", e.to_string()))?,
        })
    }
}

/// A set but blank value clears an optional field.
fn clearable<T, E>(
    value: String,
    parse: impl FnOnce(String) -> Result<T, E>,
) -> Result<Option<T>, E> {
    if value.trim().is_empty() {
        return Ok(None);
    }
    parse(value).map(Some)
}

pub async fn update_profile<S: SessionServicePort>(
    service: Arc<S>,
    caller: AuthenticatedUser,
    request: UpdateProfileRequest,
) -> Result<UpdateProfileResponse, Status> {
    let command = UpdateProfileCommand::try_from(request)?;
    if command.is_empty() {
        return Err(Status::invalid_argument("No profile fields to update"));
    }

    let user = service.update_profile(&caller.user_id, command).await?;

    Ok(UpdateProfileResponse {
        user: Some(user.into()),
    })
}
