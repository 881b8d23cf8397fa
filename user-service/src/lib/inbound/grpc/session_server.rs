use std::sync::Arc;

use tonic::Request;
use tonic::Response;
use tonic::Status;

use super::auth_gate::AuthenticatedUser;
use super::handlers::get_profile;
use super::handlers::login;
use super::handlers::logout;
use super::handlers::refresh_tokens;
use super::handlers::register;
use super::handlers::update_profile;
use crate::domain::session::ports::SessionServicePort;
use crate::proto::user_service_server::UserService as UserServiceProto;
use crate::proto::GetProfileRequest;
use crate::proto::GetProfileResponse;
use crate::proto::LoginRequest;
use crate::proto::LoginResponse;
use crate::proto::LogoutRequest;
use crate::proto::LogoutResponse;
use crate::proto::RefreshTokensRequest;
use crate::proto::RefreshTokensResponse;
use crate::proto::RegisterRequest;
use crate::proto::RegisterResponse;
use crate::proto::UpdateProfileRequest;
use crate::proto::UpdateProfileResponse;

pub struct SessionGrpcService<S>
where
    S: SessionServicePort,
{
    service: Arc<S>,
}

impl<S> SessionGrpcService<S>
where
    S: SessionServicePort,
{
    pub fn new(service: Arc<S>) -> Self {
        Self { service }
    }
}

#[tonic::async_trait]
impl<S> UserServiceProto for SessionGrpcService<S>
where
    S: SessionServicePort,
{
    async fn register(
        &self,
        request: Request<RegisterRequest>,
    ) -> Result<Response<RegisterResponse>, Status> {
        let response = register::register(self.service.clone(), request.into_inner()).await?;
        Ok(Response::new(response))
    }

    async fn login(
        &self,
        request: Request<LoginRequest>,
    ) -> Result<Response<LoginResponse>, Status> {
        let response = login::login(self.service.clone(), request.into_inner()).await?;
        Ok(Response::new(response))
    }

    async fn refresh_tokens(
        &self,
        request: Request<RefreshTokensRequest>,
    ) -> Result<Response<RefreshTokensResponse>, Status> {
        let response =
            refresh_tokens::refresh_tokens(self.service.clone(), request.into_inner()).await?;
        Ok(Response::new(response))
    }

    async fn logout(
        &self,
        request: Request<LogoutRequest>,
    ) -> Result<Response<LogoutResponse>, Status> {
        let caller = AuthenticatedUser::from_request(&request)?;
        let response = logout::logout(self.service.clone(), caller).await?;
        Ok(Response::new(response))
    }

    async fn get_profile(
        &self,
        request: Request<GetProfileRequest>,
    ) -> Result<Response<GetProfileResponse>, Status> {
        let caller = AuthenticatedUser::from_request(&request)?;
        let response = get_profile::get_profile(self.service.clone(), caller).await?;
        Ok(Response::new(response))
    }

    async fn update_profile(
        &self,
        request: Request<UpdateProfileRequest>,
    ) -> Result<Response<UpdateProfileResponse>, Status> {
        let caller = AuthenticatedUser::from_request(&request)?;
        let response =
            update_profile::update_profile(self.service.clone(), caller, request.into_inner())
                .await?;
        Ok(Response::new(response))
    }
}
