//! Authentication endpoints

use super::{ApiClient, AuthPolicy};
use crate::error::ClientError;
use crate::models::auth::{ImpersonateRequest, LoginRequest};
use crate::models::AuthResponse;

impl ApiClient {
    /// `POST /auth/login`
    ///
    /// A 401 here means bad credentials and leaves any stored session alone.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ClientError> {
        let request = self
            .http
            .post(self.url("/auth/login"))
            .json(&LoginRequest { email, password });
        self.send_json(request, AuthPolicy::Passthrough).await
    }

    /// `POST /auth/impersonate` with the admin token
    pub async fn impersonate(&self, user_id: &str) -> Result<AuthResponse, ClientError> {
        let request = self
            .http
            .post(self.url("/auth/impersonate"))
            .json(&ImpersonateRequest { user_id });
        self.send_json(request, AuthPolicy::ExpireOn401).await
    }

    /// `POST /auth/logout`
    pub async fn logout(&self) -> Result<(), ClientError> {
        let request = self.http.post(self.url("/auth/logout"));
        self.send(request, AuthPolicy::Passthrough).await?;
        Ok(())
    }
}
