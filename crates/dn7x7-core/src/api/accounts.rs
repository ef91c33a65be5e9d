//! Account lifecycle: login, signup, activation, passwords and profile.

use tracing::{debug, info, warn};

use crate::auth::LOGIN_PATH;
use crate::models::{
    Activation, LoginRequest, NewUser, PasswordChange, PasswordReset, PasswordResetConfirm,
    ProfileUpdate, TokenPair, User,
};

use super::{ApiClient, ApiError, ApiRequest, FormField};

const JWT_CREATE_PATH: &str = "/accounts/jwt/create/";
const USERS_PATH: &str = "/accounts/users/";
const ME_PATH: &str = "/accounts/users/me/";
const ACTIVATION_PATH: &str = "/accounts/users/activation/";
const RESET_PASSWORD_PATH: &str = "/accounts/users/reset_password/";
const RESET_PASSWORD_CONFIRM_PATH: &str = "/accounts/users/reset_password_confirm/";
const SET_PASSWORD_PATH: &str = "/accounts/users/set_password/";
const LOGOUT_PATH: &str = "/accounts/token/logout/";

impl ApiClient {
    /// Exchange credentials for a token pair, store it and return the profile
    pub async fn login(&self, email: &str, password: &str) -> Result<User, ApiError> {
        let request = ApiRequest::post(JWT_CREATE_PATH)
            .public()
            .json(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })?;
        let tokens: TokenPair = self.send_json(request).await?;
        self.store_tokens(&tokens)?;

        let user = self.me().await?;
        info!(user_id = user.id, "Logged in");
        Ok(user)
    }

    /// Load the profile for a stored session.
    ///
    /// Returns `None` when no access token is stored. If the profile cannot
    /// be fetched the stored credentials are discarded.
    pub async fn restore_session(&self) -> Result<Option<User>, ApiError> {
        if !self.is_authenticated() {
            return Ok(None);
        }

        match self.me().await {
            Ok(user) => {
                debug!(user_id = user.id, "Session restored");
                Ok(Some(user))
            }
            Err(e) => {
                warn!(error = %e, "Stored session is no longer usable, clearing");
                self.clear_credentials();
                Ok(None)
            }
        }
    }

    /// End the session locally, then tell the backend.
    ///
    /// The backend call is best effort: JWT sessions are stateless and a
    /// failure there must not keep the user logged in.
    pub async fn logout(&self) {
        let access = self.store().access_token().ok().flatten();
        self.clear_credentials();

        if let Some(token) = access {
            let request = ApiRequest::post(LOGOUT_PATH);
            if let Err(e) = self.send_with_token(&request, &token).await {
                warn!(error = %e, "Server-side logout failed");
            }
        }
        self.navigate(LOGIN_PATH);
        info!("Logged out");
    }

    /// Register an account. The backend emails an activation link.
    pub async fn signup(&self, user: &NewUser) -> Result<(), ApiError> {
        let request = ApiRequest::post(USERS_PATH).public().json(user)?;
        self.send_empty(request).await
    }

    pub async fn activate(&self, uid: &str, token: &str) -> Result<(), ApiError> {
        let request = ApiRequest::post(ACTIVATION_PATH).public().json(&Activation {
            uid: uid.to_string(),
            token: token.to_string(),
        })?;
        self.send_empty(request).await
    }

    /// Ask the backend to email a password reset link
    pub async fn reset_password(&self, email: &str) -> Result<(), ApiError> {
        let request = ApiRequest::post(RESET_PASSWORD_PATH)
            .public()
            .json(&PasswordReset {
                email: email.to_string(),
            })?;
        self.send_empty(request).await
    }

    pub async fn reset_password_confirm(&self, confirm: &PasswordResetConfirm) -> Result<(), ApiError> {
        let request = ApiRequest::post(RESET_PASSWORD_CONFIRM_PATH)
            .public()
            .json(confirm)?;
        self.send_empty(request).await
    }

    pub async fn set_password(&self, change: &PasswordChange) -> Result<(), ApiError> {
        let request = ApiRequest::post(SET_PASSWORD_PATH).json(change)?;
        self.send_empty(request).await
    }

    pub async fn me(&self) -> Result<User, ApiError> {
        self.send_json(ApiRequest::get(ME_PATH)).await
    }

    /// Update the profile. Sent as multipart so an image can be included.
    pub async fn update_me(&self, update: &ProfileUpdate) -> Result<User, ApiError> {
        let mut fields = Vec::new();
        if let Some(ref name) = update.name {
            fields.push(FormField::Text {
                name: "name".to_string(),
                value: name.clone(),
            });
        }
        if let Some(ref organization) = update.organization {
            fields.push(FormField::Text {
                name: "organization".to_string(),
                value: organization.clone(),
            });
        }
        if let Some(ref image) = update.profile_image {
            fields.push(FormField::File {
                name: "profile_image".to_string(),
                file_name: image.file_name.clone(),
                content_type: image.content_type.clone(),
                bytes: image.bytes.clone(),
            });
        }

        self.send_json(ApiRequest::patch(ME_PATH).multipart(fields)).await
    }
}
