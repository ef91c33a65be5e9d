//! Staff-only user management. Authorization is enforced by the backend;
//! non-staff callers get `ApiError::AccessDenied`.

use tracing::info;

use crate::models::{
    AddCreditsResponse, AdminUser, ApiCallLog, NewUser, TimeRange, ToggleActiveResponse,
    ToggleStaffResponse, UserUpdate,
};

use super::{ApiClient, ApiError, ApiRequest};

const ADMIN_USERS_PATH: &str = "/accounts/admin/users/";

fn user_path(id: i64) -> String {
    format!("{}{}/", ADMIN_USERS_PATH, id)
}

fn action_path(id: i64, action: &str) -> String {
    format!("{}{}/{}/", ADMIN_USERS_PATH, id, action)
}

impl ApiClient {
    /// All users, optionally narrowed by a search over name, email and organization
    pub async fn list_users(&self, search: Option<&str>) -> Result<Vec<AdminUser>, ApiError> {
        let mut request = ApiRequest::get(ADMIN_USERS_PATH);
        if let Some(term) = search.filter(|s| !s.is_empty()) {
            request = request.query("search", term);
        }
        self.send_json(request).await
    }

    pub async fn get_user(&self, id: i64) -> Result<AdminUser, ApiError> {
        self.send_json(ApiRequest::get(user_path(id))).await
    }

    pub async fn create_user(&self, user: &NewUser) -> Result<AdminUser, ApiError> {
        let request = ApiRequest::post(ADMIN_USERS_PATH).json(user)?;
        self.send_json(request).await
    }

    pub async fn update_user(&self, id: i64, update: &UserUpdate) -> Result<AdminUser, ApiError> {
        let request = ApiRequest::patch(user_path(id)).json(update)?;
        self.send_json(request).await
    }

    pub async fn delete_user(&self, id: i64) -> Result<(), ApiError> {
        self.send_empty(ApiRequest::delete(user_path(id))).await?;
        info!(user_id = id, "User deleted");
        Ok(())
    }

    /// Add to the user's purchased credits. The backend rejects amounts <= 0.
    pub async fn add_credits(&self, id: i64, credits: i64) -> Result<AddCreditsResponse, ApiError> {
        let request = ApiRequest::post(action_path(id, "add_credits"))
            .json(&serde_json::json!({ "credits": credits }))?;
        let response: AddCreditsResponse = self.send_json(request).await?;
        info!(user_id = id, credits = credits, total = response.total_credits, "Credits added");
        Ok(response)
    }

    pub async fn toggle_active(&self, id: i64) -> Result<ToggleActiveResponse, ApiError> {
        self.send_json(ApiRequest::post(action_path(id, "toggle_active")))
            .await
    }

    pub async fn toggle_staff(&self, id: i64) -> Result<ToggleStaffResponse, ApiError> {
        self.send_json(ApiRequest::post(action_path(id, "toggle_staff")))
            .await
    }

    /// Up to 100 most recent calls made with the user's keys
    pub async fn user_logs(&self, id: i64, time_range: TimeRange) -> Result<Vec<ApiCallLog>, ApiError> {
        let request = ApiRequest::get(action_path(id, "logs")).query("time_range", time_range.as_str());
        self.send_json(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_paths() {
        assert_eq!(user_path(12), "/accounts/admin/users/12/");
        assert_eq!(action_path(12, "add_credits"), "/accounts/admin/users/12/add_credits/");
    }
}
