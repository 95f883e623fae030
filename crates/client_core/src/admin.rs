//! User-management panel state: users, roles, permissions.
//!
//! The three sub-resources share one CRUD discipline: call the user
//! service, check the envelope, then patch the cache optimistically
//! after acknowledgment (mutations) or replace it wholesale (fetches).
//! Every action takes the acting token explicitly; this store holds no
//! session state of its own.

use reqwest::Method;
use serde_json::json;
use tokio::sync::Mutex;

use shared::{
    domain::{Permission, PermissionPatch, Role, RolePatch, UserPatch, UserProfile},
    envelope::{self, Page},
    error::ApiError,
};

use crate::executor::{Payload, RequestExecutor};

/// Page used when an action needs a full refetch after a mutation.
const DEFAULT_PAGE: u32 = 1;
const DEFAULT_PAGE_SIZE: u32 = 10;

#[derive(Default)]
struct AdminInner {
    users: Vec<UserProfile>,
    total_users: u64,
    roles: Vec<Role>,
    permissions: Vec<Permission>,
    error: Option<String>,
}

pub struct AdminStore {
    executor: RequestExecutor,
    inner: Mutex<AdminInner>,
}

impl AdminStore {
    pub fn new(executor: RequestExecutor) -> Self {
        Self {
            executor,
            inner: Mutex::new(AdminInner::default()),
        }
    }

    pub async fn users(&self) -> Vec<UserProfile> {
        self.inner.lock().await.users.clone()
    }

    pub async fn total_users(&self) -> u64 {
        self.inner.lock().await.total_users
    }

    pub async fn roles(&self) -> Vec<Role> {
        self.inner.lock().await.roles.clone()
    }

    pub async fn permissions(&self) -> Vec<Permission> {
        self.inner.lock().await.permissions.clone()
    }

    pub async fn last_error(&self) -> Option<String> {
        self.inner.lock().await.error.clone()
    }

    // --- users ---

    /// Page numbering on the user service starts at 1.
    pub async fn fetch_users(
        &self,
        token: Option<&str>,
        page: u32,
        page_size: u32,
        filters: &[(&str, String)],
    ) -> Result<Page<UserProfile>, ApiError> {
        let mut query: Vec<(&str, String)> = vec![
            ("page", page.to_string()),
            ("pageSize", page_size.to_string()),
        ];
        query.extend(filters.iter().cloned());

        let result = async {
            let body = self
                .executor
                .get("/api/users/list", &query, token)
                .await?
                .into_json()?;
            envelope::expect_success(&body, "user list failed")?;
            envelope::normalize_page::<UserProfile>(body)
        }
        .await;

        let mut inner = self.inner.lock().await;
        match result {
            Ok(page) => {
                inner.users = page.list.clone();
                inner.total_users = page.total;
                inner.error = None;
                Ok(page)
            }
            Err(err) => {
                inner.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Registers the user, then refetches the list: the creation
    /// response is not assumed to match the list-item shape.
    pub async fn create_user(
        &self,
        token: Option<&str>,
        draft: &UserPatch,
    ) -> Result<(), ApiError> {
        let result = async {
            let body = self
                .executor
                .send_json(
                    Method::POST,
                    "/api/users/register",
                    serde_json::to_value(draft)
                        .map_err(|err| ApiError::Decode(err.to_string()))?,
                    token,
                )
                .await?
                .into_json()?;
            envelope::expect_success(&body, "user creation failed")
        }
        .await;

        if let Err(err) = result {
            self.inner.lock().await.error = Some(err.to_string());
            return Err(err);
        }
        self.fetch_users(token, DEFAULT_PAGE, DEFAULT_PAGE_SIZE, &[])
            .await?;
        Ok(())
    }

    pub async fn get_user_by_id(
        &self,
        token: Option<&str>,
        id: i64,
    ) -> Result<UserProfile, ApiError> {
        let result = async {
            let body = self
                .executor
                .get(&format!("/api/users/{id}"), &[], token)
                .await?
                .into_json()?;
            envelope::expect_success(&body, "user lookup failed")?;
            envelope::normalize_item(body)
        }
        .await;
        self.record(result).await
    }

    /// Updates an arbitrary user by id. This never goes through the
    /// self-profile endpoint, which would overwrite the acting
    /// administrator's own account.
    pub async fn update_user_admin(
        &self,
        token: Option<&str>,
        id: i64,
        patch: &UserPatch,
    ) -> Result<UserProfile, ApiError> {
        let result = async {
            let body = self
                .executor
                .send_json(
                    Method::PUT,
                    &format!("/api/users/{id}"),
                    serde_json::to_value(patch)
                        .map_err(|err| ApiError::Decode(err.to_string()))?,
                    token,
                )
                .await?
                .into_json()?;
            envelope::expect_success(&body, "user update failed")?;
            envelope::normalize_item::<UserProfile>(body)
        }
        .await;

        let mut inner = self.inner.lock().await;
        match result {
            Ok(updated) => {
                if let Some(cached) = inner.users.iter_mut().find(|user| user.id == id) {
                    *cached = updated.clone();
                }
                inner.error = None;
                Ok(updated)
            }
            Err(err) => {
                inner.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Refuses to delete administrators before any network call is
    /// made. The server enforces this too; the guard keeps an obvious
    /// mistake from ever leaving the client.
    pub async fn delete_user(&self, token: Option<&str>, id: i64) -> Result<(), ApiError> {
        {
            let mut inner = self.inner.lock().await;
            let targets_admin = inner
                .users
                .iter()
                .any(|user| user.id == id && user.is_admin());
            if targets_admin {
                let err = ApiError::DomainGuard("cannot delete admin user".to_string());
                inner.error = Some(err.to_string());
                return Err(err);
            }
        }

        let result = async {
            let body = self
                .executor
                .execute(
                    Method::DELETE,
                    &format!("/api/users/{id}"),
                    &[],
                    Payload::Empty,
                    token,
                )
                .await?
                .into_json()?;
            envelope::expect_success(&body, "user deletion failed")
        }
        .await;

        let mut inner = self.inner.lock().await;
        match result {
            Ok(()) => {
                inner.users.retain(|user| user.id != id);
                inner.error = None;
                Ok(())
            }
            Err(err) => {
                inner.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    pub async fn toggle_user_status(
        &self,
        token: Option<&str>,
        id: i64,
        status: i32,
    ) -> Result<(), ApiError> {
        let result = async {
            let body = self
                .executor
                .execute(
                    Method::PUT,
                    &format!("/api/users/{id}/status"),
                    &[("status", status.to_string())],
                    Payload::Empty,
                    token,
                )
                .await?
                .into_json()?;
            envelope::expect_success(&body, "status update failed")
        }
        .await;

        let mut inner = self.inner.lock().await;
        match result {
            Ok(()) => {
                if let Some(cached) = inner.users.iter_mut().find(|user| user.id == id) {
                    cached.status = Some(status);
                }
                inner.error = None;
                Ok(())
            }
            Err(err) => {
                inner.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Fire-and-forget association; cached users keep their shape.
    pub async fn assign_roles(
        &self,
        token: Option<&str>,
        user_id: i64,
        role_ids: &[i64],
    ) -> Result<(), ApiError> {
        let result = async {
            let body = self
                .executor
                .send_json(
                    Method::POST,
                    &format!("/api/users/{user_id}/roles"),
                    json!(role_ids),
                    token,
                )
                .await?
                .into_json()?;
            envelope::expect_success(&body, "role assignment failed")
        }
        .await;
        self.record(result).await
    }

    // --- roles ---

    pub async fn fetch_roles(&self, token: Option<&str>) -> Result<Vec<Role>, ApiError> {
        let result = async {
            let body = self.executor.get("/api/roles", &[], token).await?.into_json()?;
            envelope::expect_success(&body, "role list failed")?;
            envelope::normalize_list::<Role>(body)
        }
        .await;

        let mut inner = self.inner.lock().await;
        match result {
            Ok(roles) => {
                inner.roles = roles.clone();
                inner.error = None;
                Ok(roles)
            }
            Err(err) => {
                inner.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    pub async fn create_role(
        &self,
        token: Option<&str>,
        draft: &RolePatch,
    ) -> Result<Role, ApiError> {
        let result = async {
            let body = self
                .executor
                .send_json(
                    Method::POST,
                    "/api/roles",
                    serde_json::to_value(draft)
                        .map_err(|err| ApiError::Decode(err.to_string()))?,
                    token,
                )
                .await?
                .into_json()?;
            envelope::expect_success(&body, "role creation failed")?;
            envelope::normalize_item::<Role>(body)
        }
        .await;

        let mut inner = self.inner.lock().await;
        match result {
            Ok(role) => {
                inner.roles.push(role.clone());
                inner.error = None;
                Ok(role)
            }
            Err(err) => {
                inner.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    pub async fn update_role(
        &self,
        token: Option<&str>,
        id: i64,
        patch: &RolePatch,
    ) -> Result<Role, ApiError> {
        let result = async {
            let body = self
                .executor
                .send_json(
                    Method::PUT,
                    &format!("/api/roles/{id}"),
                    serde_json::to_value(patch)
                        .map_err(|err| ApiError::Decode(err.to_string()))?,
                    token,
                )
                .await?
                .into_json()?;
            envelope::expect_success(&body, "role update failed")?;
            envelope::normalize_item::<Role>(body)
        }
        .await;

        let mut inner = self.inner.lock().await;
        match result {
            Ok(role) => {
                if let Some(cached) = inner.roles.iter_mut().find(|r| r.id == id) {
                    *cached = role.clone();
                }
                inner.error = None;
                Ok(role)
            }
            Err(err) => {
                inner.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    pub async fn delete_role(&self, token: Option<&str>, id: i64) -> Result<(), ApiError> {
        let result = async {
            let body = self
                .executor
                .execute(
                    Method::DELETE,
                    &format!("/api/roles/{id}"),
                    &[],
                    Payload::Empty,
                    token,
                )
                .await?
                .into_json()?;
            envelope::expect_success(&body, "role deletion failed")
        }
        .await;

        let mut inner = self.inner.lock().await;
        match result {
            Ok(()) => {
                inner.roles.retain(|role| role.id != id);
                inner.error = None;
                Ok(())
            }
            Err(err) => {
                inner.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    pub async fn toggle_role_status(
        &self,
        token: Option<&str>,
        id: i64,
        status: i32,
    ) -> Result<(), ApiError> {
        let result = async {
            let body = self
                .executor
                .execute(
                    Method::PUT,
                    &format!("/api/roles/{id}/status"),
                    &[("status", status.to_string())],
                    Payload::Empty,
                    token,
                )
                .await?
                .into_json()?;
            envelope::expect_success(&body, "status update failed")
        }
        .await;

        let mut inner = self.inner.lock().await;
        match result {
            Ok(()) => {
                if let Some(cached) = inner.roles.iter_mut().find(|role| role.id == id) {
                    cached.status = Some(status);
                }
                inner.error = None;
                Ok(())
            }
            Err(err) => {
                inner.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    pub async fn assign_permissions(
        &self,
        token: Option<&str>,
        role_id: i64,
        permission_ids: &[i64],
    ) -> Result<(), ApiError> {
        let result = async {
            let body = self
                .executor
                .send_json(
                    Method::POST,
                    &format!("/api/roles/{role_id}/permissions"),
                    json!(permission_ids),
                    token,
                )
                .await?
                .into_json()?;
            envelope::expect_success(&body, "permission assignment failed")
        }
        .await;
        self.record(result).await
    }

    // --- permissions ---

    pub async fn fetch_permissions(
        &self,
        token: Option<&str>,
    ) -> Result<Vec<Permission>, ApiError> {
        let result = async {
            let body = self
                .executor
                .get("/api/permissions", &[], token)
                .await?
                .into_json()?;
            envelope::expect_success(&body, "permission list failed")?;
            envelope::normalize_list::<Permission>(body)
        }
        .await;

        let mut inner = self.inner.lock().await;
        match result {
            Ok(permissions) => {
                inner.permissions = permissions.clone();
                inner.error = None;
                Ok(permissions)
            }
            Err(err) => {
                inner.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    pub async fn create_permission(
        &self,
        token: Option<&str>,
        draft: &PermissionPatch,
    ) -> Result<Permission, ApiError> {
        let result = async {
            let body = self
                .executor
                .send_json(
                    Method::POST,
                    "/api/permissions",
                    serde_json::to_value(draft)
                        .map_err(|err| ApiError::Decode(err.to_string()))?,
                    token,
                )
                .await?
                .into_json()?;
            envelope::expect_success(&body, "permission creation failed")?;
            envelope::normalize_item::<Permission>(body)
        }
        .await;

        let mut inner = self.inner.lock().await;
        match result {
            Ok(permission) => {
                inner.permissions.push(permission.clone());
                inner.error = None;
                Ok(permission)
            }
            Err(err) => {
                inner.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    pub async fn update_permission(
        &self,
        token: Option<&str>,
        id: i64,
        patch: &PermissionPatch,
    ) -> Result<Permission, ApiError> {
        let result = async {
            let body = self
                .executor
                .send_json(
                    Method::PUT,
                    &format!("/api/permissions/{id}"),
                    serde_json::to_value(patch)
                        .map_err(|err| ApiError::Decode(err.to_string()))?,
                    token,
                )
                .await?
                .into_json()?;
            envelope::expect_success(&body, "permission update failed")?;
            envelope::normalize_item::<Permission>(body)
        }
        .await;

        let mut inner = self.inner.lock().await;
        match result {
            Ok(permission) => {
                if let Some(cached) = inner.permissions.iter_mut().find(|p| p.id == id) {
                    *cached = permission.clone();
                }
                inner.error = None;
                Ok(permission)
            }
            Err(err) => {
                inner.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    pub async fn delete_permission(&self, token: Option<&str>, id: i64) -> Result<(), ApiError> {
        let result = async {
            let body = self
                .executor
                .execute(
                    Method::DELETE,
                    &format!("/api/permissions/{id}"),
                    &[],
                    Payload::Empty,
                    token,
                )
                .await?
                .into_json()?;
            envelope::expect_success(&body, "permission deletion failed")
        }
        .await;

        let mut inner = self.inner.lock().await;
        match result {
            Ok(()) => {
                inner.permissions.retain(|permission| permission.id != id);
                inner.error = None;
                Ok(())
            }
            Err(err) => {
                inner.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    async fn record<T>(&self, result: Result<T, ApiError>) -> Result<T, ApiError> {
        let mut inner = self.inner.lock().await;
        match &result {
            Ok(_) => inner.error = None,
            Err(err) => inner.error = Some(err.to_string()),
        }
        result
    }
}

#[cfg(test)]
#[path = "tests/admin_tests.rs"]
mod tests;
