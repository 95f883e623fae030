use serde::{Deserialize, Serialize};

/// A user account as the user service serializes it. Timestamps stay as
/// wire strings; the backend emits `LocalDateTime` text we only display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub real_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// 0 disabled, 1 active.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<i32>,
    /// 0 ordinary user, 1 administrator.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub account_type: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<Role>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login_time: Option<String>,
}

impl UserProfile {
    /// Administrative accounts are protected from deletion and from
    /// unprivileged status toggling.
    pub fn is_admin(&self) -> bool {
        self.account_type == Some(1)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: i64,
    pub name: String,
    /// Unique role key, e.g. "admin".
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<Permission>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    pub id: i64,
    pub name: String,
    /// Unique permission key, e.g. "user:create".
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContractRecord {
    pub id: i64,
    pub contract_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Raw status code; render through [`ContractStatus::from_code`].
    #[serde(default)]
    pub status: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
}

impl ContractRecord {
    pub fn status(&self) -> ContractStatus {
        ContractStatus::from_code(self.status)
    }
}

/// Badge style a status renders with; mirrors the UI variant names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeVariant {
    Default,
    Secondary,
    Destructive,
    Outline,
}

/// Closed contract lifecycle enumeration. Unknown codes from newer
/// backends render as `Unknown` rather than failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractStatus {
    Draft,
    UnderReview,
    Approved,
    Rejected,
    Archived,
    Unknown,
}

impl ContractStatus {
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => ContractStatus::Draft,
            1 => ContractStatus::UnderReview,
            2 => ContractStatus::Approved,
            3 => ContractStatus::Rejected,
            4 => ContractStatus::Archived,
            _ => ContractStatus::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ContractStatus::Draft => "Draft",
            ContractStatus::UnderReview => "Under Review",
            ContractStatus::Approved => "Approved",
            ContractStatus::Rejected => "Rejected",
            ContractStatus::Archived => "Archived",
            ContractStatus::Unknown => "Unknown",
        }
    }

    pub fn variant(&self) -> BadgeVariant {
        match self {
            ContractStatus::Draft => BadgeVariant::Outline,
            ContractStatus::UnderReview => BadgeVariant::Secondary,
            ContractStatus::Approved => BadgeVariant::Default,
            ContractStatus::Rejected => BadgeVariant::Destructive,
            ContractStatus::Archived => BadgeVariant::Secondary,
            ContractStatus::Unknown => BadgeVariant::Default,
        }
    }
}

/// Partial user update; absent fields are left untouched server-side.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub real_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<i32>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub account_type: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RolePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<i32>,
}

/// Change-password payload for the self-service endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
    pub old_password: String,
    pub new_password: String,
}

/// The one non-session value persisted locally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// Unknown stored values fall back to light.
    pub fn from_str_lossy(raw: &str) -> Self {
        match raw {
            "dark" => Theme::Dark,
            _ => Theme::Light,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_status_code_renders_as_unknown() {
        let status = ContractStatus::from_code(42);
        assert_eq!(status, ContractStatus::Unknown);
        assert_eq!(status.label(), "Unknown");
        assert_eq!(status.variant(), BadgeVariant::Default);
    }

    #[test]
    fn known_status_codes_map_to_labels() {
        assert_eq!(ContractStatus::from_code(0).label(), "Draft");
        assert_eq!(ContractStatus::from_code(1).label(), "Under Review");
        assert_eq!(ContractStatus::from_code(3).variant(), BadgeVariant::Destructive);
    }

    #[test]
    fn user_profile_tolerates_extra_and_missing_fields() {
        let raw = serde_json::json!({
            "id": 7,
            "username": "alice",
            "type": 1,
            "tenantId": 3,
            "creator": "system"
        });
        let user: UserProfile = serde_json::from_value(raw).expect("deserialize");
        assert!(user.is_admin());
        assert_eq!(user.email, None);
    }

    #[test]
    fn patch_serializes_only_set_fields() {
        let patch = UserPatch {
            email: Some("a@b.c".into()),
            ..UserPatch::default()
        };
        let value = serde_json::to_value(&patch).expect("serialize");
        assert_eq!(value, serde_json::json!({"email": "a@b.c"}));
    }

    #[test]
    fn theme_round_trips_and_defaults_light() {
        assert_eq!(Theme::from_str_lossy("dark"), Theme::Dark);
        assert_eq!(Theme::from_str_lossy("dark").as_str(), "dark");
        assert_eq!(Theme::from_str_lossy("solarized"), Theme::Light);
    }
}
