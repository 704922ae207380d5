use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::model::{optional_text, required_text};
use crate::string_enum;

const MIN_PASSWORD_LEN: usize = 8;

string_enum!(
    /// 用户角色
    Role {
        User => "user",
        Reporter => "reporter",
        Admin => "admin",
    }
);

/// 对外返回的用户信息（不含密码摘要）
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// 带凭据的完整用户记录，只在认证流程中使用
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
    pub password_salt: String,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl RegisterInput {
    pub fn validated(self) -> AppResult<Self> {
        let username = required_text(&self.username, "username")?;
        if !username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.') {
            return Err(AppError::validation(
                "username may only contain letters, digits, '_' and '.'",
            ));
        }
        let email = required_text(&self.email, "email")?.to_lowercase();
        if !email.contains('@') {
            return Err(AppError::validation("email is not valid"));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::validation(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        Ok(Self {
            display_name: optional_text(self.display_name).or_else(|| Some(username.clone())),
            username,
            email,
            password: self.password,
        })
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

/// 管理员修改用户：角色和显示名
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UserUpdate {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
}

impl UserUpdate {
    pub fn validated(self) -> AppResult<Self> {
        if self.display_name.is_none() && self.role.is_none() {
            return Err(AppError::validation("nothing to update"));
        }
        let display_name = match self.display_name {
            Some(name) => Some(required_text(&name, "displayName")?),
            None => None,
        };
        Ok(Self { display_name, ..self })
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_defaults_display_name_to_username() {
        let input = RegisterInput {
            username: "jdoe".into(),
            email: "JDoe@Example.com".into(),
            password: "correct horse".into(),
            display_name: None,
        }
        .validated()
        .unwrap();
        assert_eq!(input.display_name.as_deref(), Some("jdoe"));
        assert_eq!(input.email, "jdoe@example.com");
    }

    #[test]
    fn short_password_rejected() {
        let result = RegisterInput {
            username: "jdoe".into(),
            email: "jdoe@example.com".into(),
            password: "short".into(),
            display_name: None,
        }
        .validated();
        assert!(result.is_err());
    }

    #[test]
    fn role_round_trips_as_lowercase_text() {
        assert_eq!(Role::Reporter.as_str(), "reporter");
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert!("editor".parse::<Role>().is_err());
    }
}
