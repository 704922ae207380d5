// src/model/mod.rs

pub mod advertisement;
pub mod category;
pub mod news;
pub mod page;
pub mod person;
pub mod setting;
pub mod user;

use once_cell::sync::Lazy;
use regex::Regex;

/// 定义以字符串形式存储和传输的枚举：serde 名称、数据库文本、FromStr 保持一致
#[macro_export]
macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $($text => Ok($name::$variant),)+
                    _ => Err(format!("Invalid value for {}: {}", stringify!($name), value)),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

static NON_SLUG: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9\s_-]").expect("slug regex"));
static SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s_-]+").expect("separator regex"));

/// 标题 / 姓名转 URL slug
pub fn slugify(input: &str) -> String {
    let lower = input.trim().to_lowercase();
    let cleaned = NON_SLUG.replace_all(&lower, "");
    SEPARATORS
        .replace_all(cleaned.trim(), "-")
        .trim_matches('-')
        .to_string()
}

/// 必填文本字段：去掉首尾空白后不能为空
pub(crate) fn required_text(value: &str, field: &str) -> Result<String, crate::error::AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(crate::error::AppError::validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

/// 可选文本字段：空白字符串视为未填写
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
