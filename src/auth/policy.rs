// src/auth/policy.rs

use crate::model::user::Role;

/// **受保护操作的能力清单**，所有需要鉴权的 handler 都只通过 `allows` 判断
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// 查看自己的资料
    ViewOwnProfile,
    /// 撰写并修改自己的文章
    WriteNews,
    /// 修改 / 删除任何人的文章，查看全部稿件
    ManageAllNews,
    /// 发布与撤回文章
    PublishNews,
    /// 使用人物提及建议
    SuggestPeople,
    /// 新增人物
    CreatePeople,
    /// 修改 / 删除人物
    ManagePeople,
    ManageCategories,
    ManagePages,
    ManageSettings,
    ManageUsers,
    ManageAdvertisements,
}

/// 角色 → 能力
pub fn allows(role: Role, capability: Capability) -> bool {
    use Capability::*;

    match role {
        Role::Admin => true,
        Role::Reporter => matches!(
            capability,
            ViewOwnProfile | WriteNews | SuggestPeople | CreatePeople
        ),
        Role::User => matches!(capability, ViewOwnProfile),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_can_do_everything() {
        for cap in [
            Capability::ManageAdvertisements,
            Capability::ManageUsers,
            Capability::PublishNews,
            Capability::WriteNews,
        ] {
            assert!(allows(Role::Admin, cap));
        }
    }

    #[test]
    fn reporter_writes_but_does_not_publish() {
        assert!(allows(Role::Reporter, Capability::WriteNews));
        assert!(allows(Role::Reporter, Capability::CreatePeople));
        assert!(!allows(Role::Reporter, Capability::PublishNews));
        assert!(!allows(Role::Reporter, Capability::ManagePeople));
        assert!(!allows(Role::Reporter, Capability::ManageAdvertisements));
    }

    #[test]
    fn reader_only_sees_own_profile() {
        assert!(allows(Role::User, Capability::ViewOwnProfile));
        assert!(!allows(Role::User, Capability::WriteNews));
        assert!(!allows(Role::User, Capability::SuggestPeople));
    }
}
