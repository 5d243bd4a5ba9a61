use anyhow::Error;
use once_cell::sync::Lazy;
use rocket::serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    ViewProfiles,
    EditOwnProfile,
    CheckIn,
    Reflect,
    JoinGroups,
    Post,

    CreateReflections,
    ManageResources,

    ManageGroups,
    EditAnyUser,
    EditUserRoles,
    ViewEmails,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Member,
    Expert,
    Admin,
}

static MEMBER_PERMISSIONS: Lazy<HashSet<Permission>> = Lazy::new(|| {
    let mut permissions = HashSet::new();

    permissions.insert(Permission::ViewProfiles);
    permissions.insert(Permission::EditOwnProfile);
    permissions.insert(Permission::CheckIn);
    permissions.insert(Permission::Reflect);
    permissions.insert(Permission::JoinGroups);
    permissions.insert(Permission::Post);

    permissions
});

static EXPERT_PERMISSIONS: Lazy<HashSet<Permission>> = Lazy::new(|| {
    let mut permissions = HashSet::new();

    permissions.extend(MEMBER_PERMISSIONS.iter().copied());

    permissions.insert(Permission::CreateReflections);
    permissions.insert(Permission::ManageResources);

    permissions
});

static ADMIN_PERMISSIONS: Lazy<HashSet<Permission>> = Lazy::new(|| {
    let mut permissions = HashSet::new();

    permissions.extend(EXPERT_PERMISSIONS.iter().copied());

    permissions.insert(Permission::ManageGroups);
    permissions.insert(Permission::EditAnyUser);
    permissions.insert(Permission::EditUserRoles);
    permissions.insert(Permission::ViewEmails);

    permissions
});

impl Role {
    pub fn permissions(&self) -> &'static HashSet<Permission> {
        match self {
            Role::Member => &MEMBER_PERMISSIONS,
            Role::Expert => &EXPERT_PERMISSIONS,
            Role::Admin => &ADMIN_PERMISSIONS,
        }
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::Member => "member",
            Role::Expert => "expert",
            Role::Admin => "admin",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "member" => Ok(Role::Member),
            "expert" => Ok(Role::Expert),
            "admin" => Ok(Role::Admin),
            _ => Err(Error::msg(format!("Unknown role: {}", s))),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
