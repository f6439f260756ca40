//! The three user classes and the Staff/Student discriminator.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Administrator,
    Staff,
    Student,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Administrator, Role::Staff, Role::Student];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Administrator => "administrator",
            Role::Staff => "staff",
            Role::Student => "student",
        }
    }

    /// Client dashboard this role lands on after login.
    pub fn landing(&self) -> &'static str {
        match self {
            Role::Administrator => "admin",
            Role::Staff => "staff",
            Role::Student => "student",
        }
    }

    /// Leave and feedback kind for this role. Administrators have none.
    pub fn member_kind(&self) -> Option<MemberKind> {
        match self {
            Role::Administrator => None,
            Role::Staff => Some(MemberKind::Staff),
            Role::Student => Some(MemberKind::Student),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a leave request or feedback message came from staff or a student.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "member_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    Staff,
    Student,
}

impl MemberKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberKind::Staff => "staff",
            MemberKind::Student => "student",
        }
    }
}
