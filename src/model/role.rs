use serde::Serialize;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, strum_macros::Display, strum_macros::AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    SuperAdmin = 1,
    Admin = 2,
    Hr = 3,
    Manager = 4,
    Employee = 5,
}

/// Roles allowed to decide leave, broadcast notifications and read the audit trail.
pub const ADMINS: &[Role] = &[Role::SuperAdmin, Role::Admin];

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::SuperAdmin),
            2 => Some(Role::Admin),
            3 => Some(Role::Hr),
            4 => Some(Role::Manager),
            5 => Some(Role::Employee),
            _ => None,
        }
    }

    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn is_admin(self) -> bool {
        ADMINS.contains(&self)
    }
}
