use serde::{Deserialize, Serialize};
use strum_macros::Display;
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, sqlx::Type, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    Employee,
    Manager,
    Hr,
}

/// What a role is allowed to do. Derived once per request from the token's
/// role; handlers gate on these flags instead of comparing role strings.
#[derive(Debug, Copy, Clone)]
pub struct Capabilities {
    pub can_review: bool,
    pub can_manage_holidays: bool,
    pub can_manage_users: bool,
}

impl Role {
    pub fn capabilities(self) -> Capabilities {
        match self {
            Role::Employee => Capabilities {
                can_review: false,
                can_manage_holidays: false,
                can_manage_users: false,
            },
            Role::Manager => Capabilities {
                can_review: true,
                can_manage_holidays: false,
                can_manage_users: false,
            },
            Role::Hr => Capabilities {
                can_review: true,
                can_manage_holidays: true,
                can_manage_users: true,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn employee_has_no_privileges() {
        let caps = Role::Employee.capabilities();
        assert!(!caps.can_review);
        assert!(!caps.can_manage_holidays);
        assert!(!caps.can_manage_users);
    }

    #[test]
    fn manager_reviews_but_does_not_administer() {
        let caps = Role::Manager.capabilities();
        assert!(caps.can_review);
        assert!(!caps.can_manage_holidays);
        assert!(!caps.can_manage_users);
    }

    #[test]
    fn hr_holds_every_capability() {
        let caps = Role::Hr.capabilities();
        assert!(caps.can_review);
        assert!(caps.can_manage_holidays);
        assert!(caps.can_manage_users);
    }

    #[test]
    fn role_renders_lowercase() {
        assert_eq!(Role::Hr.to_string(), "hr");
        assert_eq!(Role::Employee.to_string(), "employee");
    }
}
