use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Caller id recorded when a request carries no usable identity.
pub const ANONYMOUS: &str = "Anonymous";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    Admin,
    Manager,
    Employee,
    Customer,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::Manager, Role::Employee, Role::Customer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Manager => "Manager",
            Role::Employee => "Employee",
            Role::Customer => "Customer",
        }
    }
}

impl TryFrom<&str> for Role {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == value)
            .ok_or(())
    }
}

pub trait RequiredRole {
    fn required() -> Role;
}

pub struct AdminRole;

impl RequiredRole for AdminRole {
    fn required() -> Role {
        Role::Admin
    }
}

/// Access-token payload.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    #[serde(rename = "fullName", default)]
    pub full_name: String,
    pub jti: String,
    #[serde(default)]
    pub roles: Vec<Role>,
    pub iat: usize,
    pub exp: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    /// Name-identifier claim; preferred over `sub` when attributing requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nameid: Option<String>,
}

impl Claims {
    pub fn user_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.sub).ok()
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Identity used for audit attribution: name-identifier, then subject.
    pub fn actor_id(&self) -> &str {
        self.nameid
            .as_deref()
            .filter(|id| !id.is_empty())
            .or(Some(self.sub.as_str()).filter(|sub| !sub.is_empty()))
            .unwrap_or(ANONYMOUS)
    }
}

#[cfg(test)]
mod tests {
    use super::{ANONYMOUS, AdminRole, Claims, RequiredRole, Role};

    fn claims(sub: &str, nameid: Option<&str>) -> Claims {
        Claims {
            sub: sub.to_string(),
            email: "alice@example.com".to_string(),
            full_name: "Alice".to_string(),
            jti: "jti-1".to_string(),
            roles: vec![Role::Employee],
            iat: 0,
            exp: 0,
            iss: None,
            aud: None,
            nameid: nameid.map(str::to_string),
        }
    }

    #[test]
    fn role_names_match_stored_values() {
        for role in Role::ALL {
            assert_eq!(Role::try_from(role.as_str()), Ok(role));
        }
        assert!(Role::try_from("admin").is_err());
        assert_eq!(AdminRole::required(), Role::Admin);
    }

    #[test]
    fn actor_id_prefers_name_identifier() {
        assert_eq!(claims("sub-1", Some("name-1")).actor_id(), "name-1");
        assert_eq!(claims("sub-1", None).actor_id(), "sub-1");
        assert_eq!(claims("", Some("")).actor_id(), ANONYMOUS);
    }

    #[test]
    fn serializes_full_name_and_roles_like_the_wire_format() {
        let value = serde_json::to_value(claims("sub-1", None)).expect("claims serialize");
        assert_eq!(value["fullName"], "Alice");
        assert_eq!(value["roles"], serde_json::json!(["Employee"]));
        assert!(value.get("nameid").is_none());
    }
}
