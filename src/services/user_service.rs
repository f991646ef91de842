use sea_orm::ConnectionTrait;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    auth::{Role, credentials::normalize_email},
    db::dao::{DaoBase, DaoLayerError, DaoResult, UserDao, UserRoleDao},
    db::entities::user,
};

/// Public view of an account returned by login and refresh.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub roles: Vec<Role>,
}

#[derive(Clone)]
pub struct UserService {
    user_dao: UserDao,
    role_dao: UserRoleDao,
}

impl UserService {
    pub fn new(user_dao: UserDao, role_dao: UserRoleDao) -> Self {
        Self { user_dao, role_dao }
    }

    pub async fn find_by_id(&self, id: &Uuid) -> DaoResult<Option<user::Model>> {
        match self.user_dao.find_by_id(*id).await {
            Ok(model) => Ok(Some(model)),
            Err(DaoLayerError::NotFound { .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }

    pub async fn find_by_email(&self, email: &str) -> DaoResult<Option<user::Model>> {
        self.user_dao.find_by_email(&normalize_email(email)).await
    }

    /// Role names that do not map to a known [`Role`] are skipped.
    pub async fn roles_for(&self, user_id: &Uuid) -> DaoResult<Vec<Role>> {
        let names = self.role_dao.roles_for(user_id).await?;
        Ok(names
            .iter()
            .filter_map(|name| match Role::try_from(name.as_str()) {
                Ok(role) => Some(role),
                Err(()) => {
                    tracing::warn!(%user_id, role = %name, "ignoring unknown stored role");
                    None
                }
            })
            .collect())
    }

    pub async fn assign_role(&self, user_id: &Uuid, role: Role) -> DaoResult<()> {
        self.role_dao.assign(user_id, role.as_str()).await
    }

    pub async fn assign_role_with<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: &Uuid,
        role: Role,
    ) -> DaoResult<()> {
        self.role_dao.assign_with(conn, user_id, role.as_str()).await
    }

    pub async fn set_last_login(
        &self,
        user_id: &Uuid,
        last_login: &chrono::DateTime<chrono::FixedOffset>,
    ) -> DaoResult<()> {
        self.user_dao.set_last_login(user_id, last_login).await
    }

    pub fn profile(user: &user::Model, roles: Vec<Role>) -> UserProfile {
        UserProfile {
            id: user.id,
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            roles,
        }
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{DatabaseBackend, MockDatabase};
    use uuid::Uuid;

    use crate::{
        auth::Role,
        db::entities::user,
        services::ServiceContext,
        test_helpers::{user_model, user_role_model},
    };

    #[tokio::test]
    async fn find_by_id_maps_missing_to_none() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()])
            .into_connection();
        let users = ServiceContext::new(&db).user();

        let found = users
            .find_by_id(&Uuid::new_v4())
            .await
            .expect("query should succeed");
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn roles_for_skips_unknown_names() {
        let user_id = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[
                user_role_model(user_id, "Employee"),
                user_role_model(user_id, "Wizard"),
            ]])
            .into_connection();
        let users = ServiceContext::new(&db).user();

        let roles = users.roles_for(&user_id).await.expect("query should succeed");
        assert_eq!(roles, vec![Role::Employee]);
    }

    #[test]
    fn profile_serializes_camel_case() {
        let user = user_model(Uuid::new_v4(), "alice@example.com");
        let profile = super::UserService::profile(&user, vec![Role::Admin]);
        let value = serde_json::to_value(&profile).expect("profile serializes");
        assert_eq!(value["email"], "alice@example.com");
        assert_eq!(value["fullName"], user.full_name);
        assert_eq!(value["roles"], serde_json::json!(["Admin"]));
    }
}
