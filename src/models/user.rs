use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use super::enums::Role;
use crate::database::resource::columns::*;
use crate::database::value::{col, ColumnDef, ColumnKind};
use crate::database::Resource;

/// Login account shared by admins, faculty and students.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resource for User {
    const TABLE: &'static str = "users";
    const NAME: &'static str = "User";
    const COLUMNS: &'static [ColumnDef] = &[
        ID,
        col("email", ColumnKind::Text),
        col("password_hash", ColumnKind::Text),
        col("role", Role::KIND),
        CREATED_AT,
        UPDATED_AT,
    ];
    const SEARCH_COLUMNS: &'static [&'static str] = &["email"];
    const SORTABLE: &'static [&'static str] = &["email", "created_at"];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_is_never_serialized() {
        let user = User {
            id: Uuid::new_v4(),
            email: "admin@trackademy.local".into(),
            password_hash: "$argon2id$secret".into(),
            role: Role::Admin,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["role"], "ADMIN");
        assert!(!User::soft_deletes());
    }
}
