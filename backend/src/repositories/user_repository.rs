//! Database repository for user management operations.
//!
//! Provides CRUD operations for user records, including the three secret
//! slots (verify, reset, refresh) that are always written or cleared as
//! (hash, expiry) pairs.

use crate::database::models::{CreateUser, User, UserFilter, UserPatch};
use crate::errors::{ServiceError, ServiceResult};
use crate::repositories::UserStore;
use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

const USER_COLUMNS: &str = "id, email, username, name, password_hash, provider, \
     profile_picture_url, role, email_verified, verify_token, verify_token_exp, \
     reset_token, reset_token_exp, refresh_token, refresh_token_exp, \
     is_deleted, deleted_at, created_at, updated_at";

/// Repository for user database operations.
pub struct SqliteUserRepository {
    /// Shared SQLite connection pool
    pool: SqlitePool,
}

impl SqliteUserRepository {
    /// Creates a new SqliteUserRepository instance.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn db_err(e: sqlx::Error) -> ServiceError {
    ServiceError::Database { source: e.into() }
}

#[async_trait]
impl UserStore for SqliteUserRepository {
    async fn find_one(&self, filter: UserFilter) -> ServiceResult<Option<User>> {
        if filter.is_empty() {
            return Err(ServiceError::validation(
                "at least one of id, email, or username is required",
            ));
        }

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {USER_COLUMNS} FROM users WHERE is_deleted = 0 AND ("
        ));
        let mut clause = qb.separated(" OR ");
        if let Some(id) = filter.id {
            clause.push("id = ").push_bind_unseparated(id);
        }
        if let Some(email) = filter.email {
            clause.push("email = ").push_bind_unseparated(email);
        }
        if let Some(username) = filter.username {
            clause.push("username = ").push_bind_unseparated(username);
        }
        qb.push(")");

        let user = qb
            .build_query_as::<User>()
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(user)
    }

    async fn create(&self, draft: CreateUser) -> ServiceResult<User> {
        let (verify_token, verify_token_exp) = match draft.verify_token {
            Some(slot) => (Some(slot.hash), Some(slot.expires_at)),
            None => (None, None),
        };

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users
                (id, email, username, name, password_hash, provider,
                 profile_picture_url, email_verified, verify_token, verify_token_exp)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(draft.id)
        .bind(draft.email)
        .bind(draft.username)
        .bind(draft.name)
        .bind(draft.password_hash)
        .bind(draft.provider)
        .bind(draft.profile_picture_url)
        .bind(draft.email_verified)
        .bind(verify_token)
        .bind(verify_token_exp)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(user)
    }

    async fn update(&self, id: &str, patch: UserPatch) -> ServiceResult<User> {
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("UPDATE users SET updated_at = CURRENT_TIMESTAMP");

        if let Some(name) = patch.name {
            qb.push(", name = ").push_bind(name);
        }
        if let Some(username) = patch.username {
            qb.push(", username = ").push_bind(username);
        }
        if let Some(password_hash) = patch.password_hash {
            qb.push(", password_hash = ").push_bind(password_hash);
        }
        if let Some(provider) = patch.provider {
            qb.push(", provider = ").push_bind(provider);
        }
        if let Some(url) = patch.profile_picture_url {
            qb.push(", profile_picture_url = ").push_bind(url);
        }
        if let Some(verified) = patch.email_verified {
            qb.push(", email_verified = ").push_bind(verified);
        }

        // Each slot is a (hash, expiry) pair: written together, cleared together.
        match patch.verify_token {
            Some(Some(slot)) => {
                qb.push(", verify_token = ").push_bind(slot.hash);
                qb.push(", verify_token_exp = ").push_bind(slot.expires_at);
            }
            Some(None) => {
                qb.push(", verify_token = NULL, verify_token_exp = NULL");
            }
            None => {}
        }
        match patch.reset_token {
            Some(Some(slot)) => {
                qb.push(", reset_token = ").push_bind(slot.hash);
                qb.push(", reset_token_exp = ").push_bind(slot.expires_at);
            }
            Some(None) => {
                qb.push(", reset_token = NULL, reset_token_exp = NULL");
            }
            None => {}
        }
        match patch.refresh_token {
            Some(Some(slot)) => {
                qb.push(", refresh_token = ").push_bind(slot.hash);
                qb.push(", refresh_token_exp = ").push_bind(slot.expires_at);
            }
            Some(None) => {
                qb.push(", refresh_token = NULL, refresh_token_exp = NULL");
            }
            None => {}
        }

        qb.push(" WHERE id = ").push_bind(id.to_string());
        qb.push(format!(" AND is_deleted = 0 RETURNING {USER_COLUMNS}"));

        let user = qb
            .build_query_as::<User>()
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        user.ok_or_else(|| ServiceError::not_found("User", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{Provider, SecretSlot};
    use chrono::{Duration, Utc};
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_repo() -> SqliteUserRepository {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory pool");
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("migrations");
        SqliteUserRepository::new(pool)
    }

    fn draft(id: &str, email: &str, username: &str) -> CreateUser {
        CreateUser {
            id: id.to_string(),
            email: email.to_string(),
            username: username.to_string(),
            name: "Test User".to_string(),
            password_hash: Some("$argon2id$fake".to_string()),
            provider: Provider::Email,
            profile_picture_url: None,
            email_verified: false,
            verify_token: Some(SecretSlot::new(
                "digest".to_string(),
                Utc::now() + Duration::minutes(15),
            )),
        }
    }

    #[tokio::test]
    async fn find_one_requires_an_identifier() {
        let repo = test_repo().await;
        let err = repo.find_one(UserFilter::default()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation { .. }));
    }

    #[tokio::test]
    async fn create_then_find_by_each_identifier() {
        let repo = test_repo().await;
        let created = repo.create(draft("u1", "a@test.io", "alice")).await.unwrap();
        assert_eq!(created.provider, Provider::Email);
        assert!(!created.email_verified);
        assert_eq!(created.verify_token.as_deref(), Some("digest"));
        assert!(created.verify_token_exp.is_some());

        for filter in [
            UserFilter::by_id("u1"),
            UserFilter::by_email("a@test.io"),
            UserFilter::by_username("alice"),
        ] {
            let found = repo.find_one(filter).await.unwrap().expect("user");
            assert_eq!(found.id, "u1");
        }

        // OR semantics: one bogus identifier does not mask a matching one.
        let found = repo
            .find_one(UserFilter {
                id: Some("nope".to_string()),
                email: Some("a@test.io".to_string()),
                username: None,
            })
            .await
            .unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn update_writes_and_clears_slot_pairs() {
        let repo = test_repo().await;
        repo.create(draft("u2", "b@test.io", "bob")).await.unwrap();

        let exp = Utc::now() + Duration::days(7);
        let updated = repo
            .update(
                "u2",
                UserPatch {
                    email_verified: Some(true),
                    verify_token: Some(None),
                    refresh_token: Some(Some(SecretSlot::new("rt-digest".to_string(), exp))),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(updated.email_verified);
        assert!(updated.verify_token.is_none());
        assert!(updated.verify_token_exp.is_none());
        assert_eq!(updated.refresh_token.as_deref(), Some("rt-digest"));
        assert!(updated.refresh_token_exp.is_some());
    }

    #[tokio::test]
    async fn update_missing_user_is_not_found() {
        let repo = test_repo().await;
        let err = repo
            .update(
                "ghost",
                UserPatch {
                    email_verified: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
    }

    #[tokio::test]
    async fn soft_deleted_rows_are_invisible() {
        let repo = test_repo().await;
        repo.create(draft("u3", "c@test.io", "carol")).await.unwrap();

        sqlx::query("UPDATE users SET is_deleted = 1, deleted_at = CURRENT_TIMESTAMP WHERE id = ?")
            .bind("u3")
            .execute(&repo.pool)
            .await
            .unwrap();

        assert!(repo
            .find_one(UserFilter::by_email("c@test.io"))
            .await
            .unwrap()
            .is_none());

        let err = repo
            .update(
                "u3",
                UserPatch {
                    name: Some("renamed".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
    }
}
