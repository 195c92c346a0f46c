pub(crate) use crate::users::repo_types::User;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

/// Outcome of an insert racing against the unique-email constraint.
pub enum CreateOutcome {
    Created(User),
    EmailTaken,
}

impl User {
    /// Find a user by email.
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, phone, password_hash, is_verified,
                   verification_token, password_reset_token, password_reset_expiry, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Find a user by primary key.
    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, phone, password_hash, is_verified,
                   verification_token, password_reset_token, password_reset_expiry, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Create a new unverified user with a hashed password and a fresh
    /// verification token. Duplicate emails surface as `EmailTaken` whether
    /// caught by the pre-check in the handler or by the constraint here.
    pub async fn create(
        db: &PgPool,
        name: &str,
        email: &str,
        phone: &str,
        password_hash: &str,
        verification_token: &str,
    ) -> anyhow::Result<CreateOutcome> {
        let inserted = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, phone, password_hash, verification_token)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, email, phone, password_hash, is_verified,
                      verification_token, password_reset_token, password_reset_expiry, created_at
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(phone)
        .bind(password_hash)
        .bind(verification_token)
        .fetch_one(db)
        .await;

        match inserted {
            Ok(user) => Ok(CreateOutcome::Created(user)),
            Err(e) if is_unique_violation(&e) => Ok(CreateOutcome::EmailTaken),
            Err(e) => Err(e.into()),
        }
    }

    /// Open (or supersede) the password-reset window for a user. Only the
    /// latest token is ever valid.
    pub async fn set_reset_token(
        db: &PgPool,
        id: Uuid,
        token: &str,
        expiry: OffsetDateTime,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET password_reset_token = $2, password_reset_expiry = $3
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(token)
        .bind(expiry)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Flip the matching user to verified and blank the token in a single
    /// statement. A `None` row covers unknown and already-consumed tokens
    /// alike.
    pub async fn consume_verification_token(
        db: &PgPool,
        token: &str,
    ) -> anyhow::Result<Option<Uuid>> {
        let row: Option<(Uuid,)> = sqlx::query_as(
            r#"
            UPDATE users
            SET is_verified = TRUE, verification_token = NULL
            WHERE verification_token = $1
            RETURNING id
            "#,
        )
        .bind(token)
        .fetch_optional(db)
        .await?;
        Ok(row.map(|(id,)| id))
    }

    /// Replace the password and close the reset window in a single statement.
    /// The expiry predicate keeps expired tokens indistinguishable from
    /// unknown or consumed ones.
    pub async fn consume_reset_token(
        db: &PgPool,
        token: &str,
        password_hash: &str,
    ) -> anyhow::Result<Option<Uuid>> {
        let row: Option<(Uuid,)> = sqlx::query_as(
            r#"
            UPDATE users
            SET password_hash = $2, password_reset_token = NULL, password_reset_expiry = NULL
            WHERE password_reset_token = $1 AND password_reset_expiry > now()
            RETURNING id
            "#,
        )
        .bind(token)
        .bind(password_hash)
        .fetch_optional(db)
        .await?;
        Ok(row.map(|(id,)| id))
    }
}

/// True when the error is a Postgres unique-constraint violation (23505).
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("23505"),
        _ => false,
    }
}

#[cfg(test)]
mod unique_violation_tests {
    use super::*;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::borrow::Cow;
    use std::error::Error as StdError;
    use std::fmt;

    #[derive(Debug)]
    struct TestDbError {
        code: Option<&'static str>,
    }

    impl fmt::Display for TestDbError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "test database error")
        }
    }

    impl StdError for TestDbError {}

    impl DatabaseError for TestDbError {
        fn message(&self) -> &'static str {
            "test database error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            self.code.map(Cow::Borrowed)
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::UniqueViolation
        }
    }

    #[test]
    fn is_unique_violation_matches_sqlstate() {
        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("23505"),
        }));
        assert!(is_unique_violation(&err));

        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("99999"),
        }));
        assert!(!is_unique_violation(&err));

        let err = sqlx::Error::RowNotFound;
        assert!(!is_unique_violation(&err));
    }
}
