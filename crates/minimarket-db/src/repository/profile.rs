//! # Profile Repository
//!
//! Staff accounts. Profiles are the cashier identities sales point at.
//!
//! Passwords are stored as argon2 PHC strings and never leave this module;
//! [`Profile`] has no hash field.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use minimarket_core::validation::{
    validate_email, validate_full_name, validate_password, ValidationResult,
};
use minimarket_core::{Profile, Role};

const PROFILE_COLUMNS: &str = "id, full_name, email, role, is_active, created_at";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProfile {
    pub full_name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
}

impl NewProfile {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_full_name(&self.full_name)?;
        validate_email(&self.email)?;
        validate_password(&self.password)
    }
}

/// Profile changes. A missing password keeps the current one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub full_name: String,
    pub role: Role,
    pub is_active: bool,
    #[serde(default)]
    pub password: Option<String>,
}

impl ProfileUpdate {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_full_name(&self.full_name)?;
        if let Some(password) = &self.password {
            validate_password(password)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ProfileRepository {
    pool: SqlitePool,
}

impl ProfileRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProfileRepository { pool }
    }

    /// All profiles, by name.
    pub async fn list(&self) -> DbResult<Vec<Profile>> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles ORDER BY full_name");

        let profiles = sqlx::query_as::<_, Profile>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(profiles)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Profile>> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = ?1");

        let profile = sqlx::query_as::<_, Profile>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(profile)
    }

    pub async fn get_by_email(&self, email: &str) -> DbResult<Option<Profile>> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE email = ?1");

        let profile = sqlx::query_as::<_, Profile>(&sql)
            .bind(normalize_email(email))
            .fetch_optional(&self.pool)
            .await?;

        Ok(profile)
    }

    /// Creates a profile with a freshly hashed password.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - Email already registered
    pub async fn create(&self, input: &NewProfile) -> DbResult<Profile> {
        input.validate()?;

        let profile = Profile {
            id: Uuid::new_v4().to_string(),
            full_name: input.full_name.trim().to_string(),
            email: normalize_email(&input.email),
            role: input.role,
            is_active: true,
            created_at: Utc::now(),
        };
        let password_hash = hash_password(&input.password)?;

        debug!(id = %profile.id, role = ?profile.role, "Creating profile");

        sqlx::query(
            r#"
            INSERT INTO profiles (id, full_name, email, role, password_hash, is_active, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&profile.id)
        .bind(&profile.full_name)
        .bind(&profile.email)
        .bind(profile.role)
        .bind(password_hash)
        .bind(profile.is_active)
        .bind(profile.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("email", &profile.email),
            other => other,
        })?;

        info!(id = %profile.id, "Profile created");
        Ok(profile)
    }

    pub async fn update(&self, id: &str, input: &ProfileUpdate) -> DbResult<Profile> {
        input.validate()?;

        debug!(id = %id, "Updating profile");

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE profiles SET full_name = ?2, role = ?3, is_active = ?4 WHERE id = ?1",
        )
        .bind(id)
        .bind(input.full_name.trim())
        .bind(input.role)
        .bind(input.is_active)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Profile", id));
        }

        if let Some(password) = &input.password {
            sqlx::query("UPDATE profiles SET password_hash = ?2 WHERE id = ?1")
                .bind(id)
                .bind(hash_password(password)?)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Profile", id))
    }

    /// Deletes a profile that never rang up a sale.
    ///
    /// ## Returns
    /// * `Err(DbError::Conflict)` - Sales reference the profile; deactivate it instead
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let sales: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales WHERE cashier_id = ?1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        if sales > 0 {
            warn!(id = %id, sales = sales, "Refusing to delete profile with sales");
            return Err(DbError::Conflict(format!(
                "Profile {} is referenced by {} sale(s)",
                id, sales
            )));
        }

        let result = sqlx::query("DELETE FROM profiles WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Profile", id));
        }

        info!(id = %id, "Profile deleted");
        Ok(())
    }

    /// Checks an email/password pair.
    ///
    /// ## Returns
    /// * `Ok(Some(Profile))` - Credentials match an active profile
    /// * `Ok(None)` - Unknown email, wrong password or inactive profile
    pub async fn verify_credentials(&self, email: &str, password: &str) -> DbResult<Option<Profile>> {
        let row: Option<(String, bool)> =
            sqlx::query_as("SELECT password_hash, is_active FROM profiles WHERE email = ?1")
                .bind(normalize_email(email))
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some((hash, true)) if verify_password(password, &hash) => {
                self.get_by_email(email).await
            }
            _ => Ok(None),
        }
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM profiles")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Hash a password for storage.
pub(crate) fn hash_password(password: &str) -> DbResult<String> {
    use argon2::{
        password_hash::{rand_core::OsRng, SaltString},
        Argon2, PasswordHasher,
    };

    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| DbError::Internal(format!("Failed to hash password: {}", e)))?;

    Ok(hash.to_string())
}

fn verify_password(password: &str, hash: &str) -> bool {
    use argon2::{Argon2, PasswordHash, PasswordVerifier};

    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}
