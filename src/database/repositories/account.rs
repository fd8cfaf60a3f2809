//! Account repository implementation

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection};
use crate::models::account::{Account, NewAccount, Profile, Role};
use crate::utils::errors::EventDeskError;

const ACCOUNT_COLUMNS: &str = r#"
    a.id, a.username, a.first_name, a.last_name, a.email, a.is_superuser, a.is_active, a.date_joined,
    p.role, p.phone, p.organization, p.position, p.bio, p.website, p.verified
"#;

/// Account joined with its optional profile
#[derive(Debug, FromRow)]
struct AccountRow {
    id: i64,
    username: String,
    first_name: String,
    last_name: String,
    email: String,
    is_superuser: bool,
    is_active: bool,
    date_joined: DateTime<Utc>,
    role: Option<String>,
    phone: Option<String>,
    organization: Option<String>,
    position: Option<String>,
    bio: Option<String>,
    website: Option<String>,
    verified: Option<bool>,
}

impl TryFrom<AccountRow> for Account {
    type Error = EventDeskError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let profile = match row.role {
            Some(role) => Some(Profile {
                user_id: row.id,
                role: role.parse::<Role>()?,
                phone: row.phone.unwrap_or_default(),
                organization: row.organization.unwrap_or_default(),
                position: row.position.unwrap_or_default(),
                bio: row.bio.unwrap_or_default(),
                website: row.website.unwrap_or_default(),
                verified: row.verified.unwrap_or(false),
            }),
            None => None,
        };

        Ok(Account {
            id: row.id,
            username: row.username,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            is_superuser: row.is_superuser,
            is_active: row.is_active,
            date_joined: row.date_joined,
            profile,
        })
    }
}

pub struct AccountRepository;

impl AccountRepository {
    /// Create an account and, when a role is given, its profile
    pub async fn create(conn: &mut PgConnection, request: NewAccount, now: DateTime<Utc>) -> Result<Account, EventDeskError> {
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO accounts (username, first_name, last_name, email, is_superuser, is_active, date_joined)
            VALUES ($1, $2, $3, $4, $5, TRUE, $6)
            RETURNING id
            "#
        )
        .bind(&request.username)
        .bind(&request.first_name)
        .bind(&request.last_name)
        .bind(&request.email)
        .bind(request.is_superuser)
        .bind(now)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| duplicate_username(e, &request.username))?;

        if let Some(role) = request.role {
            Self::upsert_profile(conn, &Profile::with_role(id, role)).await?;
        }

        Self::find_by_id(conn, id)
            .await?
            .ok_or(EventDeskError::AccountNotFound { user_id: id })
    }

    /// Find account by ID
    pub async fn find_by_id(conn: &mut PgConnection, id: i64) -> Result<Option<Account>, EventDeskError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {} FROM accounts a LEFT JOIN profiles p ON p.user_id = a.id WHERE a.id = $1",
            ACCOUNT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(conn)
        .await?;

        row.map(Account::try_from).transpose()
    }

    /// Update account fields and write its profile
    pub async fn update(conn: &mut PgConnection, account: &Account) -> Result<(), EventDeskError> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET username = $2,
                first_name = $3,
                last_name = $4,
                email = $5,
                is_superuser = $6,
                is_active = $7
            WHERE id = $1
            "#
        )
        .bind(account.id)
        .bind(&account.username)
        .bind(&account.first_name)
        .bind(&account.last_name)
        .bind(&account.email)
        .bind(account.is_superuser)
        .bind(account.is_active)
        .execute(&mut *conn)
        .await
        .map_err(|e| duplicate_username(e, &account.username))?;

        if result.rows_affected() == 0 {
            return Err(EventDeskError::AccountNotFound { user_id: account.id });
        }

        if let Some(ref profile) = account.profile {
            Self::upsert_profile(conn, profile).await?;
        }

        Ok(())
    }

    async fn upsert_profile(conn: &mut PgConnection, profile: &Profile) -> Result<(), EventDeskError> {
        sqlx::query(
            r#"
            INSERT INTO profiles (user_id, role, phone, organization, position, bio, website, verified)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (user_id) DO UPDATE
            SET role = EXCLUDED.role,
                phone = EXCLUDED.phone,
                organization = EXCLUDED.organization,
                position = EXCLUDED.position,
                bio = EXCLUDED.bio,
                website = EXCLUDED.website,
                verified = EXCLUDED.verified
            "#
        )
        .bind(profile.user_id)
        .bind(profile.role.as_str())
        .bind(&profile.phone)
        .bind(&profile.organization)
        .bind(&profile.position)
        .bind(&profile.bio)
        .bind(&profile.website)
        .bind(profile.verified)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Delete account; profile, events, participations and feedback cascade
    pub async fn delete(conn: &mut PgConnection, id: i64) -> Result<bool, EventDeskError> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// List all accounts ordered by username
    pub async fn list(conn: &mut PgConnection) -> Result<Vec<Account>, EventDeskError> {
        let rows = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {} FROM accounts a LEFT JOIN profiles p ON p.user_id = a.id ORDER BY a.username ASC",
            ACCOUNT_COLUMNS
        ))
        .fetch_all(conn)
        .await?;

        rows.into_iter().map(Account::try_from).collect()
    }
}

fn duplicate_username(error: sqlx::Error, username: &str) -> EventDeskError {
    match error {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            EventDeskError::Duplicate(format!("Username {}", username))
        }
        other => EventDeskError::Database(other),
    }
}
