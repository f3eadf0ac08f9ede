//! Users, profiles, financial data and revoked tokens

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

use super::{conflict_on_unique, parse_date, parse_datetime, parse_enum, Database};
use crate::error::{Error, Result};
use crate::models::{
    FinancialData, FinancialDataUpdate, NewUser, Profile, ProfileUpdate, User, UserQuery,
    UserUpdate,
};

const USER_COLUMNS: &str = "id, email, username, full_name, phone_no, role, is_active, \
                            last_login, date_joined";

impl Database {
    fn row_to_user(row: &Row) -> rusqlite::Result<User> {
        let role: String = row.get(5)?;
        let last_login: Option<String> = row.get(7)?;
        let date_joined: String = row.get(8)?;
        Ok(User {
            id: row.get(0)?,
            email: row.get(1)?,
            username: row.get(2)?,
            full_name: row.get(3)?,
            phone_no: row.get(4)?,
            role: parse_enum(5, &role)?,
            is_active: row.get(6)?,
            last_login: last_login.as_deref().map(parse_datetime),
            date_joined: parse_datetime(&date_joined),
        })
    }

    /// Create a user, failing with `Conflict` on a duplicate email or username
    pub fn create_user(&self, user: &NewUser) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO users (email, username, password_hash, full_name, phone_no, role)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
            params![
                user.email,
                user.username,
                user.password_hash,
                user.full_name,
                user.phone_no,
                user.role.as_str(),
            ],
        )
        .map_err(|e| conflict_on_unique(e, "A user with this email or username already exists"))?;

        Ok(conn.last_insert_rowid())
    }

    pub fn get_user(&self, id: i64) -> Result<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS),
                params![id],
                Self::row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                &format!(
                    "SELECT {} FROM users WHERE email = ? COLLATE NOCASE",
                    USER_COLUMNS
                ),
                params![email],
                Self::row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    /// Look up a user and password hash by username or email
    pub fn get_login(&self, identifier: &str) -> Result<Option<(User, String)>> {
        let conn = self.conn()?;
        let found = conn
            .query_row(
                &format!(
                    "SELECT {}, password_hash FROM users WHERE username = ?1 OR email = ?1 COLLATE NOCASE",
                    USER_COLUMNS
                ),
                params![identifier],
                |row| Ok((Self::row_to_user(row)?, row.get::<_, String>(9)?)),
            )
            .optional()?;
        Ok(found)
    }

    pub fn username_exists(&self, username: &str) -> Result<bool> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM users WHERE username = ?",
            params![username],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn update_last_login(&self, user_id: i64) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE users SET last_login = datetime('now') WHERE id = ?",
            params![user_id],
        )?;
        Ok(())
    }

    pub fn set_password_hash(&self, user_id: i64, password_hash: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE users SET password_hash = ? WHERE id = ?",
            params![password_hash, user_id],
        )?;
        Ok(())
    }

    /// All user ids, ascending
    pub fn list_user_ids(&self) -> Result<Vec<i64>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT id FROM users ORDER BY id")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    fn user_filter(query: &UserQuery) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(q) = query.query.as_deref() {
            if !q.trim().is_empty() {
                conditions.push(
                    "(username LIKE ? COLLATE NOCASE OR email LIKE ? COLLATE NOCASE)".to_string(),
                );
                let pattern = format!("%{}%", q.trim());
                params.push(Box::new(pattern.clone()));
                params.push(Box::new(pattern));
            }
        }

        match query.status.as_deref() {
            Some("active") => conditions.push("is_active = 1".to_string()),
            Some("banned") => conditions.push("is_active = 0".to_string()),
            _ => {}
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        (where_clause, params)
    }

    /// List users for the admin panel, returning the page and the total match count
    pub fn list_users(&self, query: &UserQuery) -> Result<(Vec<User>, i64)> {
        let conn = self.conn()?;
        let (where_clause, mut params) = Self::user_filter(query);

        let count_sql = format!("SELECT COUNT(*) FROM users {}", where_clause);
        let params_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let total: i64 = conn.query_row(&count_sql, params_refs.as_slice(), |row| row.get(0))?;

        // Whitelisted so the sort key can be interpolated
        let sort = match query.sort.as_deref() {
            Some("username") => "username",
            Some("email") => "email",
            Some("last_login") => "last_login",
            _ => "date_joined",
        };
        let order = match query.order.as_deref() {
            Some("asc") => "ASC",
            _ => "DESC",
        };

        let sql = format!(
            "SELECT {} FROM users {} ORDER BY {} {}, id {} LIMIT ? OFFSET ?",
            USER_COLUMNS, where_clause, sort, order, order
        );
        params.push(Box::new(query.limit));
        params.push(Box::new(query.offset));

        let mut stmt = conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let users = stmt
            .query_map(params_refs.as_slice(), Self::row_to_user)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok((users, total))
    }

    /// Apply admin edits to a user
    pub fn update_user(&self, id: i64, update: &UserUpdate) -> Result<User> {
        let conn = self.conn()?;
        let changed = conn
            .execute(
                r#"
                UPDATE users SET
                    username = COALESCE(?, username),
                    email = COALESCE(?, email),
                    role = COALESCE(?, role),
                    is_active = COALESCE(?, is_active)
                WHERE id = ?
                "#,
                params![
                    update.username,
                    update.email,
                    update.role.map(|r| r.as_str()),
                    update.is_active,
                    id,
                ],
            )
            .map_err(|e| conflict_on_unique(e, "Username or email already in use"))?;

        if changed == 0 {
            return Err(Error::NotFound(format!("User {} not found", id)));
        }
        drop(conn);

        self.get_user(id)?
            .ok_or_else(|| Error::NotFound(format!("User {} not found", id)))
    }

    /// Delete users by id, returning how many were removed
    pub fn delete_users(&self, ids: &[i64]) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let conn = self.conn()?;
        let placeholders: Vec<&str> = ids.iter().map(|_| "?").collect();
        let sql = format!("DELETE FROM users WHERE id IN ({})", placeholders.join(", "));
        let deleted = conn.execute(&sql, rusqlite::params_from_iter(ids.iter()))?;
        Ok(deleted)
    }

    // ========== Profile ==========

    /// Get a user's profile, creating the default one on first access
    pub fn get_or_create_profile(&self, user_id: i64) -> Result<Profile> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR IGNORE INTO profiles (user_id) VALUES (?)",
            params![user_id],
        )?;

        let profile = conn.query_row(
            r#"
            SELECT user_id, preferred_currency, date_of_birth, occupation, annual_income,
                   financial_goal, investment_risk
            FROM profiles WHERE user_id = ?
            "#,
            params![user_id],
            |row| {
                let dob: Option<String> = row.get(2)?;
                Ok(Profile {
                    user_id: row.get(0)?,
                    preferred_currency: row.get(1)?,
                    date_of_birth: dob.as_deref().map(|s| parse_date(2, s)).transpose()?,
                    occupation: row.get(3)?,
                    annual_income: row.get(4)?,
                    financial_goal: row.get(5)?,
                    investment_risk: row.get(6)?,
                })
            },
        )?;
        Ok(profile)
    }

    pub fn update_profile(&self, user_id: i64, update: &ProfileUpdate) -> Result<Profile> {
        self.get_or_create_profile(user_id)?;
        let conn = self.conn()?;
        conn.execute(
            r#"
            UPDATE profiles SET
                preferred_currency = COALESCE(?, preferred_currency),
                date_of_birth = COALESCE(?, date_of_birth),
                occupation = COALESCE(?, occupation),
                annual_income = COALESCE(?, annual_income),
                financial_goal = COALESCE(?, financial_goal),
                investment_risk = COALESCE(?, investment_risk)
            WHERE user_id = ?
            "#,
            params![
                update.preferred_currency.as_ref().map(|c| c.to_uppercase()),
                update.date_of_birth.map(|d| d.to_string()),
                update.occupation,
                update.annual_income,
                update.financial_goal,
                update.investment_risk,
                user_id,
            ],
        )?;
        drop(conn);
        self.get_or_create_profile(user_id)
    }

    /// Preferred currency code, defaulting to INR when no profile exists
    pub fn preferred_currency(&self, user_id: i64) -> Result<String> {
        let conn = self.conn()?;
        let currency: Option<String> = conn
            .query_row(
                "SELECT preferred_currency FROM profiles WHERE user_id = ?",
                params![user_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(currency.unwrap_or_else(|| "INR".to_string()))
    }

    // ========== Financial data ==========

    pub fn get_or_create_financial_data(&self, user_id: i64) -> Result<FinancialData> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR IGNORE INTO financial_data (user_id) VALUES (?)",
            params![user_id],
        )?;

        let data = conn.query_row(
            r#"
            SELECT user_id, monthly_income_salary, monthly_income_business,
                   monthly_income_freelance, monthly_income_other, savings_cash,
                   savings_stocks, savings_crypto, savings_real_estate, total_debt
            FROM financial_data WHERE user_id = ?
            "#,
            params![user_id],
            |row| {
                Ok(FinancialData {
                    user_id: row.get(0)?,
                    monthly_income_salary: row.get(1)?,
                    monthly_income_business: row.get(2)?,
                    monthly_income_freelance: row.get(3)?,
                    monthly_income_other: row.get(4)?,
                    savings_cash: row.get(5)?,
                    savings_stocks: row.get(6)?,
                    savings_crypto: row.get(7)?,
                    savings_real_estate: row.get(8)?,
                    total_debt: row.get(9)?,
                })
            },
        )?;
        Ok(data)
    }

    pub fn update_financial_data(
        &self,
        user_id: i64,
        update: &FinancialDataUpdate,
    ) -> Result<FinancialData> {
        self.get_or_create_financial_data(user_id)?;
        let conn = self.conn()?;
        conn.execute(
            r#"
            UPDATE financial_data SET
                monthly_income_salary = COALESCE(?, monthly_income_salary),
                monthly_income_business = COALESCE(?, monthly_income_business),
                monthly_income_freelance = COALESCE(?, monthly_income_freelance),
                monthly_income_other = COALESCE(?, monthly_income_other),
                savings_cash = COALESCE(?, savings_cash),
                savings_stocks = COALESCE(?, savings_stocks),
                savings_crypto = COALESCE(?, savings_crypto),
                savings_real_estate = COALESCE(?, savings_real_estate),
                total_debt = COALESCE(?, total_debt)
            WHERE user_id = ?
            "#,
            params![
                update.monthly_income_salary,
                update.monthly_income_business,
                update.monthly_income_freelance,
                update.monthly_income_other,
                update.savings_cash,
                update.savings_stocks,
                update.savings_crypto,
                update.savings_real_estate,
                update.total_debt,
                user_id,
            ],
        )?;
        drop(conn);
        self.get_or_create_financial_data(user_id)
    }

    // ========== Revoked tokens ==========

    /// Record a revoked token digest; revoking twice is a no-op
    pub fn revoke_token(&self, token_hash: &str, expires_at: DateTime<Utc>) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR IGNORE INTO revoked_tokens (token_hash, expires_at) VALUES (?, ?)",
            params![
                token_hash,
                expires_at.format("%Y-%m-%d %H:%M:%S").to_string()
            ],
        )?;
        Ok(())
    }

    pub fn is_token_revoked(&self, token_hash: &str) -> Result<bool> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM revoked_tokens WHERE token_hash = ?",
            params![token_hash],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Drop revoked-token rows whose tokens have expired anyway
    pub fn purge_expired_tokens(&self) -> Result<usize> {
        let conn = self.conn()?;
        let purged = conn.execute(
            "DELETE FROM revoked_tokens WHERE expires_at < datetime('now')",
            [],
        )?;
        Ok(purged)
    }
}
