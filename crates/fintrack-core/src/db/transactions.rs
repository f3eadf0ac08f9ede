//! Transaction operations and the deletion archive

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension, Row};

use super::{parse_date, parse_datetime, parse_enum, Database};
use crate::error::{Error, Result};
use crate::models::{
    CategoryType, DeletedTransaction, NewTransaction, Transaction, TransactionQuery,
    TransactionUpdate,
};

const TRANSACTION_SELECT: &str = r#"
    SELECT t.id, t.user_id, t.amount, t.category_id, c.name, t.category_type,
           t.description, t.date, t.created_at, t.updated_at
    FROM transactions t
    LEFT JOIN categories c ON c.id = t.category_id
"#;

fn validate_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::InvalidData(
            "Amount must be a positive number".to_string(),
        ));
    }
    Ok(())
}

impl Database {
    fn row_to_transaction(row: &Row) -> rusqlite::Result<Transaction> {
        let category_type: String = row.get(5)?;
        let date: String = row.get(7)?;
        let created_at: String = row.get(8)?;
        let updated_at: String = row.get(9)?;
        Ok(Transaction {
            id: row.get(0)?,
            user_id: row.get(1)?,
            amount: row.get(2)?,
            category_id: row.get(3)?,
            category_name: row.get(4)?,
            category_type: parse_enum(5, &category_type)?,
            description: row.get(6)?,
            date: parse_date(7, &date)?,
            created_at: parse_datetime(&created_at),
            updated_at: parse_datetime(&updated_at),
        })
    }

    fn ensure_category_owned(&self, user_id: i64, category_id: Option<i64>) -> Result<()> {
        if let Some(id) = category_id {
            if self.get_category(user_id, id)?.is_none() {
                return Err(Error::InvalidData(format!("Category {} does not exist", id)));
            }
        }
        Ok(())
    }

    /// Insert a transaction for a user
    pub fn create_transaction(&self, user_id: i64, tx: &NewTransaction) -> Result<Transaction> {
        validate_amount(tx.amount)?;
        self.ensure_category_owned(user_id, tx.category_id)?;

        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO transactions (user_id, amount, category_id, category_type, description, date)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
            params![
                user_id,
                tx.amount,
                tx.category_id,
                tx.category_type.as_str(),
                tx.description,
                tx.date.to_string(),
            ],
        )?;
        let id = conn.last_insert_rowid();
        drop(conn);

        self.get_transaction(user_id, id)?
            .ok_or_else(|| Error::NotFound(format!("Transaction {} not found", id)))
    }

    /// Get a transaction, scoped to its owner
    pub fn get_transaction(&self, user_id: i64, id: i64) -> Result<Option<Transaction>> {
        let conn = self.conn()?;
        let tx = conn
            .query_row(
                &format!("{} WHERE t.id = ? AND t.user_id = ?", TRANSACTION_SELECT),
                params![id, user_id],
                Self::row_to_transaction,
            )
            .optional()?;
        Ok(tx)
    }

    /// List a user's transactions with filters, returning the page and total count
    pub fn list_transactions(
        &self,
        user_id: i64,
        query: &TransactionQuery,
    ) -> Result<(Vec<Transaction>, i64)> {
        let conn = self.conn()?;

        let mut conditions = vec!["t.user_id = ?".to_string()];
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(user_id)];

        if let Some(q) = query.search.as_deref() {
            if !q.trim().is_empty() {
                conditions.push("t.description LIKE ? COLLATE NOCASE".to_string());
                params.push(Box::new(format!("%{}%", q.trim())));
            }
        }

        if let Some(category_id) = query.category_id {
            conditions.push("t.category_id = ?".to_string());
            params.push(Box::new(category_id));
        }

        if let Some(min) = query.min_amount {
            conditions.push("t.amount >= ?".to_string());
            params.push(Box::new(min));
        }

        if let Some(date) = query.date {
            conditions.push("t.date = ?".to_string());
            params.push(Box::new(date.to_string()));
        }

        let where_clause = format!("WHERE {}", conditions.join(" AND "));

        let params_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM transactions t {}", where_clause),
            params_refs.as_slice(),
            |row| row.get(0),
        )?;

        let order_clause = match query.ordering.as_deref() {
            Some("date") => "ORDER BY t.date ASC, t.id ASC",
            Some("amount") => "ORDER BY t.amount ASC, t.id ASC",
            Some("-amount") => "ORDER BY t.amount DESC, t.id DESC",
            _ => "ORDER BY t.date DESC, t.id DESC",
        };

        let sql = format!(
            "{} {} {} LIMIT ? OFFSET ?",
            TRANSACTION_SELECT, where_clause, order_clause
        );
        params.push(Box::new(query.limit));
        params.push(Box::new(query.offset));

        let mut stmt = conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let transactions = stmt
            .query_map(params_refs.as_slice(), Self::row_to_transaction)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok((transactions, total))
    }

    /// The most recent transactions for a user
    pub fn recent_transactions(&self, user_id: i64, limit: i64) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE t.user_id = ? ORDER BY t.date DESC, t.id DESC LIMIT ?",
            TRANSACTION_SELECT
        ))?;
        let transactions = stmt
            .query_map(params![user_id, limit], Self::row_to_transaction)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(transactions)
    }

    /// Transactions dated within `[start, end]`, optionally of one type, oldest first
    pub fn transactions_between(
        &self,
        user_id: i64,
        start: NaiveDate,
        end: NaiveDate,
        category_type: Option<CategoryType>,
    ) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            r#"{}
            WHERE t.user_id = ?1 AND t.date >= ?2 AND t.date <= ?3
              AND (?4 IS NULL OR t.category_type = ?4)
            ORDER BY t.date ASC, t.id ASC"#,
            TRANSACTION_SELECT
        ))?;
        let transactions = stmt
            .query_map(
                params![
                    user_id,
                    start.to_string(),
                    end.to_string(),
                    category_type.map(|c| c.as_str())
                ],
                Self::row_to_transaction,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(transactions)
    }

    /// Every transaction of a user, newest first
    pub fn all_transactions(&self, user_id: i64) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE t.user_id = ? ORDER BY t.date DESC, t.id DESC",
            TRANSACTION_SELECT
        ))?;
        let transactions = stmt
            .query_map(params![user_id], Self::row_to_transaction)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(transactions)
    }

    /// Every transaction across all users, newest first (admin export)
    pub fn all_users_transactions(&self) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} ORDER BY t.date DESC, t.id DESC",
            TRANSACTION_SELECT
        ))?;
        let transactions = stmt
            .query_map([], Self::row_to_transaction)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(transactions)
    }

    pub fn update_transaction(
        &self,
        user_id: i64,
        id: i64,
        update: &TransactionUpdate,
    ) -> Result<Transaction> {
        if let Some(amount) = update.amount {
            validate_amount(amount)?;
        }
        self.ensure_category_owned(user_id, update.category_id)?;

        let conn = self.conn()?;
        let changed = conn.execute(
            r#"
            UPDATE transactions SET
                amount = COALESCE(?, amount),
                category_id = COALESCE(?, category_id),
                category_type = COALESCE(?, category_type),
                description = COALESCE(?, description),
                date = COALESCE(?, date),
                updated_at = datetime('now')
            WHERE id = ? AND user_id = ?
            "#,
            params![
                update.amount,
                update.category_id,
                update.category_type.map(|c| c.as_str()),
                update.description,
                update.date.map(|d| d.to_string()),
                id,
                user_id,
            ],
        )?;
        drop(conn);

        if changed == 0 {
            return Err(Error::NotFound(format!("Transaction {} not found", id)));
        }
        self.get_transaction(user_id, id)?
            .ok_or_else(|| Error::NotFound(format!("Transaction {} not found", id)))
    }

    /// Archive a transaction into `deleted_transactions`, then remove it
    ///
    /// Both writes happen in one SQLite transaction. Returns false when the
    /// transaction does not exist for this user.
    pub fn delete_transaction(&self, user_id: i64, id: i64) -> Result<bool> {
        let mut conn = self.conn()?;
        let db_tx = conn.transaction()?;

        let archived = db_tx.execute(
            r#"
            INSERT INTO deleted_transactions
                (user_id, original_id, amount, category_name, category_type, description, date)
            SELECT t.user_id, t.id, t.amount, c.name, t.category_type, t.description, t.date
            FROM transactions t
            LEFT JOIN categories c ON c.id = t.category_id
            WHERE t.id = ? AND t.user_id = ?
            "#,
            params![id, user_id],
        )?;

        if archived == 0 {
            return Ok(false);
        }

        db_tx.execute(
            "DELETE FROM transactions WHERE id = ? AND user_id = ?",
            params![id, user_id],
        )?;
        db_tx.commit()?;

        Ok(true)
    }

    /// Archived transactions, most recently deleted first
    pub fn list_deleted_transactions(&self, user_id: i64) -> Result<Vec<DeletedTransaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, user_id, amount, category_name, category_type, description, date, deleted_at
            FROM deleted_transactions
            WHERE user_id = ?
            ORDER BY deleted_at DESC, id DESC
            "#,
        )?;
        let deleted = stmt
            .query_map(params![user_id], |row| {
                let category_type: String = row.get(4)?;
                let date: String = row.get(6)?;
                let deleted_at: String = row.get(7)?;
                Ok(DeletedTransaction {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    amount: row.get(2)?,
                    category_name: row.get(3)?,
                    category_type: parse_enum(4, &category_type)?,
                    description: row.get(5)?,
                    date: parse_date(6, &date)?,
                    deleted_at: parse_datetime(&deleted_at),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(deleted)
    }
}
