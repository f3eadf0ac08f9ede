//! Notification operations

use rusqlite::params;

use super::{parse_datetime, Database};
use crate::error::Result;
use crate::models::Notification;

impl Database {
    pub fn create_notification(
        &self,
        user_id: i64,
        title: Option<&str>,
        message: &str,
    ) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO notifications (user_id, title, message, status) VALUES (?, ?, ?, 'sent')",
            params![user_id, title, message],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Send the same notification to every user, returning how many were created
    pub fn broadcast_notification(&self, title: Option<&str>, message: &str) -> Result<usize> {
        let conn = self.conn()?;
        let created = conn.execute(
            "INSERT INTO notifications (user_id, title, message, status) SELECT id, ?, ?, 'sent' FROM users",
            params![title, message],
        )?;
        Ok(created)
    }

    /// Notifications for a user, newest first
    pub fn list_notifications(&self, user_id: i64, unread_only: bool) -> Result<Vec<Notification>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, user_id, title, message, status, is_read, created_at
            FROM notifications
            WHERE user_id = ? AND (? = 0 OR is_read = 0)
            ORDER BY created_at DESC, id DESC
            "#,
        )?;
        let notifications = stmt
            .query_map(params![user_id, unread_only], |row| {
                let created_at: String = row.get(6)?;
                Ok(Notification {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    title: row.get(2)?,
                    message: row.get(3)?,
                    status: row.get(4)?,
                    is_read: row.get(5)?,
                    created_at: parse_datetime(&created_at),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(notifications)
    }

    /// Mark the given notifications read, or all of them when `ids` is None
    pub fn mark_notifications_read(&self, user_id: i64, ids: Option<&[i64]>) -> Result<usize> {
        let conn = self.conn()?;
        let updated = match ids {
            None => conn.execute(
                "UPDATE notifications SET is_read = 1 WHERE user_id = ? AND is_read = 0",
                params![user_id],
            )?,
            Some([]) => 0,
            Some(ids) => {
                let placeholders: Vec<&str> = ids.iter().map(|_| "?").collect();
                let sql = format!(
                    "UPDATE notifications SET is_read = 1 WHERE user_id = ? AND id IN ({})",
                    placeholders.join(", ")
                );
                let mut params: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(user_id)];
                for id in ids {
                    params.push(Box::new(*id));
                }
                let params_refs: Vec<&dyn rusqlite::ToSql> =
                    params.iter().map(|p| p.as_ref()).collect();
                conn.execute(&sql, params_refs.as_slice())?
            }
        };
        Ok(updated)
    }
}
