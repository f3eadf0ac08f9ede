//! Per-user category operations

use rusqlite::{params, OptionalExtension};

use super::{conflict_on_unique, Database};
use crate::error::{Error, Result};
use crate::models::{Category, DEFAULT_CATEGORIES};

impl Database {
    /// List a user's categories, seeding the defaults the first time
    pub fn list_categories(&self, user_id: i64) -> Result<Vec<Category>> {
        let conn = self.conn()?;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM categories WHERE user_id = ?",
            params![user_id],
            |row| row.get(0),
        )?;
        if count == 0 {
            for name in DEFAULT_CATEGORIES {
                conn.execute(
                    "INSERT OR IGNORE INTO categories (user_id, name) VALUES (?, ?)",
                    params![user_id, name],
                )?;
            }
        }

        let mut stmt =
            conn.prepare("SELECT id, user_id, name FROM categories WHERE user_id = ? ORDER BY name")?;
        let categories = stmt
            .query_map(params![user_id], |row| {
                Ok(Category {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    name: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(categories)
    }

    /// Get a category, scoped to its owner
    pub fn get_category(&self, user_id: i64, id: i64) -> Result<Option<Category>> {
        let conn = self.conn()?;
        let category = conn
            .query_row(
                "SELECT id, user_id, name FROM categories WHERE id = ? AND user_id = ?",
                params![id, user_id],
                |row| {
                    Ok(Category {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        name: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(category)
    }

    pub fn find_category_by_name(&self, user_id: i64, name: &str) -> Result<Option<Category>> {
        let conn = self.conn()?;
        let category = conn
            .query_row(
                "SELECT id, user_id, name FROM categories WHERE user_id = ? AND name = ? COLLATE NOCASE",
                params![user_id, name],
                |row| {
                    Ok(Category {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        name: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(category)
    }

    pub fn create_category(&self, user_id: i64, name: &str) -> Result<Category> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidData("Category name is required".to_string()));
        }

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO categories (user_id, name) VALUES (?, ?)",
            params![user_id, name],
        )
        .map_err(|e| conflict_on_unique(e, format!("Category '{}' already exists", name)))?;

        Ok(Category {
            id: conn.last_insert_rowid(),
            user_id,
            name: name.to_string(),
        })
    }

    pub fn get_or_create_category(&self, user_id: i64, name: &str) -> Result<Category> {
        if let Some(existing) = self.find_category_by_name(user_id, name)? {
            return Ok(existing);
        }
        self.create_category(user_id, name)
    }

    pub fn rename_category(&self, user_id: i64, id: i64, name: &str) -> Result<Category> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidData("Category name is required".to_string()));
        }

        let conn = self.conn()?;
        let changed = conn
            .execute(
                "UPDATE categories SET name = ? WHERE id = ? AND user_id = ?",
                params![name, id, user_id],
            )
            .map_err(|e| conflict_on_unique(e, format!("Category '{}' already exists", name)))?;

        if changed == 0 {
            return Err(Error::NotFound(format!("Category {} not found", id)));
        }

        Ok(Category {
            id,
            user_id,
            name: name.to_string(),
        })
    }

    /// Delete a category; its transactions become uncategorized
    pub fn delete_category(&self, user_id: i64, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM categories WHERE id = ? AND user_id = ?",
            params![id, user_id],
        )?;
        Ok(deleted > 0)
    }
}
