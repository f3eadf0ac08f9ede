//! CSV exports for users, payments and transactions

use csv::Writer;

use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{Transaction, UserQuery};

pub const USERS_HEADER: [&str; 4] = ["Username", "Email", "Status", "Last Login"];
pub const PAYMENTS_HEADER: [&str; 5] = ["Payment ID", "User", "Amount", "Status", "Date"];
pub const TRANSACTIONS_HEADER: [&str; 5] = ["ID", "Date", "Category", "Amount", "Description"];

fn finish(writer: Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer.into_inner().map_err(|e| Error::Io(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| Error::InvalidData(format!("CSV is not UTF-8: {}", e)))
}

fn write_transactions(transactions: &[Transaction]) -> Result<String> {
    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record(TRANSACTIONS_HEADER)?;
    for t in transactions {
        writer.write_record([
            t.id.to_string(),
            t.date.to_string(),
            t.category_name.clone().unwrap_or_else(|| "Other".to_string()),
            format!("{:.2}", t.amount),
            t.description.clone().unwrap_or_default(),
        ])?;
    }
    finish(writer)
}

impl Database {
    /// Users matching the admin filters (paging is ignored)
    pub fn export_users_csv(&self, query: &UserQuery) -> Result<String> {
        let all = UserQuery {
            limit: -1,
            offset: 0,
            ..query.clone()
        };
        let (users, _) = self.list_users(&all)?;

        let mut writer = Writer::from_writer(Vec::new());
        writer.write_record(USERS_HEADER)?;
        for u in users {
            writer.write_record([
                u.username,
                u.email,
                if u.is_active { "Active" } else { "Banned" }.to_string(),
                u.last_login
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "Never".to_string()),
            ])?;
        }
        finish(writer)
    }

    pub fn export_payments_csv(&self) -> Result<String> {
        let (payments, _) = self.list_payments(None, None, -1, 0)?;

        let mut writer = Writer::from_writer(Vec::new());
        writer.write_record(PAYMENTS_HEADER)?;
        for p in payments {
            writer.write_record([
                p.payment_id,
                p.username,
                format!("{:.2}", p.amount),
                p.status.as_str().to_string(),
                p.created_at.format("%Y-%m-%d %H:%M").to_string(),
            ])?;
        }
        finish(writer)
    }

    /// One user's transactions, or every user's when `user_id` is `None`
    pub fn export_transactions_csv(&self, user_id: Option<i64>) -> Result<String> {
        let transactions = match user_id {
            Some(id) => self.all_transactions(id)?,
            None => self.all_users_transactions()?,
        };
        write_transactions(&transactions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CategoryType, NewTransaction, NewUser, PaymentStatus, Role};
    use chrono::NaiveDate;

    fn user(db: &Database, name: &str) -> i64 {
        db.create_user(&NewUser {
            email: format!("{}@example.com", name),
            username: name.to_string(),
            password_hash: "hash".into(),
            full_name: None,
            phone_no: None,
            role: Role::User,
        })
        .unwrap()
    }

    #[test]
    fn test_transactions_csv() {
        let db = Database::in_memory().unwrap();
        let id = user(&db, "csv");
        db.create_transaction(
            id,
            &NewTransaction {
                amount: 12.5,
                category_id: None,
                category_type: CategoryType::Expense,
                description: Some("Lunch, with team".into()),
                date: NaiveDate::from_ymd_opt(2024, 2, 3).unwrap(),
            },
        )
        .unwrap();

        let csv = db.export_transactions_csv(Some(id)).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("ID,Date,Category,Amount,Description"));
        let row = lines.next().unwrap();
        assert!(row.ends_with(",2024-02-03,Other,12.50,\"Lunch, with team\""));
    }

    #[test]
    fn test_users_csv_honours_status() {
        let db = Database::in_memory().unwrap();
        user(&db, "alice");
        let bob = user(&db, "bob");
        db.update_user(
            bob,
            &crate::models::UserUpdate {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .unwrap();

        let csv = db
            .export_users_csv(&UserQuery {
                status: Some("banned".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(
            csv,
            "Username,Email,Status,Last Login\nbob,bob@example.com,Banned,Never\n"
        );
    }

    #[test]
    fn test_payments_csv_header() {
        let db = Database::in_memory().unwrap();
        let id = user(&db, "payer");
        db.create_payment(id, 49.0, PaymentStatus::Completed).unwrap();

        let csv = db.export_payments_csv().unwrap();
        assert!(csv.starts_with("Payment ID,User,Amount,Status,Date\n"));
        assert!(csv.contains(",payer,49.00,completed,"));
    }
}
