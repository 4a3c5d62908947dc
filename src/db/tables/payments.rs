//! Database methods for the payments table

use chrono::{DateTime, Utc};
use rusqlite::{Result as SqliteResult, Row};
use uuid::Uuid;

use crate::db::Database;
use crate::models::{Payment, SettlementStatus};

fn row_to_payment(row: &Row) -> rusqlite::Result<Payment> {
    let status: String = row.get(5)?;
    let created_at: String = row.get(6)?;
    let completed_at: Option<String> = row.get(7)?;
    Ok(Payment {
        id: row.get(0)?,
        tool_call_id: row.get(1)?,
        amount: row.get(2)?,
        currency: row.get(3)?,
        checkout_id: row.get(4)?,
        status: SettlementStatus::parse(&status).unwrap_or(SettlementStatus::Pending),
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .unwrap()
            .with_timezone(&Utc),
        completed_at: completed_at.map(|s| {
            DateTime::parse_from_rfc3339(&s)
                .unwrap()
                .with_timezone(&Utc)
        }),
    })
}

const PAYMENT_COLUMNS: &str =
    "id, tool_call_id, amount, currency, checkout_id, status, created_at, completed_at";

impl Database {
    pub fn create_payment(
        &self,
        tool_call_id: &str,
        amount: f64,
        currency: &str,
    ) -> SqliteResult<Payment> {
        let conn = self.conn();
        let id = Uuid::new_v4().to_string();
        let created_at = Utc::now();

        conn.execute(
            "INSERT INTO payments (id, tool_call_id, amount, currency, status, created_at)
             VALUES (?1, ?2, ?3, ?4, 'pending', ?5)",
            rusqlite::params![&id, tool_call_id, amount, currency, &created_at.to_rfc3339()],
        )?;

        Ok(Payment {
            id,
            tool_call_id: tool_call_id.to_string(),
            amount,
            currency: currency.to_string(),
            checkout_id: None,
            status: SettlementStatus::Pending,
            created_at,
            completed_at: None,
        })
    }

    /// Attach the external checkout reference once the provider has issued it.
    pub fn set_payment_checkout_id(&self, id: &str, checkout_id: &str) -> SqliteResult<bool> {
        let conn = self.conn();
        let affected = conn.execute(
            "UPDATE payments SET checkout_id = ?1 WHERE id = ?2",
            rusqlite::params![checkout_id, id],
        )?;
        Ok(affected > 0)
    }

    pub fn get_payment_by_checkout_id(&self, checkout_id: &str) -> SqliteResult<Option<Payment>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM payments WHERE checkout_id = ?1",
            PAYMENT_COLUMNS
        ))?;
        let payment = stmt.query_row([checkout_id], row_to_payment).ok();
        Ok(payment)
    }

    /// Monitoring lookup: the identifier may be a tool call id or a checkout
    /// reference.
    pub fn find_payment(&self, identifier: &str) -> SqliteResult<Option<Payment>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM payments WHERE tool_call_id = ?1 OR checkout_id = ?1",
            PAYMENT_COLUMNS
        ))?;
        let payment = stmt.query_row([identifier], row_to_payment).ok();
        Ok(payment)
    }

    /// Record the settlement outcome. Completion timestamp is only written for
    /// a completed settlement.
    pub fn settle_payment(&self, id: &str, status: SettlementStatus) -> SqliteResult<bool> {
        let conn = self.conn();
        let affected = match status {
            SettlementStatus::Completed => conn.execute(
                "UPDATE payments SET status = ?1, completed_at = ?2 WHERE id = ?3",
                rusqlite::params![status.as_str(), &Utc::now().to_rfc3339(), id],
            )?,
            _ => conn.execute(
                "UPDATE payments SET status = ?1 WHERE id = ?2",
                rusqlite::params![status.as_str(), id],
            )?,
        };
        Ok(affected > 0)
    }
}
