//! Database methods for the tool_calls table

use chrono::{DateTime, Utc};
use rusqlite::{Result as SqliteResult, Row};
use serde_json::Value;
use uuid::Uuid;

use crate::db::Database;
use crate::models::{PaymentStatus, ToolCall};

fn row_to_tool_call(row: &Row) -> rusqlite::Result<ToolCall> {
    let parameters: String = row.get(4)?;
    let result: Option<String> = row.get(5)?;
    let payment_status: String = row.get(7)?;
    let created_at: String = row.get(8)?;
    let completed_at: Option<String> = row.get(9)?;
    Ok(ToolCall {
        id: row.get(0)?,
        agent_id: row.get(1)?,
        caller_user_id: row.get(2)?,
        tool_name: row.get(3)?,
        parameters: serde_json::from_str(&parameters).unwrap_or(Value::Null),
        result: result.map(|s| serde_json::from_str(&s).unwrap_or(Value::Null)),
        cost: row.get(6)?,
        payment_status: PaymentStatus::parse(&payment_status).unwrap_or(PaymentStatus::Pending),
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

impl Database {
    /// Insert a fresh tool call. Cost is fixed here and never mutated; result
    /// and completion arrive later through `finalize_tool_call`.
    pub fn create_tool_call(
        &self,
        agent_id: &str,
        caller_user_id: &str,
        tool_name: &str,
        parameters: &Value,
        cost: f64,
    ) -> SqliteResult<ToolCall> {
        let conn = self.conn();
        let id = Uuid::new_v4().to_string();
        let created_at = Utc::now();

        conn.execute(
            "INSERT INTO tool_calls (id, agent_id, caller_user_id, tool_name, parameters, cost, payment_status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'pending', ?7)",
            rusqlite::params![
                &id,
                agent_id,
                caller_user_id,
                tool_name,
                &parameters.to_string(),
                cost,
                &created_at.to_rfc3339()
            ],
        )?;

        Ok(ToolCall {
            id,
            agent_id: agent_id.to_string(),
            caller_user_id: caller_user_id.to_string(),
            tool_name: tool_name.to_string(),
            parameters: parameters.clone(),
            result: None,
            cost,
            payment_status: PaymentStatus::Pending,
            created_at,
            completed_at: None,
        })
    }

    pub fn get_tool_call(&self, id: &str) -> SqliteResult<Option<ToolCall>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, agent_id, caller_user_id, tool_name, parameters, result, cost, payment_status, created_at, completed_at
             FROM tool_calls WHERE id = ?1",
        )?;
        let tool_call = stmt.query_row([id], row_to_tool_call).ok();
        Ok(tool_call)
    }

    /// Attach result + completion to a pending tool call. The `completed_at IS
    /// NULL` guard is the sole conflict check: a second finalizer observes zero
    /// affected rows instead of overwriting the first commit.
    pub fn finalize_tool_call(&self, id: &str, result: &Value) -> SqliteResult<usize> {
        let conn = self.conn();
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "UPDATE tool_calls SET result = ?1, completed_at = ?2
             WHERE id = ?3 AND completed_at IS NULL",
            rusqlite::params![&result.to_string(), &now, id],
        )
    }

    pub fn set_tool_call_payment_status(
        &self,
        id: &str,
        status: PaymentStatus,
    ) -> SqliteResult<bool> {
        let conn = self.conn();
        let affected = conn.execute(
            "UPDATE tool_calls SET payment_status = ?1 WHERE id = ?2",
            rusqlite::params![status.as_str(), id],
        )?;
        Ok(affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("test.db").to_str().unwrap()).unwrap();
        (dir, db)
    }

    #[test]
    fn test_create_and_fetch_tool_call() {
        let (_dir, db) = test_db();
        let tc = db
            .create_tool_call("agent-1", "user-1", "add", &json!({"a": 1, "b": 2}), 0.001)
            .unwrap();

        let fetched = db.get_tool_call(&tc.id).unwrap().unwrap();
        assert_eq!(fetched.tool_name, "add");
        assert_eq!(fetched.parameters, json!({"a": 1, "b": 2}));
        assert_eq!(fetched.cost, 0.001);
        assert_eq!(fetched.payment_status, PaymentStatus::Pending);
        assert!(fetched.result.is_none());
        assert!(fetched.completed_at.is_none());
    }

    #[test]
    fn test_finalize_guard_rejects_second_writer() {
        let (_dir, db) = test_db();
        let tc = db
            .create_tool_call("agent-1", "user-1", "add", &json!({}), 0.0)
            .unwrap();

        let first = db.finalize_tool_call(&tc.id, &json!({"result": 42})).unwrap();
        assert_eq!(first, 1);

        // Second writer must observe the first commit and be rejected
        let second = db.finalize_tool_call(&tc.id, &json!({"result": 99})).unwrap();
        assert_eq!(second, 0);

        let stored = db.get_tool_call(&tc.id).unwrap().unwrap();
        assert_eq!(stored.result, Some(json!({"result": 42})));
        assert!(stored.completed_at.is_some());
    }

    #[test]
    fn test_payment_status_transition() {
        let (_dir, db) = test_db();
        let tc = db
            .create_tool_call("agent-1", "user-1", "add", &json!({}), 0.0)
            .unwrap();

        assert!(db
            .set_tool_call_payment_status(&tc.id, PaymentStatus::Paid)
            .unwrap());
        let fetched = db.get_tool_call(&tc.id).unwrap().unwrap();
        assert_eq!(fetched.payment_status, PaymentStatus::Paid);
    }
}
