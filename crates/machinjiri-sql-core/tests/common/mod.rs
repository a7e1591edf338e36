#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use machinjiri_sql_core::{Connection, Database, DbError, QueryResult, Result, Row, SqlValue};

/// Connection that records every statement and replays queued results.
pub struct RecordingConnection {
    driver: String,
    executed: Mutex<Vec<(String, Vec<SqlValue>)>>,
    responses: Mutex<VecDeque<Result<QueryResult>>>,
    transactions: Mutex<Vec<&'static str>>,
}

impl RecordingConnection {
    pub fn new(driver: &str) -> Arc<Self> {
        Arc::new(Self {
            driver: String::from(driver),
            executed: Mutex::new(Vec::new()),
            responses: Mutex::new(VecDeque::new()),
            transactions: Mutex::new(Vec::new()),
        })
    }

    /// Queues the result of the next executed statement.
    pub fn respond(&self, result: Result<QueryResult>) {
        self.responses.lock().unwrap().push_back(result);
    }

    /// Queues a single-row response.
    pub fn respond_row(&self, columns: Vec<(&str, SqlValue)>) {
        let row = Row::new(
            columns
                .into_iter()
                .map(|(name, value)| (String::from(name), value))
                .collect(),
        );
        self.respond(Ok(QueryResult {
            rows: vec![row],
            row_count: 1,
            last_insert_id: None,
        }));
    }

    /// Queues an execution failure.
    pub fn fail_next(&self, message: &str) {
        self.respond(Err(DbError::execution("<queued>", message)));
    }

    pub fn executed(&self) -> Vec<(String, Vec<SqlValue>)> {
        self.executed.lock().unwrap().clone()
    }

    pub fn statements(&self) -> Vec<String> {
        self.executed().into_iter().map(|(sql, _)| sql).collect()
    }

    pub fn last(&self) -> (String, Vec<SqlValue>) {
        self.executed()
            .pop()
            .unwrap_or_else(|| panic!("no statement was executed"))
    }

    pub fn transactions(&self) -> Vec<&'static str> {
        self.transactions.lock().unwrap().clone()
    }
}

#[async_trait]
impl Connection for RecordingConnection {
    fn driver(&self) -> &str {
        &self.driver
    }

    async fn execute_query(&self, sql: &str, bindings: &[SqlValue]) -> Result<QueryResult> {
        self.executed
            .lock()
            .unwrap()
            .push((String::from(sql), bindings.to_vec()));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(QueryResult::default()))
    }

    async fn begin_transaction(&self) -> Result<()> {
        self.transactions.lock().unwrap().push("begin");
        Ok(())
    }

    async fn commit(&self) -> Result<()> {
        self.transactions.lock().unwrap().push("commit");
        Ok(())
    }

    async fn rollback(&self) -> Result<()> {
        self.transactions.lock().unwrap().push("rollback");
        Ok(())
    }
}

/// Builds a provider over a fresh recording connection for `driver`.
pub fn database(driver: &str) -> (Database, Arc<RecordingConnection>) {
    let conn = RecordingConnection::new(driver);
    let db = Database::new(conn.clone()).unwrap();
    (db, conn)
}
