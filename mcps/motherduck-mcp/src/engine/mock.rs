//! Scripted in-process engine for tests
//!
//! Counts every handle opened and closed, records the targets it was asked
//! for, and can hold a query in flight through a [`QueryGate`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};

use super::{Engine, EngineHandle, PROBE_SQL};
use crate::types::{ColumnInfo, DatabaseError, DatabaseTarget, QueryResult, Result, Value};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Holds queries in flight until released
#[derive(Default)]
pub struct QueryGate {
    entered: AtomicBool,
    open: Mutex<bool>,
    opened: Condvar,
}

impl QueryGate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// True once a query has reached the gate
    pub fn has_entered(&self) -> bool {
        self.entered.load(Ordering::SeqCst)
    }

    /// Let waiting (and future) queries through
    pub fn release(&self) {
        *lock(&self.open) = true;
        self.opened.notify_all();
    }

    fn wait(&self) {
        self.entered.store(true, Ordering::SeqCst);
        let mut open = lock(&self.open);
        while !*open {
            open = self
                .opened
                .wait(open)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
    }
}

#[derive(Default)]
struct MockState {
    opened: AtomicUsize,
    closed: AtomicUsize,
    refusal: Mutex<Option<String>>,
    results: Mutex<HashMap<String, QueryResult>>,
    failures: Mutex<HashMap<String, String>>,
    gate: Mutex<Option<(String, Arc<QueryGate>)>>,
    connections: Mutex<Vec<(String, bool)>>,
    executed: Mutex<Vec<String>>,
}

/// Engine double. Clones share counters and scripts.
#[derive(Clone, Default)]
pub struct MockEngine {
    state: Arc<MockState>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `result` whenever `sql` is executed verbatim
    pub fn with_result(self, sql: &str, result: QueryResult) -> Self {
        lock(&self.state.results).insert(sql.to_string(), result);
        self
    }

    /// Fail with `message` whenever `sql` is executed verbatim
    pub fn with_failure(self, sql: &str, message: &str) -> Self {
        lock(&self.state.failures).insert(sql.to_string(), message.to_string());
        self
    }

    /// Queries containing `marker` wait at `gate` before completing
    pub fn with_gate(self, marker: &str, gate: Arc<QueryGate>) -> Self {
        *lock(&self.state.gate) = Some((marker.to_string(), gate));
        self
    }

    /// Make subsequent `connect` calls fail with `message`
    pub fn refuse_connections(&self, message: &str) {
        *lock(&self.state.refusal) = Some(message.to_string());
    }

    pub fn accept_connections(&self) {
        *lock(&self.state.refusal) = None;
    }

    pub fn opened(&self) -> usize {
        self.state.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.state.closed.load(Ordering::SeqCst)
    }

    /// Handles opened and not yet closed
    pub fn open_handles(&self) -> usize {
        self.opened() - self.closed()
    }

    /// `(raw identifier, read_only)` of every successful connect, in order
    pub fn connections(&self) -> Vec<(String, bool)> {
        lock(&self.state.connections).clone()
    }

    /// Every statement executed, probes included, in order
    pub fn executed(&self) -> Vec<String> {
        lock(&self.state.executed).clone()
    }
}

impl Engine for MockEngine {
    fn connect(&self, target: &DatabaseTarget, read_only: bool) -> Result<Box<dyn EngineHandle>> {
        if let Some(message) = lock(&self.state.refusal).clone() {
            return Err(DatabaseError::Connection(message));
        }
        lock(&self.state.connections).push((target.raw_identifier().to_string(), read_only));
        self.state.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockHandle {
            state: Arc::clone(&self.state),
            closed: false,
        }))
    }
}

struct MockHandle {
    state: Arc<MockState>,
    closed: bool,
}

impl MockHandle {
    fn mark_closed(&mut self) {
        if !self.closed {
            self.closed = true;
            self.state.closed.fetch_add(1, Ordering::SeqCst);
        }
    }
}

impl EngineHandle for MockHandle {
    fn execute(&mut self, sql: &str) -> Result<QueryResult> {
        lock(&self.state.executed).push(sql.to_string());

        let gate = lock(&self.state.gate)
            .as_ref()
            .filter(|(marker, _)| sql.contains(marker.as_str()))
            .map(|(_, gate)| Arc::clone(gate));
        if let Some(gate) = gate {
            gate.wait();
        }

        if let Some(message) = lock(&self.state.failures).get(sql) {
            return Err(DatabaseError::Query(message.clone()));
        }
        if let Some(result) = lock(&self.state.results).get(sql) {
            return Ok(result.clone());
        }
        if sql == PROBE_SQL {
            return Ok(QueryResult::new(
                vec![ColumnInfo::new("1", "INTEGER")],
                vec![vec![Value::Int(1)]],
            ));
        }
        Ok(QueryResult::new(
            vec![ColumnInfo::new("sql", "VARCHAR")],
            vec![vec![Value::Text(sql.to_string())]],
        ))
    }

    fn close(mut self: Box<Self>) -> Result<()> {
        self.mark_closed();
        Ok(())
    }
}

impl Drop for MockHandle {
    fn drop(&mut self) {
        self.mark_closed();
    }
}
