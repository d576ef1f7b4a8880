//! Scripted in-memory backend
//!
//! `MemoryDatabase` answers calls from responses registered per procedure
//! and records every call it executes. Clones share state, so a test can
//! hand one clone to a session and inspect the recorded calls through
//! another.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{Connection, ConnectionProvider, PreparedCall};
use crate::error::{ConfigError, ExecutionFailure};
use crate::invoke::ResultTable;

/// A scripted reply to one call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Return these rows to a query
    Rows(ResultTable),
    /// Complete an update without output
    Updated,
    /// Complete an update and fill every registered output slot with this id
    GeneratedId(i32),
    /// Fail with a database error
    Fail(String),
    /// Fail and drop the connection
    Disconnect(String),
}

/// How a recorded call was executed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallMode {
    Query,
    Update,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub mode: CallMode,
    pub call: PreparedCall,
}

#[derive(Debug, Default)]
struct State {
    responses: HashMap<String, VecDeque<Response>>,
    calls: Vec<RecordedCall>,
    connect_failure: Option<String>,
    connections_opened: usize,
    connections_closed: usize,
}

/// Shared scripted database
#[derive(Debug, Clone, Default)]
pub struct MemoryDatabase {
    state: Arc<Mutex<State>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for `procedure` (`schema.name`). Responses are
    /// consumed in order; the last one keeps answering.
    pub fn respond(&self, procedure: &str, response: Response) -> &Self {
        self.state
            .lock()
            .responses
            .entry(procedure.to_string())
            .or_default()
            .push_back(response);
        self
    }

    /// Make every subsequent `connect` fail
    pub fn fail_connect(&self, reason: &str) {
        self.state.lock().connect_failure = Some(reason.to_string());
    }

    /// Every call executed so far, oldest first
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().calls.clone()
    }

    pub fn connections_opened(&self) -> usize {
        self.state.lock().connections_opened
    }

    pub fn connections_closed(&self) -> usize {
        self.state.lock().connections_closed
    }

    /// Open a connection directly
    pub fn connection(&self) -> MemoryConnection {
        self.state.lock().connections_opened += 1;
        MemoryConnection {
            state: Arc::clone(&self.state),
            usable: true,
            closed: false,
        }
    }
}

#[async_trait]
impl ConnectionProvider for MemoryDatabase {
    async fn connect(&self) -> Result<Box<dyn Connection>, ConfigError> {
        let failure = self.state.lock().connect_failure.clone();
        if let Some(reason) = failure {
            return Err(ConfigError::Connect {
                address: "memory".to_string(),
                reason,
            });
        }
        Ok(Box::new(self.connection()))
    }
}

/// One session against a `MemoryDatabase`
#[derive(Debug)]
pub struct MemoryConnection {
    state: Arc<Mutex<State>>,
    usable: bool,
    closed: bool,
}

impl MemoryConnection {
    fn next_response(&mut self, mode: CallMode, call: &PreparedCall) -> Result<Response, ExecutionFailure> {
        if !self.usable {
            return Err(ExecutionFailure::connection_lost("connection is closed"));
        }

        let name = call.procedure().qualified_name();
        let mut state = self.state.lock();
        state.calls.push(RecordedCall {
            mode,
            call: call.clone(),
        });

        let queue = state
            .responses
            .get_mut(&name)
            .ok_or_else(|| ExecutionFailure::new(format!("procedure {name} does not exist")))?;
        let response = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        drop(state);

        match response {
            Some(Response::Fail(message)) => Err(ExecutionFailure::new(message)),
            Some(Response::Disconnect(message)) => {
                self.usable = false;
                Err(ExecutionFailure::connection_lost(message))
            }
            Some(other) => Ok(other),
            None => Err(ExecutionFailure::new(format!("procedure {name} does not exist"))),
        }
    }
}

#[async_trait]
impl Connection for MemoryConnection {
    async fn execute_query(&mut self, call: &PreparedCall) -> Result<ResultTable, ExecutionFailure> {
        match self.next_response(CallMode::Query, call)? {
            Response::Rows(table) => Ok(table),
            _ => Err(ExecutionFailure::new(format!(
                "{} does not return rows",
                call.procedure().qualified_name()
            ))),
        }
    }

    async fn execute_update(&mut self, call: &mut PreparedCall) -> Result<(), ExecutionFailure> {
        match self.next_response(CallMode::Update, call)? {
            Response::Updated => Ok(()),
            Response::GeneratedId(id) => {
                let outputs: Vec<usize> = call.output_slots().collect();
                for slot in outputs {
                    call.store_out_integer(slot, Some(id));
                }
                Ok(())
            }
            _ => Err(ExecutionFailure::new(format!(
                "{} cannot be called as an update",
                call.procedure().qualified_name()
            ))),
        }
    }

    fn is_usable(&self) -> bool {
        self.usable
    }

    async fn close(&mut self) {
        self.usable = false;
        self.release();
    }
}

impl MemoryConnection {
    fn release(&mut self) {
        if !self.closed {
            self.closed = true;
            self.state.lock().connections_closed += 1;
        }
    }
}

impl Drop for MemoryConnection {
    fn drop(&mut self) {
        self.release();
    }
}
