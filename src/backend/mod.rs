//! # Database Backends
//!
//! The callable-procedure facility the dispatcher runs against. A
//! `PreparedCall` is a procedure binding plus one typed value per positional
//! slot; a `Connection` executes it either as a row-returning query or as a
//! no-result update.
//!
//! - `memory`: scripted backend for tests and demos
//! - `postgres`: sqlx-backed backend (feature `postgres`)

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;

use crate::action::ProcedureBinding;
use crate::config::DatabaseConfig;
use crate::error::{BindingError, ConfigError, ExecutionFailure};
use crate::invoke::ResultTable;
use crate::value::SqlValue;

/// The state of one positional slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    /// Nothing attached yet
    Unset,
    /// Input value
    In(SqlValue),
    /// Integer output slot, filled by the backend after execution
    OutInteger(Option<i32>),
}

/// A procedure call with its positional slots. Scoped to one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedCall {
    procedure: ProcedureBinding,
    slots: Vec<Slot>,
}

impl PreparedCall {
    pub fn new(procedure: ProcedureBinding) -> Self {
        let slots = vec![Slot::Unset; procedure.placeholders];
        PreparedCall { procedure, slots }
    }

    pub fn procedure(&self) -> &ProcedureBinding {
        &self.procedure
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Attach an input value to a 1-based slot
    pub fn set(&mut self, slot: usize, value: SqlValue) -> Result<(), BindingError> {
        *self.slot_mut(slot)? = Slot::In(value);
        Ok(())
    }

    /// Designate a 1-based slot as an integer output slot
    pub fn register_out_integer(&mut self, slot: usize) -> Result<(), BindingError> {
        *self.slot_mut(slot)? = Slot::OutInteger(None);
        Ok(())
    }

    /// Store the value of a registered output slot. Returns false if the
    /// slot was not registered as an output.
    pub fn store_out_integer(&mut self, slot: usize, value: Option<i32>) -> bool {
        match slot.checked_sub(1).and_then(|i| self.slots.get_mut(i)) {
            Some(Slot::OutInteger(out)) => {
                *out = value;
                true
            }
            _ => false,
        }
    }

    /// Read back an integer output slot after execution
    pub fn out_integer(&self, slot: usize) -> Option<i32> {
        match self.get(slot)? {
            Slot::OutInteger(value) => *value,
            _ => None,
        }
    }

    /// The input value at a 1-based slot
    pub fn input(&self, slot: usize) -> Option<&SqlValue> {
        match self.get(slot)? {
            Slot::In(value) => Some(value),
            _ => None,
        }
    }

    /// 1-based indexes of the registered output slots
    pub fn output_slots(&self) -> impl Iterator<Item = usize> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| matches!(s, Slot::OutInteger(_)))
            .map(|(i, _)| i + 1)
    }

    fn get(&self, slot: usize) -> Option<&Slot> {
        slot.checked_sub(1).and_then(|i| self.slots.get(i))
    }

    fn slot_mut(&mut self, slot: usize) -> Result<&mut Slot, BindingError> {
        let slots = self.slots.len();
        slot.checked_sub(1)
            .and_then(|i| self.slots.get_mut(i))
            .ok_or(BindingError::SlotOutOfRange { slot, slots })
    }
}

/// A live database session able to run prepared calls
#[async_trait]
pub trait Connection: Send {
    /// Execute as a row-returning call
    async fn execute_query(&mut self, call: &PreparedCall) -> Result<ResultTable, ExecutionFailure>;

    /// Execute as a no-result call, filling any registered output slots
    async fn execute_update(&mut self, call: &mut PreparedCall) -> Result<(), ExecutionFailure>;

    /// False once the underlying session is gone
    fn is_usable(&self) -> bool;

    /// Release the session. Further calls fail.
    async fn close(&mut self);
}

/// Hands out database connections
#[async_trait]
pub trait ConnectionProvider: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn Connection>, ConfigError>;
}

/// The provider the binaries connect through
#[cfg(feature = "postgres")]
pub fn default_provider(config: &DatabaseConfig) -> Result<Arc<dyn ConnectionProvider>, ConfigError> {
    let provider = postgres::PgConnectionProvider::from_config(config)?;
    Ok(Arc::new(provider))
}

#[cfg(not(feature = "postgres"))]
pub fn default_provider(_config: &DatabaseConfig) -> Result<Arc<dyn ConnectionProvider>, ConfigError> {
    Err(ConfigError::Invalid {
        field: "database",
        reason: "this build has no database driver; rebuild with --features postgres".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(slots: usize) -> PreparedCall {
        PreparedCall::new(ProcedureBinding {
            schema: "vapor".to_string(),
            procedure: "p".to_string(),
            placeholders: slots,
        })
    }

    #[cfg(feature = "postgres")]
    #[test]
    fn test_default_provider_requires_credentials() {
        let err = default_provider(&DatabaseConfig::default()).err();
        assert!(matches!(
            err,
            Some(ConfigError::MissingField("database.username"))
        ));

        let config = DatabaseConfig {
            username: "vapor".to_string(),
            password: "secret".to_string(),
            ..DatabaseConfig::default()
        };
        assert!(default_provider(&config).is_ok());
    }

    #[cfg(not(feature = "postgres"))]
    #[test]
    fn test_default_provider_without_driver() {
        let err = default_provider(&DatabaseConfig::default()).err();
        assert!(matches!(err, Some(ConfigError::Invalid { field: "database", .. })));
    }

    #[test]
    fn test_set_is_one_based() {
        let mut call = call(2);
        call.set(1, SqlValue::Integer(5)).unwrap();
        call.set(2, SqlValue::Integer(9)).unwrap();
        assert_eq!(call.input(1), Some(&SqlValue::Integer(5)));
        assert_eq!(call.input(2), Some(&SqlValue::Integer(9)));
    }

    #[test]
    fn test_slot_out_of_range() {
        let mut call = call(1);
        assert_eq!(
            call.set(0, SqlValue::Integer(1)),
            Err(BindingError::SlotOutOfRange { slot: 0, slots: 1 })
        );
        assert_eq!(
            call.register_out_integer(2),
            Err(BindingError::SlotOutOfRange { slot: 2, slots: 1 })
        );
    }

    #[test]
    fn test_out_integer_round_trip() {
        let mut call = call(2);
        call.register_out_integer(2).unwrap();
        assert_eq!(call.out_integer(2), None);
        assert!(call.store_out_integer(2, Some(17)));
        assert_eq!(call.out_integer(2), Some(17));
        assert_eq!(call.output_slots().collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn test_store_requires_registered_slot() {
        let mut call = call(1);
        assert!(!call.store_out_integer(1, Some(1)));
        assert!(!call.store_out_integer(0, Some(1)));
    }
}
