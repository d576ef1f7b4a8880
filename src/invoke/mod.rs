//! # Invocation
//!
//! Binder plus dispatcher. `invoke` takes an action, one validated string per
//! declared parameter and a connection, and returns the classified outcome.
//!
//! Validation happens before this point, in the front ends, so a rejected
//! value can be re-prompted without building a call.

pub mod binder;
pub mod dispatch;
pub mod outcome;

use std::collections::HashMap;

pub use binder::{bind, convert};
pub use dispatch::execute;
pub use outcome::{Outcome, ResultTable};

use crate::action::Action;
use crate::backend::Connection;
use crate::error::BindingError;

/// Validated argument strings keyed by parameter binding name
pub type Arguments = HashMap<String, String>;

/// Bind `arguments` to `action`'s procedure and execute it.
///
/// Argument errors are returned as `Err`. A binding string that does not
/// name a callable procedure, and anything that goes wrong once the call
/// reaches the connection, is reported as `Outcome::Failure`.
pub async fn invoke(
    action: &Action,
    arguments: &Arguments,
    connection: &mut dyn Connection,
) -> Result<Outcome, BindingError> {
    if let Err(e) = action.procedure() {
        tracing::warn!(
            token = action.token,
            binding = action.binding,
            error = %e,
            "action_failed"
        );
        return Ok(Outcome::failure(e.to_string()));
    }

    let mut call = bind(action, arguments)?;

    tracing::debug!(
        token = action.token,
        procedure = %call.procedure(),
        "call_bound"
    );

    let outcome = execute(action, &mut call, connection).await;

    match &outcome {
        Outcome::Failure { message, .. } => tracing::warn!(
            token = action.token,
            classification = %action.classification,
            error = %message,
            "action_failed"
        ),
        Outcome::Rows { table } => tracing::info!(
            token = action.token,
            classification = %action.classification,
            rows = table.row_count(),
            "action_invoked"
        ),
        _ => tracing::info!(
            token = action.token,
            classification = %action.classification,
            status = outcome.status(),
            "action_invoked"
        ),
    }

    Ok(outcome)
}
