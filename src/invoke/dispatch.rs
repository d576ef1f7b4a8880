//! Dispatcher: execute a bound call according to its action's classification

use super::outcome::Outcome;
use crate::action::{Action, Classification};
use crate::backend::{Connection, PreparedCall};
use crate::error::ExecutionFailure;

/// Run `call` and classify the result. Execution failures become
/// `Outcome::Failure`; nothing is retried.
pub async fn execute(
    action: &Action,
    call: &mut PreparedCall,
    connection: &mut dyn Connection,
) -> Outcome {
    let result = match action.classification {
        Classification::Query => connection.execute_query(call).await.map(|table| {
            if table.is_empty() {
                Outcome::Empty {
                    columns: table.columns,
                }
            } else {
                Outcome::Rows { table }
            }
        }),
        Classification::Mutate => connection
            .execute_update(call)
            .await
            .map(|()| Outcome::Success { generated_id: None }),
        Classification::MutateReturnId => execute_returning_id(action, call, connection).await,
    };

    result.unwrap_or_else(|failure| Outcome::Failure {
        message: failure.message,
        connection_lost: failure.connection_lost,
    })
}

async fn execute_returning_id(
    action: &Action,
    call: &mut PreparedCall,
    connection: &mut dyn Connection,
) -> Result<Outcome, ExecutionFailure> {
    let out_slot = action.parameters.len() + 1;
    call.register_out_integer(out_slot)
        .map_err(|e| ExecutionFailure::new(e.to_string()))?;

    connection.execute_update(call).await?;

    match call.out_integer(out_slot) {
        Some(id) => Ok(Outcome::Success {
            generated_id: Some(id),
        }),
        None => Err(ExecutionFailure::new(format!(
            "{} returned no generated id",
            call.procedure().qualified_name()
        ))),
    }
}
