//! Invocation binder: validated strings to a prepared, positional call

use std::str::FromStr;

use rust_decimal::Decimal;

use super::Arguments;
use crate::action::Action;
use crate::backend::PreparedCall;
use crate::error::BindingError;
use crate::value::{parse_date, parse_datetime, SemanticType, SqlValue};

/// Convert a raw string to the value its semantic type calls for
pub fn convert(semantic_type: SemanticType, raw: &str) -> Result<SqlValue, String> {
    match semantic_type {
        SemanticType::Integer => raw
            .parse::<i32>()
            .map(SqlValue::Integer)
            .map_err(|e| e.to_string()),
        SemanticType::String => Ok(SqlValue::Text(raw.to_string())),
        SemanticType::Date => parse_date(raw)
            .map(SqlValue::Date)
            .ok_or_else(|| "expected YYYY-MM-DD".to_string()),
        SemanticType::DateTime => parse_datetime(raw)
            .map(SqlValue::DateTime)
            .ok_or_else(|| "expected YYYY-MM-DD HH:MM:SS".to_string()),
        SemanticType::Money => Decimal::from_str(raw)
            .map(SqlValue::Money)
            .map_err(|e| e.to_string()),
    }
}

/// Build the prepared call for `action`.
///
/// Each declared parameter's argument is converted and attached to the slot
/// matching its position in the declaration, so the iteration order of
/// `arguments` never matters. Trailing output slots are left unset.
pub fn bind(action: &Action, arguments: &Arguments) -> Result<PreparedCall, BindingError> {
    if let Some(stray) = arguments
        .keys()
        .find(|name| action.parameter(name).is_none())
    {
        return Err(BindingError::UnknownArgument {
            token: action.token.to_string(),
            binding_name: stray.clone(),
        });
    }

    let mut call = PreparedCall::new(action.procedure()?);

    for (index, param) in action.parameters.iter().enumerate() {
        let raw = arguments
            .get(param.binding_name)
            .ok_or_else(|| BindingError::MissingArgument {
                token: action.token.to_string(),
                binding_name: param.binding_name.to_string(),
            })?;

        let value = convert(param.semantic_type, raw).map_err(|reason| BindingError::Conversion {
            binding_name: param.binding_name.to_string(),
            semantic_type: param.semantic_type,
            value: raw.clone(),
            reason,
        })?;

        call.set(index + 1, value)?;
    }

    Ok(call)
}
