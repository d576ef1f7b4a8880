//! Request handlers
//!
//! Every invocation validates all arguments before a connection is opened,
//! then uses one connection for the call and closes it before responding.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query};
use axum::{Extension, Json};
use serde::Deserialize;

use super::dto::{
    ActionDto, ActionListDto, ApiResponse, FieldErrorDto, HealthDto, InvokeRequest,
};
use super::error::RestError;
use super::AppState;
use crate::action::Action;
use crate::invoke::{invoke, Outcome};

/// Requirement name reported for argument keys the action does not declare
const UNDECLARED_REQUIREMENT: &str = "DECLARED_PARAMETER";

/// Health check endpoint
pub async fn health(
    Extension(state): Extension<AppState>,
) -> Result<Json<ApiResponse<HealthDto>>, RestError> {
    Ok(Json(ApiResponse::success(HealthDto {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        actions: state.catalog.len(),
    })))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    /// Filter by classification (`query`, `mutate`, `mutate_return_id`)
    pub classification: Option<String>,
}

/// List the catalog in order
pub async fn list_actions(
    Extension(state): Extension<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<ApiResponse<ActionListDto>>, RestError> {
    let actions = state
        .catalog
        .iter()
        .filter(|a| {
            params
                .classification
                .as_deref()
                .is_none_or(|c| a.classification.to_string() == c)
        })
        .map(ActionDto::from)
        .collect();
    Ok(Json(ApiResponse::success(ActionListDto { actions })))
}

/// Describe one action
pub async fn get_action(
    Extension(state): Extension<AppState>,
    Path(token): Path<String>,
) -> Result<Json<ApiResponse<ActionDto>>, RestError> {
    let action = lookup(&state, &token)?;
    Ok(Json(ApiResponse::success(ActionDto::from(action))))
}

/// Validate, bind and execute one action
pub async fn invoke_action(
    Extension(state): Extension<AppState>,
    Path(token): Path<String>,
    body: Result<Json<InvokeRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<Outcome>>, RestError> {
    let action = lookup(&state, &token)?;
    let Json(request) = body.map_err(|e| RestError::bad_request(e.body_text()))?;

    let rejected = validate_arguments(action, &request);
    if !rejected.is_empty() {
        tracing::info!(token = action.token, rejected = rejected.len(), "invocation_rejected");
        return Err(RestError::validation(rejected));
    }

    let mut connection = state.provider.connect().await?;
    let result = invoke(action, &request.arguments, connection.as_mut()).await;
    connection.close().await;

    Ok(Json(ApiResponse::success(result?)))
}

fn lookup<'a>(state: &'a AppState, token: &str) -> Result<&'a Action, RestError> {
    state
        .catalog
        .lookup(token)
        .ok_or_else(|| RestError::not_found(format!("No action with token '{token}'")))
}

/// Run every declared parameter's validation, collecting all rejections.
/// Missing arguments are validated as empty strings. Keys naming no declared
/// parameter are rejected after the declared ones, in name order.
fn validate_arguments(action: &Action, request: &InvokeRequest) -> Vec<FieldErrorDto> {
    let mut rejected: Vec<FieldErrorDto> = action
        .parameters
        .iter()
        .filter_map(|param| {
            let raw = request
                .arguments
                .get(param.binding_name)
                .map_or("", String::as_str);
            param.validate(raw).err().map(|rejection| FieldErrorDto {
                binding_name: param.binding_name.to_string(),
                requirement: rejection.requirement.to_string(),
                message: rejection.message.to_string(),
            })
        })
        .collect();

    let mut undeclared: Vec<&String> = request
        .arguments
        .keys()
        .filter(|name| action.parameter(name).is_none())
        .collect();
    undeclared.sort();
    rejected.extend(undeclared.into_iter().map(|name| FieldErrorDto {
        binding_name: name.clone(),
        requirement: UNDECLARED_REQUIREMENT.to_string(),
        message: format!("action '{}' has no parameter named '{name}'", action.token),
    }));

    rejected
}
