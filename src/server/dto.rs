//! Data Transfer Objects for the HTTP API

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::action::{Action, Classification, Parameter, StatementKind};
use crate::value::SemanticType;

/// Generic API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiErrorDto>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// Error details in API response
#[derive(Debug, Serialize)]
pub struct ApiErrorDto {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct HealthDto {
    pub status: String,
    pub version: String,
    pub actions: usize,
}

/// One declared parameter of an action
#[derive(Debug, Serialize)]
pub struct ParameterDto {
    pub binding_name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub semantic_type: SemanticType,
    pub format: String,
    pub requirements: Vec<String>,
}

impl From<&Parameter> for ParameterDto {
    fn from(param: &Parameter) -> Self {
        ParameterDto {
            binding_name: param.binding_name.to_string(),
            label: param.display_label.to_string(),
            semantic_type: param.semantic_type,
            format: param.semantic_type.format_hint().to_string(),
            requirements: param
                .requirements
                .iter()
                .map(|r| r.name.to_string())
                .collect(),
        }
    }
}

/// Catalog entry as exposed to browser clients
#[derive(Debug, Serialize)]
pub struct ActionDto {
    pub token: String,
    pub description: String,
    pub classification: Classification,
    pub kind: StatementKind,
    pub parameters: Vec<ParameterDto>,
}

impl From<&Action> for ActionDto {
    fn from(action: &Action) -> Self {
        ActionDto {
            token: action.token.to_string(),
            description: action.description.to_string(),
            classification: action.classification,
            kind: action.kind,
            parameters: action.parameters.iter().map(ParameterDto::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ActionListDto {
    pub actions: Vec<ActionDto>,
}

/// Body of `POST /api/v1/actions/:token/invoke`
#[derive(Debug, Default, Deserialize)]
pub struct InvokeRequest {
    /// Raw values keyed by parameter binding name
    #[serde(default)]
    pub arguments: HashMap<String, String>,
}

/// A value that failed validation
#[derive(Debug, Serialize)]
pub struct FieldErrorDto {
    pub binding_name: String,
    pub requirement: String,
    pub message: String,
}
