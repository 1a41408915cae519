use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Debug;

/// A function the model is allowed to call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tool {
    /// The name of the function
    pub name: String,
    /// A description of what the function does, read by the model
    pub description: String,
    /// JSON schema of the arguments the function accepts
    pub parameters: Value,
}

impl Tool {
    /// Create a new tool with the given name and description
    pub fn new<N, D>(name: N, description: D, parameters: Value) -> Self
    where
        N: Into<String>,
        D: Into<String>,
    {
        Tool {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// A function call requested by the model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionCall {
    /// The name of the function to execute
    pub name: String,
    /// The arguments for the execution, already decoded from the model's JSON string
    pub arguments: Value,
}

impl FunctionCall {
    pub fn new<S: Into<String>>(name: S, arguments: Value) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}
