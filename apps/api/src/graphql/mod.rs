//! GraphQL transport. Every backend call goes through `GraphqlClient`.
//!
//! Responses are decoded exactly once, here, into `GqlOutcome`. Callers never
//! see raw JSON or have to dig through optional fields.

use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

pub mod operations;

pub use operations::Operation;

const NOT_FOUND_CODE: &str = "NOT_FOUND";
const CONFLICT_CODE: &str = "CONFLICT";

#[derive(Debug, Error)]
pub enum GraphqlError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GraphQL endpoint returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("could not decode {operation} response: {source}")]
    Decode {
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{operation} failed: {message}")]
    Rejected {
        operation: &'static str,
        message: String,
    },
}

/// Result of one GraphQL operation.
#[derive(Debug)]
pub enum GqlOutcome<T> {
    Data(T),
    NotFound,
    Conflict(String),
    TransportError(GraphqlError),
}

#[derive(Debug, Serialize)]
struct GraphqlRequest<'a, V> {
    #[serde(rename = "operationName")]
    operation_name: &'a str,
    query: &'a str,
    variables: &'a V,
}

#[derive(Debug, Default, Deserialize)]
struct GraphqlResponse {
    data: Option<Map<String, Value>>,
    #[serde(default)]
    errors: Vec<GraphqlErrorBody>,
}

#[derive(Debug, Deserialize)]
struct GraphqlErrorBody {
    message: String,
    #[serde(default)]
    extensions: Option<ErrorExtensions>,
}

#[derive(Debug, Deserialize)]
struct ErrorExtensions {
    code: Option<String>,
}

impl GraphqlErrorBody {
    fn code(&self) -> Option<&str> {
        self.extensions.as_ref().and_then(|e| e.code.as_deref())
    }
}

#[derive(Clone)]
pub struct GraphqlClient {
    client: Client,
    endpoint: String,
}

impl GraphqlClient {
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    /// Runs one named operation. Never retries; timeouts come from the
    /// underlying `reqwest::Client`.
    pub async fn execute<V, T>(&self, operation: &Operation, variables: &V) -> GqlOutcome<T>
    where
        V: Serialize + Sync,
        T: DeserializeOwned,
    {
        let request = GraphqlRequest {
            operation_name: operation.name,
            query: operation.document,
            variables,
        };

        debug!("GraphQL {} -> {}", operation.name, self.endpoint);
        let response = match self.client.post(&self.endpoint).json(&request).send().await {
            Ok(response) => response,
            Err(e) => return GqlOutcome::TransportError(GraphqlError::Http(e)),
        };

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!("GraphQL {} returned {}: {}", operation.name, status, message);
            return GqlOutcome::TransportError(GraphqlError::Status {
                status: status.as_u16(),
                message,
            });
        }

        match response.json::<GraphqlResponse>().await {
            Ok(body) => decode(operation, body),
            Err(e) => GqlOutcome::TransportError(GraphqlError::Http(e)),
        }
    }
}

fn decode<T: DeserializeOwned>(operation: &Operation, body: GraphqlResponse) -> GqlOutcome<T> {
    let GraphqlResponse { data, errors } = body;

    if let Some(first) = errors.first() {
        return match first.code() {
            Some(NOT_FOUND_CODE) => GqlOutcome::NotFound,
            Some(CONFLICT_CODE) => GqlOutcome::Conflict(first.message.clone()),
            _ => {
                let message = errors
                    .iter()
                    .map(|e| e.message.as_str())
                    .collect::<Vec<_>>()
                    .join("; ");
                GqlOutcome::TransportError(GraphqlError::Rejected {
                    operation: operation.name,
                    message,
                })
            }
        };
    }

    let value = data
        .and_then(|mut data| data.remove(operation.field))
        .unwrap_or(Value::Null);
    if value.is_null() {
        return GqlOutcome::NotFound;
    }

    match serde_json::from_value(value) {
        Ok(decoded) => GqlOutcome::Data(decoded),
        Err(source) => GqlOutcome::TransportError(GraphqlError::Decode {
            operation: operation.name,
            source,
        }),
    }
}
