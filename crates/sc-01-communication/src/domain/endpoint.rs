//! # Endpoint Directory
//!
//! Ordered candidate nodes. The endpoint for a connection attempt is
//! `endpoints[attempt % len]`, so repeated failures walk the list and wrap.

use crate::domain::errors::CommunicationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A node address and whether it needs TLS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub uri: String,
    pub secure: bool,
}

impl Endpoint {
    pub fn new(uri: impl Into<String>, secure: bool) -> Self {
        Self {
            uri: uri.into(),
            secure,
        }
    }

    /// Infer the secure flag from the scheme (`wss://` or `https://`).
    pub fn from_uri(uri: impl Into<String>) -> Self {
        let uri = uri.into();
        let secure = uri.starts_with("wss://") || uri.starts_with("https://");
        Self { uri, secure }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri)
    }
}

/// Round-robin endpoint selection.
#[derive(Debug, Clone, Default)]
pub struct EndpointDirectory {
    endpoints: Vec<Endpoint>,
}

impl EndpointDirectory {
    pub fn new(endpoints: Vec<Endpoint>) -> Self {
        Self { endpoints }
    }

    pub fn select(&self, attempt: u64) -> Result<&Endpoint, CommunicationError> {
        if self.endpoints.is_empty() {
            return Err(CommunicationError::NoEndpoints);
        }
        let index = (attempt % self.endpoints.len() as u64) as usize;
        Ok(&self.endpoints[index])
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}
