//! Selection tokens: `code || reference`.
//!
//! The first character picks the operation through the [`OperationTable`],
//! the rest of the token is the opaque file reference, verbatim. There is no
//! escaping, so [`DispatchProtocol::encode`] refuses references that would
//! make a token ambiguous instead of producing one.

use std::sync::Arc;

use crate::error::{ConfigurationError, DispatchError};
use crate::operation::{OperationKind, OperationTable};

/// Payload of the cancel control. Checked before any decoding.
pub const CANCEL_TOKEN: &str = "cancel";

/// Selection payloads are capped at 64 bytes by the messaging platform.
pub const MAX_TOKEN_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Cancel,
    Operation {
        operation: OperationKind,
        reference: String,
    },
}

#[derive(Debug, Clone)]
pub struct DispatchProtocol {
    table: Arc<OperationTable>,
}

impl DispatchProtocol {
    pub fn new(table: Arc<OperationTable>) -> Self {
        Self { table }
    }

    pub fn standard() -> Result<Self, ConfigurationError> {
        Ok(Self::new(Arc::new(OperationTable::standard()?)))
    }

    pub fn table(&self) -> &OperationTable {
        &self.table
    }

    pub fn cancel_token(&self) -> &'static str {
        CANCEL_TOKEN
    }

    pub fn encode(
        &self,
        operation: OperationKind,
        reference: &str,
    ) -> Result<String, DispatchError> {
        let code = self
            .table
            .code(operation)
            .ok_or(DispatchError::Unregistered(operation))?;

        if self.is_ambiguous(reference) {
            return Err(DispatchError::AmbiguousReference(reference.to_string()));
        }

        let mut token = String::with_capacity(code.len_utf8() + reference.len());
        token.push(code);
        token.push_str(reference);

        if token.len() > MAX_TOKEN_LEN {
            return Err(DispatchError::TokenTooLong {
                len: token.len(),
                max: MAX_TOKEN_LEN,
            });
        }
        Ok(token)
    }

    pub fn decode(&self, token: &str) -> Result<(OperationKind, String), DispatchError> {
        let mut chars = token.chars();
        let code = chars.next().ok_or(DispatchError::MalformedToken)?;
        let operation = self
            .table
            .operation(code)
            .ok_or(DispatchError::UnknownOperation(code))?;
        Ok((operation, chars.as_str().to_string()))
    }

    /// Decodes a selection payload, recognizing the cancel sentinel first.
    pub fn parse(&self, token: &str) -> Result<Selection, DispatchError> {
        if token == CANCEL_TOKEN {
            return Ok(Selection::Cancel);
        }
        let (operation, reference) = self.decode(token)?;
        Ok(Selection::Operation {
            operation,
            reference,
        })
    }

    /// A reference is refused when it is empty, or when it starts with a
    /// registered code or with the cancel sentinel's first character. No
    /// registered code can be that character, so no token spells the sentinel.
    fn is_ambiguous(&self, reference: &str) -> bool {
        let Some(first) = reference.chars().next() else {
            return true;
        };
        self.table.is_code(first) || CANCEL_TOKEN.starts_with(first)
    }
}
