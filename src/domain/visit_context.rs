//! Per-request input to visit resolution.

use super::entities::VisitorAttributes;

/// Everything the resolver needs to know about one incoming visit.
///
/// Built by the redirect handler from the request; the resolver never touches
/// HTTP types directly.
#[derive(Debug, Clone, Default)]
pub struct VisitContext {
    /// Token presented by the visitor from an earlier visit to the same link.
    /// A visit already recorded under it is not recorded again.
    pub session_token: Option<String>,
    /// Fresh token handed back with this response. Stored on the visit when one
    /// is recorded.
    pub issued_token: Option<String>,
    /// Raw query string of the incoming request, without the leading `?`.
    pub query: Option<String>,
    pub attributes: VisitorAttributes,
}

impl VisitContext {
    pub fn new(attributes: VisitorAttributes) -> Self {
        Self {
            session_token: None,
            issued_token: None,
            query: None,
            attributes,
        }
    }

    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    pub fn with_issued_token(mut self, token: impl Into<String>) -> Self {
        self.issued_token = Some(token.into());
        self
    }

    /// Token a recorded visit is stored under: the issued one if any.
    pub fn recorded_token(&self) -> Option<String> {
        self.issued_token
            .clone()
            .or_else(|| self.session_token.clone())
    }

    pub fn with_query(mut self, query: Option<String>) -> Self {
        self.query = query;
        self
    }
}
