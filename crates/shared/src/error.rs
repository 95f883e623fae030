use thiserror::Error;

/// Every failure a store action can surface. The executor produces the
/// first four; `Logical` comes out of envelope checking, and the last
/// two are raised client-side before any network call happens.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network-level failure: connect refused, DNS, broken pipe.
    #[error("request failed: {0}")]
    Transport(String),

    /// The in-flight call was aborted after the request deadline.
    #[error("request timed out after {0}s; check your network or the backend server")]
    Timeout(u64),

    /// Success status but the body could not be decoded as declared.
    #[error("malformed response body: {0}")]
    Decode(String),

    /// Non-success HTTP status; message is the server's when it sent one.
    #[error("{message}")]
    Status { status: u16, message: String },

    /// Transport succeeded but the envelope carried a failure code.
    #[error("{message}")]
    Logical { code: i64, message: String },

    /// Login response carried no token under any known field.
    #[error("missing token in login response")]
    MissingToken,

    /// A client-side invariant blocked the operation.
    #[error("{0}")]
    DomainGuard(String),
}

impl ApiError {
    /// Timeouts are transport failures too, just separately classified.
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_) | ApiError::Timeout(_))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::Timeout(_))
    }
}
