//! Types shared by the client stores: domain records as the backend
//! services serialize them, the response-envelope normalization the
//! stores rely on, and the error taxonomy every call surfaces.

pub mod domain;
pub mod envelope;
pub mod error;
