pub mod error;
pub mod model;
pub mod service;

pub use error::SessionServiceError;
pub use model::{
    ChunkReport, NextChunk, Session, SessionOptions, SessionStarted, DEFAULT_SESSION_TTL_SECS,
};
pub use service::{SessionService, SessionServiceApi};
