pub mod cleanup;
pub mod narration;
pub mod session;
