/// Export command handler
pub mod export;
