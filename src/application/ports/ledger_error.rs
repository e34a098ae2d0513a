#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("read failed: {0}")]
    ReadFailed(String),
    #[error("write failed: {0}")]
    WriteFailed(String),
    #[error("corrupt record: {0}")]
    Corrupt(String),
}
