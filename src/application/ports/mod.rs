mod credential_verifier;
mod file_relocator;
mod job_ledger;
mod ledger_error;
mod message_broker;
mod staging_store;
mod thumbnail_generator;

pub use credential_verifier::{CredentialVerifier, Credentials};
pub use file_relocator::{FileRelocator, RelocationError};
pub use job_ledger::JobLedger;
pub use ledger_error::LedgerError;
pub use message_broker::{
    BrokerError, Delivery, MessageBroker, STATUS_QUEUE, Subscription, UPLOAD_QUEUE,
};
pub use staging_store::{StagingStore, StagingStoreError};
pub use thumbnail_generator::{ThumbnailGenerator, ThumbnailGeneratorError};
