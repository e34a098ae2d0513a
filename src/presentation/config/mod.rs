mod environment;
mod settings;

pub use environment::Environment;
pub use settings::{
    AuthSettings, BrokerProvider, BrokerSettings, JobsSettings, LoggingSettings, ServerSettings,
    Settings, StorageSettings, ThumbnailSettings,
};
