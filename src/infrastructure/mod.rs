pub mod auth;
pub mod broker;
pub mod imaging;
pub mod observability;
pub mod persistence;
pub mod storage;
