//! Polls freelance job feeds, skips listings already notified, and posts the
//! new ones to a chat webhook.

pub mod cli;
pub mod config;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod services;
pub mod sources;
pub mod storage;

#[cfg(test)]
pub(crate) mod test_support;
