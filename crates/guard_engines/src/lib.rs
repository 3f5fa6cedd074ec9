#![forbid(unsafe_code)]

pub mod classifier_client;
pub mod intent;
pub mod token_vault;
pub mod verdict;
