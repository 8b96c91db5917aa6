//! Property tests for the activation machine and response parsing

mod activation;
mod parsing;
