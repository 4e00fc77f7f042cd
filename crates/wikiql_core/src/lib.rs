//! Client for a wiki's GraphQL API plus local markdown analysis helpers.

pub mod assets;
pub mod client;
pub mod config;
pub mod diff;
pub mod error;
pub mod history;
pub mod links;
pub mod lint;
pub mod literal;
pub mod logging;
pub mod model;
pub mod pages;
pub mod similarity;
pub mod system;
pub mod tags;
pub mod tree;
pub mod validate;

#[cfg(test)]
mod test_support;

pub use client::{GraphqlApi, GraphqlClient, Session};
pub use error::{ClientError, ClientResult};
pub use model::{OperationResult, Page, PageSummary};
pub use validate::{Identifier, PagePath, PageRef, validate_identifier, validate_path};
