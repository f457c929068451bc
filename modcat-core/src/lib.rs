#![doc = "modcat-core: core logic library for modcat."]

//! This crate discovers the repositories of a forge account, reads each one's
//! module descriptor and auxiliary metadata, and aggregates the results into a
//! single module catalog. It also carries the local maintenance workflow used
//! to prune and commit a mirrored module tree.
//!
//! # Usage
//! Construct a [`github::GithubClient`] (or any [`forge::Forge`]) and pass it
//! to [`catalog::build_catalog`]; write the result with
//! [`catalog::write_catalog`].

pub mod catalog;
pub mod descriptor;
pub mod error;
pub mod forge;
pub mod github;
pub mod maintenance;
pub mod module;
pub mod resolve;
