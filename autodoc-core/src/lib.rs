#![doc = "autodoc-core: core pipeline library for autodoc."]

//! This crate holds the whole documentation pipeline: scanning a source tree, building the
//! prompt, calling an LLM backend, converting Markdown to Confluence storage format and
//! publishing the page. The `autodoc` binary crate only parses arguments and loads config.
//!
//! # Usage
//! Build a [`config::Config`], select a [`backend::Backend`] and call
//! [`generate::generate`] with [`publish::Publisher::from_config`] as the connector.

pub mod analysis;
pub mod backend;
pub mod config;
pub mod confluence;
pub mod contract;
pub mod convert;
pub mod generate;
pub mod prompt;
pub mod publish;
pub mod scan;
