//! End-to-end tests for the revision pipeline: extraction, concurrent
//! dispatch, the HTTP backend and the diff document.

#[path = "../common/mod.rs"]
mod common;

mod http_service;
mod pipeline;
