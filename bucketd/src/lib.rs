//! A thin HTTP façade over an object storage bucket.
//!
//! `GET`, `PUT` and `DELETE` on `/<key>` map onto the configured
//! [`storage::ObjectStore`]; `/_list` and `/_health` are reserved.

pub mod api;
pub mod config;
pub mod error;
pub mod service;
pub mod storage;
pub mod utils;
