#![allow(non_camel_case_types)]

pub mod bindings;
pub mod cache;
pub mod cli;
pub mod configuration;
pub mod controller;
pub mod deploy;
pub mod error;
pub mod flow;
pub mod handler;
pub mod helpers;
pub mod model;
pub mod provider;
pub mod server;
pub mod types;
