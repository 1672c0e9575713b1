//! Research Pilot - Subscription lifecycle and access control
//!
//! This crate tracks each subscriber's plan (free trial, monthly, yearly or
//! lifetime), derives days remaining and the access gate from it, and exposes
//! both over a small REST API backed by pluggable storage.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
