//! Per-user point ledger
//!
//! Balances are credited ("charge") and debited ("use") through [`commands::DomainLogic`],
//! which serializes the mutations of each user with a lock from [`lock::KeyedLocks`] while
//! letting different users proceed in parallel. Every committed mutation is recorded in an
//! append-only history.

pub mod adapters;
pub mod commands;
pub mod config;
pub mod domain;
pub mod lock;
pub mod ports;
