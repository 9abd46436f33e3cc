// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Mutation modules for the persistence layer.
//!
//! This module contains all state-changing operations. Every multi-statement
//! write runs inside an immediate transaction so concurrent writers serialize
//! on the `SQLite` write lock.
//!
//! ## Module Organization
//!
//! - `catalog`: Catalog seeding and maintenance
//! - `load_files`: File version ledger and ingestion results
//! - `class_rows`: Batched class row inserts
//! - `rates`: Hourly rate history changes
//! - `billing`: Billing report storage and manual edits
//! - `jobs`: Work queue transitions

pub mod billing;
pub mod catalog;
pub mod class_rows;
pub mod jobs;
pub mod load_files;
pub mod rates;

pub use load_files::IngestionOutcome;
