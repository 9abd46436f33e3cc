// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Query modules for persistence layer.
//!
//! This module contains all read-only queries for the persistence layer.
//!
//! ## Module Organization
//!
//! - `catalog`: Reference catalogs, terms, holidays and academic levels
//! - `load_files`: Load file versions
//! - `class_rows`: Ingested class rows
//! - `rates`: Hourly rate history
//! - `billing`: Billing reports and their children
//! - `jobs`: Work queue entries

pub mod billing;
pub mod catalog;
pub mod class_rows;
pub mod jobs;
pub mod load_files;
pub mod rates;
