// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod activity;
pub mod credentials;
pub mod meal;

pub use activity::ActivityLogger;
pub use meal::{MealAnalyzer, MealEstimate};
