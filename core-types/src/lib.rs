// Copyright (c) James Kassemi, SC, US. All rights reserved.

//! Shared event model, configuration, and time helpers.

pub mod config;
pub mod events;
pub mod timefmt;
