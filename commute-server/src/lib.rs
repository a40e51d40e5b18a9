//! Commute matcher server.
//!
//! Finds rental properties near railway stations and keeps the stations
//! whose commute to a destination fits within a time limit. Journey plans
//! come from an upstream planner and are cached per query.

pub mod cache;
pub mod config;
pub mod db;
pub mod domain;
pub mod journey;
pub mod matching;
pub mod planner_api;
pub mod property;
pub mod web;
