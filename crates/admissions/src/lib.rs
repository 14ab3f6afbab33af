//! Core library for the childcare admissions service.
//!
//! The interesting subsystem lives in [`workflows::admission`]: the allocation
//! and waitlist ordering engine that turns pending applicants into accepted,
//! waitlisted, and cancelled outcomes under capacity and priority constraints.
//! Everything the engine needs from the surrounding CRUD application is
//! reached through the [`workflows::admission::AdmissionStore`] trait.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
