//! Medgate - Security gateway for a health-information LLM chat service
//!
//! This crate provides a daemon that fronts an OpenAI-compatible local model
//! server with per-route rate limiting, session and disclaimer gating,
//! severity triage for prompt selection, and reasoning-block extraction for
//! streamed model output.

pub mod config;
pub mod error;
pub mod gateway;
pub mod security;
pub mod thinking;
pub mod triage;

pub use error::MedgateError;
