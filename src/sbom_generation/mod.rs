//! Core model and pure logic of dependency inventory and risk scoring.
pub mod domain;
pub mod services;
