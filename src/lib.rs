//! Campusgate - client registry of the LMS REST gateway
//!
//! This library owns the API-key ("client") records of the REST add-on:
//! route permissions, per-client user and IP allow-lists, and the OAuth2
//! grant-type configuration the token-issuance layer consults.

pub mod context;
pub mod directory;
pub mod entities;
pub mod errors;
pub mod registry;
pub mod settings;
