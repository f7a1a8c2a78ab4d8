//! # Samaj Directory Common Library
//!
//! Shared code for the directory service and any front-end built on it:
//! - Member record and submission models
//! - Field validation rules and the validation error map
//! - Spreadsheet row mapping (header fuzzy matching)
//! - Entry form state with incremental validation
//! - Configuration loading
//! - Event types (DirectoryEvent) and SSE helpers

pub mod config;
pub mod error;
pub mod events;
pub mod form;
pub mod mapper;
pub mod models;
pub mod sse;
pub mod validation;

pub use error::{Error, Result};
pub use form::FormState;
pub use models::{FamilyMember, MemberForm, MemberRecord, NewMemberData};
pub use validation::{FamilyField, Field, FieldPath, ValidationErrors};
