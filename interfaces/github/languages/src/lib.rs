//! Thin GitHub REST interface for organization repositories and their
//! language breakdowns.

pub mod index;
