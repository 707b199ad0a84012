//! Database entities

pub mod organization_tag;
