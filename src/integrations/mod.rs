//! Upstream provider integrations.

pub mod providers {
    pub use crate::providers::*;
}
