//! Cache Promotion Policy
//!
//! Decides which faster tiers receive a copy of a value found lower down.
//! An L2 hit is always copied into L1; the only choice is whether store
//! hits are copied as well.

use super::manager::CacheTier;

/// Promotion policy configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromotionPolicy {
    /// Name of the policy
    pub name: String,
    /// Copy durable store hits into L2 and L1.
    ///
    /// Off by default so the tiered read path measures raw store reads on
    /// every cache miss; turning it on changes later benchmark timings.
    pub promote_store_hits: bool,
}

impl Default for PromotionPolicy {
    fn default() -> Self {
        Self::read_through()
    }
}

impl PromotionPolicy {
    /// L2 hits move up to L1; store hits stay where they are (default)
    pub fn read_through() -> Self {
        Self {
            name: "Read-Through".to_string(),
            promote_store_hits: false,
        }
    }

    /// Every hit below L1 is copied into all faster tiers
    pub fn full() -> Self {
        Self {
            name: "Full".to_string(),
            promote_store_hits: true,
        }
    }

    /// Tiers to populate after a hit in `found_in`, slowest first
    pub fn targets(&self, found_in: CacheTier) -> &'static [CacheTier] {
        match found_in {
            CacheTier::L1 => &[],
            CacheTier::L2 => &[CacheTier::L1],
            CacheTier::Store if self.promote_store_hits => &[CacheTier::L2, CacheTier::L1],
            CacheTier::Store => &[],
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
