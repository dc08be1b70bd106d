// crates/rum-core/src/runtime/policy.rs
// ============================================================================
// Module: Tracking Policy
// Description: Decides whether a page view is eligible for tracking.
// Purpose: Apply role exclusion, path blacklist, and sampling consistently.
// Dependencies: crate::core, rand
// ============================================================================

//! ## Overview
//! [`TrackingPolicy`] is evaluated twice per page view: once when the
//! collector bootstrap is rendered and again when the beacon arrives. Checks
//! run in a fixed order: excluded roles, blacklisted path prefixes, then
//! sampling. The random source is injectable for deterministic tests.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use rand::Rng;

use crate::core::Identity;
use crate::core::Settings;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Resolution of a sampling roll; rolls fall in `0 ..= SAMPLE_SCALE`.
pub const SAMPLE_SCALE: u32 = 1000;

// ============================================================================
// SECTION: Sampling
// ============================================================================

/// Source of sampling rolls.
pub trait SampleSource: Send + Sync {
    /// Returns a roll in `0 ..= SAMPLE_SCALE`.
    fn roll(&self) -> u32;
}

/// Thread-local RNG sampling source.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomSampleSource;

impl SampleSource for RandomSampleSource {
    fn roll(&self) -> u32 {
        rand::thread_rng().gen_range(0 ..= SAMPLE_SCALE)
    }
}

// ============================================================================
// SECTION: Policy
// ============================================================================

/// Tracking eligibility policy.
#[derive(Clone)]
pub struct TrackingPolicy {
    /// Sampling roll source.
    sampler: Arc<dyn SampleSource>,
}

impl Default for TrackingPolicy {
    fn default() -> Self {
        Self::new(Arc::new(RandomSampleSource))
    }
}

impl TrackingPolicy {
    /// Creates a policy with the given sampling source.
    #[must_use]
    pub fn new(sampler: Arc<dyn SampleSource>) -> Self {
        Self {
            sampler,
        }
    }

    /// Returns true when the page view at `url` should be tracked.
    #[must_use]
    pub fn should_track(&self, settings: &Settings, identity: &Identity, url: &str) -> bool {
        if identity.has_any_role(&settings.excluded_roles) {
            return false;
        }
        let path = request_path(url);
        if settings
            .blacklist
            .iter()
            .any(|prefix| !prefix.is_empty() && path.starts_with(prefix.as_str()))
        {
            return false;
        }
        if settings.sample_rate < 1.0 {
            let roll = f64::from(self.sampler.roll()) / f64::from(SAMPLE_SCALE);
            if roll > settings.sample_rate {
                return false;
            }
        }
        true
    }
}

/// Extracts the path component of an absolute or relative URL.
///
/// Query strings and fragments are dropped; an empty path becomes `/`.
#[must_use]
pub fn request_path(url: &str) -> &str {
    let trimmed = url.trim();
    let without_scheme = match trimmed.find("://") {
        Some(index) => {
            let rest = &trimmed[index + 3 ..];
            rest.find('/').map_or("", |slash| &rest[slash ..])
        }
        None => trimmed,
    };
    let end = without_scheme.find(['?', '#']).unwrap_or(without_scheme.len());
    let path = &without_scheme[.. end];
    if path.is_empty() { "/" } else { path }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
