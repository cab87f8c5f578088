//! Scenario toolkit for integration testing the Beaufort controller.
//!
//! Provides deterministic, seeded generation of feedback-report traces so
//! controller trajectories can be asserted under reproducible network
//! conditions — calm links, congested links, and purely lossy links.

pub mod scenario;
