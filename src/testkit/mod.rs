//! Test support shared by unit and integration tests.
//!
//! - [`helpers`]: factory functions for pairs and commits
//! - [`fakes`]: in-memory collaborators with call counters
//!
//! ```rust,ignore
//! use testverdict::testkit::{sample_pair, FakeAiBridge};
//!
//! let pair = sample_pair("assertEquals(90, calc.calculate(100));", "return price * 0.85;");
//! let bridge = FakeAiBridge::replying("Mismatch: the test expects 90 but the code returns 85.");
//! ```

pub mod fakes;
pub mod helpers;

pub use fakes::{FakeAiBridge, FakeGitService};
pub use helpers::{commit_at, pair_from_sources, sample_pair};
