//! Routing manifest compilation for kiln.
//!
//! - [`migrate`]: legacy rule shapes → `behavior`-nested rules
//! - [`compile`]: configuration → validated [`Manifest`]
//! - [`write_manifest`]: persistence as pretty JSON
//! - [`platform`]: the edge platform API payload

pub mod behavior;
pub mod compile;
pub mod error;
pub mod manifest;
pub mod migrate;
pub mod platform;
pub mod writer;

pub use behavior::{BehaviorKind, Phase};
pub use compile::compile;
pub use error::{ManifestError, Result, ValidationIssue};
pub use manifest::{Manifest, Origin, OriginType, Rule, RuleSet};
pub use migrate::{migrate, migrate_rule, migrate_rules, migrate_value};
pub use platform::{PlatformGenerator, PlatformPayload, generate_payload, write_payload};
pub use writer::{DEFAULT_MANIFEST_PATH, manifest_path, to_pretty_json, write_manifest};
