// src/lib.rs

//! Recipe resolver for packaging GLib
//!
//! Turns a recipe and a target platform into everything needed to build
//! GLib: the effective option set, the ordered dependency requests, the
//! build-tool invocation plan, and the consumer metadata of the result.
//!
//! # Architecture
//!
//! - Resolver: pure functions of (platform, options, config); no host access
//! - Recipe: TOML files carrying defaults, pins and build settings
//! - Kitchen: fetches, patches and builds through pluggable collaborators
//! - Platform: explicit descriptor passed to every stage, detected only by the CLI

mod error;
pub mod hash;
pub mod platform;
pub mod recipe;
pub mod resolver;

pub use error::{Error, Result};
pub use hash::{Checksum, HashAlgorithm, Hasher};
pub use platform::PlatformDescriptor;
pub use recipe::{Cook, CookResult, Kitchen, KitchenConfig, Recipe};
pub use resolver::{Resolution, Resolver, ResolverConfig};
