//! Shared-library dependency auto-repair.
//!
//! The resolver inspects the installed binaries for unresolved shared
//! libraries, maps them to installable packages and asks the privilege
//! broker to install them, re-checking until the linkage is clean or
//! the round budget runs out.

mod inspect;
mod mapping;
mod resolver;

pub use inspect::{LddInspector, LinkageInspector};
pub use mapping::PackageMapping;
pub use resolver::{DependencyResolver, MAX_ROUNDS, ResolutionResult};
