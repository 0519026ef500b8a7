//! Permission resolution
//!
//! Turns a user id into a per-request `CapabilitySet` by querying the policy
//! oracle. Fail-closed: any failed, timed-out or malformed check counts as
//! a denial.

pub mod capability;
pub mod resolver;

pub use capability::{CapabilitySet, Visibility};
pub use resolver::{PermissionResolver, ResolverConfig};
