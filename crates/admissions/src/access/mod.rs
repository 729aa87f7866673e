//! Access gate: an explicit route table of role and ownership requirements,
//! evaluated by a single middleware stage in front of every handler.

pub mod gate;
pub mod middleware;
pub mod rules;

pub use gate::{AccessError, AccessGate, Caller};
pub use middleware::{enforce_access, with_access_gate};
pub use rules::{AccessRule, Ownership, RoleRequirement, RouteMatch, RouteTable};
