//! Authentication and authorization
//!
//! - [`session`]: JWT issue/validate and the caller identity
//! - [`permissions`]: role permission tables
//! - [`scope`]: organization scope of a request
//! - [`middleware`]: route layers
//! - [`rate_limit`]: login throttling

pub mod middleware;
pub mod permissions;
pub mod rate_limit;
pub mod scope;
pub mod session;

pub use middleware::{CurrentUserExt, require_auth, require_permission, require_super_admin};
pub use rate_limit::RateLimiter;
pub use scope::{OrgScope, TenantContext};
pub use session::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
