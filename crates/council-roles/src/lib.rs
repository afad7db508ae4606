//! Role Registry & Alias Resolution (§4.4): resolves a role name (canonical
//! or a deprecated alias) and optional mode into a fully composed [`Role`],
//! appending the Council Deliberation Protocol to every system prompt.

pub mod alias;
pub mod protocol;
pub mod registry;
pub mod role;

pub use alias::resolve_alias;
pub use protocol::COUNCIL_PROTOCOL;
pub use registry::RoleRegistry;
pub use role::Role;
