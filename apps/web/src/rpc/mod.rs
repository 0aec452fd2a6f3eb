//! Remote procedures: caller identification, access tiers, and the in-process
//! client trusted server code uses to reach server-only procedures.

pub mod context;
pub mod input;
pub mod policy;
pub mod server_client;

pub use context::{CallContext, InboundCall, Locale, ProfileResolver, SessionResolver};
pub use input::{parse_input, parse_optional_input};
pub use policy::{AccessPolicy, Procedure};
pub use server_client::ServerCaller;
