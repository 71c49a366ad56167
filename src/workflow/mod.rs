pub mod probe_ctx;
pub mod probe_session;

pub use probe_ctx::ProbeCtx;
pub use probe_session::{ProbeSession, ProbeSettings, ProbeStyle};
