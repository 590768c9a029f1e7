//! Stable exit codes for `query-store` CLI commands.

/// Command succeeded and a page was rendered.
pub const OK: i32 = 0;
/// Invalid config, misconfigured mode, or unreadable results.
pub const INVALID: i32 = 1;
/// `query-store render` found no result and rendered the placeholder.
pub const PLACEHOLDER: i32 = 2;
