//! Turns raw wiki save templates into concrete filesystem paths.
//!
//! Per-OS behavior (placeholder roots, separators, watch roots, noise
//! denylist) lives behind [`OsStrategy`], chosen once per discovery
//! session. Windows templates can also be translated into a Proton
//! prefix with [`CompatTranslator`].

pub mod compat;
pub mod expand;
pub mod host;
pub mod placeholders;
pub mod strategy;

pub use compat::CompatTranslator;
pub use expand::{ExpandContext, Expansion, expand};
pub use host::HostDirs;
pub use placeholders::{WinRoot, has_account_marker, normalize_wiki_tokens};
pub use strategy::{
    NoisePath, OsStrategy, UnixStrategy, WindowsStrategy, native_target, strategy_for,
};
pub use savescout_wiki::TargetOs;
