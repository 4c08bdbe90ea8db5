//! crosspost adapters crate
//!
//! This crate contains infrastructure adapters implementing the domain ports:
//! - `content`: Filesystem markdown reader with YAML front matter
//! - `post_map`: JSON post map store
//! - `devto`: dev.to API adapter
//! - `qiita`: Qiita API adapter
//! - `changes`: git working tree change source

mod content_fs;
mod git_status;
pub mod http;
mod post_map_fs;

pub mod devto;
pub mod qiita;

/// Re-exports for content adapters
pub mod content {
    pub use crate::content_fs::FsContentSource;
}

/// Re-exports for post map adapters
pub mod post_map {
    pub use crate::post_map_fs::JsonPostMapStore;
}

/// Re-exports for change detection adapters
pub mod changes {
    pub use crate::git_status::GitStatusSource;
}

pub use devto::DevtoAdapter;
pub use http::HttpSettings;
pub use qiita::QiitaAdapter;
