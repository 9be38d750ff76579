//! GitHub organization language reporter
//!
//! - Lists an organization's repositories, then fetches every repository's
//!   language breakdown concurrently, printing one JSON line per repository
//!   as each fetch completes (`fanout/`)
//! - Environment configuration in `config`
//! - Optional idle listener on `PORT` in `server/`
//! - `GITHUB_TOKEN` is optional; anonymous requests are rate limited by GitHub

pub mod config;
pub mod fanout;
pub mod report;
pub mod server;
