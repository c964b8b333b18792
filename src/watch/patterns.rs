// src/watch/patterns.rs

use std::fmt;

use anyhow::{bail, Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

/// Compiled glob patterns for a watch session.
///
/// The patterns are assumed to be relative to the watch root directory. The
/// watcher passes relative paths (e.g. `"src/main.rs"`) into `matches`.
#[derive(Clone)]
pub struct WatchProfile {
    include: GlobSet,
    pattern_count: usize,
}

impl fmt::Debug for WatchProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchProfile")
            .field("pattern_count", &self.pattern_count)
            .finish_non_exhaustive()
    }
}

impl WatchProfile {
    /// Compile the CLI glob patterns into a matcher.
    ///
    /// An invalid pattern is a configuration error: the session must not
    /// start, so this fails instead of watching a subset.
    pub fn build(patterns: &[String]) -> Result<Self> {
        if patterns.is_empty() {
            bail!("at least one watch pattern is required");
        }

        let mut builder = GlobSetBuilder::new();
        for pat in patterns {
            let glob = Glob::new(pat)
                .with_context(|| format!("invalid glob pattern: {pat}"))?;
            builder.add(glob);
        }

        Ok(Self {
            include: builder.build()?,
            pattern_count: patterns.len(),
        })
    }

    /// Returns true if the session is interested in the given path
    /// (relative to the watch root), e.g. `"src/foo/bar.rs"`.
    pub fn matches(&self, rel_path: &str) -> bool {
        self.include.is_match(rel_path)
    }

    /// Number of patterns this profile was built from.
    pub fn pattern_count(&self) -> usize {
        self.pattern_count
    }
}
