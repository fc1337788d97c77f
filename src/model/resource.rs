//! Resource identity: where editor content lives, independent of any
//! open editor.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

/// Scheme of local files.
pub const SCHEME_FILE: &str = "file";
/// Scheme of files on a remote host.
pub const SCHEME_REMOTE: &str = "remote";
/// Scheme of the user-data store (settings, keybindings, ...).
pub const SCHEME_USERDATA: &str = "userdata";

/// Location of editor content.
///
/// A thin wrapper over [`Url`] that adds the containment test history
/// maintenance needs: a folder rename must cascade to every resource
/// below the renamed folder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(Url);

impl ResourceId {
    /// Parses a resource from its textual form, e.g. `file:///src/main.rs`.
    pub fn parse(input: &str) -> anyhow::Result<Self> {
        Ok(Self(Url::parse(input)?))
    }

    pub fn from_url(url: Url) -> Self {
        Self(url)
    }

    pub fn scheme(&self) -> &str {
        self.0.scheme()
    }

    pub fn path(&self) -> &str {
        self.0.path()
    }

    pub fn as_url(&self) -> &Url {
        &self.0
    }

    /// True when `self` is `ancestor` itself or lives below it.
    ///
    /// Containment requires the same scheme and authority and a path
    /// prefix that ends on a `/` boundary, so `/foo/bar` does not claim
    /// `/foo/barn/x`.
    pub fn is_equal_or_descendant_of(&self, ancestor: &ResourceId) -> bool {
        if self == ancestor {
            return true;
        }
        if self.0.scheme() != ancestor.0.scheme() || self.0.authority() != ancestor.0.authority() {
            return false;
        }
        let base = ancestor.0.path().trim_end_matches('/');
        let path = self.0.path();
        path.len() > base.len() && path.starts_with(base) && path.as_bytes()[base.len()] == b'/'
    }

    /// Path relative to `root`, without the leading slash, if `self`
    /// lives below `root`.
    pub fn path_relative_to(&self, root: &ResourceId) -> Option<&str> {
        if !self.is_equal_or_descendant_of(root) {
            return None;
        }
        let base = root.0.path().trim_end_matches('/');
        Some(self.0.path()[base.len()..].trim_start_matches('/'))
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
