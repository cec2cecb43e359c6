//! CSP directive vocabulary and the ordered directive set.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::SecurityError;

/// The fixed directive vocabulary. Unknown names are rejected at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Directive {
    DefaultSrc,
    ScriptSrc,
    StyleSrc,
    ImgSrc,
    ConnectSrc,
    FontSrc,
    MediaSrc,
    ObjectSrc,
    FrameSrc,
    ChildSrc,
    WorkerSrc,
    ManifestSrc,
    BaseUri,
    FormAction,
    FrameAncestors,
    UpgradeInsecureRequests,
    BlockAllMixedContent,
    RequireTrustedTypesFor,
    TrustedTypes,
}

impl Directive {
    pub fn as_str(&self) -> &'static str {
        match self {
            Directive::DefaultSrc => "default-src",
            Directive::ScriptSrc => "script-src",
            Directive::StyleSrc => "style-src",
            Directive::ImgSrc => "img-src",
            Directive::ConnectSrc => "connect-src",
            Directive::FontSrc => "font-src",
            Directive::MediaSrc => "media-src",
            Directive::ObjectSrc => "object-src",
            Directive::FrameSrc => "frame-src",
            Directive::ChildSrc => "child-src",
            Directive::WorkerSrc => "worker-src",
            Directive::ManifestSrc => "manifest-src",
            Directive::BaseUri => "base-uri",
            Directive::FormAction => "form-action",
            Directive::FrameAncestors => "frame-ancestors",
            Directive::UpgradeInsecureRequests => "upgrade-insecure-requests",
            Directive::BlockAllMixedContent => "block-all-mixed-content",
            Directive::RequireTrustedTypesFor => "require-trusted-types-for",
            Directive::TrustedTypes => "trusted-types",
        }
    }

    /// Boolean directives are serialized bare, with no source list.
    pub fn is_boolean(&self) -> bool {
        matches!(
            self,
            Directive::UpgradeInsecureRequests | Directive::BlockAllMixedContent
        )
    }

    /// Directives that receive the `'nonce-…'` source expression.
    pub fn is_nonce_aware(&self) -> bool {
        matches!(self, Directive::ScriptSrc | Directive::StyleSrc)
    }

    pub const ALL: [Directive; 19] = [
        Directive::DefaultSrc,
        Directive::ScriptSrc,
        Directive::StyleSrc,
        Directive::ImgSrc,
        Directive::ConnectSrc,
        Directive::FontSrc,
        Directive::MediaSrc,
        Directive::ObjectSrc,
        Directive::FrameSrc,
        Directive::ChildSrc,
        Directive::WorkerSrc,
        Directive::ManifestSrc,
        Directive::BaseUri,
        Directive::FormAction,
        Directive::FrameAncestors,
        Directive::UpgradeInsecureRequests,
        Directive::BlockAllMixedContent,
        Directive::RequireTrustedTypesFor,
        Directive::TrustedTypes,
    ];
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Directive {
    type Err = SecurityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Directive::ALL
            .iter()
            .find(|d| d.as_str() == s)
            .copied()
            .ok_or_else(|| SecurityError::Configuration(format!("unknown CSP directive: {s}")))
    }
}

/// Mapping from directives to ordered, de-duplicated source lists.
///
/// Insertion order of first appearance is preserved for both directives and
/// sources, so serialization is deterministic.
#[derive(Debug, Clone, Default)]
pub struct DirectiveSet {
    entries: Vec<(Directive, Vec<String>)>,
}

impl DirectiveSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Union `sources` into the directive's list, preserving first-seen
    /// order and dropping duplicates. Never replaces existing sources.
    pub fn union(&mut self, directive: Directive, sources: &[&str]) {
        let idx = match self.entries.iter().position(|(d, _)| *d == directive) {
            Some(idx) => idx,
            None => {
                self.entries.push((directive, Vec::new()));
                self.entries.len() - 1
            }
        };
        let list = &mut self.entries[idx].1;
        for source in sources {
            if !list.iter().any(|existing| existing == source) {
                list.push(source.to_string());
            }
        }
    }

    /// Merge a whole overlay into this set.
    pub fn merge(&mut self, overlay: &[(Directive, &[&str])]) {
        for (directive, sources) in overlay {
            self.union(*directive, sources);
        }
    }

    pub fn get(&self, directive: Directive) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(d, _)| *d == directive)
            .map(|(_, list)| list.as_slice())
    }

    pub fn contains(&self, directive: Directive) -> bool {
        self.entries.iter().any(|(d, _)| *d == directive)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Directive, &[String])> {
        self.entries.iter().map(|(d, list)| (*d, list.as_slice()))
    }

    /// Serialize as `name v1 v2; name2 v1; …` with booleans emitted bare and
    /// the `{nonce}` placeholder interpolated.
    pub fn serialize(&self, nonce: &str) -> String {
        let nonce_source = format!("'nonce-{nonce}'");
        self.entries
            .iter()
            .map(|(directive, sources)| {
                if directive.is_boolean() || sources.is_empty() {
                    directive.as_str().to_string()
                } else {
                    let rendered: Vec<String> = sources
                        .iter()
                        .map(|s| {
                            if s == "{nonce}" {
                                nonce_source.clone()
                            } else {
                                s.clone()
                            }
                        })
                        .collect();
                    format!("{} {}", directive, rendered.join(" "))
                }
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_deduplicates_preserving_order() {
        let mut set = DirectiveSet::new();
        set.union(Directive::ScriptSrc, &["'self'", "https://a.example.com"]);
        set.union(Directive::ScriptSrc, &["https://a.example.com", "https://b.example.com"]);
        assert_eq!(
            set.get(Directive::ScriptSrc).unwrap(),
            &["'self'", "https://a.example.com", "https://b.example.com"]
        );
    }

    #[test]
    fn test_serialization_is_stable() {
        let mut set = DirectiveSet::new();
        set.union(Directive::DefaultSrc, &["'self'"]);
        set.union(Directive::ScriptSrc, &["'self'", "{nonce}"]);
        set.union(Directive::UpgradeInsecureRequests, &[]);
        let first = set.serialize("abc123");
        assert_eq!(
            first,
            "default-src 'self'; script-src 'self' 'nonce-abc123'; upgrade-insecure-requests"
        );
        assert_eq!(first, set.serialize("abc123"));
    }

    #[test]
    fn test_unknown_directive_rejected() {
        assert!("default-src".parse::<Directive>().is_ok());
        assert!("evil-src".parse::<Directive>().is_err());
    }

    #[test]
    fn test_boolean_directives() {
        assert!(Directive::UpgradeInsecureRequests.is_boolean());
        assert!(!Directive::ScriptSrc.is_boolean());
    }
}
