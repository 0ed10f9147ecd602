//! The rule action vocabulary.
//!
//! One enum drives legacy migration, compile-time validation and the
//! platform rules strategy, so the three can never disagree about which
//! actions exist or where they are allowed.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Rule list a behavior runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Request,
    Response,
}

impl Phase {
    pub const ALL: [Phase; 2] = [Phase::Request, Phase::Response];

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Request => "request",
            Phase::Response => "response",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BehaviorKind {
    SetOrigin,
    Rewrite,
    SetHeaders,
    SetCookie,
    RunFunction,
    Deliver,
    RedirectTo301,
    RedirectTo302,
    BypassCache,
    ForwardCookies,
    Capture,
    EnableGzip,
    FilterHeader,
    FilterCookie,
    SetCache,
    HttpToHttps,
}

impl BehaviorKind {
    pub const ALL: [BehaviorKind; 16] = [
        BehaviorKind::SetOrigin,
        BehaviorKind::Rewrite,
        BehaviorKind::SetHeaders,
        BehaviorKind::SetCookie,
        BehaviorKind::RunFunction,
        BehaviorKind::Deliver,
        BehaviorKind::RedirectTo301,
        BehaviorKind::RedirectTo302,
        BehaviorKind::BypassCache,
        BehaviorKind::ForwardCookies,
        BehaviorKind::Capture,
        BehaviorKind::EnableGzip,
        BehaviorKind::FilterHeader,
        BehaviorKind::FilterCookie,
        BehaviorKind::SetCache,
        BehaviorKind::HttpToHttps,
    ];

    /// Configuration key for this behavior.
    pub fn key(self) -> &'static str {
        match self {
            BehaviorKind::SetOrigin => "setOrigin",
            BehaviorKind::Rewrite => "rewrite",
            BehaviorKind::SetHeaders => "setHeaders",
            BehaviorKind::SetCookie => "setCookie",
            BehaviorKind::RunFunction => "runFunction",
            BehaviorKind::Deliver => "deliver",
            BehaviorKind::RedirectTo301 => "redirectTo301",
            BehaviorKind::RedirectTo302 => "redirectTo302",
            BehaviorKind::BypassCache => "bypassCache",
            BehaviorKind::ForwardCookies => "forwardCookies",
            BehaviorKind::Capture => "capture",
            BehaviorKind::EnableGzip => "enableGZIP",
            BehaviorKind::FilterHeader => "filterHeader",
            BehaviorKind::FilterCookie => "filterCookie",
            BehaviorKind::SetCache => "setCache",
            BehaviorKind::HttpToHttps => "httpToHttps",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.key() == key)
    }

    pub fn valid_in(self, phase: Phase) -> bool {
        use BehaviorKind::*;
        match phase {
            Phase::Request => !matches!(self, EnableGzip | FilterHeader | FilterCookie),
            Phase::Response => matches!(
                self,
                EnableGzip
                    | Capture
                    | SetCookie
                    | SetHeaders
                    | FilterHeader
                    | FilterCookie
                    | RunFunction
                    | RedirectTo301
                    | RedirectTo302
                    | Deliver
            ),
        }
    }

    /// Look up `key` and accept it only if it is allowed in `phase`.
    pub fn for_phase(key: &str, phase: Phase) -> Option<Self> {
        Self::from_key(key).filter(|kind| kind.valid_in(phase))
    }
}

impl fmt::Display for BehaviorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
