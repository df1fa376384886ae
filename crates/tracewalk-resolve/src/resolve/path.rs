//! Path expression lexing and scope classification.
//!
//! A path expression is a `.`-separated list of member names, optionally
//! led by one of the six absolute scope prefixes from TSDL's dynamic
//! scope syntax. The lexer only splits; prefix matching happens on the
//! original string and the matched prefix's tokens are skipped later by
//! absolute resolution.

use tracing::debug;
use tracewalk_meta::Scope;

use crate::error::{ErrorKind, ResolveError, Result};

/// Absolute scope prefixes, in scope order, with the number of path
/// tokens each prefix occupies.
pub(crate) const ABSOLUTE_PATH_PREFIXES: [(Scope, &str, usize); 6] = [
    (Scope::PacketHeader, "trace.packet.header.", 3),
    (Scope::PacketContext, "stream.packet.context.", 3),
    (Scope::EventHeader, "stream.event.header.", 3),
    (Scope::EventCommonContext, "stream.event.context.", 3),
    (Scope::EventSpecificContext, "event.context.", 2),
    (Scope::EventPayload, "event.fields.", 2),
];

/// Number of prefix tokens to skip for an absolute path rooted at `scope`.
pub(crate) fn prefix_token_count(scope: Scope) -> usize {
    ABSOLUTE_PATH_PREFIXES[scope as usize].2
}

/// Splits a path expression into its tokens.
///
/// Tokens are the non-empty runs between `.` separators; an empty token
/// (leading, trailing or doubled dot, or an empty expression) is a
/// lexical error.
pub(crate) fn split_path_tokens(pathstr: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut pos = 0usize;
    for token in pathstr.split('.') {
        if token.is_empty() {
            return Err(ResolveError::new(
                ErrorKind::Lexical,
                format!("empty path token: path=`{pathstr}`, pos={pos}"),
            ));
        }
        tokens.push(token.to_owned());
        pos += token.len() + 1;
    }
    Ok(tokens)
}

/// Returns the scope whose absolute prefix starts `pathstr`, or `None`
/// for a relative expression.
pub(crate) fn absolute_scope_of(pathstr: &str) -> Option<Scope> {
    for (scope, prefix, _) in ABSOLUTE_PATH_PREFIXES {
        if pathstr.starts_with(prefix) {
            debug!(path = pathstr, scope = %scope, "found root scope from absolute path");
            return Some(scope);
        }
    }
    None
}
