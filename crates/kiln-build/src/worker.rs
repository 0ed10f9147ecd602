//! Worker source generation.
//!
//! When `build.worker` is false the entry only exports a handler, and kiln
//! wraps it in the event listener for the target event. Either way, top-level
//! imports and requires are hoisted so injected code can precede the source.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::context::WorkerEvent;
use crate::error::{BuildError, Result};

const ENTRY_BINDING: &str = "__kiln_entry__";

static IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| literal(r#"import\s+.*?from\s*['"](.*?)['"];?"#));
static REQUIRE_RE: LazyLock<Regex> = LazyLock::new(|| literal(r"(const\s+.*?=\s*require\(.*\).*);"));
static DEFAULT_EXPORT_RE: LazyLock<Regex> = LazyLock::new(|| literal(r"(?m)^\s*export\s+default\s+"));
static FETCH_LISTENER_RE: LazyLock<Regex> =
    LazyLock::new(|| literal(r#"addEventListener\((?:'fetch'|"fetch"|fetch),"#));
static FIREWALL_LISTENER_RE: LazyLock<Regex> =
    LazyLock::new(|| literal(r#"addEventListener\((?:'firewall'|"firewall"|firewall),"#));

// Only ever called with the constant patterns above.
fn literal(pattern: &str) -> Regex {
    Regex::new(pattern).expect("constant pattern is valid")
}

/// Wrap an exported handler in the listener for `event`.
///
/// The handler is the default export (a function, or an object with a
/// method named after the event) or a named `export function <event>`.
pub fn wrap_handler(source: &str, event: WorkerEvent) -> Result<String> {
    let (body, handler) = bind_handler(source, event)?;
    let invoke = "return handler(event);";
    let template = match event {
        WorkerEvent::Fetch => format!(
            "addEventListener('fetch', (event) => {{ event.respondWith((async function(event) {{\n  {handler}\n  {invoke}\n}})(event));}});"
        ),
        WorkerEvent::Firewall => format!(
            "addEventListener('firewall', (event) => {{\n  (async function(event) {{\n  {handler}\n  {invoke}\n}})(event);\n}});"
        ),
    };
    Ok(format!("{body}\n\n{template}\n"))
}

fn bind_handler(source: &str, event: WorkerEvent) -> Result<(String, String)> {
    if DEFAULT_EXPORT_RE.is_match(source) {
        let body = DEFAULT_EXPORT_RE
            .replace(source, format!("const {ENTRY_BINDING} = "))
            .into_owned();
        let handler = format!(
            "const handler = typeof {ENTRY_BINDING} === 'function' ? {ENTRY_BINDING} : {ENTRY_BINDING}.{event};"
        );
        return Ok((body, handler));
    }

    let named = format!("export async function {event}(");
    let named_sync = format!("export function {event}(");
    for prefix in [named, named_sync] {
        if source.contains(&prefix) {
            let body = source.replacen(&prefix, &prefix["export ".len()..], 1);
            return Ok((body, format!("const handler = {event};")));
        }
    }

    Err(BuildError::InvalidEntry {
        path: PathBuf::from("<entry>"),
        reason: format!(
            "no handler found for the {event} event; export a default handler or set build.worker to true"
        ),
    })
}

/// Move every import and top-level require to the head of the file, in order.
pub fn relocate_imports(code: &str) -> String {
    let mut hoisted = Vec::new();
    let mut rest = code.to_string();

    for re in [&*IMPORT_RE, &*REQUIRE_RE] {
        let found: Vec<String> = re.find_iter(&rest).map(|m| m.as_str().to_string()).collect();
        if found.is_empty() {
            continue;
        }
        rest = re.replace_all(&rest, "").into_owned();
        hoisted.extend(found);
    }

    if hoisted.is_empty() {
        return code.to_string();
    }
    format!("{}\n{}", hoisted.join("\n"), rest)
}

/// Whether `code` registers a listener for `event`.
pub fn detect_event_listener(code: &str, event: WorkerEvent) -> bool {
    let re = match event {
        WorkerEvent::Fetch => &*FETCH_LISTENER_RE,
        WorkerEvent::Firewall => &*FIREWALL_LISTENER_RE,
    };
    re.is_match(code)
}

/// Assemble the final worker source from injected code and the entry.
pub fn assemble(source: &str, injection: &str, worker: bool, event: WorkerEvent, entry: Option<&Path>) -> Result<String> {
    let code = if worker {
        source.to_string()
    } else {
        wrap_handler(source, event).map_err(|err| match (err, entry) {
            (BuildError::InvalidEntry { reason, .. }, Some(path)) => BuildError::InvalidEntry {
                path: path.to_path_buf(),
                reason,
            },
            (err, _) => err,
        })?
    };

    if event == WorkerEvent::Fetch && detect_event_listener(&code, WorkerEvent::Firewall) {
        return Err(BuildError::InvalidEntry {
            path: entry.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("<entry>")),
            reason: "the entry registers a firewall listener but the firewall is not enabled; build with --firewall"
                .to_string(),
        });
    }

    let combined = if injection.is_empty() {
        code
    } else {
        format!("{injection}\n{code}")
    };
    Ok(relocate_imports(&combined))
}
