//! Help surface synthesis.
//!
//! When a help command is configured, every registered unit gets two extra
//! match specifications: the bare help command lists the unit's canonical
//! command strings, and the help command followed by a search term emits
//! documentation for the command whose primary pattern starts with that
//! exact token. Replies go as private NOTICEs to the asker.

use std::sync::Arc;

use super::pattern::{Pattern, DEFAULT_MATCH_GROUP};
use super::spec::{handler, MatchSpec, OverridePolicy, Uniqueness};
use super::unit::HandlerUnit;
use crate::error::EngineError;

#[derive(Debug, Clone)]
struct HelpEntry {
    primary: String,
    aliases: Vec<String>,
    doc: Option<String>,
}

/// Render a pattern for display: `:x` becomes `<x>`, `~x` becomes `<x...>`.
fn render_pattern(raw: &str) -> String {
    raw.split(' ')
        .filter(|t| !t.is_empty())
        .map(|token| {
            if let Some(spec) = token.strip_prefix(':') {
                let name = spec.split_once('(').map(|(n, _)| n).unwrap_or(spec);
                format!("<{name}>")
            } else if let Some(name) = token.strip_prefix('~') {
                format!("<{name}...>")
            } else {
                token.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn render_entry(entry: &HelpEntry) -> String {
    let mut line = render_pattern(&entry.primary);
    if let Some(doc) = &entry.doc {
        line.push_str(": ");
        line.push_str(doc);
    }
    if !entry.aliases.is_empty() {
        line.push_str(&format!(" (aliases: {})", entry.aliases.join(", ")));
    }
    line
}

/// Synthesize the two help specs for a unit.
pub(crate) fn synthesize(
    unit: &HandlerUnit,
    help_cmd: &str,
) -> Result<Vec<MatchSpec>, EngineError> {
    // One entry per handler body: alias expansion produced one spec per
    // pattern, all sharing the primary.
    let mut entries: Vec<HelpEntry> = Vec::new();
    for spec in unit.specs.iter().filter(|s| !s.primary.is_empty()) {
        if entries.iter().any(|e| e.primary == spec.primary) {
            continue;
        }
        entries.push(HelpEntry {
            primary: spec.primary.clone(),
            aliases: spec.aliases.clone(),
            doc: spec.doc.clone(),
        });
    }
    if entries.is_empty() {
        return Ok(Vec::new());
    }

    let entries = Arc::new(entries);
    let mut specs = Vec::new();

    let list_entries = Arc::clone(&entries);
    let list_handler = handler(move |ctx| {
        let entries = Arc::clone(&list_entries);
        async move {
            let commands: Vec<&str> = entries
                .iter()
                .filter_map(|e| e.primary.split(' ').next())
                .collect();
            ctx.reply_priv_notice(&format!("commands: {}", commands.join(", ")))
                .await?;
            Ok(())
        }
    });
    specs.push(MatchSpec {
        command: "PRIVMSG".to_string(),
        pattern: Pattern::Literal(help_cmd.to_string()),
        primary: String::new(),
        aliases: Vec::new(),
        handler_name: format!("{}/list", unit.name),
        handler: list_handler,
        validators: Vec::new(),
        is_async: false,
        uniqueness: Uniqueness::None,
        override_policy: OverridePolicy::KillExisting,
        doc: None,
    });

    let search_entries = Arc::clone(&entries);
    let search_handler = handler(move |ctx| {
        let entries = Arc::clone(&search_entries);
        async move {
            let term = ctx.captures.get("term").cloned().unwrap_or_default();
            let hit = entries
                .iter()
                .find(|e| e.primary.split(' ').next() == Some(term.as_str()));
            if let Some(entry) = hit {
                ctx.reply_priv_notice(&render_entry(entry)).await?;
            }
            Ok(())
        }
    });
    let search_pattern = format!("{help_cmd} ~term");
    specs.push(MatchSpec {
        command: "PRIVMSG".to_string(),
        pattern: Pattern::compile(&search_pattern, DEFAULT_MATCH_GROUP)?,
        primary: String::new(),
        aliases: Vec::new(),
        handler_name: format!("{}/search", unit.name),
        handler: search_handler,
        validators: Vec::new(),
        is_async: false,
        uniqueness: Uniqueness::None,
        override_policy: OverridePolicy::KillExisting,
        doc: None,
    });

    Ok(specs)
}
