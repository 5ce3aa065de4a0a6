//! Handler units: the builder DSL and the dispatch loop.
//!
//! A unit declares per-command match groups; inside a group, match
//! specifications are evaluated in declaration order against every
//! broadcast message. Matching does not short-circuit: every spec in the
//! group gets its chance. Synchronous bodies block evaluation until they
//! return; asynchronous bodies are spawned and evaluation proceeds.

use std::sync::Arc;

use dashmap::DashMap;
use futures_util::FutureExt;
use slircb_proto::Message;
use tokio::sync::oneshot;
use tokio::task::AbortHandle;
use tracing::warn;
use uuid::Uuid;

use super::pattern::{Captures, Pattern, DEFAULT_MATCH_GROUP};
use super::spec::{handler, HandlerFn, MatchSpec, OverridePolicy, Uniqueness, Validator};
use crate::bot::Core;
use crate::context::{origin, Context};
use crate::error::EngineError;

/// A handler unit: a named bundle of compiled match specifications plus
/// the per-unit uniqueness table.
pub struct HandlerUnit {
    /// Unit name, unique within the registry.
    pub name: String,
    pub(crate) specs: Vec<MatchSpec>,
    /// Uniqueness-key → live-task map. The uuid tags a task so completion
    /// cleanup never removes a successor's entry.
    active: DashMap<String, (Uuid, AbortHandle)>,
}

impl HandlerUnit {
    /// Evaluate every matching spec of this unit against one message.
    pub(crate) async fn dispatch(self: &Arc<Self>, core: &Arc<Core>, message: &Arc<Message>) {
        for spec in self.specs.iter().filter(|s| s.command == message.command) {
            if !spec
                .validators
                .iter()
                .all(|v| (v.predicate)(message.as_ref()))
            {
                continue;
            }
            let Some(captures) = spec.pattern.eval(&message.trailing) else {
                continue;
            };
            self.fire(core, spec, message, captures).await;
        }
    }

    async fn fire(
        self: &Arc<Self>,
        core: &Arc<Core>,
        spec: &MatchSpec,
        message: &Arc<Message>,
        captures: Captures,
    ) {
        let key = match spec.uniqueness {
            Uniqueness::None => None,
            Uniqueness::PerChannel => {
                let nick = core.nick.read().await;
                let chan = origin(message, &nick).unwrap_or_default();
                Some(format!("{}:{}", spec.handler_name, chan))
            }
            Uniqueness::PerChannelNick => {
                let nick = core.nick.read().await;
                let chan = origin(message, &nick).unwrap_or_default();
                Some(format!("{}:{}:{}", spec.handler_name, chan, message.user.nick))
            }
        };

        if let Some(ref k) = key {
            match spec.override_policy {
                OverridePolicy::KillExisting => {
                    if let Some((_, (_, prev))) = self.active.remove(k) {
                        prev.abort();
                    }
                }
                OverridePolicy::SkipNew => {
                    if self.active.contains_key(k) {
                        return;
                    }
                }
            }
        }

        let ctx = Context::new(
            Arc::clone(core),
            Arc::clone(message),
            captures,
            self.name.clone(),
        );
        let fut = (spec.handler)(ctx);

        let unit = Arc::clone(self);
        let unit_name = self.name.clone();
        let handler_name = spec.handler_name.clone();
        let tag = Uuid::new_v4();
        let cleanup_key = key.clone();

        // The gate makes the uniqueness-table insert visible before the
        // body starts, so a fast body cannot race its own registration.
        let (gate_tx, gate_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            let _ = gate_rx.await;
            match std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!(unit = %unit_name, handler = %handler_name, error = %e, "handler failed");
                }
                Err(_) => {
                    warn!(unit = %unit_name, handler = %handler_name, "handler panicked");
                }
            }
            if let Some(k) = cleanup_key {
                unit.active.remove_if(&k, |_, (t, _)| *t == tag);
            }
        });

        if let Some(k) = key {
            self.active.insert(k, (tag, handle.abort_handle()));
        }
        let _ = gate_tx.send(());

        if !spec.is_async {
            let _ = handle.await;
        }
    }
}

enum DraftKind {
    Pattern(String),
    Regex { src: String, extract: bool },
    All,
}

struct SpecDraft {
    command: String,
    kind: DraftKind,
    aliases: Vec<String>,
    handler: HandlerFn,
    validators: Vec<Validator>,
    is_async: bool,
    uniqueness: Uniqueness,
    override_policy: OverridePolicy,
    match_group: String,
    doc: Option<String>,
    name: Option<String>,
}

/// Builder for a [`HandlerUnit`].
///
/// ```no_run
/// use slircb::engine::UnitBuilder;
///
/// let mut b = UnitBuilder::new("greeter");
/// b.command("PRIVMSG", |c| {
///     c.handle("!hello :who", |ctx| async move {
///         let who = ctx.captures["who"].clone();
///         ctx.reply(&format!("hello, {who}")).await?;
///         Ok(())
///     })
///     .doc("greet somebody");
/// });
/// let unit = b.build().unwrap();
/// ```
pub struct UnitBuilder {
    name: String,
    drafts: Vec<SpecDraft>,
    seen_commands: Vec<String>,
    duplicate: Option<String>,
}

impl UnitBuilder {
    /// Start building a unit.
    pub fn new(name: impl Into<String>) -> Self {
        UnitBuilder {
            name: name.into(),
            drafts: Vec::new(),
            seen_commands: Vec::new(),
            duplicate: None,
        }
    }

    /// Declare the match group for one IRC command. At most one group per
    /// command; a second declaration fails the build.
    pub fn command(&mut self, command: &str, f: impl FnOnce(&mut CommandScope)) -> &mut Self {
        if self.seen_commands.iter().any(|c| c == command) {
            self.duplicate.get_or_insert_with(|| command.to_string());
            return self;
        }
        self.seen_commands.push(command.to_string());

        let mut scope = CommandScope {
            command: command.to_string(),
            validator_stack: Vec::new(),
            drafts: Vec::new(),
        };
        f(&mut scope);
        self.drafts.extend(scope.drafts);
        self
    }

    /// Compile the match table.
    pub fn build(self) -> Result<HandlerUnit, EngineError> {
        if let Some(command) = self.duplicate {
            return Err(EngineError::DuplicateGroup {
                unit: self.name,
                command,
            });
        }

        let mut specs = Vec::new();
        for draft in self.drafts {
            match &draft.kind {
                DraftKind::Pattern(primary) => {
                    let handler_name =
                        draft.name.clone().unwrap_or_else(|| primary.clone());
                    for raw in std::iter::once(primary).chain(draft.aliases.iter()) {
                        specs.push(MatchSpec {
                            command: draft.command.clone(),
                            pattern: Pattern::compile(raw, &draft.match_group)?,
                            primary: primary.clone(),
                            aliases: draft.aliases.clone(),
                            handler_name: handler_name.clone(),
                            handler: Arc::clone(&draft.handler),
                            validators: draft.validators.clone(),
                            is_async: draft.is_async,
                            uniqueness: draft.uniqueness,
                            override_policy: draft.override_policy,
                            doc: draft.doc.clone(),
                        });
                    }
                }
                DraftKind::Regex { src, extract } => {
                    let re = regex::Regex::new(src).map_err(|source| EngineError::Pattern {
                        pattern: src.clone(),
                        source,
                    })?;
                    specs.push(MatchSpec {
                        command: draft.command.clone(),
                        pattern: Pattern::Regex {
                            re,
                            extract: *extract,
                        },
                        primary: String::new(),
                        aliases: Vec::new(),
                        handler_name: draft.name.clone().unwrap_or_else(|| src.clone()),
                        handler: draft.handler,
                        validators: draft.validators,
                        is_async: draft.is_async,
                        uniqueness: draft.uniqueness,
                        override_policy: draft.override_policy,
                        doc: draft.doc,
                    });
                }
                DraftKind::All => {
                    specs.push(MatchSpec {
                        command: draft.command.clone(),
                        pattern: Pattern::Any,
                        primary: String::new(),
                        aliases: Vec::new(),
                        handler_name: draft
                            .name
                            .clone()
                            .unwrap_or_else(|| format!("{}/*", draft.command)),
                        handler: draft.handler,
                        validators: draft.validators,
                        is_async: draft.is_async,
                        uniqueness: draft.uniqueness,
                        override_policy: draft.override_policy,
                        doc: draft.doc,
                    });
                }
            }
        }

        Ok(HandlerUnit {
            name: self.name,
            specs,
            active: DashMap::new(),
        })
    }
}

/// Scope handed to the closure of [`UnitBuilder::command`].
pub struct CommandScope {
    command: String,
    validator_stack: Vec<Validator>,
    drafts: Vec<SpecDraft>,
}

impl CommandScope {
    /// Append a match specification for a pattern (literal or template).
    pub fn handle<F, Fut>(&mut self, pattern: &str, f: F) -> SpecOptions<'_>
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.push(DraftKind::Pattern(pattern.to_string()), handler(f))
    }

    /// Append a match specification for a raw regular expression over the
    /// trailing. By default a boolean test; call `.extract()` on the
    /// returned options for named-capture extraction.
    pub fn handle_re<F, Fut>(&mut self, regex: &str, f: F) -> SpecOptions<'_>
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.push(
            DraftKind::Regex {
                src: regex.to_string(),
                extract: false,
            },
            handler(f),
        )
    }

    /// Append a match specification that fires on every message of the
    /// group's command.
    pub fn handle_all<F, Fut>(&mut self, f: F) -> SpecOptions<'_>
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.push(DraftKind::All, handler(f))
    }

    /// Require `predicate` to hold for every spec declared inside `f`.
    /// Scopes nest; all enclosing predicates must pass.
    pub fn validate<P>(&mut self, name: &str, predicate: P, f: impl FnOnce(&mut CommandScope))
    where
        P: Fn(&Message) -> bool + Send + Sync + 'static,
    {
        self.validator_stack.push(Validator::new(name, predicate));
        f(self);
        self.validator_stack.pop();
    }

    /// Require every validator in `validators` to hold for the specs
    /// declared inside `f`.
    pub fn validate_list(
        &mut self,
        validators: Vec<Validator>,
        f: impl FnOnce(&mut CommandScope),
    ) {
        let pushed = validators.len();
        self.validator_stack.extend(validators);
        f(self);
        self.validator_stack
            .truncate(self.validator_stack.len() - pushed);
    }

    fn push(&mut self, kind: DraftKind, handler: HandlerFn) -> SpecOptions<'_> {
        self.drafts.push(SpecDraft {
            command: self.command.clone(),
            kind,
            aliases: Vec::new(),
            handler,
            validators: self.validator_stack.clone(),
            is_async: false,
            uniqueness: Uniqueness::None,
            override_policy: OverridePolicy::KillExisting,
            match_group: DEFAULT_MATCH_GROUP.to_string(),
            doc: None,
            name: None,
        });
        SpecOptions {
            draft: self.drafts.last_mut().expect("draft just pushed"),
        }
    }
}

/// Per-spec options, chained off [`CommandScope::handle`] and friends.
pub struct SpecOptions<'a> {
    draft: &'a mut SpecDraft,
}

impl SpecOptions<'_> {
    /// Declare alternate patterns invoking the same body.
    pub fn aliases<I, S>(self, alts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.draft.aliases = alts.into_iter().map(Into::into).collect();
        self
    }

    /// Run the body on its own task; evaluation of later specs proceeds
    /// immediately.
    pub fn asynchronous(self) -> Self {
        self.draft.is_async = true;
        self
    }

    /// Restrict concurrent execution of the body.
    pub fn unique(self, uniqueness: Uniqueness, policy: OverridePolicy) -> Self {
        self.draft.uniqueness = uniqueness;
        self.draft.override_policy = policy;
        self
    }

    /// Override the capture class for untyped `:name` placeholders.
    pub fn match_group(self, class: &str) -> Self {
        self.draft.match_group = class.to_string();
        self
    }

    /// Attach documentation for the help surface.
    pub fn doc(self, text: &str) -> Self {
        self.draft.doc = Some(text.to_string());
        self
    }

    /// Name the body explicitly (defaults to the primary pattern text).
    pub fn named(self, name: &str) -> Self {
        self.draft.name = Some(name.to_string());
        self
    }

    /// For regex specs: extract named captures instead of a boolean test.
    pub fn extract(self) -> Self {
        if let DraftKind::Regex { extract, .. } = &mut self.draft.kind {
            *extract = true;
        }
        self
    }
}
