//! Compiled match specifications.
//!
//! A [`MatchSpec`] is one row in a unit's match table: command filter,
//! compiled pattern, handler body, and options. The builder in
//! [`super::unit`] produces these; the dispatch loop evaluates them.

use std::sync::Arc;

use futures_util::future::BoxFuture;
use slircb_proto::Message;

use super::pattern::Pattern;
use crate::context::Context;

/// A handler body: an async function over a [`Context`].
pub type HandlerFn = Arc<dyn Fn(Context) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// Wrap an async closure as a [`HandlerFn`].
pub fn handler<F, Fut>(f: F) -> HandlerFn
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(move |ctx| Box::pin(f(ctx)))
}

/// A named predicate guarding a scope inside a match group.
#[derive(Clone)]
pub struct Validator {
    /// Name, for logs and diagnostics.
    pub name: String,
    /// The predicate itself.
    pub predicate: Arc<dyn Fn(&Message) -> bool + Send + Sync>,
}

impl Validator {
    /// Create a validator from a name and predicate.
    pub fn new<P>(name: impl Into<String>, predicate: P) -> Self
    where
        P: Fn(&Message) -> bool + Send + Sync + 'static,
    {
        Validator {
            name: name.into(),
            predicate: Arc::new(predicate),
        }
    }
}

impl std::fmt::Debug for Validator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Validator").field("name", &self.name).finish()
    }
}

/// Concurrency restriction for a match specification's body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Uniqueness {
    /// No restriction.
    #[default]
    None,
    /// At most one live body per originating channel.
    PerChannel,
    /// At most one live body per originating channel and nick.
    PerChannelNick,
}

/// What to do when a uniqueness key already has a live body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OverridePolicy {
    /// Cancel the existing body and run the new one.
    #[default]
    KillExisting,
    /// Leave the existing body alone and drop the new firing.
    SkipNew,
}

/// One compiled row in a unit's match table.
#[derive(Clone)]
pub struct MatchSpec {
    /// The IRC command that triggers this spec.
    pub command: String,
    /// The compiled pattern.
    pub pattern: Pattern,
    /// Raw text of the primary pattern (help surface, uniqueness identity).
    pub primary: String,
    /// Alternate pattern texts invoking the same body.
    pub aliases: Vec<String>,
    /// Identity of the body, used in uniqueness keys and logs.
    pub handler_name: String,
    /// The body to invoke on match.
    pub handler: HandlerFn,
    /// Enclosing validator scopes, outermost first; all must pass.
    pub validators: Vec<Validator>,
    /// Whether the body runs on its own task without blocking evaluation.
    pub is_async: bool,
    /// Concurrency restriction.
    pub uniqueness: Uniqueness,
    /// Policy when the uniqueness key is already live.
    pub override_policy: OverridePolicy,
    /// Documentation for the help surface.
    pub doc: Option<String>,
}

impl std::fmt::Debug for MatchSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchSpec")
            .field("command", &self.command)
            .field("primary", &self.primary)
            .field("handler_name", &self.handler_name)
            .field("is_async", &self.is_async)
            .field("uniqueness", &self.uniqueness)
            .finish()
    }
}
