//! Post-processing hooks run on every translated fragment.

use std::fmt;
use std::sync::Arc;

use crate::language::TRADITIONAL_CHINESE;
use crate::record::TextRecord;

/// What a hook knows about the fragment it transforms
#[derive(Clone, Copy)]
pub struct HookContext<'a> {
    /// Current source language display name
    pub source: &'a str,
    /// Current target language display name
    pub target: &'a str,
    /// Record the fragment will be written to, when translating records
    pub record: Option<&'a dyn TextRecord>,
}

impl fmt::Debug for HookContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookContext")
            .field("source", &self.source)
            .field("target", &self.target)
            .field("record", &self.record.map(|r| r.text()))
            .finish()
    }
}

/// Plain function hook
pub type HookFn = fn(&str, &HookContext<'_>) -> String;

/// Identity used to deduplicate hooks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookId(usize);

/// A post-processing callback with a stable identity.
///
/// Clones share identity, so registering a clone of a registered hook is a no-op.
#[derive(Clone)]
pub struct Hook {
    id: HookId,
    func: Arc<dyn Fn(&str, &HookContext<'_>) -> String + Send + Sync>,
}

impl Hook {
    /// Wrap a closure; identity is the allocation, so only clones compare equal.
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&str, &HookContext<'_>) -> String + Send + Sync + 'static,
    {
        let func: Arc<dyn Fn(&str, &HookContext<'_>) -> String + Send + Sync> = Arc::new(func);
        let id = HookId(Arc::as_ptr(&func).cast::<()>() as usize);
        Self { id, func }
    }

    /// Wrap a function; identity is the function address.
    pub fn from_fn(func: HookFn) -> Self {
        Self {
            id: HookId(func as usize),
            func: Arc::new(func),
        }
    }

    pub const fn id(&self) -> HookId {
        self.id
    }

    pub fn call(&self, text: &str, ctx: &HookContext<'_>) -> String {
        (self.func)(text, ctx)
    }
}

impl From<HookFn> for Hook {
    fn from(func: HookFn) -> Self {
        Self::from_fn(func)
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Hook").field(&self.id).finish()
    }
}

/// Insertion-ordered hooks, deduplicated by [`HookId`]
#[derive(Debug, Clone, Default)]
pub struct HookSet {
    hooks: Vec<Hook>,
}

impl HookSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a hook; returns false if one with the same identity is already present.
    pub fn insert(&mut self, hook: Hook) -> bool {
        if self.contains(hook.id()) {
            return false;
        }
        self.hooks.push(hook);
        true
    }

    /// Add several hooks. Passing `None` adds nothing.
    pub fn extend<I>(&mut self, hooks: I)
    where
        I: IntoIterator,
        I::Item: Into<Hook>,
    {
        for hook in hooks {
            self.insert(hook.into());
        }
    }

    pub fn contains(&self, id: HookId) -> bool {
        self.hooks.iter().any(|h| h.id() == id)
    }

    /// Run every hook in insertion order, each on the previous one's output
    pub fn apply(&self, text: String, ctx: &HookContext<'_>) -> String {
        self.hooks.iter().fold(text, |acc, hook| hook.call(&acc, ctx))
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

/// Simplified to traditional Chinese, only when targeting traditional Chinese
pub fn chs_to_cht(text: &str, ctx: &HookContext<'_>) -> String {
    if ctx.target == TRADITIONAL_CHINESE {
        zhconv::zhconv(text, zhconv::Variant::ZhHant)
    } else {
        text.to_string()
    }
}
