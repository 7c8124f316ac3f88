use async_trait::async_trait;
use integrify_types::EventContext;
use std::fmt;
use std::sync::Arc;

/// Result of a hook. `Err(message)` aborts the invocation.
pub type HookResult = Result<(), String>;

/// Side-effect callback run around the propagation phase of a rule.
///
/// Rules invoke `pre` hooks before any mutation and `post` hooks after every
/// target has committed. Plain closures implement this trait, so most hooks
/// are written inline:
///
/// ```
/// use integrify_model::{Hook, HookResult};
/// use integrify_types::{DocumentSnapshot, EventContext};
///
/// let hook = |snap: &DocumentSnapshot, _ctx: &EventContext| -> HookResult {
///     println!("deleting references to {}", snap.id());
///     Ok(())
/// };
/// fn assert_hook<H: Hook<DocumentSnapshot>>(_: &H) {}
/// assert_hook(&hook);
/// ```
///
/// Implement the trait directly when the hook needs to await.
#[async_trait]
pub trait Hook<T: Sync + ?Sized>: Send + Sync {
    async fn run(&self, input: &T, ctx: &EventContext) -> HookResult;
}

#[async_trait]
impl<T, F> Hook<T> for F
where
    T: Sync + ?Sized,
    F: Fn(&T, &EventContext) -> HookResult + Send + Sync,
{
    async fn run(&self, input: &T, ctx: &EventContext) -> HookResult {
        self(input, ctx)
    }
}

/// Optional `pre`/`post` hooks of a rule.
pub struct Hooks<T: Sync + ?Sized> {
    pub pre: Option<Arc<dyn Hook<T>>>,
    pub post: Option<Arc<dyn Hook<T>>>,
}

impl<T: Sync + ?Sized> Hooks<T> {
    pub fn with_pre(mut self, hook: impl Hook<T> + 'static) -> Self {
        self.pre = Some(Arc::new(hook));
        self
    }

    pub fn with_post(mut self, hook: impl Hook<T> + 'static) -> Self {
        self.post = Some(Arc::new(hook));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.pre.is_none() && self.post.is_none()
    }
}

impl<T: Sync + ?Sized> Default for Hooks<T> {
    fn default() -> Self {
        Self {
            pre: None,
            post: None,
        }
    }
}

impl<T: Sync + ?Sized> Clone for Hooks<T> {
    fn clone(&self) -> Self {
        Self {
            pre: self.pre.clone(),
            post: self.post.clone(),
        }
    }
}

impl<T: Sync + ?Sized> fmt::Debug for Hooks<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("pre", &self.pre.is_some())
            .field("post", &self.post.is_some())
            .finish()
    }
}

/// Reformats a resolved key before it is used as a path segment,
/// e.g. `|key| format!("updated_{key}")`.
#[derive(Clone)]
pub struct KeyFormatter(Arc<dyn Fn(&str) -> String + Send + Sync>);

impl KeyFormatter {
    pub fn new(f: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn format(&self, key: &str) -> String {
        (self.0)(key)
    }

    /// Borrow as the plain function type the template resolver accepts.
    pub fn as_fn(&self) -> &(dyn Fn(&str) -> String + Send + Sync) {
        self.0.as_ref()
    }
}

impl fmt::Debug for KeyFormatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("KeyFormatter(..)")
    }
}

/// Hooks of a maintain-count rule. Only `pre` exists; it reformats the
/// resolved target key.
#[derive(Debug, Clone, Default)]
pub struct CountHooks {
    pub pre: Option<KeyFormatter>,
}
