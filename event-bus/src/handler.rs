//! 事件处理器（EventHandler）
//!
//! 定义处理器的名称（稳定身份）与处理逻辑，以及注册表内部持有的处理器记录。
//! 名称由调用方显式给出，注册表仅以名称在同一事件内去重、查找与移除。
//!
use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// 事件处理器：处理某一事件触发时传入的参数
#[async_trait]
pub trait EventHandler<A>: Send + Sync {
    /// 处理器名称（同一事件内唯一，用于去重、选择性触发与移除）
    fn handler_name(&self) -> &str;

    /// 处理事件
    async fn handle(&self, args: &A) -> anyhow::Result<()>;
}

/// 处理器的执行方式
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DispatchMode {
    /// 在触发方的任务中同步（顺序）执行
    #[default]
    CallerContext,
    /// 以独立的 tokio 任务执行，触发方不等待
    Spawned,
}

impl DispatchMode {
    pub fn runs_in_caller_context(self) -> bool {
        matches!(self, Self::CallerContext)
    }
}

impl fmt::Display for DispatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CallerContext => f.write_str("caller_context"),
            Self::Spawned => f.write_str("spawned"),
        }
    }
}

/// 注册表中的处理器记录
///
/// 名称在注册时读取一次并保存，之后的查找不再调用处理器。
pub struct HandlerRecord<A> {
    name: String,
    handler: Arc<dyn EventHandler<A>>,
    mode: DispatchMode,
}

impl<A> HandlerRecord<A> {
    pub(crate) fn new(handler: Arc<dyn EventHandler<A>>, mode: DispatchMode) -> Self {
        Self {
            name: handler.handler_name().to_owned(),
            handler,
            mode,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> DispatchMode {
        self.mode
    }

    pub fn handler(&self) -> &Arc<dyn EventHandler<A>> {
        &self.handler
    }
}

impl<A> Clone for HandlerRecord<A> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            handler: self.handler.clone(),
            mode: self.mode,
        }
    }
}

impl<A> fmt::Debug for HandlerRecord<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRecord")
            .field("name", &self.name())
            .field("mode", &self.mode)
            .finish()
    }
}

/// 基于同步闭包的处理器，见 [`handler_fn`]
pub struct FnHandler<F> {
    name: String,
    f: F,
}

/// 以名称包装一个同步闭包：`|args: &A| -> anyhow::Result<()>`
pub fn handler_fn<A, F>(name: impl Into<String>, f: F) -> FnHandler<F>
where
    A: Send + Sync + 'static,
    F: Fn(&A) -> anyhow::Result<()> + Send + Sync + 'static,
{
    FnHandler {
        name: name.into(),
        f,
    }
}

#[async_trait]
impl<A, F> EventHandler<A> for FnHandler<F>
where
    A: Send + Sync + 'static,
    F: Fn(&A) -> anyhow::Result<()> + Send + Sync + 'static,
{
    fn handler_name(&self) -> &str {
        &self.name
    }

    async fn handle(&self, args: &A) -> anyhow::Result<()> {
        (self.f)(args)
    }
}

/// 基于异步闭包的处理器，见 [`async_handler_fn`]
pub struct AsyncFnHandler<F> {
    name: String,
    f: F,
}

/// 以名称包装一个异步闭包：`|args: A| async move { ... }`
///
/// 闭包拿到参数的克隆，因此要求 `A: Clone`。
pub fn async_handler_fn<A, F, Fut>(name: impl Into<String>, f: F) -> AsyncFnHandler<F>
where
    A: Clone + Send + Sync + 'static,
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    AsyncFnHandler {
        name: name.into(),
        f,
    }
}

#[async_trait]
impl<A, F, Fut> EventHandler<A> for AsyncFnHandler<F>
where
    A: Clone + Send + Sync + 'static,
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    fn handler_name(&self) -> &str {
        &self.name
    }

    async fn handle(&self, args: &A) -> anyhow::Result<()> {
        (self.f)(args.clone()).await
    }
}

/// `emit_only` 的处理器名称选择：单个名称或一组名称
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HandlerSelection(Vec<String>);

impl HandlerSelection {
    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|n| n == name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }
}

impl From<&str> for HandlerSelection {
    fn from(name: &str) -> Self {
        Self(vec![name.to_owned()])
    }
}

impl From<String> for HandlerSelection {
    fn from(name: String) -> Self {
        Self(vec![name])
    }
}

impl From<Vec<String>> for HandlerSelection {
    fn from(names: Vec<String>) -> Self {
        Self(names)
    }
}

impl From<Vec<&str>> for HandlerSelection {
    fn from(names: Vec<&str>) -> Self {
        names.as_slice().into()
    }
}

impl From<&[&str]> for HandlerSelection {
    fn from(names: &[&str]) -> Self {
        Self(names.iter().map(|n| (*n).to_owned()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for HandlerSelection {
    fn from(names: [&str; N]) -> Self {
        names.as_slice().into()
    }
}

impl From<&[String]> for HandlerSelection {
    fn from(names: &[String]) -> Self {
        Self(names.to_vec())
    }
}

impl<const N: usize> From<[String; N]> for HandlerSelection {
    fn from(names: [String; N]) -> Self {
        Self(names.into())
    }
}

impl FromIterator<String> for HandlerSelection {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn fn_handler_runs_closure_with_args() {
        let seen = Arc::new(AtomicUsize::new(0));
        let h = {
            let seen = seen.clone();
            handler_fn("add", move |n: &usize| {
                seen.fetch_add(*n, Ordering::SeqCst);
                Ok(())
            })
        };

        assert_eq!(h.handler_name(), "add");
        h.handle(&5usize).await.unwrap();
        h.handle(&2usize).await.unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 7);
    }

    #[tokio::test]
    async fn async_fn_handler_receives_cloned_args() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let h = {
            let seen = seen.clone();
            async_handler_fn("push", move |s: String| {
                let seen = seen.clone();
                async move {
                    seen.lock().unwrap().push(s);
                    Ok(())
                }
            })
        };

        h.handle(&"a".to_string()).await.unwrap();
        assert_eq!(*seen.lock().unwrap(), vec!["a".to_string()]);
    }

    #[test]
    fn selection_from_single_name_and_collections() {
        let one: HandlerSelection = "a".into();
        assert!(one.contains("a"));
        assert!(!one.contains("b"));

        let many: HandlerSelection = ["a", "b"].into();
        assert_eq!(many.names(), ["a".to_string(), "b".to_string()]);

        let owned: HandlerSelection = vec!["c".to_string()].into();
        assert!(owned.contains("c"));

        let existing = vec!["d".to_string(), "e".to_string()];
        let borrowed: HandlerSelection = (&existing[..]).into();
        assert_eq!(borrowed.names(), existing.as_slice());

        let array: HandlerSelection = ["f".to_string()].into();
        assert!(array.contains("f"));
        assert!(HandlerSelection::default().is_empty());
    }

    #[test]
    fn default_mode_is_caller_context() {
        assert!(DispatchMode::default().runs_in_caller_context());
        assert!(!DispatchMode::Spawned.runs_in_caller_context());
        assert_eq!(DispatchMode::Spawned.to_string(), "spawned");
    }
}
