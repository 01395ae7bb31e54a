//! 执行后触发（EmitAfter）
//!
//! 包装一个函数：先执行函数本身并原样返回其结果，再触发指定事件。
//! 被包装函数无需感知总线，函数的参数与返回值都不会传给处理器，
//! 事件以 `A::default()` 触发。
//!
use crate::error::BusResult;
use crate::registry::EventRegistry;
use std::future::Future;
use std::sync::Arc;

/// 由 [`EventRegistry::emit_after`] 创建的包装函数
pub struct EmitAfter<A, F> {
    registry: Arc<EventRegistry<A>>,
    event: String,
    func: F,
}

impl<A, F> EmitAfter<A, F> {
    pub(crate) fn new(registry: Arc<EventRegistry<A>>, event: impl Into<String>, func: F) -> Self {
        Self {
            registry,
            event: event.into(),
            func,
        }
    }

    pub fn event(&self) -> &str {
        &self.event
    }
}

impl<A, F> EmitAfter<A, F>
where
    A: Default + Send + Sync + 'static,
{
    /// 调用被包装的异步函数，结束后触发事件
    ///
    /// 事件中的同步处理器失败时返回该错误，函数本身已经执行，其返回值被丢弃；
    /// 需要保留返回值时，直接调用函数后再自行 `emit`。
    pub async fn call<I, Fut, T>(&self, input: I) -> BusResult<T>
    where
        F: Fn(I) -> Fut,
        Fut: Future<Output = T>,
    {
        let out = (self.func)(input).await;
        self.notify().await?;
        Ok(out)
    }

    /// 调用被包装的同步函数，结束后触发事件
    ///
    /// 事件中的同步处理器失败时返回该错误，函数本身已经执行，其返回值被丢弃；
    /// 需要保留返回值时，直接调用函数后再自行 `emit`。
    pub async fn invoke<I, T>(&self, input: I) -> BusResult<T>
    where
        F: Fn(I) -> T,
    {
        let out = (self.func)(input);
        self.notify().await?;
        Ok(out)
    }

    async fn notify(&self) -> BusResult<()> {
        // 后台处理器不等待
        let _detached = self.registry.emit(&self.event, A::default()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::handler_fn;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn call_returns_result_then_notifies() {
        let bus = Arc::new(EventRegistry::<()>::new());
        let hits = Arc::new(AtomicUsize::new(0));
        {
            let hits = hits.clone();
            bus.register(
                "saved",
                handler_fn("audit", move |_: &()| {
                    hits.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }),
            );
        }

        let save = bus.emit_after("saved", |n: u32| async move { n * 2 });
        assert_eq!(save.event(), "saved");
        assert_eq!(save.call(21).await.unwrap(), 42);
        assert_eq!(save.call(1).await.unwrap(), 2);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn handler_failure_surfaces_from_wrapper() {
        let bus = Arc::new(EventRegistry::<()>::new());
        bus.register(
            "saved",
            handler_fn("broken", |_: &()| Err(anyhow::anyhow!("nope"))),
        );

        let ran = AtomicUsize::new(0);
        let save = bus.emit_after("saved", |()| {
            ran.fetch_add(1, Ordering::SeqCst);
        });

        let err = save.invoke(()).await.unwrap_err();
        assert_eq!(err.handler_name(), "broken");
        // 函数本身已经执行
        assert_eq!(ran.load(Ordering::SeqCst), 1);

        let async_save = bus.emit_after("saved", |n: u32| {
            ran.fetch_add(1, Ordering::SeqCst);
            async move { n }
        });
        let err = async_save.call(7).await.unwrap_err();
        assert!(matches!(err, crate::error::BusError::Handler { .. }));
        assert_eq!(ran.load(Ordering::SeqCst), 2);
    }
}
