//! 事件注册表（EventRegistry）
//!
//! 以事件名为键、按注册顺序保存处理器记录：
//! - `register`：同一事件内按处理器名称去重，重复注册为空操作；
//! - `emit` / `emit_only`：按记录中的执行方式分发，同步处理器在调用方任务中依次执行，
//!   后台处理器以 tokio 任务启动并登记到 [`EmitHandle`]；
//! - `emit_concurrent`：本次触发的全部处理器都以后台任务启动；
//! - `remove_handler`：唯一会报错的操作，名称不存在时返回 `HandlerNotFound`。
//!
//! 触发前先对事件桶做快照（克隆 `Arc` 记录列表）并释放锁，
//! 处理器内部可以安全地再次注册或移除。
//!
use crate::config::RegistryConfig;
use crate::emit_after::EmitAfter;
use crate::emit_handle::{EmitHandle, EmitReport};
use crate::error::{BusError, BusResult};
use crate::handler::{DispatchMode, EventHandler, HandlerRecord, HandlerSelection};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::fmt;
use std::sync::Arc;

/// 进程内事件注册表
///
/// `A` 为触发时传给每个处理器的参数类型，默认 `()`（无参数）。
pub struct EventRegistry<A = ()> {
    events: DashMap<String, Vec<HandlerRecord<A>>>,
    config: RegistryConfig,
}

impl<A> Default for EventRegistry<A> {
    fn default() -> Self {
        Self::with_config(RegistryConfig::default())
    }
}

impl<A> EventRegistry<A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            events: DashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// 全部事件下的处理器注册总数
    pub fn count(&self) -> usize {
        self.events.iter().map(|bucket| bucket.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// 某事件下已注册的处理器名称（注册顺序）
    pub fn handler_names(&self, event: &str) -> Vec<String> {
        self.events
            .get(event)
            .map(|bucket| bucket.iter().map(|r| r.name().to_owned()).collect())
            .unwrap_or_default()
    }

    /// 当前有处理器的事件名列表（无序）
    pub fn event_names(&self) -> Vec<String> {
        self.events
            .iter()
            .filter(|bucket| !bucket.value().is_empty())
            .map(|bucket| bucket.key().clone())
            .collect()
    }

    pub fn contains(&self, event: &str, handler: &str) -> bool {
        self.events
            .get(event)
            .is_some_and(|bucket| bucket.iter().any(|r| r.name() == handler))
    }

    /// 某事件下处理器的快照（注册顺序）
    pub fn handlers(&self, event: &str) -> Vec<Arc<dyn EventHandler<A>>> {
        self.snapshot(event)
            .into_iter()
            .map(|r| r.handler().clone())
            .collect()
    }

    /// 移除指定事件下的指定处理器
    pub fn remove_handler(&self, event: &str, handler: &str) -> BusResult<()> {
        {
            let Entry::Occupied(mut bucket) = self.events.entry(event.to_owned()) else {
                return Err(BusError::handler_not_found(event, handler));
            };

            let Some(pos) = bucket.get().iter().position(|r| r.name() == handler) else {
                return Err(BusError::handler_not_found(event, handler));
            };

            bucket.get_mut().remove(pos);
            if bucket.get().is_empty() {
                bucket.remove();
            }
        }

        tracing::debug!(
            registry = self.label(),
            event,
            handler,
            "event handler removed"
        );
        Ok(())
    }

    fn snapshot(&self, event: &str) -> Vec<HandlerRecord<A>> {
        // 克隆后立即释放分片锁，避免在处理器执行期间持锁
        self.events
            .get(event)
            .map(|bucket| bucket.value().clone())
            .unwrap_or_default()
    }

    fn label(&self) -> &str {
        self.config.label().unwrap_or("-")
    }
}

impl<A> EventRegistry<A>
where
    A: Send + Sync + 'static,
{
    /// 以默认执行方式注册处理器
    ///
    /// 同一事件下已存在同名处理器时不做任何修改，返回 `false`。
    pub fn register<H>(&self, event: impl Into<String>, handler: H) -> bool
    where
        H: EventHandler<A> + 'static,
    {
        self.register_with_mode(event, handler, self.config.default_mode())
    }

    /// 以指定执行方式注册处理器
    pub fn register_with_mode<H>(
        &self,
        event: impl Into<String>,
        handler: H,
        mode: DispatchMode,
    ) -> bool
    where
        H: EventHandler<A> + 'static,
    {
        self.register_arc(event, Arc::new(handler), mode)
    }

    /// 注册一个已共享的处理器（可同时挂到多个事件下）
    pub fn register_arc(
        &self,
        event: impl Into<String>,
        handler: Arc<dyn EventHandler<A>>,
        mode: DispatchMode,
    ) -> bool {
        let event = event.into();
        let record = HandlerRecord::new(handler, mode);
        let name = record.name().to_owned();

        // 分片锁只覆盖查重与插入，日志在锁释放后输出
        let inserted = {
            let mut bucket = self.events.entry(event.clone()).or_default();
            if bucket.iter().any(|r| r.name() == name) {
                false
            } else {
                bucket.push(record);
                true
            }
        };

        if inserted {
            tracing::debug!(
                registry = self.label(),
                event = %event,
                handler = %name,
                %mode,
                "event handler registered"
            );
        } else {
            tracing::debug!(
                registry = self.label(),
                event = %event,
                handler = %name,
                "event handler already registered, skipped"
            );
        }
        inserted
    }

    /// 触发事件：每个处理器按注册时的执行方式分发
    ///
    /// 同步处理器失败时立即返回错误，其后的处理器不再执行；
    /// 已启动的后台任务不受影响，但其句柄随错误一同被丢弃。
    pub async fn emit(&self, event: &str, args: A) -> BusResult<EmitHandle> {
        let records = self.snapshot(event);
        self.dispatch(event, records, Arc::new(args)).await
    }

    /// 仅触发名称在 `names` 中的处理器，未匹配的名称被忽略
    pub async fn emit_only(
        &self,
        event: &str,
        names: impl Into<HandlerSelection>,
        args: A,
    ) -> BusResult<EmitHandle> {
        let names = names.into();
        let records = self
            .snapshot(event)
            .into_iter()
            .filter(|r| names.contains(r.name()))
            .collect();
        self.dispatch(event, records, Arc::new(args)).await
    }

    /// 触发事件：全部处理器都以后台任务启动，立即返回
    pub fn emit_concurrent(&self, event: &str, args: A) -> EmitHandle {
        let args = Arc::new(args);
        let mut handle = EmitHandle::new(event);
        for record in self.snapshot(event) {
            self.spawn(event, &record, args.clone(), &mut handle);
        }
        handle
    }

    /// 以后台任务触发全部处理器，并等待它们结束
    pub async fn emit_and_wait(&self, event: &str, args: A) -> EmitReport {
        self.emit_concurrent(event, args).join().await
    }

    /// 包装一个函数：执行后触发 `event`（不传递任何参数）
    pub fn emit_after<F>(self: &Arc<Self>, event: impl Into<String>, func: F) -> EmitAfter<A, F> {
        EmitAfter::new(self.clone(), event, func)
    }

    async fn dispatch(
        &self,
        event: &str,
        records: Vec<HandlerRecord<A>>,
        args: Arc<A>,
    ) -> BusResult<EmitHandle> {
        let mut handle = EmitHandle::new(event);

        for record in records {
            match record.mode() {
                DispatchMode::CallerContext => {
                    tracing::trace!(
                        registry = self.label(),
                        event,
                        handler = record.name(),
                        "invoking event handler"
                    );
                    record
                        .handler()
                        .handle(&args)
                        .await
                        .map_err(|e| BusError::handler(event, record.name(), e))?;
                }
                DispatchMode::Spawned => self.spawn(event, &record, args.clone(), &mut handle),
            }
        }

        Ok(handle)
    }

    fn spawn(
        &self,
        event: &str,
        record: &HandlerRecord<A>,
        args: Arc<A>,
        handle: &mut EmitHandle,
    ) {
        let handler = record.handler().clone();
        let registry = self.label().to_owned();
        let event_name = event.to_owned();

        tracing::trace!(
            registry = %registry,
            event,
            handler = record.name(),
            "spawning event handler"
        );

        let task = tokio::spawn(async move {
            let result = handler.handle(&args).await;
            if let Err(err) = &result {
                tracing::warn!(
                    registry = %registry,
                    event = %event_name,
                    handler = handler.handler_name(),
                    error = %err,
                    "spawned event handler failed"
                );
            }
            result
        });

        handle.push(record.name(), task);
    }
}

impl<A> fmt::Display for EventRegistry<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<EventRegistry: {} subscribed events>", self.count())
    }
}

impl<A> fmt::Debug for EventRegistry<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRegistry")
            .field("config", &self.config)
            .field("count", &self.count())
            .finish()
    }
}
