//! 进程内事件总线（event-bus）
//!
//! 以事件名为通道的发布/订阅注册表：
//! - 处理器以显式名称注册到事件下，同一事件内按名称去重；
//! - 触发时按处理器的执行方式分发：在调用方任务中依次执行，或以 tokio 任务并发执行；
//! - 支持只触发指定名称的处理器、移除处理器（不存在时报错）、以及“执行后触发”包装。
//!
//! 不提供持久化、跨进程投递、重试与背压；触发即一次尽力而为的进程内扇出。
//!
//! 典型用法：
//! ```rust
//! use event_bus::{EventRegistry, handler_fn};
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> anyhow::Result<()> {
//! let bus = EventRegistry::<()>::new();
//! let ticks = Arc::new(AtomicUsize::new(0));
//! {
//!     let ticks = ticks.clone();
//!     bus.register("tick", handler_fn("inc", move |_: &()| {
//!         ticks.fetch_add(1, Ordering::SeqCst);
//!         Ok(())
//!     }));
//! }
//!
//! for _ in 0..3 {
//!     let _ = bus.emit("tick", ()).await?;
//! }
//! assert_eq!(ticks.load(Ordering::SeqCst), 3);
//! assert_eq!(bus.to_string(), "<EventRegistry: 1 subscribed events>");
//! # Ok(())
//! # }
//! ```
//!
pub mod config;
pub mod emit_after;
pub mod emit_handle;
pub mod error;
pub mod handler;
pub mod registry;

pub use config::RegistryConfig;
pub use emit_after::EmitAfter;
pub use emit_handle::{EmitHandle, EmitReport, HandlerFailure};
pub use error::{BusError, BusResult};
pub use handler::{
    AsyncFnHandler, DispatchMode, EventHandler, FnHandler, HandlerRecord, HandlerSelection,
    async_handler_fn, handler_fn,
};
pub use registry::EventRegistry;
