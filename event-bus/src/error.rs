//! 事件总线统一错误定义
//!
//! 注册表对外只暴露两类错误：
//! - 移除不存在的处理器（唯一的校验型错误）；
//! - 同步（调用方上下文）处理器执行失败，原样携带处理器自身的错误。
//!
//! 其余操作（重复注册、未知事件的 emit、`emit_only` 中未匹配的名称）均为静默空操作。
//!
use thiserror::Error;

/// 统一错误类型
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum BusError {
    #[error("handler not found: event={event}, handler={handler}")]
    HandlerNotFound { event: String, handler: String },

    #[error("event handler error: event={event}, handler={handler}, reason={source}")]
    Handler {
        event: String,
        handler: String,
        source: anyhow::Error,
    },
}

impl BusError {
    pub fn handler_not_found(event: impl Into<String>, handler: impl Into<String>) -> Self {
        Self::HandlerNotFound {
            event: event.into(),
            handler: handler.into(),
        }
    }

    pub fn handler(
        event: impl Into<String>,
        handler: impl Into<String>,
        source: anyhow::Error,
    ) -> Self {
        Self::Handler {
            event: event.into(),
            handler: handler.into(),
            source,
        }
    }

    /// 出错处理器的声明名称
    pub fn handler_name(&self) -> &str {
        match self {
            Self::HandlerNotFound { handler, .. } | Self::Handler { handler, .. } => handler,
        }
    }
}

/// 统一 Result 类型别名
pub type BusResult<T> = Result<T, BusError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[derive(Debug, thiserror::Error)]
    #[error("disk full")]
    struct DiskFull;

    #[test]
    fn handler_error_keeps_original_source() {
        let err = BusError::handler("saved", "flush", anyhow::Error::new(DiskFull));

        assert_eq!(
            err.to_string(),
            "event handler error: event=saved, handler=flush, reason=disk full"
        );
        assert_eq!(err.handler_name(), "flush");

        let BusError::Handler { source, .. } = &err else {
            panic!("unexpected error: {err:?}");
        };
        assert!(source.downcast_ref::<DiskFull>().is_some());
        assert!(err.source().is_some());
    }

    #[test]
    fn not_found_message_names_event_and_handler() {
        let err = BusError::handler_not_found("tick", "inc");
        assert_eq!(err.to_string(), "handler not found: event=tick, handler=inc");
    }
}
