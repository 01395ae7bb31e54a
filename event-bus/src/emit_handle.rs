//! 触发句柄（EmitHandle）
//!
//! 一次触发中以独立任务启动的处理器都登记在句柄里：
//! - 丢弃句柄即“发出即忘”，已启动的任务不会被取消；
//! - `join` 等待全部任务结束，并汇总成功与失败的处理器。
//!
use futures_util::future::join_all;
use std::fmt;
use tokio::task::JoinHandle;

pub(crate) type HandlerTask = JoinHandle<anyhow::Result<()>>;

/// 一次触发所启动的后台任务
#[must_use = "dropping the handle detaches the spawned handlers; call `join` to wait for them"]
pub struct EmitHandle {
    event: String,
    tasks: Vec<(String, HandlerTask)>,
}

impl EmitHandle {
    pub(crate) fn new(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            tasks: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, handler: impl Into<String>, task: HandlerTask) {
        self.tasks.push((handler.into(), task));
    }

    pub fn event(&self) -> &str {
        &self.event
    }

    /// 已启动的后台处理器数量
    pub fn spawned(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// 全部后台处理器是否都已结束（不阻塞）
    pub fn is_finished(&self) -> bool {
        self.tasks.iter().all(|(_, t)| t.is_finished())
    }

    /// 等待全部后台处理器结束
    ///
    /// 处理器返回的错误与任务 panic 都记为失败，互不影响。
    pub async fn join(self) -> EmitReport {
        let (names, tasks): (Vec<_>, Vec<_>) = self.tasks.into_iter().unzip();
        let results = join_all(tasks).await;

        let mut report = EmitReport {
            event: self.event,
            completed: Vec::new(),
            failures: Vec::new(),
        };

        for (handler, result) in names.into_iter().zip(results) {
            match result {
                Ok(Ok(())) => report.completed.push(handler),
                Ok(Err(error)) => report.failures.push(HandlerFailure { handler, error }),
                Err(join_err) => report.failures.push(HandlerFailure {
                    handler,
                    error: anyhow::Error::new(join_err),
                }),
            }
        }

        report
    }
}

impl fmt::Debug for EmitHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.tasks.iter().map(|(n, _)| n.as_str()).collect();
        f.debug_struct("EmitHandle")
            .field("event", &self.event)
            .field("spawned", &names)
            .finish()
    }
}

/// `EmitHandle::join` 的汇总结果
#[derive(Debug)]
pub struct EmitReport {
    event: String,
    completed: Vec<String>,
    failures: Vec<HandlerFailure>,
}

impl EmitReport {
    pub fn event(&self) -> &str {
        &self.event
    }

    /// 成功结束的处理器名称（按启动顺序）
    pub fn completed(&self) -> &[String] {
        &self.completed
    }

    pub fn failures(&self) -> &[HandlerFailure] {
        &self.failures
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// 后台处理器的失败记录
#[derive(Debug)]
pub struct HandlerFailure {
    pub handler: String,
    pub error: anyhow::Error,
}

impl fmt::Display for HandlerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handler={}, reason={}", self.handler, self.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn join_collects_success_error_and_panic() {
        let mut handle = EmitHandle::new("e");
        handle.push("ok", tokio::spawn(async { Ok(()) }));
        handle.push("err", tokio::spawn(async { Err(anyhow::anyhow!("boom")) }));
        handle.push(
            "panic",
            tokio::spawn(async {
                if true {
                    panic!("handler panicked");
                }
                Ok(())
            }),
        );
        assert_eq!(handle.spawned(), 3);

        let report = handle.join().await;
        assert_eq!(report.event(), "e");
        assert_eq!(report.completed(), ["ok".to_string()]);
        assert!(!report.is_success());

        let failed: Vec<&str> = report.failures().iter().map(|f| f.handler.as_str()).collect();
        assert_eq!(failed, vec!["err", "panic"]);
        assert_eq!(report.failures()[0].to_string(), "handler=err, reason=boom");
    }

    #[tokio::test]
    async fn empty_handle_joins_immediately() {
        let handle = EmitHandle::new("nothing");
        assert!(handle.is_empty());
        assert!(handle.is_finished());

        let report = handle.join().await;
        assert!(report.is_success());
        assert!(report.completed().is_empty());
    }
}
