//! 自动分组服务 - 单个 tokio 任务独占 policy，所有生产者通过队列投递事件
//!
//! 队列是 FIFO，同一 (user_id, package) 的事件按投递顺序处理，policy 不需要加锁。

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::callback::AutogroupCallback;
use super::event::AutogroupEvent;
use super::identity::{NotificationIdentity, PostedNotification};
use super::policy::AutogroupPolicy;

/// 生产者句柄，可克隆
#[derive(Debug, Clone)]
pub struct AutogroupHandle {
    tx: UnboundedSender<AutogroupEvent>,
}

impl AutogroupHandle {
    /// 投递事件（不阻塞）；返回 false 表示服务已停止
    pub fn send(&self, event: AutogroupEvent) -> bool {
        match self.tx.send(event) {
            Ok(()) => true,
            Err(e) => {
                warn!(event = ?e.0, "Autogroup service stopped, event dropped");
                false
            }
        }
    }

    pub fn post(&self, identity: &NotificationIdentity, has_app_group: bool) -> bool {
        self.send(AutogroupEvent::posted(identity, has_app_group))
    }

    pub fn post_with(&self, posted: &PostedNotification) -> bool {
        self.send(AutogroupEvent::posted_with(posted))
    }

    pub fn remove(&self, identity: &NotificationIdentity) -> bool {
        self.send(AutogroupEvent::removed(identity))
    }

    /// 释放句柄；最后一个句柄释放后服务任务退出
    pub fn shutdown(self) {
        drop(self);
    }
}

/// 自动分组服务
pub struct AutogroupService;

impl AutogroupService {
    /// 在当前 tokio runtime 上启动服务
    ///
    /// 所有句柄释放后，任务排空队列并返回 policy
    pub fn spawn<C>(policy: AutogroupPolicy<C>) -> (AutogroupHandle, JoinHandle<AutogroupPolicy<C>>)
    where
        C: AutogroupCallback + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        info!(threshold = policy.threshold(), "Starting autogroup service");
        let task = tokio::spawn(Self::run(policy, rx));
        (AutogroupHandle { tx }, task)
    }

    async fn run<C: AutogroupCallback>(
        mut policy: AutogroupPolicy<C>,
        mut rx: UnboundedReceiver<AutogroupEvent>,
    ) -> AutogroupPolicy<C> {
        let mut handled: u64 = 0;
        while let Some(event) = rx.recv().await {
            event.apply(&mut policy);
            handled += 1;
        }
        debug!(handled, "Autogroup service queue closed");
        policy
    }
}
