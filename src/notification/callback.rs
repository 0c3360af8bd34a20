//! Autogroup 回调 trait 定义
//!
//! Policy 只依赖这个抽象，不关心 summary/成员资格最终由谁落地。
//! 所有调用都是 fire-and-forget：policy 不等待确认，也不重试。

use serde::{Deserialize, Serialize};
use tracing::info;

use super::identity::NotificationIdentity;

/// 自动分组回调（由通知投递管线实现）
pub trait AutogroupCallback {
    /// 为 (user_id, package) 创建 summary，`summary_key` 为组内最早 post 的通知 key
    fn add_auto_group_summary(&mut self, user_id: i32, package: &str, summary_key: &str);

    /// 移除 (user_id, package) 的 summary
    fn remove_auto_group_summary(&mut self, user_id: i32, package: &str);

    /// 授予自动分组成员资格
    fn add_auto_group_membership(&mut self, identity: &NotificationIdentity);

    /// 撤销自动分组成员资格
    fn remove_auto_group_membership(&mut self, identity: &NotificationIdentity);

    /// summary 是否需要 ongoing 标志发生变化
    fn update_auto_group_summary(&mut self, _user_id: i32, _package: &str, _needs_ongoing: bool) {}
}

impl<C: AutogroupCallback + ?Sized> AutogroupCallback for Box<C> {
    fn add_auto_group_summary(&mut self, user_id: i32, package: &str, summary_key: &str) {
        (**self).add_auto_group_summary(user_id, package, summary_key)
    }

    fn remove_auto_group_summary(&mut self, user_id: i32, package: &str) {
        (**self).remove_auto_group_summary(user_id, package)
    }

    fn add_auto_group_membership(&mut self, identity: &NotificationIdentity) {
        (**self).add_auto_group_membership(identity)
    }

    fn remove_auto_group_membership(&mut self, identity: &NotificationIdentity) {
        (**self).remove_auto_group_membership(identity)
    }

    fn update_auto_group_summary(&mut self, user_id: i32, package: &str, needs_ongoing: bool) {
        (**self).update_auto_group_summary(user_id, package, needs_ongoing)
    }
}

/// 同时转发给两个回调，先 A 后 B
impl<A: AutogroupCallback, B: AutogroupCallback> AutogroupCallback for (A, B) {
    fn add_auto_group_summary(&mut self, user_id: i32, package: &str, summary_key: &str) {
        self.0.add_auto_group_summary(user_id, package, summary_key);
        self.1.add_auto_group_summary(user_id, package, summary_key);
    }

    fn remove_auto_group_summary(&mut self, user_id: i32, package: &str) {
        self.0.remove_auto_group_summary(user_id, package);
        self.1.remove_auto_group_summary(user_id, package);
    }

    fn add_auto_group_membership(&mut self, identity: &NotificationIdentity) {
        self.0.add_auto_group_membership(identity);
        self.1.add_auto_group_membership(identity);
    }

    fn remove_auto_group_membership(&mut self, identity: &NotificationIdentity) {
        self.0.remove_auto_group_membership(identity);
        self.1.remove_auto_group_membership(identity);
    }

    fn update_auto_group_summary(&mut self, user_id: i32, package: &str, needs_ongoing: bool) {
        self.0.update_auto_group_summary(user_id, package, needs_ongoing);
        self.1.update_auto_group_summary(user_id, package, needs_ongoing);
    }
}

/// None 时忽略所有调用
impl<C: AutogroupCallback> AutogroupCallback for Option<C> {
    fn add_auto_group_summary(&mut self, user_id: i32, package: &str, summary_key: &str) {
        if let Some(c) = self {
            c.add_auto_group_summary(user_id, package, summary_key);
        }
    }

    fn remove_auto_group_summary(&mut self, user_id: i32, package: &str) {
        if let Some(c) = self {
            c.remove_auto_group_summary(user_id, package);
        }
    }

    fn add_auto_group_membership(&mut self, identity: &NotificationIdentity) {
        if let Some(c) = self {
            c.add_auto_group_membership(identity);
        }
    }

    fn remove_auto_group_membership(&mut self, identity: &NotificationIdentity) {
        if let Some(c) = self {
            c.remove_auto_group_membership(identity);
        }
    }

    fn update_auto_group_summary(&mut self, user_id: i32, package: &str, needs_ongoing: bool) {
        if let Some(c) = self {
            c.update_auto_group_summary(user_id, package, needs_ongoing);
        }
    }
}

/// 一次回调调用的记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum SinkCall {
    AddSummary {
        user_id: i32,
        package: String,
        summary_key: String,
    },
    RemoveSummary {
        user_id: i32,
        package: String,
    },
    AddMembership {
        user_id: i32,
        package: String,
        key: String,
    },
    RemoveMembership {
        user_id: i32,
        package: String,
        key: String,
    },
    UpdateSummary {
        user_id: i32,
        package: String,
        needs_ongoing: bool,
    },
}

impl std::fmt::Display for SinkCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SinkCall::AddSummary { user_id, package, summary_key } => {
                write!(f, "+summary   {}|{} (key {})", user_id, package, summary_key)
            }
            SinkCall::RemoveSummary { user_id, package } => {
                write!(f, "-summary   {}|{}", user_id, package)
            }
            SinkCall::AddMembership { user_id, package, key } => {
                write!(f, "+member    {}|{}|{}", user_id, package, key)
            }
            SinkCall::RemoveMembership { user_id, package, key } => {
                write!(f, "-member    {}|{}|{}", user_id, package, key)
            }
            SinkCall::UpdateSummary { user_id, package, needs_ongoing } => {
                write!(f, "~summary   {}|{} ongoing={}", user_id, package, needs_ongoing)
            }
        }
    }
}

/// 记录所有调用的回调（测试和 replay 使用）
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    calls: Vec<SinkCall>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 按调用顺序返回全部记录
    pub fn calls(&self) -> &[SinkCall] {
        &self.calls
    }

    /// 取出并清空记录
    pub fn take(&mut self) -> Vec<SinkCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn summary_adds(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, SinkCall::AddSummary { .. }))
            .count()
    }

    pub fn summary_removes(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, SinkCall::RemoveSummary { .. }))
            .count()
    }

    /// 被授予成员资格的 key，按调用顺序
    pub fn membership_grants(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                SinkCall::AddMembership { key, .. } => Some(key.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl AutogroupCallback for RecordingSink {
    fn add_auto_group_summary(&mut self, user_id: i32, package: &str, summary_key: &str) {
        self.calls.push(SinkCall::AddSummary {
            user_id,
            package: package.to_string(),
            summary_key: summary_key.to_string(),
        });
    }

    fn remove_auto_group_summary(&mut self, user_id: i32, package: &str) {
        self.calls.push(SinkCall::RemoveSummary {
            user_id,
            package: package.to_string(),
        });
    }

    fn add_auto_group_membership(&mut self, identity: &NotificationIdentity) {
        self.calls.push(SinkCall::AddMembership {
            user_id: identity.user_id,
            package: identity.package.clone(),
            key: identity.key.clone(),
        });
    }

    fn remove_auto_group_membership(&mut self, identity: &NotificationIdentity) {
        self.calls.push(SinkCall::RemoveMembership {
            user_id: identity.user_id,
            package: identity.package.clone(),
            key: identity.key.clone(),
        });
    }

    fn update_auto_group_summary(&mut self, user_id: i32, package: &str, needs_ongoing: bool) {
        self.calls.push(SinkCall::UpdateSummary {
            user_id,
            package: package.to_string(),
            needs_ongoing,
        });
    }
}

/// 只打日志的回调
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl AutogroupCallback for TracingSink {
    fn add_auto_group_summary(&mut self, user_id: i32, package: &str, summary_key: &str) {
        info!(user_id, package = %package, summary_key = %summary_key, "Autogroup summary added");
    }

    fn remove_auto_group_summary(&mut self, user_id: i32, package: &str) {
        info!(user_id, package = %package, "Autogroup summary removed");
    }

    fn add_auto_group_membership(&mut self, identity: &NotificationIdentity) {
        info!(
            user_id = identity.user_id,
            package = %identity.package,
            key = %identity.key,
            "Autogroup membership granted"
        );
    }

    fn remove_auto_group_membership(&mut self, identity: &NotificationIdentity) {
        info!(
            user_id = identity.user_id,
            package = %identity.package,
            key = %identity.key,
            "Autogroup membership revoked"
        );
    }

    fn update_auto_group_summary(&mut self, user_id: i32, package: &str, needs_ongoing: bool) {
        info!(user_id, package = %package, needs_ongoing, "Autogroup summary updated");
    }
}
