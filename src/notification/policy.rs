//! 自动分组策略 - 决定何时把同一应用的未分组通知归入合成 summary
//!
//! 每个 (user_id, package) 的状态：
//! - `None`：没有被跟踪的通知
//! - `Accumulating`：有未分组通知，但数量未达到阈值
//! - `Grouped`：summary 已存在，新的未分组通知立即加入
//!
//! 阈值只在 `Accumulating -> Grouped` 时生效一次；自动分组成员清零时移除 summary 并回到 `None`。
//! 所有方法都假定调用方已串行化事件（见 [`super::service`]），内部不加锁。

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, info};

use super::callback::AutogroupCallback;
use super::identity::{NotificationIdentity, PackageKey, PostedNotification};
use super::index::{NotificationKeyIndex, PostOutcome};

/// 触发自动分组的未分组通知数量
pub const AUTOGROUP_AT_COUNT: usize = 4;

/// 单个 (user_id, package) 的分组状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupState {
    None,
    Accumulating,
    Grouped,
}

impl GroupState {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupState::None => "none",
            GroupState::Accumulating => "accumulating",
            GroupState::Grouped => "grouped",
        }
    }
}

impl std::fmt::Display for GroupState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 自动分组策略
pub struct AutogroupPolicy<C> {
    callback: C,
    index: NotificationKeyIndex,
    threshold: usize,
    /// 当前 summary 带 ongoing 标志的 (user_id, package)
    ongoing_summaries: HashSet<PackageKey>,
}

impl<C: AutogroupCallback> AutogroupPolicy<C> {
    /// 使用默认阈值 [`AUTOGROUP_AT_COUNT`]
    pub fn new(callback: C) -> Self {
        Self {
            callback,
            index: NotificationKeyIndex::new(),
            threshold: AUTOGROUP_AT_COUNT,
            ongoing_summaries: HashSet::new(),
        }
    }

    /// 设置阈值（最小为 1）
    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.threshold = threshold.max(1);
        self
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn callback(&self) -> &C {
        &self.callback
    }

    pub fn callback_mut(&mut self) -> &mut C {
        &mut self.callback
    }

    pub fn into_callback(self) -> C {
        self.callback
    }

    pub fn index(&self) -> &NotificationKeyIndex {
        &self.index
    }

    /// 查询 (user_id, package) 的当前状态
    pub fn state(&self, package: &PackageKey) -> GroupState {
        if self.index.autogrouped_count(package) > 0 {
            GroupState::Grouped
        } else if self.index.pending_count(package) > 0 {
            GroupState::Accumulating
        } else {
            GroupState::None
        }
    }

    /// 通知被 post（或更新）
    pub fn on_notification_posted(&mut self, identity: &NotificationIdentity, has_app_group: bool) {
        self.on_notification_posted_with(
            &PostedNotification::new(identity.clone()).with_app_group(has_app_group),
        );
    }

    /// 通知被 post（或更新），携带 ongoing 标志
    pub fn on_notification_posted_with(&mut self, posted: &PostedNotification) {
        let identity = &posted.identity;
        let package = identity.package_key();

        let outcome = self
            .index
            .record_posted(identity, posted.has_app_group, posted.ongoing);
        debug!(notification = %identity, outcome = ?outcome, "Notification posted");

        match outcome {
            PostOutcome::Ignored | PostOutcome::EvictedPending => {}
            PostOutcome::EvictedAutogrouped => {
                // 应用自己指定了 group：撤销成员资格，之后由应用的 group 管理
                self.callback.remove_auto_group_membership(identity);
                self.after_autogroup_shrunk(&package);
            }
            PostOutcome::Refreshed { autogrouped } => {
                if autogrouped {
                    self.sync_ongoing(&package);
                }
            }
            PostOutcome::Pending { pending } => {
                if self.index.autogrouped_count(&package) > 0 {
                    let keys = self.index.promote_pending(&package);
                    self.grant(&package, keys);
                    self.sync_ongoing(&package);
                } else if pending >= self.threshold {
                    let keys = self.index.promote_pending(&package);
                    // summary 以最早 post 的通知命名
                    let Some(summary_key) = keys.first().cloned() else {
                        return;
                    };
                    info!(
                        package = %package,
                        count = pending,
                        posted = %identity.key,
                        summary_key = %summary_key,
                        "Autogroup threshold reached"
                    );
                    self.callback
                        .add_auto_group_summary(package.user_id, &package.package, &summary_key);
                    self.grant(&package, keys);
                    self.sync_ongoing(&package);
                }
            }
        }
    }

    /// 通知被移除；未知通知是 no-op
    pub fn on_notification_removed(&mut self, identity: &NotificationIdentity) {
        let was_autogrouped = self.index.record_removed(identity);
        debug!(notification = %identity, was_autogrouped, "Notification removed");

        if was_autogrouped {
            self.after_autogroup_shrunk(&identity.package_key());
        }
    }

    /// 按 post 顺序逐个授予成员资格
    fn grant(&mut self, package: &PackageKey, keys: Vec<String>) {
        for key in keys {
            let member = NotificationIdentity::new(package.user_id, package.package.clone(), key);
            self.callback.add_auto_group_membership(&member);
        }
    }

    fn after_autogroup_shrunk(&mut self, package: &PackageKey) {
        if self.index.autogrouped_count(package) == 0 {
            info!(package = %package, "Autogroup emptied, removing summary");
            self.ongoing_summaries.remove(package);
            self.callback
                .remove_auto_group_summary(package.user_id, &package.package);
        } else {
            self.sync_ongoing(package);
        }
    }

    /// summary 的 ongoing 标志与成员不一致时通知回调
    fn sync_ongoing(&mut self, package: &PackageKey) {
        let needs_ongoing = self.index.ongoing_count(package) > 0;
        if needs_ongoing == self.ongoing_summaries.contains(package) {
            return;
        }

        if needs_ongoing {
            self.ongoing_summaries.insert(package.clone());
        } else {
            self.ongoing_summaries.remove(package);
        }
        self.callback
            .update_auto_group_summary(package.user_id, &package.package, needs_ongoing);
    }
}
