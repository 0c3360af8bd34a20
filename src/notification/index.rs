//! 通知键索引 - 按 (user_id, package) 记录未分组和已自动分组的通知
//!
//! 索引只做簿记，从不调用回调。是否创建/移除 summary 由 policy 决定。

use std::collections::HashMap;

use super::identity::{NotificationIdentity, PackageKey};

/// 被跟踪的一条通知
#[derive(Debug, Clone, PartialEq, Eq)]
struct Member {
    key: String,
    ongoing: bool,
}

/// 单个 (user_id, package) 的状态
#[derive(Debug, Default)]
struct PackageRecord {
    /// 尚未自动分组的通知，按 post 顺序
    pending: Vec<Member>,
    /// 已获得自动分组成员资格的通知，按授予顺序
    autogrouped: Vec<Member>,
}

impl PackageRecord {
    fn is_empty(&self) -> bool {
        self.pending.is_empty() && self.autogrouped.is_empty()
    }

    fn position(list: &[Member], key: &str) -> Option<usize> {
        list.iter().position(|m| m.key == key)
    }
}

/// `record_posted` 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostOutcome {
    /// 带应用 group 且此前未被跟踪
    Ignored,
    /// 带应用 group，从未分组集合中移出（尚未自动分组）
    EvictedPending,
    /// 带应用 group，此前持有自动分组成员资格
    EvictedAutogrouped,
    /// 新加入未分组集合，附带当前未分组数量
    Pending { pending: usize },
    /// 已被跟踪的 key 重新 post，只更新 ongoing 标志
    Refreshed { autogrouped: bool },
}

/// 通知键索引
#[derive(Debug, Default)]
pub struct NotificationKeyIndex {
    /// user_id -> package -> record
    users: HashMap<i32, HashMap<String, PackageRecord>>,
}

impl NotificationKeyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一次 post
    ///
    /// - `has_app_group` 为 true：通知不参与自动分组，从任何集合中移出
    /// - 否则追加到未分组集合末尾；重复 post 不改变顺序
    pub fn record_posted(
        &mut self,
        identity: &NotificationIdentity,
        has_app_group: bool,
        ongoing: bool,
    ) -> PostOutcome {
        if has_app_group {
            return match self.remove_member(identity) {
                Some(true) => PostOutcome::EvictedAutogrouped,
                Some(false) => PostOutcome::EvictedPending,
                None => PostOutcome::Ignored,
            };
        }

        let record = self
            .users
            .entry(identity.user_id)
            .or_default()
            .entry(identity.package.clone())
            .or_default();

        if let Some(pos) = PackageRecord::position(&record.autogrouped, &identity.key) {
            record.autogrouped[pos].ongoing = ongoing;
            return PostOutcome::Refreshed { autogrouped: true };
        }
        if let Some(pos) = PackageRecord::position(&record.pending, &identity.key) {
            record.pending[pos].ongoing = ongoing;
            return PostOutcome::Refreshed { autogrouped: false };
        }

        record.pending.push(Member {
            key: identity.key.clone(),
            ongoing,
        });
        PostOutcome::Pending {
            pending: record.pending.len(),
        }
    }

    /// 记录一次移除，返回该通知此前是否持有自动分组成员资格
    ///
    /// 未知的 key 是 no-op，返回 false
    pub fn record_removed(&mut self, identity: &NotificationIdentity) -> bool {
        self.remove_member(identity).unwrap_or(false)
    }

    /// 把所有未分组通知转为自动分组成员，按 post 顺序返回它们的 key
    pub fn promote_pending(&mut self, package: &PackageKey) -> Vec<String> {
        let Some(record) = self.record_mut(package) else {
            return Vec::new();
        };

        let promoted: Vec<Member> = record.pending.drain(..).collect();
        let keys = promoted.iter().map(|m| m.key.clone()).collect();
        record.autogrouped.extend(promoted);
        keys
    }

    /// 未分组（等待阈值）的通知数量
    pub fn pending_count(&self, package: &PackageKey) -> usize {
        self.record(package).map_or(0, |r| r.pending.len())
    }

    /// 自动分组成员数量
    pub fn autogrouped_count(&self, package: &PackageKey) -> usize {
        self.record(package).map_or(0, |r| r.autogrouped.len())
    }

    /// 自动分组成员中 ongoing 的数量
    pub fn ongoing_count(&self, package: &PackageKey) -> usize {
        self.record(package)
            .map_or(0, |r| r.autogrouped.iter().filter(|m| m.ongoing).count())
    }

    pub fn is_autogrouped(&self, identity: &NotificationIdentity) -> bool {
        self.record(&identity.package_key())
            .is_some_and(|r| PackageRecord::position(&r.autogrouped, &identity.key).is_some())
    }

    pub fn is_pending(&self, identity: &NotificationIdentity) -> bool {
        self.record(&identity.package_key())
            .is_some_and(|r| PackageRecord::position(&r.pending, &identity.key).is_some())
    }

    /// 自动分组成员 key，按授予顺序
    pub fn autogrouped_keys(&self, package: &PackageKey) -> Vec<String> {
        self.record(package)
            .map(|r| r.autogrouped.iter().map(|m| m.key.clone()).collect())
            .unwrap_or_default()
    }

    /// 当前有状态的 (user_id, package) 数量
    pub fn package_count(&self) -> usize {
        self.users.values().map(HashMap::len).sum()
    }

    fn record(&self, package: &PackageKey) -> Option<&PackageRecord> {
        self.users.get(&package.user_id)?.get(&package.package)
    }

    fn record_mut(&mut self, package: &PackageKey) -> Option<&mut PackageRecord> {
        self.users.get_mut(&package.user_id)?.get_mut(&package.package)
    }

    /// 从任一集合中移除，Some(true) 表示此前已自动分组
    fn remove_member(&mut self, identity: &NotificationIdentity) -> Option<bool> {
        let packages = self.users.get_mut(&identity.user_id)?;
        let record = packages.get_mut(&identity.package)?;

        let was_autogrouped =
            if let Some(pos) = PackageRecord::position(&record.autogrouped, &identity.key) {
                record.autogrouped.remove(pos);
                true
            } else if let Some(pos) = PackageRecord::position(&record.pending, &identity.key) {
                record.pending.remove(pos);
                false
            } else {
                return None;
            };

        // 清理空记录，避免索引随已消失的应用增长
        if record.is_empty() {
            packages.remove(&identity.package);
            if packages.is_empty() {
                self.users.remove(&identity.user_id);
            }
        }

        Some(was_autogrouped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(key: &str) -> NotificationIdentity {
        NotificationIdentity::new(0, "com.app", key)
    }

    fn pkg() -> PackageKey {
        PackageKey::new(0, "com.app")
    }

    #[test]
    fn test_posted_without_group_is_pending() {
        let mut index = NotificationKeyIndex::new();
        assert_eq!(
            index.record_posted(&id("a"), false, false),
            PostOutcome::Pending { pending: 1 }
        );
        assert_eq!(
            index.record_posted(&id("b"), false, false),
            PostOutcome::Pending { pending: 2 }
        );
        assert_eq!(index.pending_count(&pkg()), 2);
        assert!(index.is_pending(&id("a")));
    }

    #[test]
    fn test_repost_keeps_order() {
        let mut index = NotificationKeyIndex::new();
        index.record_posted(&id("a"), false, false);
        index.record_posted(&id("b"), false, false);

        // 重复 post 不改变顺序
        assert_eq!(
            index.record_posted(&id("a"), false, true),
            PostOutcome::Refreshed { autogrouped: false }
        );
        assert_eq!(index.pending_count(&pkg()), 2);
        assert_eq!(index.promote_pending(&pkg()), vec!["a", "b"]);
    }

    #[test]
    fn test_app_group_on_untracked_is_ignored() {
        let mut index = NotificationKeyIndex::new();
        assert_eq!(index.record_posted(&id("a"), true, false), PostOutcome::Ignored);
        assert_eq!(index.package_count(), 0);
    }

    #[test]
    fn test_app_group_evicts_pending() {
        let mut index = NotificationKeyIndex::new();
        index.record_posted(&id("a"), false, false);
        index.record_posted(&id("b"), false, false);

        assert_eq!(index.record_posted(&id("a"), true, false), PostOutcome::EvictedPending);
        assert_eq!(index.pending_count(&pkg()), 1);
        assert!(!index.is_pending(&id("a")));
    }

    #[test]
    fn test_app_group_evicts_autogrouped() {
        let mut index = NotificationKeyIndex::new();
        index.record_posted(&id("a"), false, false);
        index.promote_pending(&pkg());

        assert_eq!(index.record_posted(&id("a"), true, false), PostOutcome::EvictedAutogrouped);
        assert_eq!(index.autogrouped_count(&pkg()), 0);
    }

    #[test]
    fn test_promote_moves_everything_in_order() {
        let mut index = NotificationKeyIndex::new();
        for key in ["k0", "k1", "k2"] {
            index.record_posted(&id(key), false, false);
        }

        assert_eq!(index.promote_pending(&pkg()), vec!["k0", "k1", "k2"]);
        assert_eq!(index.pending_count(&pkg()), 0);
        assert_eq!(index.autogrouped_count(&pkg()), 3);
        assert!(index.is_autogrouped(&id("k1")));
        assert_eq!(index.autogrouped_keys(&pkg()), vec!["k0", "k1", "k2"]);
    }

    #[test]
    fn test_removed_reports_membership() {
        let mut index = NotificationKeyIndex::new();
        index.record_posted(&id("a"), false, false);
        index.promote_pending(&pkg());
        index.record_posted(&id("b"), false, false);

        assert!(!index.record_removed(&id("b")));
        assert!(index.record_removed(&id("a")));
    }

    #[test]
    fn test_unknown_removal_is_noop() {
        let mut index = NotificationKeyIndex::new();
        assert!(!index.record_removed(&id("ghost")));

        index.record_posted(&id("a"), false, false);
        assert!(!index.record_removed(&NotificationIdentity::new(0, "com.other", "a")));
        assert!(!index.record_removed(&NotificationIdentity::new(7, "com.app", "a")));
        assert_eq!(index.pending_count(&pkg()), 1);
    }

    #[test]
    fn test_empty_records_are_pruned() {
        let mut index = NotificationKeyIndex::new();
        index.record_posted(&id("a"), false, false);
        index.record_posted(&NotificationIdentity::new(10, "com.other", "x"), false, false);
        assert_eq!(index.package_count(), 2);

        index.record_removed(&id("a"));
        assert_eq!(index.package_count(), 1);
        assert!(!index.users.contains_key(&0));
    }

    #[test]
    fn test_ongoing_count_only_counts_autogrouped() {
        let mut index = NotificationKeyIndex::new();
        index.record_posted(&id("a"), false, true);
        assert_eq!(index.ongoing_count(&pkg()), 0);

        index.promote_pending(&pkg());
        assert_eq!(index.ongoing_count(&pkg()), 1);

        index.record_posted(&id("a"), false, false);
        assert_eq!(index.ongoing_count(&pkg()), 0);
    }
}
