//! 通知身份 - (user_id, package, key) 复合键

use serde::{Deserialize, Serialize};
use std::fmt;

/// 一条存活通知的唯一标识
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationIdentity {
    pub user_id: i32,
    pub package: String,
    pub key: String,
}

impl NotificationIdentity {
    pub fn new(user_id: i32, package: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            user_id,
            package: package.into(),
            key: key.into(),
        }
    }

    /// 所属的 (user_id, package)
    pub fn package_key(&self) -> PackageKey {
        PackageKey::new(self.user_id, self.package.clone())
    }
}

impl fmt::Display for NotificationIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}|{}", self.user_id, self.package, self.key)
    }
}

/// 分组状态的作用域：同一用户下的同一应用
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PackageKey {
    pub user_id: i32,
    pub package: String,
}

impl PackageKey {
    pub fn new(user_id: i32, package: impl Into<String>) -> Self {
        Self {
            user_id,
            package: package.into(),
        }
    }
}

impl fmt::Display for PackageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.user_id, self.package)
    }
}

/// 一次 posted 事件携带的全部信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedNotification {
    pub identity: NotificationIdentity,
    /// 应用是否自己指定了 group key
    pub has_app_group: bool,
    /// 是否为常驻（ongoing / 前台服务）通知
    pub ongoing: bool,
}

impl PostedNotification {
    pub fn new(identity: NotificationIdentity) -> Self {
        Self {
            identity,
            has_app_group: false,
            ongoing: false,
        }
    }

    pub fn with_app_group(mut self, has_app_group: bool) -> Self {
        self.has_app_group = has_app_group;
        self
    }

    pub fn with_ongoing(mut self, ongoing: bool) -> Self {
        self.ongoing = ongoing;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_display() {
        let id = NotificationIdentity::new(10, "com.app", "k1");
        assert_eq!(id.to_string(), "10|com.app|k1");
        assert_eq!(id.package_key().to_string(), "10|com.app");
    }

    #[test]
    fn test_same_key_different_user_is_distinct() {
        let a = NotificationIdentity::new(0, "com.app", "k1");
        let b = NotificationIdentity::new(10, "com.app", "k1");
        assert_ne!(a, b);
        assert_ne!(a.package_key(), b.package_key());
    }

    #[test]
    fn test_posted_builder_defaults() {
        let posted = PostedNotification::new(NotificationIdentity::new(0, "com.app", "k1"));
        assert!(!posted.has_app_group);
        assert!(!posted.ongoing);

        let posted = posted.with_app_group(true).with_ongoing(true);
        assert!(posted.has_app_group);
        assert!(posted.ongoing);
    }
}
