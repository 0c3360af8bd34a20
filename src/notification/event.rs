//! 通知生命周期事件 - posted / removed
//!
//! 既是 service 队列里的消息，也是事件轨迹文件（JSONL）的一行。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::callback::AutogroupCallback;
use super::identity::{NotificationIdentity, PostedNotification};
use super::policy::AutogroupPolicy;

/// 通知生命周期事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AutogroupEvent {
    Posted {
        user_id: i32,
        package: String,
        key: String,
        /// 应用是否自己指定了 group key
        #[serde(default)]
        app_group: bool,
        #[serde(default)]
        ongoing: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ts: Option<DateTime<Utc>>,
    },
    Removed {
        user_id: i32,
        package: String,
        key: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ts: Option<DateTime<Utc>>,
    },
}

impl AutogroupEvent {
    pub fn posted(identity: &NotificationIdentity, app_group: bool) -> Self {
        AutogroupEvent::Posted {
            user_id: identity.user_id,
            package: identity.package.clone(),
            key: identity.key.clone(),
            app_group,
            ongoing: false,
            ts: None,
        }
    }

    pub fn posted_with(posted: &PostedNotification) -> Self {
        AutogroupEvent::Posted {
            user_id: posted.identity.user_id,
            package: posted.identity.package.clone(),
            key: posted.identity.key.clone(),
            app_group: posted.has_app_group,
            ongoing: posted.ongoing,
            ts: None,
        }
    }

    pub fn removed(identity: &NotificationIdentity) -> Self {
        AutogroupEvent::Removed {
            user_id: identity.user_id,
            package: identity.package.clone(),
            key: identity.key.clone(),
            ts: None,
        }
    }

    pub fn identity(&self) -> NotificationIdentity {
        match self {
            AutogroupEvent::Posted { user_id, package, key, .. }
            | AutogroupEvent::Removed { user_id, package, key, .. } => {
                NotificationIdentity::new(*user_id, package.clone(), key.clone())
            }
        }
    }

    pub fn ts(&self) -> Option<DateTime<Utc>> {
        match self {
            AutogroupEvent::Posted { ts, .. } | AutogroupEvent::Removed { ts, .. } => *ts,
        }
    }

    /// 交给 policy 处理
    pub fn apply<C: AutogroupCallback>(&self, policy: &mut AutogroupPolicy<C>) {
        match self {
            AutogroupEvent::Posted { app_group, ongoing, .. } => {
                let posted = PostedNotification::new(self.identity())
                    .with_app_group(*app_group)
                    .with_ongoing(*ongoing);
                policy.on_notification_posted_with(&posted);
            }
            AutogroupEvent::Removed { .. } => {
                policy.on_notification_removed(&self.identity());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::callback::RecordingSink;

    #[test]
    fn test_parse_minimal_posted() {
        let json = r#"{"event":"posted","user_id":0,"package":"com.app","key":"k0"}"#;
        let event: AutogroupEvent = serde_json::from_str(json).unwrap();

        assert_eq!(
            event,
            AutogroupEvent::Posted {
                user_id: 0,
                package: "com.app".to_string(),
                key: "k0".to_string(),
                app_group: false,
                ongoing: false,
                ts: None,
            }
        );
    }

    #[test]
    fn test_parse_removed_with_ts() {
        let json = concat!(
            r#"{"event":"removed","user_id":10,"package":"com.app","key":"k0","#,
            r#""ts":"2024-01-15T10:30:00Z"}"#
        );
        let event: AutogroupEvent = serde_json::from_str(json).unwrap();

        assert_eq!(event.identity(), NotificationIdentity::new(10, "com.app", "k0"));
        assert!(event.ts().is_some());
    }

    #[test]
    fn test_unknown_event_rejected() {
        let json = r#"{"event":"updated","user_id":0,"package":"com.app","key":"k0"}"#;
        assert!(serde_json::from_str::<AutogroupEvent>(json).is_err());
    }

    #[test]
    fn test_serialize_skips_missing_ts() {
        let event = AutogroupEvent::removed(&NotificationIdentity::new(0, "com.app", "k0"));
        let json = serde_json::to_string(&event).unwrap();
        assert!(!json.contains("ts"));
        assert!(json.contains(r#""event":"removed""#));
    }

    #[test]
    fn test_apply_routes_to_policy() {
        let mut policy = AutogroupPolicy::new(RecordingSink::new()).with_threshold(1);
        let identity = NotificationIdentity::new(0, "com.app", "k0");

        AutogroupEvent::posted(&identity, false).apply(&mut policy);
        assert_eq!(policy.callback().summary_adds(), 1);

        AutogroupEvent::removed(&identity).apply(&mut policy);
        assert_eq!(policy.callback().summary_removes(), 1);
    }
}
