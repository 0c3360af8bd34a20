//! 通知自动分组引擎
//!
//! 当同一应用（同一用户下）出现足够多没有应用 group 的通知时，把它们归入一个合成 summary；
//! 自动分组成员全部消失后移除 summary。
//!
//! # 组成
//! 1. `NotificationKeyIndex`：按 (user_id, package) 记录未分组/已自动分组的通知
//! 2. `AutogroupPolicy`：状态机，决定何时调用回调
//! 3. `AutogroupCallback`：由通知投递管线实现的回调 trait
//! 4. `AutogroupService`：单任务串行处理事件
//!
//! # 使用示例
//! ```ignore
//! use notification_autogroup::notification::{
//!     AutogroupPolicy, NotificationIdentity, RecordingSink,
//! };
//!
//! let mut policy = AutogroupPolicy::new(RecordingSink::new());
//! policy.on_notification_posted(&NotificationIdentity::new(0, "com.app", "k0"), false);
//! ```

pub mod callback;
pub mod event;
pub mod identity;
pub mod index;
pub mod policy;
pub mod service;

pub use callback::{AutogroupCallback, RecordingSink, SinkCall, TracingSink};
pub use event::AutogroupEvent;
pub use identity::{NotificationIdentity, PackageKey, PostedNotification};
pub use index::{NotificationKeyIndex, PostOutcome};
pub use policy::{AutogroupPolicy, GroupState, AUTOGROUP_AT_COUNT};
pub use service::{AutogroupHandle, AutogroupService};
