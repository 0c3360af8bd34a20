//! Notification Autogroup - 把同一应用的未分组通知自动归入合成 summary

pub mod cli;
pub mod config;
pub mod notification;
pub mod trace;

pub use config::AutogroupConfig;
pub use notification::{
    AutogroupCallback, AutogroupEvent, AutogroupHandle, AutogroupPolicy, AutogroupService,
    GroupState, NotificationIdentity, NotificationKeyIndex, PackageKey, PostedNotification,
    RecordingSink, SinkCall, TracingSink, AUTOGROUP_AT_COUNT,
};
pub use trace::{check_ordering, parse_trace, read_trace, replay};
