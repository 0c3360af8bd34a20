//! Event trace (JSONL) reading and replay.
//!
//! One `AutogroupEvent` per line. Blank lines and `#` comments are skipped.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;
use tracing::warn;

use crate::notification::{
    AutogroupCallback, AutogroupEvent, AutogroupPolicy, GroupState, PackageKey,
};

/// Parse a JSONL trace. Errors carry the 1-based line number.
pub fn parse_trace(content: &str) -> Result<Vec<AutogroupEvent>> {
    let mut events = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let event: AutogroupEvent = serde_json::from_str(line)
            .with_context(|| format!("Invalid event on line {}", idx + 1))?;
        events.push(event);
    }

    Ok(events)
}

pub fn read_trace(path: &Path) -> Result<Vec<AutogroupEvent>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read trace {}", path.display()))?;
    parse_trace(&content)
}

/// Count events whose timestamp goes backwards for the same package.
///
/// The policy relies on per-package ordering, so these are logged. Events
/// without `ts` are not checked.
pub fn check_ordering(events: &[AutogroupEvent]) -> usize {
    let mut last_seen: HashMap<PackageKey, DateTime<Utc>> = HashMap::new();
    let mut out_of_order = 0;

    for (idx, event) in events.iter().enumerate() {
        let Some(ts) = event.ts() else { continue };
        let package = event.identity().package_key();

        match last_seen.get(&package) {
            Some(prev) if ts < *prev => {
                warn!(
                    package = %package,
                    event_index = idx,
                    ts = %ts,
                    previous = %prev,
                    "Event timestamp goes backwards for package"
                );
                out_of_order += 1;
            }
            _ => {
                last_seen.insert(package, ts);
            }
        }
    }

    out_of_order
}

/// Packages touched by the trace, in sorted order
pub fn touched_packages(events: &[AutogroupEvent]) -> Vec<PackageKey> {
    events
        .iter()
        .map(|e| e.identity().package_key())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Final state of every package touched by the trace
pub fn final_states<C: AutogroupCallback>(
    events: &[AutogroupEvent],
    policy: &AutogroupPolicy<C>,
) -> Vec<(PackageKey, GroupState)> {
    touched_packages(events)
        .into_iter()
        .map(|package| {
            let state = policy.state(&package);
            (package, state)
        })
        .collect()
}

/// Feed events through the policy in file order.
pub fn replay<C: AutogroupCallback>(events: &[AutogroupEvent], policy: &mut AutogroupPolicy<C>) {
    for event in events {
        event.apply(policy);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::RecordingSink;

    const TRACE: &str = r#"
# four ungrouped posts cross the threshold
{"event":"posted","user_id":0,"package":"com.app","key":"k0"}
{"event":"posted","user_id":0,"package":"com.app","key":"k1"}

{"event":"posted","user_id":0,"package":"com.other","key":"x","app_group":true}
{"event":"posted","user_id":0,"package":"com.app","key":"k2"}
{"event":"posted","user_id":0,"package":"com.app","key":"k3"}
{"event":"removed","user_id":0,"package":"com.app","key":"k0"}
"#;

    #[test]
    fn test_parse_skips_blank_and_comments() {
        let events = parse_trace(TRACE).unwrap();
        assert_eq!(events.len(), 6);
    }

    #[test]
    fn test_parse_error_names_line() {
        let content = concat!(
            r#"{"event":"posted","user_id":0,"package":"a","key":"k"}"#,
            "\n{broken"
        );
        let err = parse_trace(content).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_replay_and_final_states() {
        let events = parse_trace(TRACE).unwrap();
        let mut policy = AutogroupPolicy::new(RecordingSink::new());
        replay(&events, &mut policy);

        assert_eq!(policy.callback().summary_adds(), 1);
        assert_eq!(policy.callback().membership_grants(), vec!["k0", "k1", "k2", "k3"]);

        let states = final_states(&events, &policy);
        assert_eq!(
            states,
            vec![
                (PackageKey::new(0, "com.app"), GroupState::Grouped),
                (PackageKey::new(0, "com.other"), GroupState::None),
            ]
        );
    }

    #[test]
    fn test_check_ordering_per_package() {
        let content = r#"
{"event":"posted","user_id":0,"package":"a","key":"1","ts":"2024-01-01T00:00:10Z"}
{"event":"posted","user_id":0,"package":"b","key":"1","ts":"2024-01-01T00:00:05Z"}
{"event":"posted","user_id":0,"package":"a","key":"2","ts":"2024-01-01T00:00:01Z"}
{"event":"posted","user_id":0,"package":"a","key":"3"}
"#;
        let events = parse_trace(content).unwrap();
        // b being earlier than a is fine, only a going backwards counts
        assert_eq!(check_ordering(&events), 1);
    }

    #[test]
    fn test_read_trace_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_trace(&dir.path().join("missing.jsonl")).unwrap_err();
        assert!(err.to_string().contains("Failed to read trace"));
    }
}
