use crate::domain::model::{JobRecord, SourceOutcome};
use std::collections::HashMap;

/// Merges per-source outcomes into one deduplicated job list. Input order
/// does not matter: outcomes are re-ordered by the configured source
/// priority before merging, so the result is deterministic and idempotent.
pub struct Deduplicator {
    /// Source names in priority order (registry position)
    priority: Vec<String>,
}

impl Deduplicator {
    pub fn new(priority_order: Vec<String>) -> Self {
        Self {
            priority: priority_order
                .into_iter()
                .map(|name| name.to_lowercase())
                .collect(),
        }
    }

    fn priority_index(&self, source: &str) -> usize {
        let lowered = source.to_lowercase();
        self.priority
            .iter()
            .position(|name| *name == lowered)
            .unwrap_or(usize::MAX)
    }

    pub fn merge(&self, outcomes: &[SourceOutcome]) -> Vec<JobRecord> {
        let mut ordered: Vec<&SourceOutcome> = outcomes.iter().collect();
        // 未列在優先序裡的來源排最後，再以名稱排序保持穩定
        ordered.sort_by_key(|o| (self.priority_index(&o.source), o.source.clone()));

        let mut seen: HashMap<String, usize> = HashMap::new();
        let mut merged: Vec<JobRecord> = Vec::new();

        for outcome in ordered {
            for record in &outcome.records {
                let key = identity_key(record);
                match seen.get(&key) {
                    None => {
                        seen.insert(key, merged.len());
                        merged.push(record.clone());
                    }
                    Some(&index) => {
                        // 欄位較齊全的紀錄勝出，但保留先出現的位置
                        if record.filled_fields() > merged[index].filled_fields() {
                            merged[index] = record.clone();
                        }
                    }
                }
            }
        }

        merged
    }
}

fn normalize(value: &str) -> String {
    value.to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Identity key: normalized title + company + location.
pub fn identity_key(record: &JobRecord) -> String {
    format!(
        "{}\u{1f}{}\u{1f}{}",
        normalize(&record.title),
        normalize(&record.company),
        normalize(record.location.as_deref().unwrap_or("")),
    )
}
