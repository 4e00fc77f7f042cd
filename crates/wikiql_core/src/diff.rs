use serde::Serialize;
use similar::{Algorithm, DiffTag, capture_diff_slices};

pub const DEFAULT_CONTEXT_LINES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffKind {
    Unchanged,
    Add,
    Remove,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffEntry {
    #[serde(rename = "type")]
    pub kind: DiffKind,
    /// 1-based.
    pub line_num: usize,
    pub content: String,
}

impl DiffEntry {
    fn new(kind: DiffKind, line_num: usize, content: &str) -> Self {
        Self {
            kind,
            line_num,
            content: content.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiffStats {
    pub added: usize,
    pub removed: usize,
    pub unchanged: usize,
}

impl DiffStats {
    pub fn has_changes(&self) -> bool {
        self.added > 0 || self.removed > 0
    }
}

/// Positional line diff: line `i` of `before` is compared with line `i` of
/// `after`, with no alignment. One inserted line therefore marks every later
/// line as changed. Use [`diff_lines_aligned`] when that matters.
pub fn diff_lines(before: &str, after: &str) -> Vec<DiffEntry> {
    let old = before.split('\n').collect::<Vec<_>>();
    let new = after.split('\n').collect::<Vec<_>>();
    let mut entries = Vec::with_capacity(old.len().max(new.len()));

    for index in 0..old.len().max(new.len()) {
        let line_num = index + 1;
        match (old.get(index), new.get(index)) {
            (None, Some(added)) => entries.push(DiffEntry::new(DiffKind::Add, line_num, added)),
            (Some(removed), None) => {
                entries.push(DiffEntry::new(DiffKind::Remove, line_num, removed))
            }
            (Some(removed), Some(added)) if removed != added => {
                entries.push(DiffEntry::new(DiffKind::Remove, line_num, removed));
                entries.push(DiffEntry::new(DiffKind::Add, line_num, added));
            }
            (Some(same), Some(_)) => {
                entries.push(DiffEntry::new(DiffKind::Unchanged, line_num, same))
            }
            (None, None) => {}
        }
    }
    entries
}

/// Myers-aligned line diff. Removed lines carry their line number in
/// `before`; added and unchanged lines carry their number in `after`.
pub fn diff_lines_aligned(before: &str, after: &str) -> Vec<DiffEntry> {
    let old = before.split('\n').collect::<Vec<_>>();
    let new = after.split('\n').collect::<Vec<_>>();
    let mut entries = Vec::new();

    for op in capture_diff_slices(Algorithm::Myers, &old, &new) {
        let (tag, old_range, new_range) = op.as_tag_tuple();
        match tag {
            DiffTag::Equal => {
                for index in new_range {
                    entries.push(DiffEntry::new(DiffKind::Unchanged, index + 1, new[index]));
                }
            }
            DiffTag::Delete => {
                for index in old_range {
                    entries.push(DiffEntry::new(DiffKind::Remove, index + 1, old[index]));
                }
            }
            DiffTag::Insert => {
                for index in new_range {
                    entries.push(DiffEntry::new(DiffKind::Add, index + 1, new[index]));
                }
            }
            DiffTag::Replace => {
                for index in old_range {
                    entries.push(DiffEntry::new(DiffKind::Remove, index + 1, old[index]));
                }
                for index in new_range {
                    entries.push(DiffEntry::new(DiffKind::Add, index + 1, new[index]));
                }
            }
        }
    }
    entries
}

pub fn diff_stats(entries: &[DiffEntry]) -> DiffStats {
    let mut stats = DiffStats::default();
    for entry in entries {
        match entry.kind {
            DiffKind::Add => stats.added += 1,
            DiffKind::Remove => stats.removed += 1,
            DiffKind::Unchanged => stats.unchanged += 1,
        }
    }
    stats
}

/// Render changed entries plus `context_lines` unchanged entries around
/// them. Context distance is counted in entries, not line numbers. A `...`
/// line marks each jump in line numbers after the first printed line.
pub fn format_diff(entries: &[DiffEntry], context_lines: usize) -> String {
    let changed = entries
        .iter()
        .enumerate()
        .filter(|(_, entry)| entry.kind != DiffKind::Unchanged)
        .map(|(index, _)| index)
        .collect::<Vec<_>>();

    let mut lines = Vec::new();
    let mut last_printed: Option<usize> = None;
    for (index, entry) in entries.iter().enumerate() {
        let visible = entry.kind != DiffKind::Unchanged
            || changed
                .iter()
                .any(|&changed_index| changed_index.abs_diff(index) <= context_lines);
        if !visible {
            continue;
        }
        if let Some(previous) = last_printed
            && entry.line_num > previous + 1
        {
            lines.push("...".to_string());
        }
        let prefix = match entry.kind {
            DiffKind::Add => "+ ",
            DiffKind::Remove => "- ",
            DiffKind::Unchanged => "  ",
        };
        lines.push(format!("{prefix}{}", entry.content));
        last_printed = Some(entry.line_num);
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(entries: &[DiffEntry]) -> Vec<(DiffKind, usize)> {
        entries.iter().map(|entry| (entry.kind, entry.line_num)).collect()
    }

    #[test]
    fn identical_texts_are_unchanged() {
        let entries = diff_lines("line1\nline2", "line1\nline2");
        assert_eq!(
            kinds(&entries),
            vec![(DiffKind::Unchanged, 1), (DiffKind::Unchanged, 2)]
        );
    }

    #[test]
    fn changed_line_is_remove_then_add_on_same_number() {
        let entries = diff_lines("old", "new");
        assert_eq!(kinds(&entries), vec![(DiffKind::Remove, 1), (DiffKind::Add, 1)]);
        assert_eq!(entries[0].content, "old");
        assert_eq!(entries[1].content, "new");
    }

    #[test]
    fn length_mismatch_adds_or_removes_tail() {
        assert_eq!(
            kinds(&diff_lines("a", "a\nb")),
            vec![(DiffKind::Unchanged, 1), (DiffKind::Add, 2)]
        );
        assert_eq!(
            kinds(&diff_lines("a\nb", "a")),
            vec![(DiffKind::Unchanged, 1), (DiffKind::Remove, 2)]
        );
    }

    #[test]
    fn positional_diff_shifts_after_insert_but_aligned_does_not() {
        let before = "a\nb\nc";
        let after = "x\na\nb\nc";
        let positional = diff_stats(&diff_lines(before, after));
        assert_eq!(positional.unchanged, 0);
        assert_eq!(positional.added, 4);
        assert_eq!(positional.removed, 3);

        let aligned = diff_lines_aligned(before, after);
        assert_eq!(
            kinds(&aligned),
            vec![
                (DiffKind::Add, 1),
                (DiffKind::Unchanged, 2),
                (DiffKind::Unchanged, 3),
                (DiffKind::Unchanged, 4)
            ]
        );
        assert_eq!(diff_stats(&aligned).added, 1);
    }

    #[test]
    fn format_diff_limits_context_and_marks_gaps() {
        let before = (1..=12).map(|n| format!("l{n}")).collect::<Vec<_>>().join("\n");
        let after = before.replace("l2\n", "L2\n").replace("l11", "L11");
        let rendered = format_diff(&diff_lines(&before, &after), 1);

        assert_eq!(
            rendered,
            ["  l1", "- l2", "+ L2", "  l3", "...", "  l10", "- l11", "+ L11", "  l12"].join("\n")
        );
    }

    #[test]
    fn format_diff_of_identical_texts_is_empty() {
        let entries = diff_lines("same\ntext", "same\ntext");
        assert_eq!(format_diff(&entries, DEFAULT_CONTEXT_LINES), "");
        assert!(!diff_stats(&entries).has_changes());
    }
}
