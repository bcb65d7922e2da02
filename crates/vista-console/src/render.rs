//! Plain-text rendering of section views.

use vista_core::{ListView, Notification};
use vista_model::{PageSlot, Tone};

/// `"[!] Critical"`, optionally colored.
pub fn badge(tone: Tone, label: &str, color: bool) -> String {
    if color {
        format!("\x1b[{}m{} {label}\x1b[0m", tone.ansi(), tone.marker())
    } else {
        format!("{} {label}", tone.marker())
    }
}

/// `"‹ 1 … 6 [7] 8 … 20 ›"`
pub fn pager(window: &[PageSlot], current: usize) -> String {
    let slots: Vec<String> = window
        .iter()
        .map(|slot| match slot {
            PageSlot::Page(n) if *n == current => format!("[{n}]"),
            other => other.to_string(),
        })
        .collect();
    format!("‹ {} ›", slots.join(" "))
}

/// Exactly one of loading / error / empty / content, as lines.
pub fn render_view<T>(title: &str, view: &ListView<T>, row: impl Fn(&T) -> String) -> Vec<String> {
    match view {
        ListView::Idle => vec![format!("{title}: not loaded")],
        ListView::Loading => vec![format!("{title}: loading…")],
        ListView::Error { message } => vec![format!("{title}: {message}"), "  [ retry ]".into()],
        ListView::Empty { filtered_out: true } => {
            vec![format!("{title}: no results match the current filters")]
        }
        ListView::Empty { filtered_out: false } => vec![format!("{title}: nothing here yet")],
        ListView::Ready(result) => {
            let mut lines = Vec::with_capacity(result.items.len() + 2);
            lines.push(format!("{title} ({})", result.total));
            lines.extend(result.items.iter().map(|item| format!("  {}", row(item))));
            if result.total_pages > 1 {
                lines.push(format!("  {}", pager(&view.window(), result.page)));
            }
            lines
        }
    }
}

pub fn render_notifications(notes: &[Notification], color: bool) -> Vec<String> {
    notes
        .iter()
        .map(|n| badge(n.kind.tone(), &n.text, color))
        .collect()
}

#[cfg(test)]
mod tests {
    use vista_core::{QueryResult, compute_window};

    use super::*;

    #[test]
    fn pager_marks_current_page() {
        assert_eq!(pager(&compute_window(7, 20), 7), "‹ 1 … 6 [7] 8 … 20 ›");
        assert_eq!(pager(&compute_window(1, 3), 1), "‹ [1] 2 3 ›");
    }

    #[test]
    fn one_state_per_view() {
        assert_eq!(render_view::<u32>("Flags", &ListView::Loading, |_| unreachable!()), vec!["Flags: loading…"]);
        let lines = render_view::<u32>(
            "Flags",
            &ListView::Error { message: "timed out".into() },
            |_| unreachable!(),
        );
        assert_eq!(lines, vec!["Flags: timed out", "  [ retry ]"]);
        assert_eq!(
            render_view::<u32>("Flags", &ListView::Empty { filtered_out: true }, |_| unreachable!()),
            vec!["Flags: no results match the current filters"]
        );
    }

    #[test]
    fn ready_view_lists_rows_and_pager() {
        let view = ListView::Ready(QueryResult {
            items: vec![11, 12],
            total: 12,
            total_pages: 2,
            page: 2,
        });
        let lines = render_view("Numbers", &view, |n| n.to_string());
        assert_eq!(lines, vec!["Numbers (12)", "  11", "  12", "  ‹ 1 [2] ›"]);
    }

    #[test]
    fn badges() {
        assert_eq!(badge(Tone::Critical, "Critical", false), "[!] Critical");
        assert!(badge(Tone::Positive, "ok", true).starts_with("\x1b[32m"));
    }
}
