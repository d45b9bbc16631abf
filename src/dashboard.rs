//! The five-tile summary dashboard.
//!
//! Rendering happens in two steps. [`DashboardView::from_result`] reads every
//! field through the placeholder-defaulting accessors of [`AnalysisResult`]
//! into plain owned strings; [`DashboardView::render`] lays those out as
//! terminal text. Neither step can fail: a missing field shows as `N/A`, a
//! missing list shows no bullets, and a missing result shows a single
//! placeholder line instead of the tiles.

use crate::result::{AnalysisResult, ListField, TextField};
use std::fmt;

/// Shown instead of the tiles when no analysis has completed yet.
pub const PLACEHOLDER_MESSAGE: &str =
    "AI Insights will appear here once an analysis has completed.";

const BULLET: &str = "• ";
const MIN_COLUMN_WIDTH: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaTile {
    pub company: String,
    pub period: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentimentTile {
    pub tone: String,
    pub confidence: String,
    pub rationale: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TakeawaysTile {
    pub positives: Vec<String>,
    pub concerns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuidanceTile {
    pub revenue: String,
    pub margin: String,
    pub capex: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationalTile {
    pub capacity_utilization: String,
    pub growth_initiatives: String,
}

/// All five tiles, in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dashboard {
    pub meta: MetaTile,
    pub sentiment: SentimentTile,
    pub takeaways: TakeawaysTile,
    pub guidance: GuidanceTile,
    pub operational: OperationalTile,
}

impl Dashboard {
    pub fn from_result(result: &AnalysisResult) -> Self {
        Self {
            meta: MetaTile {
                company: result.text(TextField::CompanyName),
                period: result.text(TextField::Period),
            },
            sentiment: SentimentTile {
                tone: result.text(TextField::Tone),
                confidence: result.text(TextField::ConfidenceScore),
                rationale: result.text(TextField::Rationale),
            },
            takeaways: TakeawaysTile {
                positives: result.list(ListField::Positives),
                concerns: result.list(ListField::Concerns),
            },
            guidance: GuidanceTile {
                revenue: result.text(TextField::Revenue),
                margin: result.text(TextField::Margin),
                capex: result.text(TextField::Capex),
            },
            operational: OperationalTile {
                capacity_utilization: result.text(TextField::CapacityUtilization),
                growth_initiatives: result.text(TextField::GrowthInitiatives),
            },
        }
    }
}

/// What the dashboard area shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardView {
    /// No result yet.
    Placeholder,
    /// The five tiles.
    Tiles(Box<Dashboard>),
}

/// Terminal layout options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderStyle {
    /// Emit ANSI colour codes.
    pub color: bool,
    /// Total line width used for wrapping and the two-column tile.
    pub width: usize,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            color: false,
            width: 80,
        }
    }
}

impl DashboardView {
    pub fn from_result(result: Option<&AnalysisResult>) -> Self {
        match result {
            Some(r) => DashboardView::Tiles(Box::new(Dashboard::from_result(r))),
            None => DashboardView::Placeholder,
        }
    }

    pub fn tiles(&self) -> Option<&Dashboard> {
        match self {
            DashboardView::Tiles(d) => Some(d),
            DashboardView::Placeholder => None,
        }
    }

    /// Lay the view out as terminal text, ending with a newline.
    pub fn render(&self, style: RenderStyle) -> String {
        let p = Painter { color: style.color };
        let Some(d) = self.tiles() else {
            return format!("{}\n", p.dim(PLACEHOLDER_MESSAGE));
        };

        let inner = style.width.saturating_sub(3).max(MIN_COLUMN_WIDTH * 2 + 2);
        let mut out = String::new();

        // ── Tile 1: meta ────────────────────────────────────────────────
        tile(
            &mut out,
            &p,
            &format!("🏢 {}", d.meta.company),
            vec![format!("{} {}", p.bold("Period:"), d.meta.period)],
        );

        // ── Tile 2: sentiment ───────────────────────────────────────────
        let mut body = vec![format!(
            "{} {}    {} {}",
            p.bold("Tone:"),
            p.cyan(&d.sentiment.tone),
            p.bold("Confidence:"),
            p.cyan(&d.sentiment.confidence)
        )];
        body.extend(labelled_wrap(&p, "Rationale:", &d.sentiment.rationale, inner));
        tile(&mut out, &p, "🧠 Sentiment Analysis", body);

        // ── Tile 3: takeaways, two columns ──────────────────────────────
        let col = (inner - 2) / 2;
        let left = bullet_column(&d.takeaways.positives, col);
        let right = bullet_column(&d.takeaways.concerns, col);
        let mut body = vec![format!(
            "{}  {}",
            p.green(&pad("Positives", col)),
            p.red("Concerns")
        )];
        for i in 0..left.len().max(right.len()) {
            let l = left.get(i).map(String::as_str).unwrap_or("");
            let r = right.get(i).map(String::as_str).unwrap_or("");
            body.push(format!("{}  {}", pad(l, col), r).trim_end().to_string());
        }
        tile(&mut out, &p, "🔑 Key Takeaways", body);

        // ── Tile 4: guidance ────────────────────────────────────────────
        let mut body = Vec::new();
        body.extend(labelled_wrap(&p, "Revenue:", &d.guidance.revenue, inner));
        body.extend(labelled_wrap(&p, "Margin:", &d.guidance.margin, inner));
        body.extend(labelled_wrap(&p, "Capex:", &d.guidance.capex, inner));
        tile(&mut out, &p, "🔮 Guidance & Outlook", body);

        // ── Tile 5: operational ─────────────────────────────────────────
        let mut body = labelled_wrap(
            &p,
            "Capacity Utilization:",
            &d.operational.capacity_utilization,
            inner,
        );
        body.push(p.dim(&"─".repeat(inner.min(40))));
        body.extend(labelled_wrap(
            &p,
            "New Growth Initiatives:",
            &d.operational.growth_initiatives,
            inner,
        ));
        tile(&mut out, &p, "⚙️ Operational Updates", body);

        out
    }
}

impl fmt::Display for DashboardView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(RenderStyle::default()))
    }
}

// ── Layout helpers ───────────────────────────────────────────────────────

fn tile(out: &mut String, p: &Painter, title: &str, body: Vec<String>) {
    out.push_str(&format!("{} {}\n", p.dim("╭─"), p.bold(title)));
    for line in body {
        if line.is_empty() {
            out.push_str(&format!("{}\n", p.dim("│")));
        } else {
            out.push_str(&format!("{}  {}\n", p.dim("│"), line));
        }
    }
    out.push_str(&format!("{}\n", p.dim("╰─")));
}

/// `label value`, wrapped to `width` with continuation lines indented.
fn labelled_wrap(p: &Painter, label: &str, value: &str, width: usize) -> Vec<String> {
    let indent = 2;
    let first_width = width.saturating_sub(label.chars().count() + 1);
    let mut lines = wrap(value, first_width.max(MIN_COLUMN_WIDTH)).into_iter();
    let mut out = vec![format!("{} {}", p.bold(label), lines.next().unwrap_or_default())];
    out.extend(lines.map(|l| format!("{}{}", " ".repeat(indent), l)));
    out
}

/// Bulleted items wrapped to `width`, continuation lines hanging under the text.
fn bullet_column(items: &[String], width: usize) -> Vec<String> {
    let hang = BULLET.chars().count();
    let mut out = Vec::new();
    for item in items {
        for (i, line) in wrap(item, width.saturating_sub(hang)).into_iter().enumerate() {
            if i == 0 {
                out.push(format!("{BULLET}{line}"));
            } else {
                out.push(format!("{}{line}", " ".repeat(hang)));
            }
        }
    }
    out
}

/// Greedy word wrap by character count. Words longer than `width` are split.
/// Always returns at least one line.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if current_len > 0 {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let rest = word.split_off(width);
            lines.push(word.into_iter().collect());
            word = rest;
        }
        let len = word.len();
        if current_len > 0 && current_len + 1 + len > width {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.extend(word);
        current_len += len;
    }
    if current_len > 0 || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Pad `s` with spaces to `width` characters.
fn pad(s: &str, width: usize) -> String {
    let len = s.chars().count();
    if len >= width {
        s.to_string()
    } else {
        format!("{s}{}", " ".repeat(width - len))
    }
}

/// ANSI styling that can be switched off.
struct Painter {
    color: bool,
}

impl Painter {
    fn paint(&self, code: &str, s: &str) -> String {
        if self.color {
            format!("\x1b[{code}m{s}\x1b[0m")
        } else {
            s.to_string()
        }
    }

    fn bold(&self, s: &str) -> String {
        self.paint("1", s)
    }

    fn dim(&self, s: &str) -> String {
        self.paint("2", s)
    }

    fn green(&self, s: &str) -> String {
        self.paint("32", s)
    }

    fn red(&self, s: &str) -> String {
        self.paint("31", s)
    }

    fn cyan(&self, s: &str) -> String {
        self.paint("36", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::NOT_AVAILABLE;
    use serde_json::json;

    #[test]
    fn placeholder_only_without_result() {
        let view = DashboardView::from_result(None);
        assert_eq!(view, DashboardView::Placeholder);
        let text = view.render(RenderStyle::default());
        assert_eq!(text, format!("{PLACEHOLDER_MESSAGE}\n"));
        assert!(!text.contains("Sentiment Analysis"));
    }

    #[test]
    fn empty_object_renders_all_placeholders() {
        let r = AnalysisResult::from_value(json!({}));
        let view = DashboardView::from_result(Some(&r));
        let d = view.tiles().unwrap();
        assert_eq!(d.meta.company, NOT_AVAILABLE);
        assert_eq!(d.sentiment.rationale, NOT_AVAILABLE);
        assert_eq!(d.guidance.capex, NOT_AVAILABLE);
        assert_eq!(d.operational.growth_initiatives, NOT_AVAILABLE);
        assert!(d.takeaways.positives.is_empty());
        assert!(d.takeaways.concerns.is_empty());

        let text = view.to_string();
        assert!(text.contains("🏢 N/A"));
        assert!(text.contains("Capex: N/A"));
        assert!(!text.contains(BULLET));
    }

    #[test]
    fn every_tile_is_rendered() {
        let text = DashboardView::from_result(Some(&AnalysisResult::sample())).to_string();
        for title in [
            "🏢 Sample Corp (demo data)",
            "🧠 Sentiment Analysis",
            "🔑 Key Takeaways",
            "🔮 Guidance & Outlook",
            "⚙️ Operational Updates",
        ] {
            assert!(text.contains(title), "missing {title:?} in:\n{text}");
        }
        assert_eq!(text.matches("╭─").count(), 5);
    }

    #[test]
    fn columns_are_side_by_side() {
        let r = AnalysisResult::from_value(json!({
            "Key Takeaways": {"Positives": ["Pos one", "Pos two"], "Concerns": ["Con one"]}
        }));
        let text = DashboardView::from_result(Some(&r)).to_string();
        let first = text
            .lines()
            .find(|l| l.contains("Pos one"))
            .expect("positive bullet line");
        assert!(first.contains("Con one"), "got line: {first:?}");
        assert!(text.lines().any(|l| l.contains("Pos two") && !l.contains("Con")));
    }

    #[test]
    fn colour_is_optional() {
        let view = DashboardView::from_result(Some(&AnalysisResult::sample()));
        let plain = view.render(RenderStyle::default());
        assert!(!plain.contains('\x1b'));
        let coloured = view.render(RenderStyle {
            color: true,
            width: 80,
        });
        assert!(coloured.contains("\x1b[32m"));
    }

    #[test]
    fn long_rationale_wraps() {
        let long = "word ".repeat(60);
        let r = AnalysisResult::from_value(json!({"Sentiment": {"Rationale": long}}));
        let text = DashboardView::from_result(Some(&r)).render(RenderStyle {
            color: false,
            width: 60,
        });
        let rationale_lines = text.lines().filter(|l| l.contains("word")).count();
        assert!(rationale_lines > 1);
        assert!(text.lines().all(|l| l.chars().count() <= 60), "{text}");
    }

    #[test]
    fn wrap_behaviour() {
        assert_eq!(wrap("", 10), vec![""]);
        assert_eq!(wrap("a b c", 3), vec!["a b", "c"]);
        assert_eq!(wrap("abcdefgh", 3), vec!["abc", "def", "gh"]);
        assert_eq!(wrap("  spaced   out  ", 20), vec!["spaced out"]);
    }
}
