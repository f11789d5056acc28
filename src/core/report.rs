use chrono::{DateTime, Local};

use crate::core::affordance::RowAction;
use crate::core::format::format_size;
use crate::core::history::{GrabHistoryRow, HistorySummary};

/// Escape text for HTML element content and quoted attribute values.
pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// HTML builder that escapes every dynamic value. Markup only comes from
/// the `'static` tag and attribute names passed to its methods.
#[derive(Debug, Default)]
pub struct Html {
    buf: String,
}

impl Html {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, tag: &'static str) -> &mut Self {
        self.buf.push('<');
        self.buf.push_str(tag);
        self.buf.push('>');
        self
    }

    pub fn open_with(&mut self, tag: &'static str, attrs: &[(&'static str, &str)]) -> &mut Self {
        self.buf.push('<');
        self.buf.push_str(tag);
        for (name, value) in attrs {
            self.buf.push(' ');
            self.buf.push_str(name);
            self.buf.push_str("=\"");
            self.buf.push_str(&escape(value));
            self.buf.push('"');
        }
        self.buf.push('>');
        self
    }

    pub fn close(&mut self, tag: &'static str) -> &mut Self {
        self.buf.push_str("</");
        self.buf.push_str(tag);
        self.buf.push('>');
        self
    }

    pub fn text(&mut self, value: &str) -> &mut Self {
        self.buf.push_str(&escape(value));
        self
    }

    /// `<tag>value</tag>` with the value escaped.
    pub fn element(&mut self, tag: &'static str, value: &str) -> &mut Self {
        self.open(tag).text(value).close(tag)
    }

    pub fn finish(self) -> String {
        self.buf
    }
}

const STYLE: &str = "body{font-family:sans-serif;background:#0c0f1a;color:#e8eaf0}\
table{border-collapse:collapse;width:100%}\
th,td{border:1px solid #2a2f4a;padding:4px 8px;font-size:13px}\
th{background:#141829;text-align:left}";

/// Standalone HTML page listing the given rows.
pub fn render_report(
    rows: &[GrabHistoryRow],
    summary: &HistorySummary,
    generated_at: DateTime<Local>,
) -> String {
    let mut html = Html::new();
    html.open("html").open("head");
    html.open_with("meta", &[("charset", "utf-8")]);
    html.element("title", "Historique des grabs");
    html.element("style", STYLE);
    html.close("head").open("body");

    html.element("h1", "Historique des grabs");
    html.element(
        "p",
        &format!(
            "Généré le {} · {} grabs · {} webhook · {} sans torrent · dernier grab: {}",
            generated_at.format("%d/%m/%Y %H:%M:%S"),
            summary.total,
            summary.webhook,
            summary.missing,
            summary.last_grab_label(),
        ),
    );

    html.open("table").open("tr");
    for header in ["Date", "Instance", "Tracker", "Source", "Titre", "Taille", "download_id", "Torrent"] {
        html.element("th", header);
    }
    html.close("tr");

    for row in rows {
        html.open("tr");
        html.element("td", row.grabbed_at.as_deref().unwrap_or(""));
        html.element("td", row.instance.as_deref().unwrap_or(""));
        html.element("td", row.indexer.as_deref().unwrap_or(""));
        html.element("td", row.source.as_deref().unwrap_or(""));
        html.open("td");
        match row.info_url.as_deref().filter(|u| is_web_url(u)) {
            Some(url) => {
                html.open_with("a", &[("href", url)]).text(row.display_title()).close("a");
            }
            None => {
                html.text(row.display_title());
            }
        }
        html.close("td");
        html.element("td", &row.size.map(format_size).unwrap_or_default());
        html.element("td", row.download_id.as_deref().unwrap_or(""));
        let torrent = match RowAction::resolve(row) {
            RowAction::Download { file } => file,
            RowAction::Absent => "Absent".to_string(),
            RowAction::Recover(_) => "manquant".to_string(),
        };
        html.element("td", &torrent);
        html.close("tr");
    }

    html.close("table").close("body").close("html");
    format!("<!DOCTYPE html>{}", html.finish())
}

fn is_web_url(url: &str) -> bool {
    let url = url.trim().to_lowercase();
    url.starts_with("http://") || url.starts_with("https://")
}
