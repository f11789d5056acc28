use iced::widget::{container, text};
use iced::{Border, Color, Element, Padding, Theme};

use crate::app::Message;
use crate::theme;

fn badge(label: String, color: Color) -> Element<'static, Message> {
    container(text(label).size(10).color(theme::TEXT_PRIMARY))
        .padding(Padding::from([2, 6]))
        .style(move |_: &Theme| container::Style {
            background: Some(color.into()),
            border: Border::default().rounded(3),
            ..Default::default()
        })
        .into()
}

/// Render an ingestion channel badge.
pub fn source_badge(source: Option<&str>) -> Element<'static, Message> {
    let source = source.filter(|s| !s.is_empty()).unwrap_or("inconnu");
    badge(source.to_string(), theme::source_color(source))
}

/// Render the server-side grab status (`missing` when no grab exists).
pub fn status_badge(status: Option<&str>) -> Element<'static, Message> {
    let status = status.filter(|s| !s.is_empty()).unwrap_or("missing");
    let color = match status {
        "missing" => theme::with_alpha(theme::ERROR, 0.7),
        "ok" | "success" | "downloaded" => theme::with_alpha(theme::SUCCESS, 0.7),
        _ => theme::BG_TERTIARY,
    };
    badge(status.to_string(), color)
}
