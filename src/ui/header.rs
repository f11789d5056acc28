use iced::widget::{button, column, container, row, text, Space};
use iced::{Border, Element, Length, Padding, Theme};

use crate::app::Message;
use crate::core::history::HistorySummary;
use crate::theme;

pub fn header_bar(
    summary: &HistorySummary,
    server_url: &str,
    syncing: bool,
    exporting: bool,
) -> Element<'static, Message> {
    let title = column![
        row![
            text("Grab").size(20).color(theme::ACCENT),
            text("Desk").size(20).color(theme::TEXT_PRIMARY),
        ]
        .spacing(0),
        text(server_url.to_string()).size(11).color(theme::TEXT_MUTED),
    ]
    .spacing(2);

    let last_grab = summary.last_grab_label();
    let counters = row![
        counter("Total", summary.total.to_string()),
        counter("Webhook", summary.webhook.to_string()),
        counter("Sans torrent", summary.missing.to_string()),
        counter("Dernier grab", if last_grab.is_empty() { "—".to_string() } else { last_grab }),
    ]
    .spacing(20)
    .align_y(iced::Alignment::Center);

    let left = row![title, Space::new().width(32), counters].align_y(iced::Alignment::Center);

    let export_btn = styled_button("Exporter", (!exporting).then_some(Message::ExportRequested));
    let settings_btn = styled_button("Paramètres", Some(Message::ToggleSettings));
    let reload_btn = styled_button("Actualiser", Some(Message::Reload));

    let sync_label = if syncing { "Synchronisation..." } else { "Synchroniser" };
    let sync_btn = button(text(sync_label).size(13).color(theme::TEXT_PRIMARY))
        .padding(Padding::from([6, 16]))
        .style(move |_, status| {
            let bg = match status {
                button::Status::Hovered => theme::ACCENT_HOVER,
                button::Status::Disabled => theme::DISABLED,
                _ => theme::ACCENT,
            };
            button::Style {
                background: Some(bg.into()),
                text_color: theme::TEXT_PRIMARY,
                border: Border::default().rounded(6),
                ..Default::default()
            }
        })
        .on_press_maybe(if syncing { None } else { Some(Message::SyncRequested) });

    let right = row![export_btn, settings_btn, reload_btn, sync_btn]
        .spacing(8)
        .align_y(iced::Alignment::Center);

    container(
        row![left, Space::new().width(Length::Fill), right]
            .align_y(iced::Alignment::Center)
            .padding(Padding::from([12, 20])),
    )
    .width(Length::Fill)
    .style(|_: &Theme| container::Style {
        background: Some(theme::BG_SECONDARY.into()),
        ..Default::default()
    })
    .into()
}

fn counter(label: &str, value: String) -> Element<'static, Message> {
    column![
        text(label.to_string()).size(11).color(theme::TEXT_MUTED),
        text(value).size(15).color(theme::TEXT_PRIMARY),
    ]
    .spacing(2)
    .into()
}

fn styled_button(label: &str, msg: Option<Message>) -> Element<'static, Message> {
    let label = label.to_string();
    button(text(label).size(13).color(theme::TEXT_PRIMARY))
        .padding(Padding::from([6, 14]))
        .style(|_, status| {
            let bg = match status {
                button::Status::Hovered => theme::BG_HOVER,
                _ => theme::BG_TERTIARY,
            };
            button::Style {
                background: Some(bg.into()),
                text_color: theme::TEXT_PRIMARY,
                border: Border {
                    color: theme::BORDER,
                    width: 1.0,
                    radius: 6.0.into(),
                },
                ..Default::default()
            }
        })
        .on_press_maybe(msg)
        .into()
}
