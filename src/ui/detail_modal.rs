use iced::widget::{button, column, container, mouse_area, row, scrollable, text, Space};
use iced::{Border, Element, Length, Padding, Theme};

use crate::app::Message;
use crate::core::format::format_size;
use crate::core::history::GrabHistoryRow;
use crate::theme;
use crate::ui::badges;

/// Read-only view of one cached row; every field can be copied.
pub fn detail_modal(r: &GrabHistoryRow) -> Element<'_, Message> {
    let fields: [(&str, Option<String>); 10] = [
        ("download_id", r.download_id.clone()),
        ("Instance", r.instance.clone()),
        ("Tracker", r.indexer.clone()),
        ("Source", r.source.clone()),
        ("Dernière source", r.source_last_seen.clone()),
        ("Titre", r.source_title.clone()),
        ("Taille", r.size.map(format_size)),
        ("Date du grab", r.grabbed_at.clone()),
        ("URL d'info", r.info_url.clone()),
        ("Fichier torrent", r.torrent_file.clone()),
    ];

    let field_rows: Vec<Element<'_, Message>> = fields
        .into_iter()
        .map(|(label, value)| field_row(label, value))
        .collect();

    let content = column![
        row![
            text(r.display_title()).size(16).color(theme::TEXT_PRIMARY),
            Space::new().width(Length::Fill),
            badges::status_badge(r.status.as_deref()),
        ]
        .spacing(8)
        .align_y(iced::Alignment::Center),
        column(field_rows).spacing(6),
        Space::new().height(8),
        row![
            Space::new().width(Length::Fill),
            button(text("Fermer").size(13).color(theme::TEXT_PRIMARY))
                .padding(Padding::from([8, 20]))
                .style(|_, _| button::Style {
                    background: Some(theme::BG_TERTIARY.into()),
                    border: Border {
                        color: theme::BORDER,
                        width: 1.0,
                        radius: 6.0.into(),
                    },
                    ..Default::default()
                })
                .on_press(Message::CloseDetail),
        ],
    ]
    .spacing(12)
    .padding(24)
    .width(640);

    let modal = container(scrollable(content).height(Length::Shrink))
        .max_height(640)
        .style(|_: &Theme| container::Style {
            background: Some(theme::BG_SECONDARY.into()),
            border: Border {
                color: theme::BORDER,
                width: 1.0,
                radius: 12.0.into(),
            },
            ..Default::default()
        });

    // Clicks inside the card must not reach the backdrop.
    let card = mouse_area(modal).on_press(Message::Noop);

    mouse_area(
        container(card)
            .width(Length::Fill)
            .height(Length::Fill)
            .center_x(Length::Fill)
            .center_y(Length::Fill)
            .style(|_: &Theme| container::Style {
                background: Some(iced::Color::from_rgba(0.0, 0.0, 0.0, 0.6).into()),
                ..Default::default()
            }),
    )
    .on_press(Message::CloseDetail)
    .into()
}

fn field_row(label: &str, value: Option<String>) -> Element<'static, Message> {
    let value = value.filter(|v| !v.trim().is_empty());
    let shown = value.clone().unwrap_or_else(|| "—".to_string());

    let copy = button(text("Copier").size(11).color(theme::TEXT_PRIMARY))
        .padding(Padding::from([2, 10]))
        .style(|_, status| button::Style {
            background: Some(
                match status {
                    button::Status::Hovered => theme::BG_HOVER,
                    _ => theme::BG_TERTIARY,
                }
                .into(),
            ),
            border: Border::default().rounded(4),
            ..Default::default()
        })
        .on_press_maybe(value.map(Message::CopyField));

    row![
        container(text(label.to_string()).size(12).color(theme::TEXT_MUTED)).width(130),
        container(text(shown).size(12).color(theme::TEXT_SECONDARY)).width(Length::Fill),
        copy,
    ]
    .spacing(8)
    .align_y(iced::Alignment::Center)
    .into()
}
