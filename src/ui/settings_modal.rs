use iced::widget::{button, column, container, mouse_area, row, text, text_input, Space};
use iced::{Border, Element, Length, Padding, Theme};
use std::collections::HashMap;

use crate::app::Message;
use crate::db::schema::SettingKey;
use crate::theme;

pub fn settings_modal(draft: &HashMap<String, String>) -> Element<'_, Message> {
    let fields: Vec<Element<'_, Message>> = SettingKey::ALL
        .iter()
        .map(|key| {
            let value = draft.get(key.as_str()).map(String::as_str).unwrap_or("");
            settings_field(*key, value)
        })
        .collect();

    let content = column![
        text("Paramètres").size(18).color(theme::TEXT_PRIMARY),
        column(fields).spacing(12),
        Space::new().height(8),
        row![
            button(text("Annuler").size(13).color(theme::TEXT_PRIMARY))
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
                .on_press(Message::ToggleSettings),
            Space::new().width(Length::Fill),
            button(text("Enregistrer").size(13).color(theme::TEXT_PRIMARY))
                .padding(Padding::from([8, 20]))
                .style(|_, _| button::Style {
                    background: Some(theme::ACCENT.into()),
                    border: Border::default().rounded(6),
                    ..Default::default()
                })
                .on_press(Message::SaveSettings),
        ]
        .align_y(iced::Alignment::Center),
    ]
    .spacing(12)
    .padding(24)
    .width(520);

    let modal = container(content).style(|_: &Theme| container::Style {
        background: Some(theme::BG_SECONDARY.into()),
        border: Border {
            color: theme::BORDER,
            width: 1.0,
            radius: 12.0.into(),
        },
        ..Default::default()
    });

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
    .on_press(Message::ToggleSettings)
    .into()
}

fn settings_field(key: SettingKey, value: &str) -> Element<'_, Message> {
    let mut input = text_input("", value)
        .on_input(move |v| Message::SettingChanged(key, v))
        .size(13)
        .padding(Padding::from([6, 10]))
        .style(|_, _| text_input::Style {
            background: theme::BG_TERTIARY.into(),
            border: Border {
                color: theme::BORDER,
                width: 1.0,
                radius: 6.0.into(),
            },
            icon: theme::TEXT_MUTED,
            placeholder: theme::TEXT_MUTED,
            value: theme::TEXT_PRIMARY,
            selection: theme::ACCENT,
        });
    if key == SettingKey::SessionToken {
        input = input.secure(true);
    }

    column![text(key.label()).size(13).color(theme::TEXT_SECONDARY), input]
        .spacing(4)
        .into()
}
