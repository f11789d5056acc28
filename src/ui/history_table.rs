use iced::widget::{button, column, container, row, scrollable, text};
use iced::{Border, Element, Length, Padding, Theme};

use crate::app::Message;
use crate::core::affordance::RowAction;
use crate::core::controller::ReconcileView;
use crate::core::format::{format_local, format_size};
use crate::core::history::GrabHistoryRow;
use crate::theme;
use crate::ui::badges;

const DATE_WIDTH: f32 = 150.0;
const INSTANCE_WIDTH: f32 = 120.0;
const TRACKER_WIDTH: f32 = 120.0;
const SOURCE_WIDTH: f32 = 110.0;
const SIZE_WIDTH: f32 = 80.0;
const ACTION_WIDTH: f32 = 130.0;

pub fn history_table(view: &ReconcileView) -> Element<'_, Message> {
    let header = container(
        row![
            header_cell("Date", Length::Fixed(DATE_WIDTH)),
            header_cell("Instance", Length::Fixed(INSTANCE_WIDTH)),
            header_cell("Tracker", Length::Fixed(TRACKER_WIDTH)),
            header_cell("Source", Length::Fixed(SOURCE_WIDTH)),
            header_cell("Titre", Length::Fill),
            header_cell("Taille", Length::Fixed(SIZE_WIDTH)),
            header_cell("Torrent", Length::Fixed(ACTION_WIDTH)),
        ]
        .spacing(4)
        .align_y(iced::Alignment::Center)
        .padding(Padding::from([8, 16])),
    )
    .width(Length::Fill)
    .style(|_: &Theme| container::Style {
        background: Some(theme::BG_SECONDARY.into()),
        border: Border {
            color: theme::BORDER,
            width: 1.0,
            radius: 0.0.into(),
        },
        ..Default::default()
    });

    let mut rows: Vec<Element<'_, Message>> = view
        .row_actions()
        .map(|(r, action)| history_row(view, r, action))
        .collect();

    if rows.is_empty() {
        let message = if view.is_loading() {
            "Chargement de l'historique..."
        } else {
            "Aucun grab dans l'historique pour ces filtres."
        };
        rows.push(
            container(text(message).size(14).color(theme::TEXT_MUTED))
                .width(Length::Fill)
                .padding(40)
                .center_x(Length::Fill)
                .into(),
        );
    }

    let table_body = scrollable(column(rows).width(Length::Fill))
        .width(Length::Fill)
        .height(Length::Fill);

    column![header, table_body].width(Length::Fill).into()
}

fn header_cell(label: &str, width: Length) -> Element<'static, Message> {
    container(text(label.to_string()).size(12).color(theme::TEXT_MUTED))
        .width(width)
        .into()
}

fn history_row<'a>(
    view: &'a ReconcileView,
    r: &'a GrabHistoryRow,
    action: RowAction,
) -> Element<'a, Message> {
    let date = r
        .grabbed_at()
        .map(format_local)
        .unwrap_or_else(|| "—".to_string());
    let size = r.size.map(format_size).unwrap_or_default();

    let title = button(text(r.display_title()).size(13).color(theme::TEXT_PRIMARY))
        .padding(0)
        .style(|_, status| button::Style {
            background: None,
            text_color: match status {
                button::Status::Hovered => theme::ACCENT_HOVER,
                _ => theme::TEXT_PRIMARY,
            },
            ..Default::default()
        })
        .on_press(Message::OpenDetail(r.key()));

    let row_content = row![
        container(text(date).size(12).color(theme::TEXT_SECONDARY)).width(DATE_WIDTH),
        container(
            text(r.instance.as_deref().unwrap_or("—"))
                .size(12)
                .color(theme::TEXT_SECONDARY),
        )
        .width(INSTANCE_WIDTH),
        container(
            text(r.indexer.as_deref().unwrap_or("—"))
                .size(12)
                .color(theme::TEXT_SECONDARY),
        )
        .width(TRACKER_WIDTH),
        container(badges::source_badge(r.source.as_deref())).width(SOURCE_WIDTH),
        container(title).width(Length::Fill),
        container(text(size).size(12).color(theme::TEXT_MUTED)).width(SIZE_WIDTH),
        container(action_cell(view, action)).width(ACTION_WIDTH),
    ]
    .spacing(4)
    .align_y(iced::Alignment::Center)
    .padding(Padding::from([6, 16]));

    container(row_content)
        .width(Length::Fill)
        .style(|_: &Theme| container::Style {
            background: Some(theme::BG_PRIMARY.into()),
            border: Border {
                color: theme::BORDER,
                width: 0.0,
                radius: 0.0.into(),
            },
            ..Default::default()
        })
        .into()
}

fn action_cell(view: &ReconcileView, action: RowAction) -> Element<'static, Message> {
    match action {
        RowAction::Download { file } => action_button(
            "Télécharger",
            theme::SUCCESS,
            Some(Message::DownloadTorrent(file)),
        ),
        RowAction::Absent => action_button("Absent", theme::DISABLED, None),
        RowAction::Recover(key) => {
            let state = view.button_view(&key);
            let msg = state.enabled.then(|| Message::RecoverPressed(key));
            action_button(state.label, theme::button_tone_color(state.tone), msg)
        }
    }
}

fn action_button(label: &str, color: iced::Color, msg: Option<Message>) -> Element<'static, Message> {
    let label = label.to_string();
    button(text(label).size(11).color(theme::TEXT_PRIMARY))
        .padding(Padding::from([4, 12]))
        .style(move |_, status| {
            let bg = match status {
                button::Status::Hovered => theme::with_alpha(color, 0.85),
                _ => color,
            };
            button::Style {
                background: Some(bg.into()),
                text_color: theme::TEXT_PRIMARY,
                border: Border::default().rounded(4),
                ..Default::default()
            }
        })
        .on_press_maybe(msg)
        .into()
}
