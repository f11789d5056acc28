use iced::widget::{container, pick_list, row, text, text_input, Space};
use iced::{Border, Element, Length, Padding, Theme};

use crate::app::Message;
use crate::core::controller::FilterChange;
use crate::core::history::{FilterOptions, HistoryFilters, SortKey, SOURCE_OPTIONS};
use crate::theme;

const ALL_INSTANCES: &str = "Toutes les instances";
const ALL_TRACKERS: &str = "Tous les trackers";
const ALL_SOURCES: &str = "Toutes les sources";

pub fn filters_bar<'a>(
    filters: &'a HistoryFilters,
    options: &'a FilterOptions,
    sort: SortKey,
    loading: bool,
) -> Element<'a, Message> {
    let search = text_input("Rechercher un download_id...", &filters.download_id)
        .on_input(|v| Message::FilterChanged(FilterChange::DownloadId(v)))
        .width(264)
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

    let instance_pick = optional_pick(
        ALL_INSTANCES,
        &options.instances,
        filters.instance.as_deref(),
        |v| Message::FilterChanged(FilterChange::Instance(v)),
    );

    let tracker_pick = optional_pick(
        ALL_TRACKERS,
        &options.trackers,
        filters.tracker.as_deref(),
        |v| Message::FilterChanged(FilterChange::Tracker(v)),
    );

    let sources: Vec<String> = SOURCE_OPTIONS.iter().map(|s| s.to_string()).collect();
    let source_pick = optional_pick(
        ALL_SOURCES,
        &sources,
        filters.source.as_deref(),
        |v| Message::FilterChanged(FilterChange::Source(v)),
    );

    let sort_pick = pick_list(SortKey::ALL, Some(sort), |s| {
        Message::FilterChanged(FilterChange::Sort(s))
    })
    .text_size(13)
    .padding(Padding::from([4, 8]));

    let status: Element<'a, Message> = if loading {
        text("Chargement...").size(12).color(theme::TEXT_MUTED).into()
    } else {
        Space::new().width(0).into()
    };

    container(
        row![
            search,
            instance_pick,
            tracker_pick,
            source_pick,
            Space::new().width(Length::Fill),
            status,
            text("Tri").size(12).color(theme::TEXT_MUTED),
            sort_pick,
        ]
        .spacing(8)
        .align_y(iced::Alignment::Center)
        .padding(Padding::from([8, 20])),
    )
    .width(Length::Fill)
    .style(|_: &Theme| container::Style {
        border: Border {
            color: theme::BORDER,
            width: 1.0,
            radius: 0.0.into(),
        },
        ..Default::default()
    })
    .into()
}

/// A pick list with a leading "all" entry that maps to `None`.
fn optional_pick<'a>(
    all_label: &'static str,
    values: &[String],
    selected: Option<&str>,
    on_select: impl Fn(Option<String>) -> Message + 'a,
) -> Element<'a, Message> {
    let options: Vec<String> = std::iter::once(all_label.to_string())
        .chain(values.iter().cloned())
        .collect();
    let selected = selected.unwrap_or(all_label).to_string();

    pick_list(options, Some(selected), move |val| {
        if val == all_label {
            on_select(None)
        } else {
            on_select(Some(val))
        }
    })
    .text_size(13)
    .padding(Padding::from([4, 8]))
    .into()
}
