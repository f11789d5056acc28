use iced::widget::{column, container, mouse_area, text};
use iced::{Border, Element, Length, Padding, Theme};
use std::time::{Duration, Instant};

use crate::app::Message;
use crate::core::notice::{Notice, NoticeLevel};
use crate::theme;

/// How long a toast stays on screen unless clicked away.
pub const TOAST_LIFETIME: Duration = Duration::from_millis(3500);

#[derive(Debug, Clone)]
pub struct Toast {
    pub id: u64,
    pub message: String,
    pub level: NoticeLevel,
    pub created_at: Instant,
}

impl Toast {
    pub fn new(id: u64, notice: Notice) -> Self {
        Self {
            id,
            message: notice.message,
            level: notice.level,
            created_at: Instant::now(),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() > TOAST_LIFETIME
    }
}

/// Render the toast stack (bottom-right, overlaid via Stack).
pub fn toast_container(toasts: &[Toast]) -> Element<'_, Message> {
    if toasts.is_empty() {
        return container(column![]).width(0).height(0).into();
    }

    let toast_views: Vec<Element<'_, Message>> = toasts
        .iter()
        .map(|t| {
            let color = theme::notice_color(t.level);
            let bg_color = theme::with_alpha(color, 0.12);
            let id = t.id;

            mouse_area(
                container(text(&t.message).size(13).color(color))
                    .padding(Padding::from([10, 16]))
                    .width(360)
                    .style(move |_: &Theme| container::Style {
                        background: Some(bg_color.into()),
                        border: Border {
                            color,
                            width: 1.0,
                            radius: 8.0.into(),
                        },
                        ..Default::default()
                    }),
            )
            .on_press(Message::DismissToast(id))
            .into()
        })
        .collect();

    container(column(toast_views).spacing(8))
        .padding(16)
        .width(Length::Shrink)
        .into()
}
