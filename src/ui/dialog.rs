use iced::widget::{button, center, column, container, opaque, row, stack, text};
use iced::{window, Alignment, Color, Element};
use iced_aw::Spinner;

use crate::app::{Dialog, Message, ViewerMessage};

/// Draw `dialog` (if any) on top of `base`. The backdrop swallows all
/// input, so nothing underneath can be clicked until the dialog is closed.
pub fn overlay<'a>(
    base: Element<'a, Message>,
    dialog: Option<&'a Dialog>,
    window: window::Id,
) -> Element<'a, Message> {
    let Some(dialog) = dialog else {
        return base;
    };

    let body = match dialog {
        Dialog::Notice(message) => column![
            text(message),
            button("OK").on_press(Message::DismissDialog(window)),
        ],
        Dialog::ConfirmDelete(name) => column![
            text(format!("Are you sure you want to delete '{name}'?")),
            row![
                button("OK").on_press(Message::Viewer(window, ViewerMessage::ConfirmDelete)),
                button("Cancel")
                    .style(button::secondary)
                    .on_press(Message::DismissDialog(window)),
            ]
            .spacing(10),
        ],
    };

    let card = container(body.spacing(16).align_x(Alignment::Center))
        .padding(20)
        .max_width(340.0)
        .style(container::rounded_box);

    stack![
        base,
        opaque(center(opaque(card)).style(|_theme| container::Style {
            background: Some(
                Color {
                    a: 0.7,
                    ..Color::BLACK
                }
                .into()
            ),
            ..container::Style::default()
        }))
    ]
    .into()
}

/// Spinner plus label, shown in place of the action button while a job runs
pub fn busy_indicator<'a>(label: &'a str) -> Element<'a, Message> {
    row![Spinner::new(), text(label)]
        .spacing(10)
        .align_y(Alignment::Center)
        .into()
}
