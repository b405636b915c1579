use iced::widget::{button, column, container, scrollable, text};
use iced::{Alignment, Element, Length};

use crate::app::{Message, Page};
use crate::state::data::StoredImage;

/// List of saved images; clicking one opens it in the viewer
pub fn view(images: &[StoredImage]) -> Element<'_, Message> {
    let list: Element<'_, Message> = if images.is_empty() {
        container(text("No saved images yet").size(14))
            .width(Length::Fill)
            .height(Length::Fill)
            .center_x(Length::Fill)
            .center_y(Length::Fill)
            .into()
    } else {
        scrollable(
            column(images.iter().map(|image| {
                button(text(&image.name))
                    .width(Length::Fill)
                    .style(button::text)
                    .on_press(Message::OpenImage(image.name.clone()))
                    .into()
            }))
            .spacing(2),
        )
        .height(Length::Fill)
        .into()
    };

    column![
        list,
        button("Back")
            .style(button::secondary)
            .on_press(Message::ShowPage(Page::Prompt)),
    ]
    .spacing(10)
    .padding(12)
    .align_x(Alignment::Center)
    .into()
}
