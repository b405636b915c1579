use iced::widget::{button, column, container, row, text, text_input};
use iced::{Alignment, Element, Length};

use super::dialog;
use crate::app::{MainWindow, Message, Page};

pub fn view(main: &MainWindow) -> Element<'_, Message> {
    let busy = main.job.is_generating();

    // Without handlers the input is rendered disabled.
    let mut input = text_input("Describe your image...", &main.prompt)
        .padding(8)
        .width(Length::Fill);
    if !busy {
        input = input
            .on_input(Message::PromptChanged)
            .on_submit(Message::Submit);
    }

    let mut input_row = row![input].spacing(8).align_y(Alignment::Center);
    if main.attach_visible {
        let label = if main.attachment.is_some() {
            "Added!"
        } else {
            "Add File"
        };
        let style = if main.attachment.is_some() {
            button::success
        } else {
            button::primary
        };
        input_row = input_row.push(
            button(text(label).size(13))
                .style(style)
                .on_press_maybe((!busy).then_some(Message::PickAttachment)),
        );
    }

    let action: Element<'_, Message> = if busy {
        dialog::busy_indicator("Generating...")
    } else {
        button("✨ Generate ✨")
            .on_press(Message::Submit)
            .padding(10)
            .into()
    };

    let mut content = column![
        text("Image Generator").size(30),
        text("Press 'F2' to upload an image").size(11),
        input_row,
    ]
    .spacing(12)
    .padding(20)
    .align_x(Alignment::Center);

    if let Some(name) = main
        .attachment
        .as_ref()
        .and_then(|path| path.file_name())
        .filter(|_| main.attach_visible)
    {
        content = content.push(text(format!("Editing {}", name.to_string_lossy())).size(11));
    }

    content = content.push(action).push(
        button("Saved Images")
            .style(button::secondary)
            .on_press(Message::ShowPage(Page::Library)),
    );

    container(content)
        .width(Length::Fill)
        .height(Length::Fill)
        .center_x(Length::Fill)
        .center_y(Length::Fill)
        .into()
}
