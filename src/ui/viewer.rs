use iced::widget::{button, column, container, image, row, text, text_input};
use iced::{Alignment, ContentFit, Element, Length};

use super::dialog;
use crate::app::{Message, Viewer, ViewerMessage};

pub fn view(viewer: &Viewer) -> Element<'_, Message> {
    let id = viewer.id;
    let busy = viewer.job.is_generating();
    let msg = move |message: ViewerMessage| Message::Viewer(id, message);

    let toolbar = row![
        button("Download Image").on_press(msg(ViewerMessage::Export)),
        button("Change Filename").on_press_maybe((!busy).then(|| msg(ViewerMessage::StartRename))),
        button("Delete Image")
            .style(button::danger)
            .on_press_maybe((!busy).then(|| msg(ViewerMessage::RequestDelete))),
    ]
    .spacing(6);

    let picture = container(image(viewer.handle.clone()).content_fit(ContentFit::Contain))
        .width(Length::Fill)
        .height(Length::Fill)
        .center_x(Length::Fill)
        .center_y(Length::Fill);

    let mut content = column![toolbar].spacing(8).padding(8);

    if let Some(value) = &viewer.rename_input {
        content = content.push(
            row![
                text_input("Enter filename:", value)
                    .on_input(move |value| msg(ViewerMessage::RenameChanged(value)))
                    .on_submit(msg(ViewerMessage::ConfirmRename))
                    .padding(6),
                button("Save").on_press(msg(ViewerMessage::ConfirmRename)),
                button("Cancel")
                    .style(button::secondary)
                    .on_press(msg(ViewerMessage::CancelRename)),
            ]
            .spacing(6)
            .align_y(Alignment::Center),
        );
    }

    content = content.push(picture);

    let mut edit_input = text_input("Describe an edit...", &viewer.edit_prompt).padding(6);
    if !busy {
        edit_input = edit_input
            .on_input(move |value| msg(ViewerMessage::EditPromptChanged(value)))
            .on_submit(msg(ViewerMessage::SubmitEdit));
    }
    let edit_action: Element<'_, Message> = if busy {
        dialog::busy_indicator("Editing...")
    } else {
        button("Edit").on_press(msg(ViewerMessage::SubmitEdit)).into()
    };
    content = content.push(
        row![edit_input, edit_action]
            .spacing(6)
            .align_y(Alignment::Center),
    );

    if let Some(status) = &viewer.status {
        content = content.push(text(&status.text).size(12));
    }

    dialog::overlay(content.into(), viewer.dialog.as_ref(), id)
}
