/// User interface module
///
/// Pure view code, one file per screen:
/// - Prompt page with the generate button (prompt.rs)
/// - Saved images list (gallery.rs)
/// - Image viewer window with its toolbar (viewer.rs)
/// - Modal dialogs and the busy indicator shared by all of them (dialog.rs)

pub mod dialog;
pub mod gallery;
pub mod prompt;
pub mod viewer;

use iced::widget::{column, text};
use iced::{Element, Length};

use crate::app::{MainWindow, Message, Page};
use crate::state::data::StoredImage;

/// Everything drawn in the main window
pub fn main_view<'a>(main: &'a MainWindow, images: &'a [StoredImage]) -> Element<'a, Message> {
    let page = match main.page {
        Page::Prompt => prompt::view(main),
        Page::Library => gallery::view(images),
    };

    let mut content = column![page].height(Length::Fill);
    if let Some(status) = &main.status {
        content = content.push(text(&status.text).size(12));
    }

    dialog::overlay(content.into(), main.dialog.as_ref(), main.id)
}
