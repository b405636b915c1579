//! Application state machine
//!
//! Two kinds of windows exist: the main window (prompt page and saved
//! images page) and at most one image viewer. Each window that can start a
//! generation owns its own `JobState`; results come back as messages on the
//! UI event loop and are dropped if the window they belong to is gone or is
//! no longer waiting on that job.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use iced::time::{self, Instant};
use iced::widget::image::Handle;
use iced::{event, keyboard, window, Element, Event, Size, Subscription, Task, Theme};

use crate::client::GenerationClient;
use crate::error::{AppResult, ErrorKind};
use crate::job::GenerationJob;
use crate::state::data::{GenerationRequest, GenerationResult, JobState, JobTicket, StoredImage};
use crate::state::library::Library;
use crate::ui;

pub const APP_TITLE: &str = "Image Gen v1.0.0";
const STATUS_TTL: Duration = Duration::from_secs(5);
const EXPORT_STATUS_TTL: Duration = Duration::from_secs(3);
const VIEWER_TOOLBAR_HEIGHT: f32 = 150.0;

/// Main window pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Page {
    #[default]
    Prompt,
    Library,
}

/// Which window a generation job reports back to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobTarget {
    Main,
    Viewer(window::Id),
}

/// Blocking dialog drawn over a window's content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dialog {
    Notice(String),
    ConfirmDelete(String),
}

/// Non-blocking message that disappears on its own
#[derive(Debug, Clone)]
pub struct StatusLine {
    pub text: String,
    expires_at: Instant,
}

impl StatusLine {
    fn new(text: impl Into<String>, ttl: Duration) -> Self {
        Self {
            text: text.into(),
            expires_at: Instant::now() + ttl,
        }
    }
}

#[derive(Debug)]
pub struct MainWindow {
    pub id: window::Id,
    pub page: Page,
    pub prompt: String,
    /// Whether the attach control is shown (toggled with F2)
    pub attach_visible: bool,
    pub attachment: Option<PathBuf>,
    pub job: JobState,
    pub dialog: Option<Dialog>,
    pub status: Option<StatusLine>,
}

impl MainWindow {
    fn new(id: window::Id) -> Self {
        Self {
            id,
            page: Page::Prompt,
            prompt: String::new(),
            attach_visible: false,
            attachment: None,
            job: JobState::Idle,
            dialog: None,
            status: None,
        }
    }

    /// Request for the current input. Edit mode only when the attach control
    /// is visible and an image has actually been picked.
    pub fn request(&self) -> AppResult<GenerationRequest> {
        let source = self
            .attachment
            .clone()
            .filter(|_| self.attach_visible);
        GenerationRequest::new(&self.prompt, source)
    }
}

#[derive(Debug)]
pub struct Viewer {
    pub id: window::Id,
    pub image: StoredImage,
    pub handle: Handle,
    /// `Some` while the rename field is open
    pub rename_input: Option<String>,
    pub edit_prompt: String,
    pub job: JobState,
    pub dialog: Option<Dialog>,
    pub status: Option<StatusLine>,
}

impl Viewer {
    fn new(id: window::Id, image: StoredImage, bytes: Vec<u8>) -> Self {
        Self {
            id,
            image,
            handle: Handle::from_bytes(bytes),
            rename_input: None,
            edit_prompt: String::new(),
            job: JobState::Idle,
            dialog: None,
            status: None,
        }
    }
}

/// Events coming from the viewer window
#[derive(Debug, Clone)]
pub enum ViewerMessage {
    Export,
    ExportPicked(Option<PathBuf>),
    StartRename,
    RenameChanged(String),
    ConfirmRename,
    CancelRename,
    RequestDelete,
    ConfirmDelete,
    EditPromptChanged(String),
    SubmitEdit,
}

/// Application messages (events)
#[derive(Debug, Clone)]
pub enum Message {
    PromptChanged(String),
    /// F2 pressed in some window
    ToggleAttachment(window::Id),
    PickAttachment,
    AttachmentPicked(Option<PathBuf>),
    Submit,
    ShowPage(Page),
    OpenImage(String),
    DismissDialog(window::Id),
    Viewer(window::Id, ViewerMessage),
    GenerationFinished {
        target: JobTarget,
        ticket: JobTicket,
        result: GenerationResult,
    },
    WindowOpened(window::Id),
    WindowClosed(window::Id),
    Tick(Instant),
}

/// Main application state
pub struct App {
    client: Arc<dyn GenerationClient>,
    library: Library,
    /// Cached listing shown on the saved images page
    images: Vec<StoredImage>,
    main: MainWindow,
    viewer: Option<Viewer>,
    last_ticket: u64,
}

impl App {
    /// Create the application and open the main window
    pub fn new(client: Arc<dyn GenerationClient>, library: Library) -> (Self, Task<Message>) {
        let (main_id, open_main) = window::open(main_window_settings());

        let mut app = App {
            client,
            library,
            images: Vec::new(),
            main: MainWindow::new(main_id),
            viewer: None,
            last_ticket: 0,
        };
        app.refresh_images();

        log::info!(
            "🎨 Image Gen initialized with {} images in {}",
            app.images.len(),
            app.library.path().display()
        );

        (app, open_main.map(Message::WindowOpened))
    }

    pub fn title(&self, id: window::Id) -> String {
        match &self.viewer {
            Some(viewer) if viewer.id == id => viewer.image.name.clone(),
            _ => APP_TITLE.to_string(),
        }
    }

    pub fn theme(&self, _id: window::Id) -> Theme {
        Theme::Dark
    }

    pub fn subscription(&self) -> Subscription<Message> {
        let mut subscriptions = vec![
            window::close_events().map(Message::WindowClosed),
            event::listen_with(key_press),
        ];

        let has_status = self.main.status.is_some()
            || self.viewer.as_ref().is_some_and(|v| v.status.is_some());
        if has_status {
            subscriptions.push(time::every(Duration::from_millis(500)).map(Message::Tick));
        }

        Subscription::batch(subscriptions)
    }

    /// Handle application messages and update state
    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::PromptChanged(prompt) => {
                // Input is locked while a job runs
                if !self.main.job.is_generating() {
                    self.main.prompt = prompt;
                }
                Task::none()
            }
            Message::ToggleAttachment(id) => {
                // F2 only means something on the prompt page of the main window
                let on_prompt_page = id == self.main.id && self.main.page == Page::Prompt;
                if on_prompt_page && !self.main.job.is_generating() {
                    self.main.attach_visible = !self.main.attach_visible;
                    if !self.main.attach_visible {
                        self.main.attachment = None;
                    }
                }
                Task::none()
            }
            Message::PickAttachment => {
                if self.main.job.is_generating() {
                    return Task::none();
                }
                Task::perform(pick_source_image(), Message::AttachmentPicked)
            }
            Message::AttachmentPicked(path) => {
                // A cancelled dialog keeps the previous attachment
                if path.is_some() && self.main.attach_visible && !self.main.job.is_generating() {
                    self.main.attachment = path;
                }
                Task::none()
            }
            Message::Submit => self.submit_prompt(),
            Message::ShowPage(page) => {
                self.main.page = page;
                // The folder may have changed behind our back
                if page == Page::Library {
                    self.refresh_images();
                }
                Task::none()
            }
            Message::OpenImage(name) => match self.library.get(&name) {
                Some(image) => self.open_viewer(image),
                None => {
                    // Deleted or renamed outside the app since the last listing
                    self.refresh_images();
                    self.main.status = Some(StatusLine::new(
                        format!("'{name}' no longer exists"),
                        STATUS_TTL,
                    ));
                    Task::none()
                }
            },
            Message::DismissDialog(id) => {
                if id == self.main.id {
                    self.main.dialog = None;
                } else if let Some(viewer) = self.viewer.as_mut().filter(|v| v.id == id) {
                    viewer.dialog = None;
                }
                Task::none()
            }
            Message::Viewer(id, message) => {
                if self.viewer.as_ref().is_some_and(|v| v.id == id) {
                    self.update_viewer(message)
                } else {
                    log::debug!("Ignoring {message:?} for closed viewer window");
                    Task::none()
                }
            }
            Message::GenerationFinished {
                target,
                ticket,
                result,
            } => self.finish_generation(target, ticket, result),
            Message::WindowOpened(id) => {
                log::debug!("Window {id:?} opened");
                Task::none()
            }
            Message::WindowClosed(id) => {
                // Closing the main window quits, viewers just go away
                if id == self.main.id {
                    log::info!("Main window closed, exiting");
                    return iced::exit();
                }
                if !self.viewer.as_ref().is_some_and(|v| v.id == id) {
                    return Task::none();
                }
                if let Some(viewer) = self.viewer.take() {
                    if viewer.job.is_generating() {
                        log::warn!(
                            "Viewer for '{}' closed while an edit was running; \
                             its result will be discarded",
                            viewer.image.name
                        );
                    }
                }
                Task::none()
            }
            Message::Tick(now) => {
                // Expire status lines
                if self.main.status.as_ref().is_some_and(|s| s.expires_at <= now) {
                    self.main.status = None;
                }
                if let Some(viewer) = self.viewer.as_mut() {
                    if viewer.status.as_ref().is_some_and(|s| s.expires_at <= now) {
                        viewer.status = None;
                    }
                }
                Task::none()
            }
        }
    }

    /// Build the user interface of one window
    pub fn view(&self, id: window::Id) -> Element<'_, Message> {
        if id == self.main.id {
            return ui::main_view(&self.main, &self.images);
        }

        match &self.viewer {
            Some(viewer) if viewer.id == id => ui::viewer::view(viewer),
            // A window we already forgot about; it is closing.
            _ => iced::widget::horizontal_space().into(),
        }
    }

    fn submit_prompt(&mut self) -> Task<Message> {
        if self.main.job.is_generating() || self.main.dialog.is_some() {
            log::debug!("Submit ignored, main window is busy");
            return Task::none();
        }

        let request = match self.main.request() {
            Ok(request) => request,
            Err(error) => {
                self.main.dialog = Some(Dialog::Notice(error.to_string()));
                return Task::none();
            }
        };

        let ticket = self.next_ticket();
        self.main.job = JobState::Generating { ticket };
        self.launch(JobTarget::Main, ticket, GenerationJob::new(request, self.client.clone()))
    }

    fn launch(&self, target: JobTarget, ticket: JobTicket, job: GenerationJob) -> Task<Message> {
        log::info!("Prompt: {} (job {})", job.request().prompt, ticket.0);

        Task::perform(run_job(target, ticket, job), std::convert::identity)
    }

    fn finish_generation(
        &mut self,
        target: JobTarget,
        ticket: JobTicket,
        result: GenerationResult,
    ) -> Task<Message> {
        match target {
            JobTarget::Main => {
                if !self.main.job.is_waiting_on(ticket) {
                    log::warn!("Discarding stale result of job {}", ticket.0);
                    return Task::none();
                }
                self.main.job = JobState::Idle;

                match result {
                    GenerationResult::Success {
                        image_bytes,
                        suggested_name,
                    } => match self.store_result(&image_bytes, &suggested_name) {
                        Ok(image) => {
                            self.main.prompt.clear();
                            self.main.attachment = None;
                            self.refresh_images();
                            self.open_viewer(image)
                        }
                        Err(message) => {
                            self.main.status = Some(StatusLine::new(message, STATUS_TTL));
                            Task::none()
                        }
                    },
                    GenerationResult::Failure { reason, kind } => {
                        self.main.dialog = Some(Dialog::Notice(failure_message(&reason, kind)));
                        Task::none()
                    }
                }
            }
            JobTarget::Viewer(id) => {
                let waiting = self
                    .viewer
                    .as_ref()
                    .is_some_and(|v| v.id == id && v.job.is_waiting_on(ticket));
                if !waiting {
                    log::warn!(
                        "Discarding result of job {} for a viewer that is no longer open",
                        ticket.0
                    );
                    return Task::none();
                }
                if let Some(viewer) = self.viewer.as_mut() {
                    viewer.job = JobState::Idle;
                }

                match result {
                    GenerationResult::Success {
                        image_bytes,
                        suggested_name,
                    } => match self.store_result(&image_bytes, &suggested_name) {
                        Ok(image) => {
                            self.refresh_images();
                            self.open_viewer(image)
                        }
                        Err(message) => {
                            if let Some(viewer) = self.viewer.as_mut() {
                                viewer.status = Some(StatusLine::new(message, STATUS_TTL));
                            }
                            Task::none()
                        }
                    },
                    GenerationResult::Failure { reason, kind } => {
                        if let Some(viewer) = self.viewer.as_mut() {
                            viewer.dialog = Some(Dialog::Notice(failure_message(&reason, kind)));
                        }
                        Task::none()
                    }
                }
            }
        }
    }

    fn update_viewer(&mut self, message: ViewerMessage) -> Task<Message> {
        let Some(viewer) = self.viewer.as_mut() else {
            return Task::none();
        };
        let id = viewer.id;
        let busy = viewer.job.is_generating();

        match message {
            ViewerMessage::Export => {
                let suggested = format!("{}.png", viewer.image.name);
                Task::perform(pick_export_path(suggested), move |path| {
                    Message::Viewer(id, ViewerMessage::ExportPicked(path))
                })
            }
            ViewerMessage::ExportPicked(None) => Task::none(),
            ViewerMessage::ExportPicked(Some(destination)) => {
                let status = match self.library.copy_to(&viewer.image, &destination) {
                    Ok(path) => {
                        StatusLine::new(format!("Saved to {}", path.display()), EXPORT_STATUS_TTL)
                    }
                    Err(error) => {
                        log::warn!("Export of '{}' failed: {error}", viewer.image.name);
                        StatusLine::new(format!("Export failed: {error}"), STATUS_TTL)
                    }
                };
                viewer.status = Some(status);
                Task::none()
            }
            ViewerMessage::StartRename => {
                if !busy {
                    viewer.rename_input = Some(viewer.image.name.clone());
                }
                Task::none()
            }
            ViewerMessage::RenameChanged(value) => {
                if viewer.rename_input.is_some() {
                    viewer.rename_input = Some(value);
                }
                Task::none()
            }
            ViewerMessage::CancelRename => {
                viewer.rename_input = None;
                Task::none()
            }
            ViewerMessage::ConfirmRename => {
                let Some(new_name) = viewer.rename_input.clone() else {
                    return Task::none();
                };
                // The running edit may still be reading the source file
                if busy || viewer.dialog.is_some() {
                    return Task::none();
                }

                match self.library.rename(&viewer.image, &new_name) {
                    Ok(renamed) => {
                        self.main.status = Some(StatusLine::new(
                            format!("Renamed to '{}'", renamed.name),
                            STATUS_TTL,
                        ));
                        self.refresh_images();
                        self.close_viewer()
                    }
                    Err(error) if error.kind() == ErrorKind::Validation => {
                        viewer.dialog = Some(Dialog::Notice(error.to_string()));
                        Task::none()
                    }
                    Err(error) => {
                        log::warn!("Rename of '{}' failed: {error}", viewer.image.name);
                        let text = format!("Rename failed: {error}");
                        viewer.status = Some(StatusLine::new(text, STATUS_TTL));
                        Task::none()
                    }
                }
            }
            ViewerMessage::RequestDelete => {
                if !busy {
                    viewer.dialog = Some(Dialog::ConfirmDelete(viewer.image.name.clone()));
                }
                Task::none()
            }
            ViewerMessage::ConfirmDelete => {
                // Only reachable through the confirmation dialog
                if !matches!(viewer.dialog, Some(Dialog::ConfirmDelete(_))) {
                    return Task::none();
                }
                viewer.dialog = None;

                match self.library.delete(&viewer.image) {
                    Ok(()) => {
                        self.main.status = Some(StatusLine::new(
                            format!("'{}' deleted", viewer.image.name),
                            STATUS_TTL,
                        ));
                        self.refresh_images();
                        self.close_viewer()
                    }
                    Err(error) => {
                        log::warn!("Deletion of '{}' failed: {error}", viewer.image.name);
                        let text = format!("Deletion failed: {error}");
                        viewer.status = Some(StatusLine::new(text, STATUS_TTL));
                        Task::none()
                    }
                }
            }
            ViewerMessage::EditPromptChanged(prompt) => {
                if !busy {
                    viewer.edit_prompt = prompt;
                }
                Task::none()
            }
            ViewerMessage::SubmitEdit => {
                if busy || viewer.dialog.is_some() {
                    log::debug!("Edit ignored, viewer is busy");
                    return Task::none();
                }

                // The displayed image is always the edit source
                let source = Some(viewer.image.path.clone());
                let request = match GenerationRequest::new(&viewer.edit_prompt, source) {
                    Ok(request) => request,
                    Err(error) => {
                        viewer.dialog = Some(Dialog::Notice(error.to_string()));
                        return Task::none();
                    }
                };

                let ticket = self.next_ticket();
                if let Some(viewer) = self.viewer.as_mut() {
                    viewer.job = JobState::Generating { ticket };
                    viewer.rename_input = None;
                }
                self.launch(
                    JobTarget::Viewer(id),
                    ticket,
                    GenerationJob::new(request, self.client.clone()),
                )
            }
        }
    }

    /// Show `image` in the viewer, closing whatever viewer was open before.
    fn open_viewer(&mut self, image: StoredImage) -> Task<Message> {
        let bytes = match self.library.read(&image) {
            Ok(bytes) => bytes,
            Err(error) => {
                self.main.status = Some(StatusLine::new(
                    format!("Could not open '{}': {error}", image.name),
                    STATUS_TTL,
                ));
                return Task::none();
            }
        };

        log::info!("Opening File: {}", image.path.display());

        let close_previous = self.close_viewer();
        let (id, open) = window::open(viewer_window_settings(&image));
        self.viewer = Some(Viewer::new(id, image, bytes));

        Task::batch([close_previous, open.map(Message::WindowOpened)])
    }

    fn close_viewer(&mut self) -> Task<Message> {
        match self.viewer.take() {
            Some(viewer) => {
                if viewer.job.is_generating() {
                    log::warn!(
                        "Replacing viewer for '{}' while an edit is running; \
                         its result will be discarded",
                        viewer.image.name
                    );
                }
                window::close(viewer.id)
            }
            None => Task::none(),
        }
    }

    /// Save a finished generation under a free name.
    /// Returns the message to show on failure.
    fn store_result(&self, bytes: &[u8], suggested_name: &str) -> Result<StoredImage, String> {
        let name = self.library.unique_name(suggested_name);
        self.library.save(bytes, &name).map_err(|error| {
            log::error!("Could not save generated image '{name}': {error}");
            format!("Could not save image: {error}")
        })
    }

    fn refresh_images(&mut self) {
        match self.library.list() {
            Ok(images) => {
                log::debug!("Image list refreshed ({} images)", images.len());
                self.images = images;
            }
            Err(error) => {
                log::error!("Could not list images: {error}");
                self.main.status = Some(StatusLine::new(
                    format!("Could not read image folder: {error}"),
                    STATUS_TTL,
                ));
            }
        }
    }

    fn next_ticket(&mut self) -> JobTicket {
        self.last_ticket += 1;
        JobTicket(self.last_ticket)
    }
}

/// Run `job` and wrap its result for the window that started it
async fn run_job(target: JobTarget, ticket: JobTicket, job: GenerationJob) -> Message {
    let result = job.run().await;
    Message::GenerationFinished {
        target,
        ticket,
        result,
    }
}

fn failure_message(reason: &str, kind: ErrorKind) -> String {
    match kind {
        ErrorKind::Config => format!("Image generation is not set up: {reason}"),
        _ => format!("There was an error generating the image: {reason}"),
    }
}

fn key_press(event: Event, _status: event::Status, id: window::Id) -> Option<Message> {
    match event {
        Event::Keyboard(keyboard::Event::KeyPressed {
            key: keyboard::Key::Named(keyboard::key::Named::F2),
            ..
        }) => Some(Message::ToggleAttachment(id)),
        _ => None,
    }
}

async fn pick_source_image() -> Option<PathBuf> {
    rfd::AsyncFileDialog::new()
        .set_title("Choose an image to edit")
        .add_filter("Images", &["png", "jpg", "jpeg", "webp"])
        .pick_file()
        .await
        .map(|file| file.path().to_path_buf())
}

async fn pick_export_path(file_name: String) -> Option<PathBuf> {
    rfd::AsyncFileDialog::new()
        .set_title("Save Image As…")
        .set_file_name(file_name)
        .add_filter("PNG Files", &["png"])
        .save_file()
        .await
        .map(|file| file.path().to_path_buf())
}

fn main_window_settings() -> window::Settings {
    window::Settings {
        size: Size::new(460.0, 340.0),
        min_size: Some(Size::new(400.0, 260.0)),
        ..window::Settings::default()
    }
}

/// Size the viewer to the image, within reason.
fn viewer_window_settings(image: &StoredImage) -> window::Settings {
    let (width, height) = ::image::image_dimensions(&image.path)
        .map(|(w, h)| (w as f32, h as f32))
        .unwrap_or((512.0, 512.0));
    let scale = (900.0 / width).min(700.0 / height).min(1.0);

    window::Settings {
        size: Size::new(
            (width * scale).max(480.0),
            height * scale + VIEWER_TOOLBAR_HEIGHT,
        ),
        ..window::Settings::default()
    }
}
