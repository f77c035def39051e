use crate::app::messages::Message;
use crate::app::state::{App, UploadPhase};
use crate::locale::{UiStrings, friendly_provider_error};
use iced::Length;
use iced::alignment::Horizontal;
use iced::widget::{button, column, row, text, text_input};
use iced::Element;

impl App {
    pub(super) fn view_home(&self, ui: &'static UiStrings) -> Element<'_, Message> {
        let extracting = matches!(self.home.phase, UploadPhase::Extracting { .. });

        let mut pick = button(ui.pick_file);
        if !extracting && !self.home.path_input.trim().is_empty() {
            pick = pick.on_press(Message::ExtractRequested);
        }

        let mut input = text_input("photo.jpg / story.pdf", &self.home.path_input)
            .on_input(Message::PathInputChanged)
            .width(Length::Fixed(420.0));
        if !extracting {
            input = input.on_submit(Message::ExtractRequested);
        }

        let status: Element<'_, Message> = match &self.home.phase {
            UploadPhase::Idle => text("").into(),
            UploadPhase::Extracting { .. } => text(ui.extracting).size(18).into(),
            UploadPhase::Failed(err) => text(friendly_provider_error(err, self.language()))
                .size(18)
                .into(),
        };

        column![
            text(ui.app_title).size(48),
            text(ui.home_tagline).size(22),
            row![input, pick].spacing(10),
            status,
        ]
        .spacing(24)
        .padding(40)
        .align_x(Horizontal::Center)
        .width(Length::Fill)
        .into()
    }
}
