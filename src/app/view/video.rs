use crate::app::messages::Message;
use crate::app::state::{App, VideoPhase};
use crate::locale::{UiStrings, friendly_provider_error};
use iced::alignment::Horizontal;
use iced::widget::{button, column, row, text, text_input};
use iced::{Element, Length};

impl App {
    pub(super) fn view_video(&self, ui: &'static UiStrings) -> Element<'_, Message> {
        let body: Element<'_, Message> = match &self.video.phase {
            VideoPhase::Idle => button(ui.make_video)
                .on_press(Message::VideoRequested)
                .into(),
            VideoPhase::Drafting { .. } => text(ui.buffering).size(18).into(),
            VideoPhase::Confirm => {
                let mut confirm = button(ui.make_video);
                if !self.video.prompt.trim().is_empty() {
                    confirm = confirm.on_press(Message::VideoConfirmed);
                }
                column![
                    text_input("", &self.video.prompt)
                        .on_input(Message::PromptEdited)
                        .width(Length::Fixed(560.0)),
                    row![confirm, button(ui.cancel).on_press(Message::VideoCancelled)]
                        .spacing(10),
                ]
                .spacing(12)
                .align_x(Horizontal::Center)
                .into()
            }
            VideoPhase::Rendering { started, .. } => column![
                text(ui.rendering_video).size(18),
                text(format!("{}s", started.elapsed().as_secs())),
                button(ui.cancel).on_press(Message::VideoCancelled),
            ]
            .spacing(12)
            .align_x(Horizontal::Center)
            .into(),
            VideoPhase::Ready(_) => row![
                button(ui.open_video).on_press(Message::OpenVideoPressed),
                button(ui.retry).on_press(Message::VideoRequested),
            ]
            .spacing(10)
            .into(),
            VideoPhase::Failed(err) => column![
                text(friendly_provider_error(err, self.language())).size(18),
                button(ui.retry).on_press(Message::VideoRequested),
            ]
            .spacing(12)
            .align_x(Horizontal::Center)
            .into(),
        };

        column![body]
            .spacing(20)
            .padding(40)
            .align_x(Horizontal::Center)
            .width(Length::Fill)
            .into()
    }
}
