use crate::app::messages::Message;
use crate::app::state::{App, ExplainPhase};
use crate::locale::{UiStrings, friendly_provider_error};
use crate::provider::ChatRole;
use iced::alignment::Vertical;
use iced::widget::{Column, button, column, row, scrollable, text, text_input};
use iced::{Element, Length};

impl App {
    pub(super) fn view_explain(&self, ui: &'static UiStrings) -> Element<'_, Message> {
        match &self.explain.phase {
            ExplainPhase::Idle | ExplainPhase::Loading { .. } => {
                return column![text(ui.buffering).size(20)]
                    .padding(30)
                    .width(Length::Fill)
                    .into();
            }
            ExplainPhase::Failed(err) => {
                return column![
                    text(friendly_provider_error(err, self.language())).size(20),
                    button(ui.retry).on_press(Message::ExplainRetryPressed),
                ]
                .spacing(12)
                .padding(30)
                .width(Length::Fill)
                .into();
            }
            ExplainPhase::Ready => {}
        }

        let mut summary: Column<'_, Message> =
            column![text(ui.summary_heading).size(20)].spacing(6);
        for point in &self.explain.summary {
            summary = summary.push(text(format!("•  {point}")).size(self.config.font_size as f32));
        }

        let mut questions: Column<'_, Message> =
            column![text(ui.questions_heading).size(20)].spacing(6);
        for question in &self.explain.questions {
            questions = questions
                .push(button(text(question.as_str())).on_press(Message::QuestionPicked(question.clone())));
        }

        let mut transcript: Column<'_, Message> = column![].spacing(8);
        for turn in &self.explain.history {
            let prefix = match turn.role {
                ChatRole::User => "🧒",
                ChatRole::Assistant => "🏮",
            };
            transcript = transcript.push(text(format!("{prefix}  {}", turn.text)));
        }
        if !self.explain.user_partial.is_empty() {
            transcript = transcript.push(text(format!("🧒  {}", self.explain.user_partial)));
        }
        if !self.explain.model_partial.is_empty() {
            transcript = transcript.push(text(format!("🏮  {}", self.explain.model_partial)));
        }
        if self.explain.pending_chat.is_some() {
            transcript = transcript.push(text("..."));
        }

        let mut input = text_input(ui.chat_placeholder, &self.explain.input)
            .on_input(Message::ChatInputChanged)
            .width(Length::Fill);
        if self.explain.pending_chat.is_none() {
            input = input.on_submit(Message::ChatSubmitted);
        }
        let mut send = button(ui.send);
        if self.explain.pending_chat.is_none() && !self.explain.input.trim().is_empty() {
            send = send.on_press(Message::ChatSubmitted);
        }

        let voice_label = if self.explain.voice_active() {
            ui.talk_stop
        } else {
            ui.talk_start
        };
        let mut voice_row = row![button(voice_label).on_press(Message::VoiceToggled)]
            .spacing(10)
            .align_y(Vertical::Center);
        if self.explain.voice_active() {
            voice_row = voice_row.push(text(ui.listening));
        }

        column![
            row![summary.width(Length::FillPortion(1)), questions.width(Length::FillPortion(1))]
                .spacing(24),
            scrollable(transcript).height(Length::FillPortion(1)),
            row![input, send].spacing(8),
            voice_row,
        ]
        .spacing(16)
        .height(Length::Fill)
        .into()
    }
}
