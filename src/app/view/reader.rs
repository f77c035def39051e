use crate::app::messages::Message;
use crate::app::state::App;
use crate::locale::{UiStrings, friendly_provider_error};
use iced::alignment::Vertical;
use iced::widget::text::{LineHeight, Wrapping};
use iced::widget::{button, column, container, row, scrollable, slider, text};
use iced::{Color, Element, Length};

impl App {
    pub(super) fn view_reader(&self, ui: &'static UiStrings) -> Element<'_, Message> {
        let chunks: &[String] = self
            .document
            .as_ref()
            .map(|doc| doc.chunks.as_slice())
            .unwrap_or_default();
        let highlight_idx = self
            .reader
            .playing_chunk
            .filter(|idx| *idx < chunks.len());
        let highlight = match self.config.theme {
            crate::config::ThemeMode::Day => Color::from_rgba(1.0, 0.85, 0.4, 0.7),
            crate::config::ThemeMode::Night => Color::from_rgba(0.3, 0.4, 0.7, 0.7),
        };

        let spans: Vec<iced::widget::text::Span<'_, Message>> = chunks
            .iter()
            .enumerate()
            .map(|(idx, chunk)| {
                let mut span: iced::widget::text::Span<'_, Message> =
                    iced::widget::text::Span::new(format!("{chunk} "))
                        .size(self.config.font_size as f32)
                        .line_height(LineHeight::Relative(self.config.line_spacing));
                if Some(idx) == highlight_idx {
                    span = span
                        .background(iced::Background::Color(highlight))
                        .padding(iced::Padding::from(2u16));
                }
                span
            })
            .collect();

        let story: iced::widget::text::Rich<'_, Message> =
            iced::widget::text::Rich::with_spans(spans);
        let story_view = scrollable(
            container(
                story
                    .width(Length::Fill)
                    .wrapping(Wrapping::WordOrGlyph),
            )
            .width(Length::Fill)
            .padding([12, 28]),
        )
        .height(Length::FillPortion(1));

        let play_stop = if self.reader.playing {
            button(ui.stop).on_press(Message::StopPressed)
        } else {
            button(ui.play).on_press(Message::PlayPressed)
        };

        let status = if self.reader.buffering {
            text(ui.buffering)
        } else if let Some(err) = &self.reader.error {
            text(friendly_provider_error(err, self.language()))
        } else {
            text("")
        };

        let controls = row![
            play_stop,
            status,
            column![
                text(format!("{}: {:.2}x", ui.speed, self.narrator.speed())),
                slider(0.5..=1.8, self.narrator.speed(), Message::SpeedChanged).step(0.05),
            ]
            .spacing(4)
            .width(Length::Fixed(180.0)),
            column![
                text(ui.volume),
                slider(0.0..=1.0, self.config.speech_volume, Message::VolumeChanged).step(0.05),
            ]
            .spacing(4)
            .width(Length::Fixed(140.0)),
        ]
        .spacing(16)
        .align_y(Vertical::Center);

        column![story_view, controls]
            .spacing(12)
            .height(Length::Fill)
            .into()
    }
}
