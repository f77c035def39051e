mod comic;
mod explain;
mod home;
mod reader;
mod video;

use super::messages::{Message, Mode};
use super::state::{App, Screen};
use crate::locale::{self, UiStrings};
use crate::provider::ALL_LANGUAGES;
use iced::Length;
use iced::alignment::Vertical;
use iced::widget::{Column, button, column, horizontal_space, pick_list, row, slider, text};
use iced::Element;

impl App {
    pub fn view(&self) -> Element<'_, Message> {
        let ui = locale::strings(self.language());
        let body = match self.screen {
            Screen::Home => self.view_home(ui),
            Screen::Mode(Mode::Reader) => self.view_reader(ui),
            Screen::Mode(Mode::Explain) => self.view_explain(ui),
            Screen::Mode(Mode::Comic) => self.view_comic(ui),
            Screen::Mode(Mode::Video) => self.view_video(ui),
        };

        let mut content: Column<'_, Message> = column![self.top_bar(ui)]
            .push(body)
            .spacing(14)
            .padding(16)
            .height(Length::Fill);
        content = content.width(Length::Fill);
        content.into()
    }

    fn top_bar(&self, ui: &'static UiStrings) -> Element<'_, Message> {
        let theme_label = match self.config.theme {
            crate::config::ThemeMode::Day => "Night",
            crate::config::ThemeMode::Night => "Day",
        };

        let mut bar = row![].spacing(10).align_y(Vertical::Center);

        if let Some(doc) = &self.document {
            bar = bar
                .push(self.tab(ui.read_tab, Mode::Reader))
                .push(self.tab(ui.explain_tab, Mode::Explain))
                .push(self.tab(ui.comic_tab, Mode::Comic))
                .push(self.tab(ui.video_tab, Mode::Video))
                .push(button(ui.back_home).on_press(Message::GoHome))
                .push(text(doc.name.as_str()).size(14));
        } else {
            bar = bar.push(text(ui.app_title).size(24));
        }

        bar = bar
            .push(horizontal_space())
            .push(text(ui.language_label))
            .push(pick_list(
                ALL_LANGUAGES,
                Some(self.language()),
                Message::LanguageChanged,
            ))
            .push(
                row![
                    text("A").size(14),
                    slider(16.0..=48.0, self.config.font_size as f32, |value| {
                        Message::FontSizeChanged(value.round() as u32)
                    })
                    .width(90),
                    text("A").size(22),
                ]
                .spacing(4)
                .align_y(Vertical::Center),
            )
            .push(button(theme_label).on_press(Message::ToggleTheme));

        bar.into()
    }

    fn tab(&self, label: &'static str, mode: Mode) -> Element<'_, Message> {
        if self.screen == Screen::Mode(mode) {
            button(label).into()
        } else {
            button(label).on_press(Message::ModeSelected(mode)).into()
        }
    }
}
