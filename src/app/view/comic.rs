use crate::app::messages::Message;
use crate::app::state::{App, ComicPhase};
use crate::locale::{UiStrings, friendly_provider_error};
use iced::alignment::Horizontal;
use iced::widget::{Column, Row, button, column, container, image, row, scrollable, text};
use iced::{Element, Length};

impl App {
    pub(super) fn view_comic(&self, ui: &'static UiStrings) -> Element<'_, Message> {
        let busy = matches!(
            self.comic.phase,
            ComicPhase::Describing { .. } | ComicPhase::Rendering { .. }
        );
        let mut make = button(ui.make_comic);
        if !busy {
            make = make.on_press(Message::ComicRequested);
        }

        let status: Element<'_, Message> = match &self.comic.phase {
            ComicPhase::Describing { .. } | ComicPhase::Rendering { .. } => {
                text(ui.drawing_panels).size(18).into()
            }
            ComicPhase::Failed(err) => text(friendly_provider_error(err, self.language()))
                .size(18)
                .into(),
            _ => text("").into(),
        };

        let mut grid: Column<'_, Message> = column![].spacing(16);
        for pair in self.comic.panels.chunks(2) {
            let mut strip: Row<'_, Message> = row![].spacing(16);
            for panel in pair {
                let art: Element<'_, Message> = if let Some(handle) = &panel.image {
                    image(handle.clone()).width(Length::Fill).into()
                } else if panel.failed {
                    container(text("✶").size(48))
                        .center_x(Length::Fill)
                        .padding(40)
                        .into()
                } else {
                    container(text("...").size(30))
                        .center_x(Length::Fill)
                        .padding(40)
                        .into()
                };
                strip = strip.push(
                    column![art, text(panel.scene.description.as_str()).size(16)]
                        .spacing(6)
                        .width(Length::FillPortion(1)),
                );
            }
            grid = grid.push(strip);
        }

        column![
            row![make, status].spacing(16),
            scrollable(grid).height(Length::FillPortion(1)),
        ]
        .spacing(16)
        .align_x(Horizontal::Center)
        .height(Length::Fill)
        .into()
    }
}
