use crossterm::event::Event;
use ratatui::Frame;
use ratatui::layout::Rect;

pub mod editor;
pub mod save_prompt;
pub mod tab_bar;

pub use editor::EditorBuffer;
pub use save_prompt::{PromptAction, SavePromptComponent};
pub use tab_bar::{TabBar, TabLabel};

pub trait Component {
    fn render(&mut self, frame: &mut Frame, area: Rect, focused: bool);

    fn handle_event(&mut self, _event: &Event) -> bool {
        false
    }
}
