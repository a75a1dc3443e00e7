use crate::director::Action;
use crate::model::{WidgetState, MOODS};
use crossterm::event::{
    self, Event, KeyCode, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind,
};
use std::time::Duration;

pub(crate) fn collect_input_nonblocking(max_frame_time: Duration) -> anyhow::Result<Vec<Event>> {
    let mut out = Vec::new();

    // poll with a tiny timeout so we stay responsive
    let timeout = std::cmp::min(Duration::from_millis(1), max_frame_time);
    while event::poll(timeout)? {
        match event::read()? {
            ev @ (Event::Key(_) | Event::Mouse(_)) => {
                out.push(ev);
                if out.len() >= 64 {
                    break;
                }
            }
            _ => {}
        }
    }
    Ok(out)
}

pub(crate) fn map_event_to_action(state: &WidgetState, ev: &Event) -> Option<Action> {
    match ev {
        Event::Key(k) if k.kind == KeyEventKind::Press || k.kind == KeyEventKind::Repeat => {
            // the open feedback box grabs printable input first
            if state.show_feedback && !state.submitted {
                return match k.code {
                    KeyCode::Enter => Some(Action::Submit),
                    KeyCode::Esc | KeyCode::Tab => Some(Action::ToggleFeedback),
                    KeyCode::Backspace => Some(Action::FeedbackBackspace),
                    KeyCode::Char(ch) if !k.modifiers.contains(KeyModifiers::CONTROL) => {
                        if ch.is_ascii() && !ch.is_ascii_control() {
                            Some(Action::FeedbackChar(ch))
                        } else {
                            None
                        }
                    }
                    _ => None,
                };
            }

            match k.code {
                KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(Action::Quit),
                KeyCode::Char('h') | KeyCode::Char('H') => Some(Action::HelpToggle),
                _ if state.submitted => None,
                KeyCode::Left => Some(Action::SlideMood(-1)),
                KeyCode::Right => Some(Action::SlideMood(1)),
                KeyCode::Char('1') => Some(Action::SelectMood(MOODS[0])),
                KeyCode::Char('2') => Some(Action::SelectMood(MOODS[1])),
                KeyCode::Char('3') => Some(Action::SelectMood(MOODS[2])),
                KeyCode::Tab => Some(Action::ToggleFeedback),
                KeyCode::Enter => Some(Action::Submit),
                _ => None,
            }
        }
        Event::Mouse(m) => match m.kind {
            // the pointer stream is always on; the director decides whether
            // the current mood consumes it
            MouseEventKind::Moved | MouseEventKind::Drag(_) => Some(Action::PointerMove {
                col: m.column,
                row: m.row,
            }),
            MouseEventKind::Down(MouseButton::Left) if !state.submitted => {
                Some(Action::PointerSelect {
                    col: m.column,
                    row: m.row,
                })
            }
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Mood;
    use crossterm::event::KeyEvent;

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn number_keys_select_moods_in_slider_order() {
        let st = WidgetState::new();
        assert!(matches!(
            map_event_to_action(&st, &key(KeyCode::Char('1'))),
            Some(Action::SelectMood(Mood::Bad))
        ));
        assert!(matches!(
            map_event_to_action(&st, &key(KeyCode::Char('3'))),
            Some(Action::SelectMood(Mood::Good))
        ));
    }

    #[test]
    fn open_feedback_box_captures_typing() {
        let mut st = WidgetState::new();
        st.show_feedback = true;
        assert!(matches!(
            map_event_to_action(&st, &key(KeyCode::Char('q'))),
            Some(Action::FeedbackChar('q'))
        ));
        assert!(matches!(
            map_event_to_action(&st, &key(KeyCode::Backspace)),
            Some(Action::FeedbackBackspace)
        ));
        assert!(matches!(
            map_event_to_action(&st, &key(KeyCode::Enter)),
            Some(Action::Submit)
        ));
        assert!(matches!(
            map_event_to_action(&st, &key(KeyCode::Esc)),
            Some(Action::ToggleFeedback)
        ));
    }

    #[test]
    fn submitted_state_keeps_only_quit_and_help() {
        let mut st = WidgetState::new();
        st.submitted = true;
        assert!(matches!(
            map_event_to_action(&st, &key(KeyCode::Char('q'))),
            Some(Action::Quit)
        ));
        assert!(matches!(
            map_event_to_action(&st, &key(KeyCode::Char('h'))),
            Some(Action::HelpToggle)
        ));
        assert!(map_event_to_action(&st, &key(KeyCode::Char('2'))).is_none());
        assert!(map_event_to_action(&st, &key(KeyCode::Enter)).is_none());
    }
}
