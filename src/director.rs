use crate::anim::{Animator, Channel, Ease, Element, Motion};
use crate::burst::{Burst, PARTICLE_COUNT};
use crate::model::{Layout, Mood, Rgb, WidgetState, MOODS};
use rand::{rngs::StdRng, SeedableRng};

/// Normalized pointer offset is scaled by this, giving pupils a ±10 range
/// per axis inside the card.
const POINTER_SCALE: f32 = 20.0;
const POINTER_EASE_SECS: f32 = 0.3;

const BLINK_EVERY_SECS: f32 = 2.0;
const BLINK_SHUT_SCALE: f32 = 0.1;

const LABEL_SLIDE_FROM: f32 = -12.0;
const IDLE_SWAY_SECS: f32 = 0.6;

#[derive(Clone, Debug)]
pub(crate) enum Action {
    SelectMood(Mood),
    SlideMood(i32),
    PointerMove { col: u16, row: u16 },
    PointerSelect { col: u16, row: u16 },
    ToggleFeedback,
    FeedbackChar(char),
    FeedbackBackspace,
    Submit,
    HelpToggle,
    Quit,
}

struct BlinkTimer {
    next_at: f32,
}

/// Owns the widget state and every mood-scoped animation handle. Nothing
/// else starts or cancels mood-bundle tweens, which is what makes the
/// teardown in `enter_mood` complete by construction.
pub(crate) struct Director {
    pub(crate) state: WidgetState,
    pub(crate) anim: Animator,
    pub(crate) confetti: Burst,
    blink: Option<BlinkTimer>,
    celebration_due: bool,
    layout: Option<Layout>,
    rng: StdRng,
    card_from: (Rgb, Rgb),
    card_to: (Rgb, Rgb),
}

impl Director {
    pub(crate) fn new(seed: u64) -> Self {
        let initial = Mood::Good;
        let mut d = Self {
            state: WidgetState::new(),
            anim: Animator::new(),
            confetti: Burst::new(),
            blink: None,
            celebration_due: false,
            layout: None,
            rng: StdRng::seed_from_u64(seed),
            card_from: initial.gradient(),
            card_to: initial.gradient(),
        };
        d.enter_mood(initial);
        d
    }

    /// Renderer hands back the frame's geometry; the pointer tracker and
    /// the deferred burst both read it.
    pub(crate) fn set_layout(&mut self, layout: Layout) {
        self.layout = Some(layout);
    }

    pub(crate) fn apply(&mut self, action: Action) {
        match action {
            Action::SelectMood(mood) => self.select_mood(mood),
            Action::SlideMood(delta) => {
                if !self.state.submitted {
                    let slot = (self.state.mood.slot() as i32 + delta).clamp(0, 2);
                    self.select_mood(MOODS[slot as usize]);
                }
            }
            Action::PointerMove { col, row } => self.pointer_moved(col, row),
            Action::PointerSelect { col, row } => {
                if let Some(layout) = self.layout {
                    for (slot, hit) in layout.dots.iter().enumerate() {
                        if hit.contains(col, row) {
                            self.select_mood(MOODS[slot]);
                        }
                    }
                }
            }
            Action::ToggleFeedback => {
                if !self.state.submitted {
                    self.state.show_feedback = !self.state.show_feedback;
                }
            }
            Action::FeedbackChar(ch) => {
                if !self.state.submitted && self.state.show_feedback {
                    self.state.feedback.push(ch);
                }
            }
            Action::FeedbackBackspace => {
                if !self.state.submitted && self.state.show_feedback {
                    self.state.feedback.pop();
                }
            }
            Action::Submit => self.submit(),
            // handled by the app loop
            Action::HelpToggle | Action::Quit => {}
        }
    }

    pub(crate) fn tick(&mut self, dt: f32) {
        self.anim.tick(dt);
        self.confetti.update(dt);

        if self.celebration_due && self.layout.is_some_and(|l| l.burst_stage) {
            self.celebration_due = false;
            self.celebrate();
        }

        if let Some(blink) = &mut self.blink {
            while self.anim.clock() >= blink.next_at {
                for eye in [Element::LeftEye, Element::RightEye] {
                    self.anim.animate(
                        eye,
                        Channel::ScaleY,
                        Motion {
                            yoyo: true,
                            repeat: 1,
                            ..Motion::to(BLINK_SHUT_SCALE, 0.1, Ease::QuadInOut)
                        },
                    );
                }
                blink.next_at += BLINK_EVERY_SECS;
            }
        }
    }

    /// The effective card gradient right now, mid-crossfade included.
    pub(crate) fn card_palette(&self) -> (Rgb, Rgb) {
        let t = self.anim.value(Element::Card, Channel::Blend);
        (
            self.card_from.0.mix(self.card_to.0, t),
            self.card_from.1.mix(self.card_to.1, t),
        )
    }

    fn select_mood(&mut self, mood: Mood) {
        if self.state.submitted {
            return;
        }
        // no equality guard: re-selecting the active mood replays the bundle
        self.state.mood = mood;
        self.enter_mood(mood);
    }

    /// The transition bundle. Teardown of the previous bundle comes first
    /// and completes before anything new starts.
    fn enter_mood(&mut self, mood: Mood) {
        for el in [
            Element::LeftPupil,
            Element::RightPupil,
            Element::Mouth,
            Element::Face,
        ] {
            self.anim.cancel_all(el);
        }
        self.blink = None;

        // gradient crossfade, picking up from whatever is on screen now
        self.card_from = self.card_palette();
        self.card_to = mood.gradient();
        self.anim.animate(
            Element::Card,
            Channel::Blend,
            Motion::from_to(0.0, 1.0, 0.8, Ease::CubicInOut),
        );

        self.anim.animate(
            Element::Mouth,
            Channel::Curve,
            Motion::to(mood.mouth_curve(), 0.5, Ease::CubicOut),
        );

        // eyes to a known baseline before any mood-specific eye behavior
        for eye in [Element::LeftEye, Element::RightEye] {
            self.anim.set(eye, Channel::ScaleY, 1.0);
            self.anim.set(eye, Channel::Rotation, 0.0);
        }

        if mood == Mood::Okay {
            for pupil in [Element::LeftPupil, Element::RightPupil] {
                self.anim.set(pupil, Channel::Scale, 0.0);
            }
            self.blink = Some(BlinkTimer {
                next_at: self.anim.clock() + BLINK_EVERY_SECS,
            });
        } else {
            for pupil in [Element::LeftPupil, Element::RightPupil] {
                self.anim.set(pupil, Channel::Scale, 1.0);
            }
        }

        self.anim.animate(
            Element::Dot(mood),
            Channel::Scale,
            Motion {
                yoyo: true,
                repeat: 1,
                ..Motion::from_to(0.8, 1.2, 0.3, Ease::BackOut(2.0))
            },
        );

        // label entrance: overshoot pop plus a slide-in fade
        self.anim.animate(
            Element::Label,
            Channel::Scale,
            Motion::from_to(0.8, 1.0, 0.6, Ease::BackOut(1.7)),
        );
        self.anim.animate(
            Element::Label,
            Channel::X,
            Motion::from_to(LABEL_SLIDE_FROM, 0.0, 1.0, Ease::CubicOut),
        );
        self.anim.animate(
            Element::Label,
            Channel::Opacity,
            Motion::from_to(0.0, 1.0, 1.0, Ease::CubicOut),
        );

        // idle sway, torn down only by the next transition or submission
        self.anim.animate(
            Element::Face,
            Channel::Rotation,
            Motion {
                yoyo: true,
                repeat: -1,
                ..Motion::to(mood.idle_tilt_deg(), IDLE_SWAY_SECS, Ease::SineInOut)
            },
        );
    }

    /// Mood-gated pointer tracking. Inert until the card has been laid out,
    /// while the mood hides pupils, and after submission.
    fn pointer_moved(&mut self, col: u16, row: u16) {
        if self.state.submitted || !self.state.mood.tracks_pointer() {
            return;
        }
        let Some(card) = self.layout.map(|l| l.card) else {
            return;
        };
        if card.w == 0 || card.h == 0 {
            return;
        }
        let dx = ((col as f32 - card.x as f32) / card.w as f32 - 0.5) * POINTER_SCALE;
        let dy = ((row as f32 - card.y as f32) / card.h as f32 - 0.5) * POINTER_SCALE;
        for pupil in [Element::LeftPupil, Element::RightPupil] {
            self.anim
                .animate(pupil, Channel::X, Motion::to(dx, POINTER_EASE_SECS, Ease::QuadOut));
            self.anim
                .animate(pupil, Channel::Y, Motion::to(dy, POINTER_EASE_SECS, Ease::QuadOut));
        }
    }

    /// One-way. The celebration is held until the submitted view (the
    /// confetti's container) has actually been drawn.
    fn submit(&mut self) {
        if self.state.submitted {
            return;
        }
        self.state.submitted = true;
        self.blink = None;
        self.celebration_due = true;
    }

    fn celebrate(&mut self) {
        // the idle sway would fight the pop on the same target; stop it and
        // settle the face before popping
        self.anim.cancel_all(Element::Face);
        self.anim.set(Element::Face, Channel::Rotation, 0.0);
        self.anim.animate(
            Element::Face,
            Channel::Scale,
            Motion::from_to(0.8, 1.0, 0.6, Ease::ElasticOut),
        );
        self.confetti.spawn(PARTICLE_COUNT, &mut self.rng);
    }

    #[cfg(test)]
    pub(crate) fn blink_armed(&self) -> bool {
        self.blink.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Rect;

    fn laid_out(burst_stage: bool) -> Layout {
        let card = Rect { x: 10, y: 5, w: 40, h: 20 };
        let dots = [
            Rect { x: 14, y: 20, w: 3, h: 3 },
            Rect { x: 29, y: 20, w: 3, h: 3 },
            Rect { x: 44, y: 20, w: 3, h: 3 },
        ];
        Layout { card, dots, burst_stage }
    }

    fn director() -> Director {
        let mut d = Director::new(0xFACE);
        d.set_layout(laid_out(false));
        d
    }

    #[test]
    fn starts_good_with_idle_sway_and_no_blink() {
        let d = director();
        assert_eq!(d.state.mood, Mood::Good);
        assert!(!d.blink_armed());
        assert_eq!(d.anim.target_of(Element::Face, Channel::Rotation), Some(5.0));
        assert_eq!(d.anim.value(Element::LeftPupil, Channel::Scale), 1.0);
    }

    #[test]
    fn pointer_is_ignored_before_first_layout() {
        let mut d = Director::new(1);
        d.apply(Action::PointerMove { col: 30, row: 10 });
        assert!(!d.anim.is_animating(Element::LeftPupil, Channel::X));
    }

    #[test]
    fn okay_mood_suspends_pointer_tracking() {
        let mut d = director();
        d.apply(Action::SelectMood(Mood::Okay));
        d.apply(Action::PointerMove { col: 45, row: 22 });
        assert!(!d.anim.is_animating(Element::LeftPupil, Channel::X));
        assert_eq!(d.anim.value(Element::LeftPupil, Channel::X), 0.0);
    }

    #[test]
    fn tracking_offsets_stay_in_scaled_range() {
        let mut d = director();
        for (col, row) in [(10u16, 5u16), (49, 24), (30, 15)] {
            d.apply(Action::PointerMove { col, row });
            let x = d.anim.target_of(Element::LeftPupil, Channel::X).unwrap();
            let y = d.anim.target_of(Element::LeftPupil, Channel::Y).unwrap();
            assert!((-10.0..=10.0).contains(&x), "x = {x}");
            assert!((-10.0..=10.0).contains(&y), "y = {y}");
            assert_eq!(d.anim.target_of(Element::RightPupil, Channel::X), Some(x));
        }
    }

    #[test]
    fn pointer_tween_supersedes_without_stacking() {
        let mut d = director();
        d.apply(Action::PointerMove { col: 12, row: 6 });
        d.apply(Action::PointerMove { col: 48, row: 23 });
        assert_eq!(
            d.anim
                .target_of(Element::LeftPupil, Channel::X)
                .map(|x| x > 0.0),
            Some(true)
        );
        // one positional tween per axis, not a queue of them
        assert_eq!(d.anim.active_on(Element::LeftPupil), 2);
    }

    #[test]
    fn blink_armed_iff_mood_is_okay() {
        let mut d = director();
        let trail = [Mood::Okay, Mood::Bad, Mood::Okay, Mood::Okay, Mood::Good, Mood::Okay];
        for m in trail {
            d.apply(Action::SelectMood(m));
            assert_eq!(d.blink_armed(), m == Mood::Okay);
        }
    }

    #[test]
    fn transition_cancels_previous_bundle_completely() {
        let mut d = director();
        d.tick(0.05);
        d.apply(Action::SelectMood(Mood::Bad));
        // exactly the new bundle's tweens on the shared targets
        assert_eq!(d.anim.active_on(Element::Face), 1);
        assert_eq!(d.anim.active_on(Element::Mouth), 1);
        assert_eq!(d.anim.target_of(Element::Face, Channel::Rotation), Some(-5.0));
        assert_eq!(d.anim.target_of(Element::Mouth, Channel::Curve), Some(-1.0));
        assert!(!d.anim.is_animating(Element::LeftEye, Channel::ScaleY));
    }

    #[test]
    fn good_to_bad_scenario() {
        let mut d = director();
        d.apply(Action::SelectMood(Mood::Bad));
        assert_eq!(d.state.mood, Mood::Bad);
        assert_eq!(d.card_to, Mood::Bad.gradient());
        assert!(!d.blink_armed());
        // crossfade starts from the old gradient and reaches the new one
        assert_eq!(d.card_palette(), Mood::Good.gradient());
        d.tick(1.0);
        assert_eq!(d.card_palette(), Mood::Bad.gradient());
    }

    #[test]
    fn reselecting_active_mood_replays_bundle() {
        let mut d = director();
        d.tick(0.4);
        let mid_label = d.anim.value(Element::Label, Channel::Opacity);
        assert!(mid_label > 0.0);
        d.apply(Action::SelectMood(Mood::Good));
        // entrance restarted from scratch
        assert_eq!(d.anim.value(Element::Label, Channel::Opacity), 0.0);
    }

    #[test]
    fn blink_pulses_then_stops_after_leaving_okay() {
        let mut d = director();
        d.apply(Action::SelectMood(Mood::Okay));
        d.tick(2.05);
        assert!(d.anim.is_animating(Element::LeftEye, Channel::ScaleY));
        assert_eq!(
            d.anim.target_of(Element::LeftEye, Channel::ScaleY),
            Some(0.1)
        );
        // dip and return
        d.tick(0.25);
        assert!(!d.anim.is_animating(Element::LeftEye, Channel::ScaleY));
        assert!((d.anim.value(Element::LeftEye, Channel::ScaleY) - 1.0).abs() < 1e-3);
        // leave OKAY before the next interval elapses: no further blink
        d.apply(Action::SelectMood(Mood::Good));
        d.tick(4.0);
        assert!(!d.anim.is_animating(Element::LeftEye, Channel::ScaleY));
    }

    #[test]
    fn okay_hides_pupils_instantly() {
        let mut d = director();
        d.apply(Action::PointerMove { col: 45, row: 8 });
        d.apply(Action::SelectMood(Mood::Okay));
        assert_eq!(d.anim.value(Element::LeftPupil, Channel::Scale), 0.0);
        assert_eq!(d.anim.value(Element::RightPupil, Channel::Scale), 0.0);
        d.apply(Action::SelectMood(Mood::Bad));
        assert_eq!(d.anim.value(Element::LeftPupil, Channel::Scale), 1.0);
    }

    #[test]
    fn slider_walk_clamps_at_the_ends() {
        let mut d = director();
        d.apply(Action::SlideMood(1));
        assert_eq!(d.state.mood, Mood::Good);
        d.apply(Action::SlideMood(-1));
        assert_eq!(d.state.mood, Mood::Okay);
        d.apply(Action::SlideMood(-1));
        d.apply(Action::SlideMood(-1));
        assert_eq!(d.state.mood, Mood::Bad);
    }

    #[test]
    fn dot_click_selects_that_mood() {
        let mut d = director();
        d.apply(Action::PointerSelect { col: 15, row: 21 });
        assert_eq!(d.state.mood, Mood::Bad);
        d.apply(Action::PointerSelect { col: 30, row: 21 });
        assert_eq!(d.state.mood, Mood::Okay);
        // a click outside every dot changes nothing
        d.apply(Action::PointerSelect { col: 11, row: 6 });
        assert_eq!(d.state.mood, Mood::Okay);
    }

    #[test]
    fn feedback_editing_round_trip() {
        let mut d = director();
        d.apply(Action::FeedbackChar('x'));
        assert_eq!(d.state.feedback, "");
        d.apply(Action::ToggleFeedback);
        for ch in "Great service".chars() {
            d.apply(Action::FeedbackChar(ch));
        }
        d.apply(Action::FeedbackBackspace);
        d.apply(Action::FeedbackChar('e'));
        assert_eq!(d.state.feedback, "Great service");
    }

    #[test]
    fn submission_scenario_end_to_end() {
        let mut d = director();
        d.apply(Action::ToggleFeedback);
        for ch in "Great service".chars() {
            d.apply(Action::FeedbackChar(ch));
        }
        d.apply(Action::Submit);
        assert!(d.state.submitted);
        assert_eq!(d.state.feedback, "Great service");
        assert!(!d.blink_armed());

        // burst waits for the submitted view to be drawn
        d.tick(0.1);
        assert_eq!(d.confetti.len(), 0);
        d.set_layout(laid_out(true));
        d.tick(0.016);
        assert_eq!(d.confetti.len(), PARTICLE_COUNT);

        // pop replaced the idle sway on the face
        assert_eq!(d.anim.active_on(Element::Face), 1);
        assert!(d.anim.is_animating(Element::Face, Channel::Scale));
        assert!(!d.anim.is_animating(Element::Face, Channel::Rotation));

        // mood editing and tracking are inert now
        d.apply(Action::SelectMood(Mood::Bad));
        assert_eq!(d.state.mood, Mood::Good);
        d.apply(Action::PointerMove { col: 48, row: 23 });
        assert!(!d.anim.is_animating(Element::LeftPupil, Channel::X));
    }

    #[test]
    fn second_submit_is_a_no_op() {
        let mut d = director();
        d.apply(Action::Submit);
        d.set_layout(laid_out(true));
        d.tick(0.016);
        assert_eq!(d.confetti.len(), PARTICLE_COUNT);
        let feedback_before = d.state.feedback.clone();
        d.apply(Action::Submit);
        d.tick(0.016);
        // no duplicate burst, no state change
        assert!(d.confetti.len() <= PARTICLE_COUNT);
        assert!(d.state.submitted);
        assert_eq!(d.state.feedback, feedback_before);
    }

    #[test]
    fn idle_sway_never_finishes_on_its_own() {
        let mut d = director();
        for _ in 0..200 {
            d.tick(0.1);
        }
        assert!(d.anim.is_animating(Element::Face, Channel::Rotation));
    }
}
