use crate::model::Mood;
use std::collections::HashMap;

/// Animatable targets on the card.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum Element {
    Card,
    Face,
    LeftEye,
    RightEye,
    LeftPupil,
    RightPupil,
    Mouth,
    Label,
    Dot(Mood),
}

/// Property slots. A tween owns exactly one (element, channel) slot, so a
/// pointer-tracking tween on pupil X/Y never disturbs a visibility tween on
/// pupil Scale, and starting a tween on an occupied slot supersedes the
/// previous one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum Channel {
    X,
    Y,
    Scale,
    ScaleY,
    Rotation,
    Opacity,
    Curve,
    Blend,
}

impl Channel {
    fn neutral(self) -> f32 {
        match self {
            Channel::Scale | Channel::ScaleY => 1.0,
            _ => 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Ease {
    Linear,
    QuadOut,
    QuadInOut,
    CubicOut,
    CubicInOut,
    SineInOut,
    /// Overshoots past the target on the way in, by the given amount.
    BackOut(f32),
    ElasticOut,
}

impl Ease {
    pub(crate) fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Ease::Linear => t,
            Ease::QuadOut => 1.0 - (1.0 - t) * (1.0 - t),
            Ease::QuadInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Ease::CubicOut => 1.0 - (1.0 - t).powi(3),
            Ease::CubicInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Ease::SineInOut => -((std::f32::consts::PI * t).cos() - 1.0) / 2.0,
            Ease::BackOut(s) => {
                let u = t - 1.0;
                1.0 + u * u * ((s + 1.0) * u + s)
            }
            Ease::ElasticOut => {
                if t <= 0.0 {
                    0.0
                } else if t >= 1.0 {
                    1.0
                } else {
                    // half-second period against a unit duration
                    2f32.powf(-10.0 * t)
                        * ((t - 0.125) * 4.0 * std::f32::consts::PI).sin()
                        + 1.0
                }
            }
        }
    }
}

/// One tween request. `repeat` counts extra cycles (-1 = forever); `yoyo`
/// reverses direction on alternating cycles.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Motion {
    pub(crate) to: f32,
    pub(crate) from: Option<f32>,
    pub(crate) duration: f32,
    pub(crate) ease: Ease,
    pub(crate) yoyo: bool,
    pub(crate) repeat: i32,
}

impl Motion {
    pub(crate) fn to(to: f32, duration: f32, ease: Ease) -> Self {
        Self {
            to,
            from: None,
            duration,
            ease,
            yoyo: false,
            repeat: 0,
        }
    }

    pub(crate) fn from_to(from: f32, to: f32, duration: f32, ease: Ease) -> Self {
        Self {
            from: Some(from),
            ..Self::to(to, duration, ease)
        }
    }
}

struct Tween {
    el: Element,
    ch: Channel,
    from: f32,
    to: f32,
    duration: f32,
    ease: Ease,
    yoyo: bool,
    repeat: i32,
    elapsed: f32,
    reversed: bool,
}

/// The tween capability. Single-threaded and cooperative: nothing moves
/// except inside `tick`, which the app calls between frames.
///
/// Cancellation leaves a slot at its last interpolated value; callers that
/// need a known value afterwards set it explicitly.
pub(crate) struct Animator {
    clock: f32,
    values: HashMap<(Element, Channel), f32>,
    tweens: Vec<Tween>,
}

impl Animator {
    pub(crate) fn new() -> Self {
        Self {
            clock: 0.0,
            values: HashMap::new(),
            tweens: Vec::new(),
        }
    }

    /// Seconds of animation time elapsed since startup.
    pub(crate) fn clock(&self) -> f32 {
        self.clock
    }

    pub(crate) fn value(&self, el: Element, ch: Channel) -> f32 {
        self.values.get(&(el, ch)).copied().unwrap_or(ch.neutral())
    }

    /// The "set immediately" variant: no interpolation, and any tween on the
    /// slot is dropped so it cannot overwrite the value later.
    pub(crate) fn set(&mut self, el: Element, ch: Channel, value: f32) {
        self.tweens.retain(|t| !(t.el == el && t.ch == ch));
        self.values.insert((el, ch), value);
    }

    /// Start a tween on (el, ch), superseding any tween already on the slot.
    /// A `from` in the motion snaps the slot there before interpolating.
    pub(crate) fn animate(&mut self, el: Element, ch: Channel, m: Motion) {
        let from = m.from.unwrap_or_else(|| self.value(el, ch));
        self.tweens.retain(|t| !(t.el == el && t.ch == ch));
        self.values.insert((el, ch), from);
        self.tweens.push(Tween {
            el,
            ch,
            from,
            to: m.to,
            duration: m.duration.max(1e-3),
            ease: m.ease,
            yoyo: m.yoyo,
            repeat: m.repeat,
            elapsed: 0.0,
            reversed: false,
        });
    }

    /// Drop every in-flight tween on a target, all channels at once.
    pub(crate) fn cancel_all(&mut self, el: Element) {
        self.tweens.retain(|t| t.el != el);
    }

    pub(crate) fn tick(&mut self, dt: f32) {
        self.clock += dt;
        let Self { values, tweens, .. } = self;
        tweens.retain_mut(|t| {
            t.elapsed += dt;
            while t.elapsed >= t.duration {
                if t.repeat == 0 {
                    let end = if t.reversed { t.from } else { t.to };
                    values.insert((t.el, t.ch), end);
                    return false;
                }
                t.elapsed -= t.duration;
                if t.repeat > 0 {
                    t.repeat -= 1;
                }
                if t.yoyo {
                    t.reversed = !t.reversed;
                }
            }
            let p = t.ease.apply(t.elapsed / t.duration);
            let (a, b) = if t.reversed {
                (t.to, t.from)
            } else {
                (t.from, t.to)
            };
            values.insert((t.el, t.ch), a + (b - a) * p);
            true
        });
    }

    #[cfg(test)]
    pub(crate) fn is_animating(&self, el: Element, ch: Channel) -> bool {
        self.tweens.iter().any(|t| t.el == el && t.ch == ch)
    }

    #[cfg(test)]
    pub(crate) fn active_on(&self, el: Element) -> usize {
        self.tweens.iter().filter(|t| t.el == el).count()
    }

    #[cfg(test)]
    pub(crate) fn target_of(&self, el: Element, ch: Channel) -> Option<f32> {
        self.tweens
            .iter()
            .find(|t| t.el == el && t.ch == ch)
            .map(|t| t.to)
    }
}
