/// Control signal applied to a pipeline register between two cycles.
///
/// Exactly one signal is chosen per register per cycle, and it is applied to
/// every field of that register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Control {
    /// Latch the value computed during this cycle.
    #[default]
    Normal,
    /// Keep the current value, the computed one is discarded.
    Stall,
    /// Reset to the register's neutral (nop) value.
    Bubble,
}

impl Control {
    /// Combine the stall and bubble conditions of the HCL. At most one of
    /// them can be true.
    pub fn from_flags(stall: bool, bubble: bool) -> Self {
        debug_assert!(!(stall && bubble), "stall and bubble at the same time");
        if bubble {
            Control::Bubble
        } else if stall {
            Control::Stall
        } else {
            Control::Normal
        }
    }
}

impl std::fmt::Display for Control {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Control::Normal => "normal",
            Control::Stall => "stall",
            Control::Bubble => "bubble",
        };
        f.pad(s)
    }
}

/// A single field of a pipeline register (flip-flop).
///
/// `output` is what the downstream stage reads during the cycle, `input` is
/// what the upstream stage computed. They only meet when the register is
/// latched at the end of the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PipeField<T> {
    output: T,
    input: T,
}

impl<T: Copy> PipeField<T> {
    pub fn new(init: T) -> Self {
        Self {
            output: init,
            input: init,
        }
    }

    /// Value committed at the end of the previous cycle.
    pub fn output(&self) -> T {
        self.output
    }

    /// Value computed during this cycle, pending until latched.
    pub fn input(&self) -> T {
        self.input
    }

    pub fn set_input(&mut self, v: T) {
        self.input = v;
    }

    pub fn normal(&mut self) {
        self.output = self.input;
    }

    pub fn stall(&mut self) {
        self.input = self.output;
    }

    pub fn bubble(&mut self, reset: T) {
        self.output = reset;
        self.input = reset;
    }

    pub fn latch(&mut self, ctrl: Control, reset: T) {
        match ctrl {
            Control::Normal => self.normal(),
            Control::Stall => self.stall(),
            Control::Bubble => self.bubble(reset),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_transitions() {
        let mut f = PipeField::new(1u64);
        f.set_input(2);
        assert_eq!(f.output(), 1);
        f.latch(Control::Stall, 0);
        assert_eq!(f.output(), 1);

        f.set_input(3);
        f.latch(Control::Normal, 0);
        assert_eq!(f.output(), 3);

        f.set_input(4);
        f.latch(Control::Bubble, 0xf);
        assert_eq!(f.output(), 0xf);
    }

    #[test]
    fn test_from_flags() {
        assert_eq!(Control::from_flags(false, false), Control::Normal);
        assert_eq!(Control::from_flags(true, false), Control::Stall);
        assert_eq!(Control::from_flags(false, true), Control::Bubble);
    }
}
