/// What the composer needs to know about the page when deciding to submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ComposerGate {
    pub is_loading: bool,
    pub disabled: bool,
}

impl ComposerGate {
    pub fn accepts_input(self) -> bool {
        !self.is_loading && !self.disabled
    }
}

#[derive(Debug, Default)]
pub struct Composer {
    buffer: String,
}

impl Composer {
    pub fn buffer_mut(&mut self) -> &mut String {
        &mut self.buffer
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.buffer = text.into();
    }

    pub fn can_submit(&self, gate: ComposerGate) -> bool {
        gate.accepts_input() && !self.buffer.trim().is_empty()
    }

    /// Takes the trimmed buffer if it may be sent, clearing it; otherwise leaves it alone.
    pub fn submit(&mut self, gate: ComposerGate) -> Option<String> {
        if !self.can_submit(gate) {
            return None;
        }
        let message = self.buffer.trim().to_string();
        self.buffer.clear();
        Some(message)
    }

    /// Enter submits; Shift+Enter is left to the text box as a newline.
    pub fn on_enter(&mut self, shift: bool, gate: ComposerGate) -> Option<String> {
        if shift {
            return None;
        }
        self.submit(gate)
    }
}

#[cfg(test)]
mod tests {
    use super::{Composer, ComposerGate};

    const READY: ComposerGate = ComposerGate {
        is_loading: false,
        disabled: false,
    };

    #[test]
    fn submit_trims_and_clears() {
        let mut composer = Composer::default();
        composer.set_text("  What skills?\n");
        assert_eq!(composer.submit(READY).as_deref(), Some("What skills?"));
        assert_eq!(composer.text(), "");
    }

    #[test]
    fn whitespace_only_input_never_submits() {
        let mut composer = Composer::default();
        for blank in ["", " ", "\n\t  \n"] {
            composer.set_text(blank);
            assert_eq!(composer.submit(READY), None);
            assert_eq!(composer.on_enter(false, READY), None);
        }
    }

    #[test]
    fn loading_or_disabled_keeps_the_buffer() {
        let mut composer = Composer::default();
        composer.set_text("hello");

        let loading = ComposerGate {
            is_loading: true,
            disabled: false,
        };
        let disabled = ComposerGate {
            is_loading: false,
            disabled: true,
        };
        assert_eq!(composer.submit(loading), None);
        assert_eq!(composer.submit(disabled), None);
        assert_eq!(composer.text(), "hello");
    }

    #[test]
    fn shift_enter_does_not_submit() {
        let mut composer = Composer::default();
        composer.set_text("line one");
        assert_eq!(composer.on_enter(true, READY), None);
        assert_eq!(composer.on_enter(false, READY).as_deref(), Some("line one"));
    }
}
