//! Text being composed in the input bar.

/// Upper bound on a single outgoing message, in characters.
const MAX_INPUT_CHARS: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MessageInputState {
    text: String,
}

impl MessageInputState {
    pub fn text(&self) -> &str {
        &self.text
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Number of characters, which is also where the cursor sits.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Appends a character. Returns false once the length limit is reached.
    pub fn push_char(&mut self, ch: char) -> bool {
        if self.char_len() >= MAX_INPUT_CHARS {
            return false;
        }
        self.text.push(ch);
        true
    }

    pub fn pop_char(&mut self) {
        self.text.pop();
    }

    /// Takes the composed text, leaving the input empty.
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.text)
    }
}
