//! Token emission helpers.

use crate::token::RawToken;
use crate::tokenizer::Tokenizer;

impl Tokenizer {
    pub(super) fn emit_token<F: FnMut(RawToken)>(&mut self, token: RawToken, emit: &mut F) {
        #[cfg(any(test, feature = "debug-stats"))]
        log::trace!(target: "html.tokenizer", "emit token: {token:?}");
        self.stats.tokens_emitted = self.stats.tokens_emitted.saturating_add(1);
        emit(token);
    }

    /// Emit the saved suffix plus `tail` as one text token, if non-empty.
    /// Leaves the saved suffix empty.
    pub(super) fn flush_text<F: FnMut(RawToken)>(&mut self, tail: &str, emit: &mut F) {
        let mut raw = std::mem::take(&mut self.saved);
        raw.push_str(tail);
        if !raw.is_empty() {
            let kind = self.text_kind();
            self.emit_token(RawToken::text(raw, kind), emit);
        }
    }
}
