use std::collections::HashSet;

use crate::declaration::MixinDeclaration;
use crate::kind::ReferenceKind;
use crate::resolve::{target_method_selectors, Candidate, ResolutionOutcome, Resolver};
use crate::scanner::Mode;
use crate::selector::ParseError;

impl Resolver<'_> {
    /// Candidates for a selector being typed on `declaration`.
    ///
    /// Everything of the declaration's kind is enumerated, then filtered by
    /// `prefix` against the member name and the label (case-insensitive).
    /// Labels are unique and the list is capped at `max_candidates`.
    pub fn complete(&self, declaration: &MixinDeclaration, prefix: &str) -> Result<Vec<Candidate>, ParseError> {
        let kind = ReferenceKind::wildcard_for(declaration);
        let methods = target_method_selectors(declaration)?;

        let ResolutionOutcome::Candidates(all) = self.resolve_kind(&kind, &methods, declaration, Mode::Enumerate)
        else {
            return Ok(Vec::new());
        };

        let prefix = prefix.trim().to_ascii_lowercase();
        let mut seen = HashSet::new();
        let out: Vec<Candidate> = all
            .into_iter()
            .filter(|c| matches_prefix(c, &prefix))
            .filter(|c| seen.insert(c.label.clone()))
            .take(self.options().max_candidates)
            .collect();

        tracing::debug!(
            target = "weft.mixin",
            declaration = %declaration.name,
            prefix = %prefix,
            candidates = out.len(),
            "completed selector"
        );
        Ok(out)
    }
}

fn matches_prefix(candidate: &Candidate, prefix: &str) -> bool {
    prefix.is_empty()
        || candidate.name.to_ascii_lowercase().starts_with(prefix)
        || candidate.label.to_ascii_lowercase().starts_with(prefix)
}
