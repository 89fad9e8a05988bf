use json_patch::Patch;

/// Outcome of running a handler against a target resource.
#[derive(Clone, Debug, PartialEq)]
pub enum Verdict {
    Allowed,
    /// The message is shown to the user that issued the request.
    Denied(String),
    Patched(Patch),
}

impl Verdict {
    /// An empty patch means there is nothing to change, which is a plain
    /// approval rather than an empty list of edits.
    pub fn from_patch(patch: Patch) -> Verdict {
        if patch.0.is_empty() {
            Verdict::Allowed
        } else {
            Verdict::Patched(patch)
        }
    }

    pub fn is_allowed(&self) -> bool {
        !matches!(self, Verdict::Denied(_))
    }

    pub fn is_mutation(&self) -> bool {
        matches!(self, Verdict::Patched(_))
    }
}
