//! Frames left out of stack hashes.
//!
//! Debugger, verifier and heap plumbing shows up on many unrelated crash
//! stacks; hashing it would merge distinct bugs into one bucket.

/// Built-in exclusion patterns, matched case-insensitively against
/// `module!symbol` names.
pub const EXCLUDED_SYMBOLS: &[&str] = &[
    "apvrf!*",
    "apvrf",
    "ntdll*!dbgbreakpoint",
    "ntdll*!dbguiremotebreakin",
    "ntdll*!_eh4_callfilterfunc",
    "ntdll*!_except_handler4",
    "ntdll*!executehandler2",
    "ntdll*!executehandler",
    "ntdll*!kifastsystemcallret",
    "ntdll*!kiuserexceptiondispatcher",
    "ntdll*!rtl*exception*",
    "ntdll*!rtl*heap*",
    "ntdll*!rtl*failure*",
    "ntdll*!zwwaitformultipleobjects",
    "msvcrt!free",
    "msvcrt!*alloc",
    "kernel32!werp*",
    "kernel32!unhandledexceptionfilter",
    "kernel32!*raiseexception*",
    "kernel32!waitformultipleobjects*",
    "kernel32!heapfree",
    "kernel32!kebugcheck*",
    "clrstub*",
    "vrfcore!*",
    "vrfcore",
    "vfbasics!*",
    "vfbasics",
    "verifier!*",
    "verifier",
    "mscorwks",
];

/// Match `text` against a pattern where `*` matches any run of characters
/// and `?` matches exactly one. ASCII case is ignored.
pub fn wildcard_match(pattern: &str, text: &str) -> bool {
    let pattern = pattern.as_bytes();
    let text = text.as_bytes();
    let (mut p, mut t) = (0, 0);
    // Last `*` seen and the text position it is currently absorbing up to.
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() && pattern[p] == b'*' {
            backtrack = Some((p, t));
            p += 1;
        } else if p < pattern.len()
            && (pattern[p] == b'?' || pattern[p].eq_ignore_ascii_case(&text[t]))
        {
            p += 1;
            t += 1;
        } else if let Some((star, absorbed)) = backtrack {
            p = star + 1;
            t = absorbed + 1;
            backtrack = Some((star, t));
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|b| *b == b'*')
}

/// Built-in patterns plus caller-supplied extras.
#[derive(Debug, Clone, Default)]
pub struct ExclusionList {
    extra: Vec<String>,
}

impl ExclusionList {
    pub fn new(extra: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self { extra: extra.into_iter().map(Into::into).collect() }
    }

    pub fn is_excluded(&self, symbol: &str) -> bool {
        EXCLUDED_SYMBOLS.iter().any(|pattern| wildcard_match(pattern, symbol))
            || self.extra.iter().any(|pattern| wildcard_match(pattern, symbol))
    }
}
