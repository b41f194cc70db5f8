use globset::{GlobBuilder, GlobMatcher};
use std::iter::Peekable;
use std::str::Chars;

use crate::core::config::TriggerConfig;
use crate::core::error::{PreflightError, Result};

/// The `PatternMatcher` trait decides whether a changed file is relevant to
/// a trigger.
pub trait PatternMatcher {
    /// Returns `true` when `fname`, a repository-relative path, should be
    /// passed to the trigger's command.
    fn matches_file(&self, fname: &str) -> bool;
}

/// A single compiled include or exclude pattern.
#[derive(Debug, Clone)]
struct GlobRule {
    /// Patterns without a `/` only ever see the base name of a file.
    basename_only: bool,
    matcher: GlobMatcher,
}

impl GlobRule {
    fn new(pattern: &str) -> Result<Self> {
        Ok(Self {
            basename_only: !pattern.contains('/'),
            matcher: compile_pattern(pattern)?,
        })
    }

    /// The string this rule is compared against for `fname`.
    fn candidate<'a>(&self, fname: &'a str) -> &'a str {
        if self.basename_only {
            base_name(fname)
        } else {
            fname
        }
    }
}

/// Include and exclude rules of one trigger, compiled once and applied to
/// every changed file.
///
/// Matching is similar to fnmatch. Includes are tried in order; the first
/// include that matches decides the outcome, and the excludes are checked
/// against the same name that include saw. A file that no include matches is
/// never selected.
#[derive(Debug, Clone)]
pub struct TriggerFilter {
    includes: Vec<GlobRule>,
    excludes: Vec<GlobRule>,
}

impl TriggerFilter {
    pub fn new(trigger: &TriggerConfig) -> Result<Self> {
        let includes = trigger
            .includes
            .iter()
            .map(|p| GlobRule::new(p))
            .collect::<Result<Vec<_>>>()?;
        let excludes = trigger
            .excludes
            .iter()
            .map(|p| GlobRule::new(p))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { includes, excludes })
    }
}

impl PatternMatcher for TriggerFilter {
    fn matches_file(&self, fname: &str) -> bool {
        for include in &self.includes {
            let match_name = include.candidate(fname);
            if !include.matcher.is_match(match_name) {
                continue;
            }
            return !self
                .excludes
                .iter()
                .any(|exclude| exclude.matcher.is_match(match_name));
        }
        false
    }
}

/// Checks a single file against a trigger's rules.
///
/// A malformed pattern is reported as an error rather than a non-match.
pub fn matches(trigger: &TriggerConfig, fname: &str) -> Result<bool> {
    Ok(TriggerFilter::new(trigger)?.matches_file(fname))
}

/// Compiles a shell-glob pattern.
///
/// `*` and `?` never cross a `/`. Backslash escapes work both outside and
/// inside bracket classes, a class is negated by a leading `^` only, and an
/// unescaped `-` or `]` where a class member is expected is a syntax error.
/// The richer syntax globset would otherwise accept (`**` and `{a,b}`
/// alternation) is neutralised so that those characters keep their plain
/// shell meaning.
pub fn compile_pattern(pattern: &str) -> Result<GlobMatcher> {
    let syntax_error = |message: String| PreflightError::GlobSyntax {
        pattern: pattern.to_string(),
        message,
    };
    let glob = GlobBuilder::new(&shell_glob(pattern).map_err(syntax_error)?)
        .literal_separator(true)
        .backslash_escape(true)
        .build()
        .map_err(|e| syntax_error(e.kind().to_string()))?;
    Ok(glob.compile_matcher())
}

/// Rewrites a shell glob into globset syntax with the same meaning.
///
/// Runs of `*` collapse into one, since a star cannot span directories
/// anyway, braces become literal, and every bracket class is parsed here and
/// written back out in a form globset reads literally.
fn shell_glob(pattern: &str) -> std::result::Result<String, String> {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                out.push(c);
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            }
            '[' => CharClass::parse(&mut chars)?.write_glob(&mut out),
            '*' => {
                out.push(c);
                while chars.next_if_eq(&'*').is_some() {}
            }
            '{' | '}' => {
                out.push('[');
                out.push(c);
                out.push(']');
            }
            _ => out.push(c),
        }
    }
    Ok(out)
}

const UNCLOSED_CLASS: &str = "unclosed character class";

/// Characters globset's class grammar reads by position rather than as plain
/// members. Sorted.
const CLASS_SPECIALS: [char; 4] = ['!', '-', ']', '^'];

/// A bracket class with its escapes resolved.
#[derive(Debug, PartialEq)]
struct CharClass {
    negated: bool,
    /// Inclusive ranges; single members are `(c, c)`. Reversed ranges are
    /// kept and match nothing.
    ranges: Vec<(char, char)>,
}

impl CharClass {
    /// Parses a class body; the opening `[` has already been consumed.
    fn parse(chars: &mut Peekable<Chars<'_>>) -> std::result::Result<Self, String> {
        let negated = chars.next_if_eq(&'^').is_some();
        let mut ranges = Vec::new();
        loop {
            if !ranges.is_empty() && chars.next_if_eq(&']').is_some() {
                return Ok(Self { negated, ranges });
            }
            let lo = class_member(chars)?;
            let hi = if chars.next_if_eq(&'-').is_some() {
                class_member(chars)?
            } else {
                lo
            };
            ranges.push((lo, hi));
        }
    }

    /// Appends the class in globset syntax.
    ///
    /// `]` and `-` are literal only in the first or last slot, and neither
    /// `!` nor `^` may open a class that is not negated, so those four are
    /// split out of the ranges and placed explicitly.
    fn write_glob(&self, out: &mut String) {
        let mut plain = Vec::new();
        let mut specials = Vec::new();
        for &(lo, hi) in self.ranges.iter().filter(|(lo, hi)| lo <= hi) {
            let mut cur = lo;
            for s in CLASS_SPECIALS {
                if s < cur || s > hi {
                    continue;
                }
                if cur < s {
                    plain.push((cur, ascii_step(s, -1)));
                }
                if !specials.contains(&s) {
                    specials.push(s);
                }
                cur = ascii_step(s, 1);
            }
            if cur <= hi {
                plain.push((cur, hi));
            }
        }
        let has = |c: char| specials.contains(&c);

        if plain.is_empty() && specials.is_empty() {
            // Only reversed ranges. A NUL never occurs in a path, and a
            // negated empty class matches any character, `/` included.
            out.push_str(if self.negated { "{?,/}" } else { "\0" });
            return;
        }
        if !self.negated && plain.is_empty() && !has(']') && !has('-') {
            out.push_str(match (has('!'), has('^')) {
                (true, true) => "{\\!,\\^}",
                (true, false) => "\\!",
                _ => "\\^",
            });
            return;
        }

        out.push('[');
        if self.negated {
            out.push('^');
        }
        // With `]` taking the first slot, `-` goes last instead.
        let dash_first = has('-') && !has(']');
        if has(']') {
            out.push(']');
        } else if dash_first {
            out.push('-');
        }
        for (lo, hi) in plain {
            out.push(lo);
            if lo != hi {
                out.push('-');
                out.push(hi);
            }
        }
        for c in ['!', '^'] {
            if has(c) {
                out.push(c);
            }
        }
        if has('-') && !dash_first {
            out.push('-');
        }
        out.push(']');
    }
}

/// Reads one class member. `-` and `]` must be escaped here, and the class
/// must not end right after the member.
fn class_member(chars: &mut Peekable<Chars<'_>>) -> std::result::Result<char, String> {
    let member = match chars.next() {
        None => return Err(UNCLOSED_CLASS.to_string()),
        Some(c @ ('-' | ']')) => {
            return Err(format!("unescaped {c:?} in character class"));
        }
        Some('\\') => chars.next().ok_or_else(|| UNCLOSED_CLASS.to_string())?,
        Some(c) => c,
    };
    if chars.peek().is_none() {
        return Err(UNCLOSED_CLASS.to_string());
    }
    Ok(member)
}

/// Neighbour of one of the ASCII `CLASS_SPECIALS`.
fn ascii_step(c: char, delta: i8) -> char {
    char::from((c as u8).wrapping_add_signed(delta))
}

fn base_name(fname: &str) -> &str {
    let trimmed = fname.trim_end_matches('/');
    if trimmed.is_empty() {
        return if fname.is_empty() { "." } else { "/" };
    }
    match trimmed.rsplit_once('/') {
        Some((_, base)) => base,
        None => trimmed,
    }
}
