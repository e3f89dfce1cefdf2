//! Wadler-Lindig format IR for re-printing lbc source.
//!
//! This module defines the intermediate representation used between the AST
//! walker and the printer. The IR captures formatting intent (groups,
//! indentation, line breaks) without committing to a specific layout until
//! printing time.

/// A document IR node in the Wadler-Lindig style.
///
/// The printer decides at each `Group` boundary whether to render flat (all
/// on one line) or broken (with line breaks and indentation).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatIR {
    /// Literal text to emit verbatim.
    Text(String),
    /// A space in flat mode; a newline + indent in broken mode.
    Space,
    /// Always emits a newline + current indentation, regardless of mode.
    Hardline,
    /// Increase indentation for the child IR by the configured indent size.
    Indent(Box<FormatIR>),
    /// Try to render the child flat (on one line). If it exceeds the
    /// remaining line width, render in broken mode instead.
    Group(Box<FormatIR>),
    /// Emit different content depending on whether the enclosing group is
    /// in flat or broken mode.
    IfBreak {
        flat: Box<FormatIR>,
        broken: Box<FormatIR>,
    },
    /// A sequence of IR nodes rendered in order.
    Concat(Vec<FormatIR>),
    /// Produces no output.
    Empty,
}

// ── Helper constructors ─────────────────────────────────────────────────

pub fn text(s: impl Into<String>) -> FormatIR {
    FormatIR::Text(s.into())
}

pub fn space() -> FormatIR {
    FormatIR::Space
}

pub fn hardline() -> FormatIR {
    FormatIR::Hardline
}

pub fn indent(ir: FormatIR) -> FormatIR {
    FormatIR::Indent(Box::new(ir))
}

pub fn group(ir: FormatIR) -> FormatIR {
    FormatIR::Group(Box::new(ir))
}

pub fn concat(parts: Vec<FormatIR>) -> FormatIR {
    FormatIR::Concat(parts)
}

pub fn if_break(flat: FormatIR, broken: FormatIR) -> FormatIR {
    FormatIR::IfBreak {
        flat: Box::new(flat),
        broken: Box::new(broken),
    }
}
