//! Wadler-Lindig printer for the lbc format IR.
//!
//! Converts a `FormatIR` tree into a formatted string by deciding at each
//! `Group` boundary whether to render flat (all on one line) or broken
//! (with line breaks and indentation), so re-printed source is optimally
//! laid out rather than one-token-per-line.

use crate::ir::FormatIR;

/// Configuration for the re-printer's output.
#[derive(Debug, Clone)]
pub struct FormatConfig {
    /// Number of spaces per indentation level. Default: 4 (BASIC-style).
    pub indent_size: usize,
    /// Maximum line width before groups break. Default: 100.
    pub max_width: usize,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            indent_size: 4,
            max_width: 100,
        }
    }
}

/// Whether the current context is rendering flat or broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Flat,
    Break,
}

#[derive(Debug)]
struct PrintCmd<'a> {
    indent: usize,
    mode: Mode,
    ir: &'a FormatIR,
}

/// Render a `FormatIR` tree as a formatted string respecting the given
/// config. Stack-based: at each `Group`, measures whether the flat
/// rendering fits on the remaining line before committing to a mode.
pub fn print(ir: &FormatIR, config: &FormatConfig) -> String {
    let mut out = String::new();
    let mut col: usize = 0;
    let mut stack: Vec<PrintCmd> = vec![PrintCmd {
        indent: 0,
        mode: Mode::Break,
        ir,
    }];

    while let Some(cmd) = stack.pop() {
        match cmd.ir {
            FormatIR::Empty => {}

            FormatIR::Text(s) => {
                out.push_str(s);
                col += s.len();
            }

            FormatIR::Space => match cmd.mode {
                Mode::Flat => {
                    out.push(' ');
                    col += 1;
                }
                Mode::Break => {
                    out.push('\n');
                    out.push_str(&" ".repeat(cmd.indent));
                    col = cmd.indent;
                }
            },

            FormatIR::Hardline => {
                out.push('\n');
                out.push_str(&" ".repeat(cmd.indent));
                col = cmd.indent;
            }

            FormatIR::Indent(child) => {
                stack.push(PrintCmd {
                    indent: cmd.indent + config.indent_size,
                    mode: cmd.mode,
                    ir: child,
                });
            }

            FormatIR::Group(child) => {
                let flat_width = measure_flat(child);
                let mode = if col + flat_width <= config.max_width {
                    Mode::Flat
                } else {
                    Mode::Break
                };
                stack.push(PrintCmd {
                    indent: cmd.indent,
                    mode,
                    ir: child,
                });
            }

            FormatIR::IfBreak { flat, broken } => {
                let chosen = match cmd.mode {
                    Mode::Flat => flat,
                    Mode::Break => broken,
                };
                stack.push(PrintCmd {
                    indent: cmd.indent,
                    mode: cmd.mode,
                    ir: chosen,
                });
            }

            FormatIR::Concat(parts) => {
                for part in parts.iter().rev() {
                    stack.push(PrintCmd {
                        indent: cmd.indent,
                        mode: cmd.mode,
                        ir: part,
                    });
                }
            }
        }
    }

    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }

    out
}

/// Width of an IR node when rendered flat. `usize::MAX` if it contains a
/// `Hardline` (which forces a break and can never fit on one line).
fn measure_flat(ir: &FormatIR) -> usize {
    match ir {
        FormatIR::Empty => 0,
        FormatIR::Text(s) => s.len(),
        FormatIR::Space => 1,
        FormatIR::Hardline => usize::MAX,
        FormatIR::Indent(child) => measure_flat(child),
        FormatIR::Group(child) => measure_flat(child),
        FormatIR::IfBreak { flat, .. } => measure_flat(flat),
        FormatIR::Concat(parts) => {
            let mut total: usize = 0;
            for part in parts {
                let w = measure_flat(part);
                if w == usize::MAX {
                    return usize::MAX;
                }
                total = total.saturating_add(w);
                if total == usize::MAX {
                    return usize::MAX;
                }
            }
            total
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::*;

    fn default_config() -> FormatConfig {
        FormatConfig::default()
    }

    #[test]
    fn group_fits_renders_flat() {
        let ir = group(concat(vec![text("a"), space(), text("b")]));
        assert_eq!(print(&ir, &default_config()), "a b\n");
    }

    #[test]
    fn group_exceeds_width_breaks() {
        let config = FormatConfig {
            indent_size: 2,
            max_width: 10,
        };
        let ir = group(concat(vec![
            text("hello"),
            space(),
            text("beautiful"),
            space(),
            text("world"),
        ]));
        assert_eq!(print(&ir, &config), "hello\nbeautiful\nworld\n");
    }

    #[test]
    fn hardline_always_breaks() {
        let ir = concat(vec![text("a"), hardline(), text("b")]);
        assert_eq!(print(&ir, &default_config()), "a\nb\n");
    }

    #[test]
    fn indent_adds_spaces() {
        let ir = concat(vec![
            text("SUB FOO()"),
            indent(concat(vec![hardline(), text("PRINT 1")])),
            hardline(),
            text("END SUB"),
        ]);
        assert_eq!(
            print(&ir, &default_config()),
            "SUB FOO()\n    PRINT 1\nEND SUB\n"
        );
    }

    #[test]
    fn if_break_selects_by_enclosing_mode() {
        let ir = group(concat(vec![
            text("("),
            if_break(text("x, y"), concat(vec![text("x,"), hardline(), text("y")])),
            text(")"),
        ]));
        assert_eq!(print(&ir, &default_config()), "(x, y)\n");
    }

    #[test]
    fn empty_produces_nothing() {
        let ir = concat(vec![text("a"), FormatIR::Empty, text("b")]);
        assert_eq!(print(&ir, &default_config()), "ab\n");
    }
}
