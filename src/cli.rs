//! Command-line arguments of the `pl0c` driver

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{ArgGroup, Parser};
use std::path::PathBuf;

/// Compile a PL0 program to three-address IR
#[derive(Debug, Parser)]
#[command(name = "pl0c", styles = styles())]
#[command(group(ArgGroup::new("dump").args(["lex", "ast", "sym", "ir"])))]
pub struct Args {
    /// Source file to compile
    pub input: PathBuf,

    /// Write the output here instead of stdout
    #[arg(short = 'o', long = "out")]
    pub out: Option<PathBuf>,

    /// Print the token table and stop
    #[arg(short = 'l', long)]
    pub lex: bool,

    /// Print the syntax tree and stop
    #[arg(short = 'a', long)]
    pub ast: bool,

    /// Print the symbol table and stop
    #[arg(long)]
    pub sym: bool,

    /// Print the IR (the default)
    #[arg(short = 'I', long)]
    pub ir: bool,

    /// Enable verbose logging
    #[arg(short = 'V', long)]
    pub verbose: bool,
}

/// What the driver prints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dump {
    Tokens,
    Ast,
    Symbols,
    Ir,
}

impl Args {
    pub fn dump(&self) -> Dump {
        if self.lex {
            Dump::Tokens
        } else if self.ast {
            Dump::Ast
        } else if self.sym {
            Dump::Symbols
        } else {
            Dump::Ir
        }
    }
}

/// Help and error styling for the CLI
pub fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default())
        .error(AnsiColor::Red.on_default() | Effects::BOLD)
        .valid(AnsiColor::Green.on_default() | Effects::BOLD)
        .invalid(AnsiColor::Red.on_default() | Effects::BOLD)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_dump_is_ir() {
        let args = Args::try_parse_from(["pl0c", "prog.pl0"]).unwrap();

        assert_eq!(args.dump(), Dump::Ir);
        assert_eq!(args.input, PathBuf::from("prog.pl0"));
        assert!(args.out.is_none());
    }

    #[test]
    fn test_dump_flags() {
        let args = Args::try_parse_from(["pl0c", "--sym", "-V", "prog.pl0"]).unwrap();

        assert_eq!(args.dump(), Dump::Symbols);
        assert!(args.verbose);
    }

    #[test]
    fn test_dump_flags_are_exclusive() {
        assert!(Args::try_parse_from(["pl0c", "--lex", "--ast", "prog.pl0"]).is_err());
    }
}
