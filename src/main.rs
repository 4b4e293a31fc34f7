// pl0c: PL0 compiler front end

use std::fs;

use anyhow::Context;
use clap::Parser as _;
use tracing::{debug, Level};

use pl0c::cli::{Args, Dump};
use pl0c::parser::lexer::{Lexer, Token};
use pl0c::parser::Parser;
use pl0c::{compile, semantic, CompileError};

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let source = fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    debug!(input = %args.input.display(), bytes = source.len(), "read source");

    let text = match render(args.dump(), &source) {
        Ok(text) => text,
        Err(err) => {
            debug!(diagnostics = err.count(), "compilation failed");
            eprintln!("{}", err);
            let code = if err.is_internal() { 2 } else { 1 };
            std::process::exit(code);
        }
    };

    match &args.out {
        Some(path) => fs::write(path, text)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => print!("{}", text),
    }

    Ok(())
}

/// Run the pipeline as far as the requested dump needs
fn render(dump: Dump, source: &str) -> Result<String, CompileError> {
    match dump {
        Dump::Tokens => {
            let tokens = Lexer::new(source).tokenize()?;
            Ok(token_table(&tokens))
        }
        Dump::Ast => {
            let program = Parser::from_source(source)?
                .parse_program()
                .into_result()
                .map_err(CompileError::Syntax)?;
            Ok(format!("{:#?}\n", program))
        }
        Dump::Symbols => {
            let program = Parser::from_source(source)?
                .parse_program()
                .into_result()
                .map_err(CompileError::Syntax)?;
            let analysis = semantic::check(&program);
            if !analysis.is_accepted() {
                return Err(CompileError::Semantic(analysis.errors));
            }
            Ok(analysis.symbols.to_string())
        }
        Dump::Ir => Ok(compile(source)?.to_string()),
    }
}

fn token_table(tokens: &[Token]) -> String {
    let mut table = format!("{:<12} {:<20} {}\n", "Type", "Value", "Line");
    for token in tokens {
        table.push_str(&format!(
            "{:<12} {:<20} {}\n",
            token.kind.name(),
            token.kind.lexeme(),
            token.location.line
        ));
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_table_has_one_row_per_token() {
        let tokens = Lexer::new("x := 1").tokenize().unwrap();
        let table = token_table(&tokens);
        let rows: Vec<&str> = table.lines().collect();

        assert_eq!(rows.len(), tokens.len() + 1);
        assert!(rows[0].starts_with("Type"));
        assert!(rows[2].contains(":="));
    }
}
