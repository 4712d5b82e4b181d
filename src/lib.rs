pub mod arbitrary;
pub mod candidate;
pub mod config;
pub mod emitter;
pub mod error;
pub mod escape;
pub mod printer;
pub mod stack;
pub mod utility;
pub mod variant;

use std::env;
use std::fs;
use std::io::{self, Read};
use std::path::Path;

use candidate::{SegmentRole, split_candidate};

pub use emitter::{CompileOutcome, CompiledRule, Compiler};
pub use error::{CompileError, CompileResult};
pub use utility::{CoreUtilities, Declaration, Utility, UtilityResolver};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Compile {
        candidates: Vec<String>,
        out: Option<String>,
        minify: bool,
        config: Option<String>,
    },
    Explain {
        candidate: String,
        config: Option<String>,
    },
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliError {
    pub message: String,
}

pub fn run(command: Command) -> Result<(), CliError> {
    match command {
        Command::Compile {
            candidates,
            out,
            minify,
            config,
        } => run_compile(candidates, out, minify, config),
        Command::Explain { candidate, config } => run_explain(&candidate, config),
        Command::Help => {
            print_help();
            Ok(())
        }
    }
}

pub fn run_from_env() -> Result<(), CliError> {
    let command = parse_args(env::args().skip(1))?;
    run(command)
}

pub fn parse_args<I>(args: I) -> Result<Command, CliError>
where
    I: IntoIterator<Item = String>,
{
    let mut iter = args.into_iter();
    let Some(cmd) = iter.next() else {
        return Ok(Command::Help);
    };

    match cmd.as_str() {
        "compile" => parse_compile_args(iter.collect()),
        "explain" => parse_explain_args(iter.collect()),
        "-h" | "--help" | "help" => Ok(Command::Help),
        _ => Err(CliError {
            message: format!("unknown command: {}", cmd),
        }),
    }
}

fn parse_compile_args(args: Vec<String>) -> Result<Command, CliError> {
    let mut candidates = Vec::new();
    let mut out = None;
    let mut minify = false;
    let mut config = None;
    let mut idx = 0;

    while idx < args.len() {
        match args[idx].as_str() {
            "--out" | "--output" | "-o" => {
                idx += 1;
                if idx >= args.len() {
                    return Err(CliError {
                        message: "compile requires a value for --output".to_string(),
                    });
                }
                out = Some(args[idx].clone());
            }
            "--config" | "-c" => {
                idx += 1;
                if idx >= args.len() {
                    return Err(CliError {
                        message: "compile requires a value for --config".to_string(),
                    });
                }
                config = Some(args[idx].clone());
            }
            "--minify" => {
                minify = true;
            }
            value => {
                candidates.push(value.to_string());
            }
        }
        idx += 1;
    }

    Ok(Command::Compile {
        candidates,
        out,
        minify,
        config,
    })
}

fn parse_explain_args(args: Vec<String>) -> Result<Command, CliError> {
    let mut candidate = None;
    let mut config = None;
    let mut idx = 0;

    while idx < args.len() {
        match args[idx].as_str() {
            "--config" | "-c" => {
                idx += 1;
                if idx >= args.len() {
                    return Err(CliError {
                        message: "explain requires a value for --config".to_string(),
                    });
                }
                config = Some(args[idx].clone());
            }
            value => {
                if candidate.is_some() {
                    return Err(CliError {
                        message: format!("explain takes a single candidate, got extra: {}", value),
                    });
                }
                candidate = Some(value.to_string());
            }
        }
        idx += 1;
    }

    let Some(candidate) = candidate else {
        return Err(CliError {
            message: "explain requires a candidate".to_string(),
        });
    };

    Ok(Command::Explain { candidate, config })
}

fn load_compiler(config_path: Option<&str>) -> Result<Compiler, CliError> {
    let config = match config_path {
        Some(path) => config::load(Path::new(path)).map_err(|err| CliError {
            message: err.message,
        })?,
        None => config::Config::default(),
    };
    tracing::debug!(theme = %config.theme.name, "loaded config");
    Ok(Compiler::from_config(&config))
}

fn run_compile(
    mut candidates: Vec<String>,
    out: Option<String>,
    minify: bool,
    config_path: Option<String>,
) -> Result<(), CliError> {
    let compiler = load_compiler(config_path.as_deref())?;

    if candidates.is_empty() {
        let mut input = String::new();
        io::stdin()
            .read_to_string(&mut input)
            .map_err(|err| CliError {
                message: format!("failed to read candidates from stdin: {}", err),
            })?;
        candidates = input.split_whitespace().map(str::to_string).collect();
    }

    let outcomes = compiler.compile_all(&candidates);
    let rule_count = outcomes
        .iter()
        .filter(|outcome| outcome.rule().is_some())
        .count();
    let skipped = outcomes.len() - rule_count;
    let css = printer::print_outcomes(&outcomes, minify);

    match out {
        Some(path) => {
            fs::write(&path, format!("{}\n", css)).map_err(|err| CliError {
                message: format!("failed to write output {}: {}", path, err),
            })?;
        }
        None => println!("{}", css),
    }

    tracing::info!(rules = rule_count, skipped, "compile finished");
    eprintln!(
        "compiled {} rules from {} candidates, skipped {}",
        rule_count,
        outcomes.len(),
        skipped
    );

    Ok(())
}

fn run_explain(candidate: &str, config_path: Option<String>) -> Result<(), CliError> {
    let compiler = load_compiler(config_path.as_deref())?;
    for line in explain_lines(&compiler, candidate) {
        println!("{}", line);
    }
    Ok(())
}

fn explain_lines(compiler: &Compiler, candidate: &str) -> Vec<String> {
    let mut lines = vec![format!("candidate: {}", candidate)];

    match split_candidate(candidate) {
        Ok(split) => {
            let segments = split
                .segments()
                .iter()
                .map(|segment| match segment.role {
                    SegmentRole::Variant => segment.text.to_string(),
                    SegmentRole::Base => format!("<{}>", segment.text),
                })
                .collect::<Vec<_>>();
            lines.push(format!("segments: {}", segments.join(" | ")));
        }
        Err(err) => {
            lines.push(format!("skipped: {}", err));
            return lines;
        }
    }

    match compiler.parse(candidate) {
        Ok(parsed) => {
            for variant in &parsed.chain {
                lines.push(format!(
                    "variant: {} ({:?}) {}",
                    variant.raw, variant.kind, variant.parameter
                ));
            }
            lines.push(format!("base: {}", parsed.base));
        }
        Err(err) => {
            lines.push(format!("skipped: {}", err));
            return lines;
        }
    }

    match compiler.compile(candidate) {
        Ok(rule) => {
            if let Some(css) = printer::print_rule(&rule, false) {
                lines.push("rule:".to_string());
                lines.extend(css.lines().map(|line| format!("  {}", line)));
            }
        }
        Err(err) => lines.push(format!("skipped: {}", err)),
    }

    lines
}

fn print_help() {
    println!("tailstack");
    println!();
    println!("USAGE:");
    println!("  tailstack compile [--output <path>] [--minify] [--config <path>] [<candidate>...]");
    println!("  tailstack explain [--config <path>] <candidate>");
    println!();
    println!("Without candidates, compile reads whitespace-separated candidates from stdin.");
    println!();
    println!("EXAMPLES:");
    println!("  tailstack compile \"md:hover:bg-blue-500\" \"[&_p]:text-sm\"");
    println!("  tailstack compile --minify -c tailstack.toml \"min-[640px]:max-[1024px]:flex\"");
    println!("  echo \"flex hidden\" | tailstack compile -o dist/utilities.css");
    println!("  tailstack explain \"aria-[checked]:data-[state=active]:bg-blue-500\"");
}

#[cfg(test)]
mod tests {
    use super::{Command, Compiler, explain_lines, parse_args};

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn no_args_prints_help() {
        assert_eq!(parse_args(Vec::new()).expect("args should parse"), Command::Help);
        assert_eq!(
            parse_args(args(&["--help"])).expect("args should parse"),
            Command::Help
        );
    }

    #[test]
    fn parse_compile_collects_candidates_and_flags() {
        let command = parse_args(args(&[
            "compile",
            "--minify",
            "-c",
            "tailstack.toml",
            "hover:flex",
            "--output",
            "dist/out.css",
            "md:hidden",
        ]))
        .expect("compile args should parse");

        assert_eq!(
            command,
            Command::Compile {
                candidates: vec!["hover:flex".to_string(), "md:hidden".to_string()],
                out: Some("dist/out.css".to_string()),
                minify: true,
                config: Some("tailstack.toml".to_string()),
            }
        );
    }

    #[test]
    fn parse_compile_without_candidates_reads_stdin_later() {
        let command = parse_args(args(&["compile"])).expect("compile args should parse");
        assert_eq!(
            command,
            Command::Compile {
                candidates: vec![],
                out: None,
                minify: false,
                config: None,
            }
        );
    }

    #[test]
    fn parse_compile_requires_flag_values() {
        let err = parse_args(args(&["compile", "--config"])).expect_err("missing value");
        assert_eq!(err.message, "compile requires a value for --config");
        let err = parse_args(args(&["compile", "-o"])).expect_err("missing value");
        assert_eq!(err.message, "compile requires a value for --output");
    }

    #[test]
    fn parse_explain_takes_one_candidate() {
        assert_eq!(
            parse_args(args(&["explain", "hover:flex"])).expect("explain args should parse"),
            Command::Explain {
                candidate: "hover:flex".to_string(),
                config: None,
            }
        );
        assert!(parse_args(args(&["explain"])).is_err());
        assert!(parse_args(args(&["explain", "a", "b"])).is_err());
    }

    #[test]
    fn rejects_unknown_command() {
        let err = parse_args(args(&["build"])).expect_err("unknown command");
        assert_eq!(err.message, "unknown command: build");
    }

    #[test]
    fn explain_lists_variants_and_rule() {
        let lines = explain_lines(&Compiler::default(), "md:hover:flex");
        assert_eq!(lines[0], "candidate: md:hover:flex");
        assert_eq!(lines[1], "segments: md | hover | <flex>");
        assert_eq!(lines[2], "variant: md (Responsive) 768px");
        assert_eq!(lines[3], "variant: hover (PseudoClass) :hover");
        assert_eq!(lines[4], "base: flex");
        assert_eq!(lines[5], "rule:");
        assert_eq!(lines[6], "  @media (min-width: 768px) {");
    }

    #[test]
    fn explain_reports_skip_reason() {
        let lines = explain_lines(&Compiler::default(), "hover:[&:first-child]:flex");
        assert_eq!(
            lines.last().map(String::as_str),
            Some(
                "skipped: variant `hover` cannot be stacked with an arbitrary selector variant"
            )
        );
        let lines = explain_lines(&Compiler::default(), "wobble:flex");
        assert_eq!(
            lines,
            vec![
                "candidate: wobble:flex",
                "segments: wobble | <flex>",
                "skipped: unknown variant `wobble`",
            ]
        );
        let lines = explain_lines(&Compiler::default(), "hover:[&:x");
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("skipped: unbalanced bracket expression"));
    }
}
