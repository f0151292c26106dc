use anyhow::Context as _;
use cfgtrace::{util::set_notation, Algorithm, Outcome, Response, Session, StructuredGrammar};
use clap::{Parser, ValueEnum};
use std::{
    fs,
    io::{self, Read as _},
    path::PathBuf,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The analyses to run, in order. All of them by default.
    #[arg(short, long = "algorithm", value_enum)]
    algorithms: Vec<Algorithm>,

    /// The output format.
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Omit the step-by-step traces from the text output.
    #[arg(long)]
    no_steps: bool,

    /// The path of grammar definition file, or `-' to read from stdin.
    input: PathBuf,
}

#[derive(Debug, Copy, Clone, PartialEq, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    tracing::trace!("CLI args = {:?}", args);

    let source = read_input(&args)
        .with_context(|| anyhow::anyhow!("failed to read {}", args.input.display()))?;

    let algorithms = if args.algorithms.is_empty() {
        Algorithm::ALL.to_vec()
    } else {
        args.algorithms.clone()
    };

    let mut session = Session::new();
    let mut num_errors = 0;

    match args.format {
        Format::Json => {
            let loaded = session.load_grammar(&source);
            println!("{}", serde_json::to_string(&loaded)?);
            if let Response::Error { message } = loaded {
                anyhow::bail!("{}", message);
            }
            for algorithm in algorithms {
                let res = session.run_algorithm(algorithm.name());
                num_errors += usize::from(matches!(res, Response::Error { .. }));
                println!("{}", serde_json::to_string(&res)?);
            }
        }

        Format::Text => {
            let grammar = session.load(&source)?;
            print_grammar(&grammar);
            for algorithm in algorithms {
                println!();
                match session.run(algorithm) {
                    Ok(outcome) => print_outcome(&outcome, !args.no_steps),
                    Err(err) => {
                        num_errors += 1;
                        println!("## {}", algorithm.title());
                        println!("[error] {}", err);
                    }
                }
            }
        }
    }

    if num_errors > 0 {
        let noun = if num_errors == 1 { "analysis" } else { "analyses" };
        anyhow::bail!("{} {} failed", num_errors, noun);
    }

    Ok(())
}

fn read_input(args: &Args) -> io::Result<String> {
    if args.input.as_os_str() == "-" {
        let mut source = String::new();
        io::stdin().read_to_string(&mut source)?;
        Ok(source)
    } else {
        fs::read_to_string(&args.input)
    }
}

fn print_grammar(grammar: &StructuredGrammar) {
    println!("## grammar");
    for (left, alternatives) in &grammar.productions {
        println!("{} -> {}", left, alternatives.join(" | "));
    }
    println!("start: {}", grammar.start);
    println!(
        "variables: {}",
        set_notation(grammar.variables.iter().map(String::as_str))
    );
    println!(
        "terminals: {}",
        set_notation(grammar.terminals.iter().map(String::as_str))
    );
}

fn print_outcome(outcome: &Outcome, with_steps: bool) {
    println!("## {}", outcome.title());
    match outcome {
        Outcome::Set { values, .. } => {
            println!("{}", set_notation(values.iter().map(String::as_str)));
        }
        Outcome::Mapping { values, .. } => {
            for (variable, closure) in values {
                println!(
                    "{}: {}",
                    variable,
                    set_notation(closure.iter().map(String::as_str))
                );
            }
        }
        Outcome::Grammar { value, .. } => {
            for (left, alternatives) in &value.productions {
                println!("{} -> {}", left, alternatives.join(" | "));
            }
        }
    }

    if with_steps {
        println!("### steps");
        for (i, step) in outcome.steps().iter().enumerate() {
            println!("{:3}. [{}] {}", i + 1, step.phase, step);
        }
    }
}
