use calc_notation::Evaluator;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing_subscriber::EnvFilter;

fn main() -> rustyline::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    println!("Calculus Notation Solver");
    println!("Enter calculus notation, e.g. d/dx(x^2), ∫x^2 dx, lim_{{x->0}}(sin(x)/x)");
    println!("Type 'quit' to exit.");

    let evaluator = Evaluator::new();
    let mut rl = DefaultEditor::new()?;

    loop {
        let readline = rl.readline("> ");
        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                rl.add_history_entry(line)?;
                if line == "quit" || line == "exit" {
                    break;
                }
                report(&evaluator, line);
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }
    Ok(())
}

fn report(evaluator: &Evaluator, input: &str) {
    match evaluator.evaluate(input) {
        Ok(result) => {
            println!("Parsed: {}", result.parsed);
            println!("Steps:");
            for (i, step) in result.steps.iter().enumerate() {
                println!("{}. {}", i + 1, step);
            }
            println!("Result: {}", result.rendered);
            println!("LaTeX:  {}", result.latex());
        }
        Err(failure) => {
            println!("Error: {}", failure.error);
            if let Some(parsed) = &failure.parsed {
                println!("Parsed so far: {}", parsed);
            }
        }
    }
}
