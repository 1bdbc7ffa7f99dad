#[cfg(feature = "cli")]
pub mod cli;

#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
pub fn run() -> Result<(), crate::error::AppError> {
    use crate::adapters::cli::{Args, CalculationOutput, init_tracing, parse_inputs};
    use crate::speciation::solver::EquilibriumSolver;

    init_tracing();

    let args = Args::parse();
    let (mut stream, ass) = parse_inputs(&args)?;

    let solver = EquilibriumSolver::new(&ass);
    solver.constants().validate()?;
    let outcome = solver.update_equilibrium_with_outcome(&mut stream);

    let out = CalculationOutput::new(&stream, outcome);
    crate::adapters::cli::print_output(&out, &args)?;

    Ok(())
}
